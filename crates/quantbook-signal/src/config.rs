//! 시그널 집계 설정.
//!
//! 생산자별/자산군별 가중 행렬, 충돌 감쇠 계수, 거부권 규칙을
//! 정의합니다. 전부 외부에서 공급되며 하드코딩되지 않습니다.
//! 구조적으로 잘못된 설정(빈 행렬, 음수 가중치)은 시작 시점
//! 검증에서 즉시 실패합니다.

use quantbook_core::{AssetClass, BookError, BookResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 생산자 한 곳의 가중치 설정.
///
/// 가중치는 자산군별로 다릅니다. 예를 들어 금리 정책 생산자는
/// 금리 종목에 대해 FX 생산자보다 무겁게 반영됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProducerConfig {
    /// 생산자의 주력 자산군 (충돌 감쇠의 버킷 기준)
    pub specialty: AssetClass,

    /// 자산군별 가중치 (없는 자산군은 default_weight로 폴백)
    #[serde(default)]
    pub class_weights: HashMap<AssetClass, f64>,

    /// 자산군별 항목이 없을 때의 기본 가중치
    #[serde(default = "default_producer_weight")]
    pub default_weight: f64,
}

fn default_producer_weight() -> f64 {
    1.0
}

impl ProducerConfig {
    /// 주력 자산군만으로 생성합니다.
    pub fn new(specialty: AssetClass) -> Self {
        Self {
            specialty,
            class_weights: HashMap::new(),
            default_weight: default_producer_weight(),
        }
    }

    /// 자산군 가중치를 설정합니다.
    pub fn with_class_weight(mut self, asset_class: AssetClass, weight: f64) -> Self {
        self.class_weights.insert(asset_class, weight);
        self
    }

    /// 기본 가중치를 설정합니다.
    pub fn with_default_weight(mut self, weight: f64) -> Self {
        self.default_weight = weight;
        self
    }

    /// 주어진 자산군에 대한 유효 가중치를 반환합니다.
    pub fn weight_for(&self, asset_class: AssetClass) -> f64 {
        self.class_weights
            .get(&asset_class)
            .copied()
            .unwrap_or(self.default_weight)
    }
}

/// 거부권(레짐 오버라이드) 규칙.
///
/// 지정된 크로스에셋/레짐 생산자 하나만 순점수를 0 쪽으로
/// 강제할 수 있습니다. 다른 생산자 간 거부권 경로는 없습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VetoRule {
    /// 거부권을 가진 생산자 ID
    pub producer_id: String,

    /// 발동 임계값 (부호 판독값이 이 값 미만이면 극단으로 간주,
    /// 고정 음수, 기본값: -0.7)
    #[serde(default = "default_extreme_threshold")]
    pub extreme_threshold: f64,

    /// 발동 시 순점수에 곱하는 평탄화 계수
    /// (0.0 = 전량 평탄화, 기본값: 0.25)
    #[serde(default = "default_flatten_factor")]
    pub flatten_factor: f64,
}

fn default_extreme_threshold() -> f64 {
    -0.7
}

fn default_flatten_factor() -> f64 {
    0.25
}

impl VetoRule {
    /// 기본 임계값으로 규칙을 생성합니다.
    pub fn new(producer_id: impl Into<String>) -> Self {
        Self {
            producer_id: producer_id.into(),
            extreme_threshold: default_extreme_threshold(),
            flatten_factor: default_flatten_factor(),
        }
    }
}

/// 시그널 집계 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalConfig {
    /// 생산자 ID → 가중치 설정
    pub producers: HashMap<String, ProducerConfig>,

    /// 동일 자산군 충돌 시 감쇠 계수 (0.3 ~ 0.5, 기본값: 0.4)
    ///
    /// 확신 부족에 대한 페널티이지 상쇄가 아닙니다.
    #[serde(default = "default_damping_factor")]
    pub damping_factor: f64,

    /// 거부권 규칙 (없으면 거부권 경로 비활성)
    #[serde(default)]
    pub veto: Option<VetoRule>,
}

fn default_damping_factor() -> f64 {
    0.4
}

impl SignalConfig {
    /// 생산자 목록으로 설정을 생성합니다.
    pub fn new(producers: HashMap<String, ProducerConfig>) -> Self {
        Self {
            producers,
            damping_factor: default_damping_factor(),
            veto: None,
        }
    }

    /// 감쇠 계수를 설정합니다.
    pub fn with_damping_factor(mut self, factor: f64) -> Self {
        self.damping_factor = factor;
        self
    }

    /// 거부권 규칙을 설정합니다.
    pub fn with_veto(mut self, veto: VetoRule) -> Self {
        self.veto = Some(veto);
        self
    }

    /// 설정 값을 검증합니다.
    ///
    /// 잘못된 가중 행렬은 구조적 문제이므로 여기서 즉시 실패합니다.
    /// 재시도로 해결되지 않는 오류입니다.
    pub fn validate(&self) -> BookResult<()> {
        if self.producers.is_empty() {
            return Err(BookError::Config(
                "signal weight matrix has no producers".to_string(),
            ));
        }

        for (producer_id, producer) in &self.producers {
            if producer.default_weight <= 0.0 || !producer.default_weight.is_finite() {
                return Err(BookError::Config(format!(
                    "producer {} has invalid default weight {}",
                    producer_id, producer.default_weight
                )));
            }
            for (asset_class, weight) in &producer.class_weights {
                if *weight <= 0.0 || !weight.is_finite() {
                    return Err(BookError::Config(format!(
                        "producer {} has invalid weight {} for {}",
                        producer_id, weight, asset_class
                    )));
                }
            }
        }

        if !(0.3..=0.5).contains(&self.damping_factor) {
            return Err(BookError::Config(format!(
                "damping_factor {} must be between 0.3 and 0.5",
                self.damping_factor
            )));
        }

        if let Some(veto) = &self.veto {
            if !self.producers.contains_key(&veto.producer_id) {
                return Err(BookError::Config(format!(
                    "veto producer {} is not in the weight matrix",
                    veto.producer_id
                )));
            }
            if veto.extreme_threshold >= 0.0 {
                return Err(BookError::Config(
                    "veto extreme_threshold must be negative".to_string(),
                ));
            }
            if !(0.0..1.0).contains(&veto.flatten_factor) {
                return Err(BookError::Config(format!(
                    "veto flatten_factor {} must be in [0, 1)",
                    veto.flatten_factor
                )));
            }
        }

        Ok(())
    }
}
