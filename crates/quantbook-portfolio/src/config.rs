//! 포트폴리오 구성 설정.

use quantbook_core::{BookError, BookResult, RegimeConfig};
use serde::{Deserialize, Serialize};

/// 포트폴리오 구성 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioConfig {
    /// 후행 변동성 추정 윈도우 (세션 수, 기본값: 63)
    #[serde(default = "default_volatility_window")]
    pub volatility_window: usize,

    /// 변동성 추정에 필요한 최소 관측치 수 (기본값: 21)
    /// 미달 종목은 이번 패스에서 제외되고 경고로 표시됩니다
    #[serde(default = "default_min_volatility_observations")]
    pub min_volatility_observations: usize,

    /// 종목당 최대 리스크 기여 비중 (총 리스크 대비, 기본값: 0.20)
    #[serde(default = "default_concentration_limit")]
    pub concentration_limit: f64,

    /// 총 비중 절대값 합의 상한 (기본값: 2.0)
    #[serde(default = "default_leverage_cap")]
    pub leverage_cap: f64,

    /// 리밸런싱 드리프트 임계값 (기본값: 0.05)
    /// 이전 목표 대비 편차가 이를 넘을 때만 실제 변경으로 표시됩니다
    #[serde(default = "default_drift_threshold")]
    pub drift_threshold: f64,

    /// 레짐 배분 승수 및 전환 램프 설정
    #[serde(default)]
    pub regime: RegimeConfig,
}

fn default_volatility_window() -> usize {
    63
}

fn default_min_volatility_observations() -> usize {
    21
}

fn default_concentration_limit() -> f64 {
    0.20
}

fn default_leverage_cap() -> f64 {
    2.0
}

fn default_drift_threshold() -> f64 {
    0.05
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            volatility_window: default_volatility_window(),
            min_volatility_observations: default_min_volatility_observations(),
            concentration_limit: default_concentration_limit(),
            leverage_cap: default_leverage_cap(),
            drift_threshold: default_drift_threshold(),
            regime: RegimeConfig::default(),
        }
    }
}

impl PortfolioConfig {
    /// 보수적인 구성 설정을 생성합니다 (낮은 레버리지, 민감한 리밸런싱).
    pub fn conservative() -> Self {
        Self {
            volatility_window: 126,
            min_volatility_observations: 42,
            concentration_limit: 0.15,
            leverage_cap: 1.0,
            drift_threshold: 0.03,
            regime: RegimeConfig::default(),
        }
    }

    /// 공격적인 구성 설정을 생성합니다 (높은 레버리지).
    pub fn aggressive() -> Self {
        Self {
            volatility_window: 42,
            min_volatility_observations: 21,
            concentration_limit: 0.25,
            leverage_cap: 3.0,
            drift_threshold: 0.08,
            regime: RegimeConfig::default(),
        }
    }

    /// 설정 값을 검증합니다.
    pub fn validate(&self) -> BookResult<()> {
        if self.volatility_window < 2 {
            return Err(BookError::Config(
                "volatility_window must be at least 2 sessions".to_string(),
            ));
        }

        if self.min_volatility_observations < 2 {
            return Err(BookError::Config(
                "min_volatility_observations must be at least 2".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.concentration_limit) || self.concentration_limit == 0.0 {
            return Err(BookError::Config(format!(
                "concentration_limit {} must be in (0, 1]",
                self.concentration_limit
            )));
        }

        if self.leverage_cap <= 0.0 {
            return Err(BookError::Config(
                "leverage_cap must be positive".to_string(),
            ));
        }

        if self.drift_threshold < 0.0 {
            return Err(BookError::Config(
                "drift_threshold must be non-negative".to_string(),
            ));
        }

        self.regime.validate().map_err(BookError::Config)
    }
}
