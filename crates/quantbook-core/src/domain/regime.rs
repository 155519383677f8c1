//! 시장 레짐 상태.
//!
//! 시장을 RISK_ON / NEUTRAL / RISK_OFF 3단계로 분류하고
//! 총 노출을 각 단계의 배분 승수로 스케일합니다.
//!
//! 레짐 전환은 절대 즉시 반영되지 않습니다. `transition_progress`가
//! 세션마다 고정 증분으로 전진하며, 이전 승수에서 목표 승수로
//! 선형 보간됩니다 (첫날 약 50%, 2~3일차에 완료).
//!
//! 레짐 판정 자체는 외부 입력입니다. 이 타입은 판정 결과를 받아
//! 램프 상태만 관리합니다.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 시장 레짐 분류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegimeKind {
    /// 위험 선호 (목표 배분 100%)
    RiskOn,
    /// 중립 (목표 배분 70%)
    #[default]
    Neutral,
    /// 위험 회피 (목표 배분 40%)
    RiskOff,
}

impl fmt::Display for RegimeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::RiskOn => "RISK_ON",
            Self::Neutral => "NEUTRAL",
            Self::RiskOff => "RISK_OFF",
        };
        write!(f, "{}", s)
    }
}

/// 레짐 배분 승수 및 전환 램프 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeConfig {
    /// RISK_ON 목표 배분 승수 (기본값: 1.0)
    #[serde(default = "default_risk_on_multiplier")]
    pub risk_on_multiplier: f64,

    /// NEUTRAL 목표 배분 승수 (기본값: 0.7)
    #[serde(default = "default_neutral_multiplier")]
    pub neutral_multiplier: f64,

    /// RISK_OFF 목표 배분 승수 (기본값: 0.4)
    #[serde(default = "default_risk_off_multiplier")]
    pub risk_off_multiplier: f64,

    /// 세션당 전환 진행 증분 (기본값: 0.5 → 첫날 50%, 둘째 날 완료)
    #[serde(default = "default_progress_per_session")]
    pub progress_per_session: f64,
}

fn default_risk_on_multiplier() -> f64 {
    1.0
}

fn default_neutral_multiplier() -> f64 {
    0.7
}

fn default_risk_off_multiplier() -> f64 {
    0.4
}

fn default_progress_per_session() -> f64 {
    0.5
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            risk_on_multiplier: default_risk_on_multiplier(),
            neutral_multiplier: default_neutral_multiplier(),
            risk_off_multiplier: default_risk_off_multiplier(),
            progress_per_session: default_progress_per_session(),
        }
    }
}

impl RegimeConfig {
    /// 레짐의 목표 배분 승수를 반환합니다.
    pub fn target_multiplier(&self, regime: RegimeKind) -> f64 {
        match regime {
            RegimeKind::RiskOn => self.risk_on_multiplier,
            RegimeKind::Neutral => self.neutral_multiplier,
            RegimeKind::RiskOff => self.risk_off_multiplier,
        }
    }

    /// 설정 값을 검증합니다.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("risk_on_multiplier", self.risk_on_multiplier),
            ("neutral_multiplier", self.neutral_multiplier),
            ("risk_off_multiplier", self.risk_off_multiplier),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be between 0 and 1", name));
            }
        }

        if self.progress_per_session <= 0.0 || self.progress_per_session > 1.0 {
            return Err("progress_per_session must be in (0, 1]".to_string());
        }

        Ok(())
    }
}

/// 프로세스 전역 레짐 상태.
///
/// 실행 간에 생존하는 두 가지 상태 중 하나입니다
/// (다른 하나는 서킷 브레이커). 값으로 전달받아 값으로 반환하며
/// 영속화는 외부 협력자의 책임입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeState {
    /// 현재 목표 레짐
    pub current: RegimeKind,
    /// 전환 시작 시점의 유효 승수 (보간의 출발점)
    pub prior_multiplier: f64,
    /// 전환 진행도 (0.0 ~ 1.0)
    pub transition_progress: f64,
}

impl Default for RegimeState {
    fn default() -> Self {
        Self {
            current: RegimeKind::Neutral,
            prior_multiplier: default_neutral_multiplier(),
            transition_progress: 1.0,
        }
    }
}

impl RegimeState {
    /// 전환 완료 상태의 레짐으로 생성합니다.
    pub fn settled(regime: RegimeKind, config: &RegimeConfig) -> Self {
        Self {
            current: regime,
            prior_multiplier: config.target_multiplier(regime),
            transition_progress: 1.0,
        }
    }

    /// 현재 보간된 유효 배분 승수.
    ///
    /// `prior + (target - prior) × progress`. 전환 완료 시
    /// 목표 승수와 일치합니다.
    pub fn effective_multiplier(&self, config: &RegimeConfig) -> f64 {
        let target = config.target_multiplier(self.current);
        self.prior_multiplier + (target - self.prior_multiplier) * self.transition_progress
    }

    /// 외부 레짐 판정을 반영합니다.
    ///
    /// 다른 레짐으로 바뀌면 현재 유효 승수를 출발점으로 새 램프를
    /// 시작합니다. 같은 레짐이면 아무 일도 하지 않습니다.
    pub fn apply_detection(&mut self, regime: RegimeKind, config: &RegimeConfig) {
        if regime == self.current {
            return;
        }

        self.prior_multiplier = self.effective_multiplier(config);
        self.current = regime;
        self.transition_progress = 0.0;
    }

    /// 세션 하나만큼 전환을 전진시킵니다.
    ///
    /// 진행도는 단조 증가하며 1.0에서 멈춥니다.
    pub fn advance_session(&mut self, config: &RegimeConfig) {
        self.transition_progress =
            (self.transition_progress + config.progress_per_session).min(1.0);
    }

    /// 전환이 완료되었는지 확인합니다.
    pub fn is_settled(&self) -> bool {
        self.transition_progress >= 1.0
    }
}
