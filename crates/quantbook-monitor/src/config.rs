//! 브레이커 설정 및 북 전체 설정 로딩.

use quantbook_core::{BookError, BookResult};
use quantbook_portfolio::PortfolioConfig;
use quantbook_risk::{StressConfig, VarConfig};
use quantbook_signal::SignalConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 서킷 브레이커 설정.
///
/// 낙폭 임계값은 음수 퍼센트입니다 (-5.0 = -5% 낙폭에서 발동).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakerConfig {
    /// TIER_1 진입 낙폭 (기본값: -5.0)
    #[serde(default = "default_tier1_drawdown_pct")]
    pub tier1_drawdown_pct: f64,

    /// TIER_2 진입 낙폭 (기본값: -10.0)
    #[serde(default = "default_tier2_drawdown_pct")]
    pub tier2_drawdown_pct: f64,

    /// 선택적 TIER_3 진입 낙폭 (기본값: 없음, 2단계 운영)
    #[serde(default)]
    pub tier3_drawdown_pct: Option<f64>,

    /// 재진입 가능 낙폭 (이보다 회복되어야 램프 시작, 기본값: -3.0)
    #[serde(default = "default_reentry_drawdown_pct")]
    pub reentry_drawdown_pct: f64,

    /// 재진입 쿨다운 (세션 수, 기본값: 5)
    #[serde(default = "default_cooldown_sessions")]
    pub cooldown_sessions: u32,

    /// 재진입 램프 길이 (세션 수, 기본값: 3)
    #[serde(default = "default_ramp_sessions")]
    pub ramp_sessions: u32,

    /// TIER_1의 노출 스칼라 (기본값: 0.5 = 총 노출 50% 축소)
    #[serde(default = "default_tier1_exposure_scalar")]
    pub tier1_exposure_scalar: f64,
}

fn default_tier1_drawdown_pct() -> f64 {
    -5.0
}

fn default_tier2_drawdown_pct() -> f64 {
    -10.0
}

fn default_reentry_drawdown_pct() -> f64 {
    -3.0
}

fn default_cooldown_sessions() -> u32 {
    5
}

fn default_ramp_sessions() -> u32 {
    3
}

fn default_tier1_exposure_scalar() -> f64 {
    0.5
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            tier1_drawdown_pct: default_tier1_drawdown_pct(),
            tier2_drawdown_pct: default_tier2_drawdown_pct(),
            tier3_drawdown_pct: None,
            reentry_drawdown_pct: default_reentry_drawdown_pct(),
            cooldown_sessions: default_cooldown_sessions(),
            ramp_sessions: default_ramp_sessions(),
            tier1_exposure_scalar: default_tier1_exposure_scalar(),
        }
    }
}

impl BreakerConfig {
    /// 보수적인 설정을 생성합니다 (이른 발동, 느린 재진입).
    pub fn conservative() -> Self {
        Self {
            tier1_drawdown_pct: -3.0,
            tier2_drawdown_pct: -7.0,
            tier3_drawdown_pct: None,
            reentry_drawdown_pct: -1.5,
            cooldown_sessions: 7,
            ramp_sessions: 5,
            tier1_exposure_scalar: 0.4,
        }
    }

    /// 공격적인 설정을 생성합니다 (늦은 발동, 빠른 재진입).
    pub fn aggressive() -> Self {
        Self {
            tier1_drawdown_pct: -7.0,
            tier2_drawdown_pct: -12.0,
            tier3_drawdown_pct: None,
            reentry_drawdown_pct: -4.0,
            cooldown_sessions: 3,
            ramp_sessions: 2,
            tier1_exposure_scalar: 0.6,
        }
    }

    /// 설정 값을 검증합니다.
    pub fn validate(&self) -> BookResult<()> {
        if self.tier1_drawdown_pct >= 0.0 {
            return Err(BookError::Config(
                "tier1_drawdown_pct must be negative".to_string(),
            ));
        }

        if self.tier2_drawdown_pct >= self.tier1_drawdown_pct {
            return Err(BookError::Config(
                "tier2_drawdown_pct must be deeper than tier1".to_string(),
            ));
        }

        if let Some(tier3) = self.tier3_drawdown_pct {
            if tier3 >= self.tier2_drawdown_pct {
                return Err(BookError::Config(
                    "tier3_drawdown_pct must be deeper than tier2".to_string(),
                ));
            }
        }

        if self.reentry_drawdown_pct <= self.tier1_drawdown_pct {
            return Err(BookError::Config(
                "reentry_drawdown_pct must be shallower than tier1".to_string(),
            ));
        }

        if self.cooldown_sessions == 0 || self.ramp_sessions == 0 {
            return Err(BookError::Config(
                "cooldown_sessions and ramp_sessions must be at least 1".to_string(),
            ));
        }

        if !(0.0..1.0).contains(&self.tier1_exposure_scalar) {
            return Err(BookError::Config(format!(
                "tier1_exposure_scalar {} must be in [0, 1)",
                self.tier1_exposure_scalar
            )));
        }

        Ok(())
    }
}

/// 북 전체 설정.
///
/// 모든 컴포넌트 설정을 하나로 묶어 TOML 파일과
/// `QUANTBOOK__` 접두사 환경 변수에서 로드합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookConfig {
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingSection,
    /// 시그널 집계 설정
    pub signal: SignalConfig,
    /// 포트폴리오 구성 설정
    #[serde(default)]
    pub portfolio: PortfolioConfig,
    /// VaR 계산 설정
    #[serde(default)]
    pub var: VarConfig,
    /// 스트레스 시나리오 카탈로그
    #[serde(default)]
    pub stress: StressConfig,
    /// 서킷 브레이커 설정
    #[serde(default)]
    pub breaker: BreakerConfig,
}

/// 로깅 설정 섹션.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl BookConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 로드 직후 전 섹션을 검증해 구조적 오류는 여기서 즉시
    /// 실패합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> BookResult<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("QUANTBOOK")
                    .separator("__")
                    .try_parsing(true),
            );

        let loaded: Self = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| BookError::Config(e.to_string()))?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> BookResult<Self> {
        Self::load("config/default.toml")
    }

    /// 전 섹션을 검증합니다.
    pub fn validate(&self) -> BookResult<()> {
        self.signal.validate()?;
        self.portfolio.validate()?;
        self.var.validate()?;
        self.stress.validate()?;
        self.breaker.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_breaker_config_valid() {
        assert!(BreakerConfig::default().validate().is_ok());
        assert!(BreakerConfig::conservative().validate().is_ok());
        assert!(BreakerConfig::aggressive().validate().is_ok());
    }

    #[test]
    fn test_tier_ordering_enforced() {
        let mut config = BreakerConfig::default();
        config.tier2_drawdown_pct = -4.0; // tier1(-5)보다 얕음
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tier3_must_be_deeper() {
        let mut config = BreakerConfig::default();
        config.tier3_drawdown_pct = Some(-8.0); // tier2(-10)보다 얕음
        assert!(config.validate().is_err());

        config.tier3_drawdown_pct = Some(-15.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_reentry_must_be_shallower_than_tier1() {
        let mut config = BreakerConfig::default();
        config.reentry_drawdown_pct = -6.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_preset_ordering() {
        let conservative = BreakerConfig::conservative();
        let aggressive = BreakerConfig::aggressive();
        assert!(conservative.tier1_drawdown_pct > aggressive.tier1_drawdown_pct);
        assert!(conservative.cooldown_sessions > aggressive.cooldown_sessions);
    }
}
