//! 리스크 측정 설정.

use quantbook_core::{BookError, BookResult};
use serde::{Deserialize, Serialize};

use crate::stress::StressScenario;

/// VaR 계산 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarConfig {
    /// 신뢰수준 목록 (기본값: [0.95, 0.99])
    #[serde(default = "default_confidence_levels")]
    pub confidence_levels: Vec<f64>,

    /// 과거 시뮬레이션의 최소 관측치 수 (기본값: 252)
    /// 미달 시 모수적 방법으로 자동 폴백하고 경고를 남깁니다
    #[serde(default = "default_min_history")]
    pub min_history: usize,

    /// 몬테카를로 시뮬레이션 횟수 (기본값: 10,000)
    /// 수렴 기준이 아니라 고정 횟수로 최악 지연을 제한합니다
    #[serde(default = "default_mc_simulations")]
    pub mc_simulations: usize,

    /// Student-t 주변분포 적합에 필요한 최소 관측치 수 (기본값: 30)
    /// 미달 종목은 준가우시안(자유도 30) 적합으로 폴백합니다
    #[serde(default = "default_mc_min_observations")]
    pub mc_min_observations: usize,

    /// 상관행렬 수축 강도 (항등행렬 방향, 기본값: 0.1)
    #[serde(default = "default_shrinkage")]
    pub shrinkage: f64,

    /// 몬테카를로 난수 시드 (재현 가능한 실행, 기본값: 42)
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_confidence_levels() -> Vec<f64> {
    vec![0.95, 0.99]
}

fn default_min_history() -> usize {
    252
}

fn default_mc_simulations() -> usize {
    10_000
}

fn default_mc_min_observations() -> usize {
    30
}

fn default_shrinkage() -> f64 {
    0.1
}

fn default_seed() -> u64 {
    42
}

impl Default for VarConfig {
    fn default() -> Self {
        Self {
            confidence_levels: default_confidence_levels(),
            min_history: default_min_history(),
            mc_simulations: default_mc_simulations(),
            mc_min_observations: default_mc_min_observations(),
            shrinkage: default_shrinkage(),
            seed: default_seed(),
        }
    }
}

impl VarConfig {
    /// 설정 값을 검증합니다.
    pub fn validate(&self) -> BookResult<()> {
        if self.confidence_levels.is_empty() {
            return Err(BookError::Config(
                "at least one VaR confidence level is required".to_string(),
            ));
        }

        for level in &self.confidence_levels {
            if !(0.5..1.0).contains(level) {
                return Err(BookError::Config(format!(
                    "confidence level {} must be in [0.5, 1)",
                    level
                )));
            }
        }

        if self.mc_simulations == 0 {
            return Err(BookError::Config(
                "mc_simulations must be positive".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.shrinkage) {
            return Err(BookError::Config(format!(
                "shrinkage {} must be in [0, 1]",
                self.shrinkage
            )));
        }

        Ok(())
    }
}

/// 스트레스 테스트 설정 (시나리오 카탈로그).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressConfig {
    /// 재연할 시나리오 목록 (기본값: 역사적 위기 4종)
    #[serde(default = "crate::stress::catalog::default_catalog")]
    pub scenarios: Vec<StressScenario>,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            scenarios: crate::stress::catalog::default_catalog(),
        }
    }
}

impl StressConfig {
    /// 설정 값을 검증합니다.
    ///
    /// 쇼크가 하나도 없는 시나리오는 구조적 오류이므로 즉시
    /// 실패합니다.
    pub fn validate(&self) -> BookResult<()> {
        let mut seen = std::collections::HashSet::new();
        for scenario in &self.scenarios {
            if !seen.insert(scenario.id.as_str()) {
                return Err(BookError::Config(format!(
                    "duplicate stress scenario id: {}",
                    scenario.id
                )));
            }
            if scenario.shocks.is_empty() {
                return Err(BookError::Config(format!(
                    "stress scenario {} defines no shocks",
                    scenario.id
                )));
            }
            if scenario.start > scenario.end {
                return Err(BookError::Config(format!(
                    "stress scenario {} has inverted date range",
                    scenario.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    #[test]
    fn test_default_var_config_valid() {
        let config = VarConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.confidence_levels, vec![0.95, 0.99]);
        assert_eq!(config.min_history, 252);
    }

    #[test]
    fn test_invalid_confidence_level() {
        let mut config = VarConfig::default();
        config.confidence_levels = vec![1.5];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_stress_config_valid() {
        let config = StressConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scenarios.len(), 4);
    }

    #[test]
    fn test_scenario_without_shocks_fails_fast() {
        let config = StressConfig {
            scenarios: vec![StressScenario {
                id: "empty".to_string(),
                name: "Empty".to_string(),
                start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2020, 2, 1).unwrap(),
                shocks: HashMap::new(),
            }],
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_scenario_id_fails() {
        let mut config = StressConfig::default();
        let duplicate = config.scenarios[0].clone();
        config.scenarios.push(duplicate);
        assert!(config.validate().is_err());
    }
}
