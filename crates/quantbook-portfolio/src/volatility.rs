//! 후행 실현 변동성 추정.
//!
//! 리스크 패리티 기반 배분은 종목별 후행 변동성의 역수로
//! 비중을 정합니다. 이 모듈은 수익률 히스토리에서 연율화
//! 변동성 테이블을 만듭니다.

use quantbook_core::ReturnsHistory;
use std::collections::HashMap;
use tracing::warn;

use crate::config::PortfolioConfig;

/// 연간 거래일 수 (연율화 계산에 사용).
pub const TRADING_DAYS_PER_YEAR: usize = 252;

/// 종목별 연율화 실현 변동성 테이블.
#[derive(Debug, Clone, Default)]
pub struct VolatilityTable {
    /// 종목 ID → 연율화 변동성 (소수, 0.12 = 12%)
    vols: HashMap<String, f64>,
    /// 히스토리 부족으로 추정에서 빠진 종목
    missing: Vec<String>,
}

impl VolatilityTable {
    /// 수익률 히스토리에서 변동성 테이블을 만듭니다.
    ///
    /// 관측치가 최소 기준에 미달하거나 변동이 전혀 없는 종목은
    /// 테이블에서 빠지고 `missing`에 기록됩니다. 구성 단계에서
    /// 해당 종목은 경고와 함께 이번 패스에서 제외됩니다.
    pub fn from_history(history: &ReturnsHistory, config: &PortfolioConfig) -> Self {
        let mut vols = HashMap::new();
        let mut missing = Vec::new();

        for (instrument_id, series) in &history.series {
            if series.len() < config.min_volatility_observations {
                warn!(
                    instrument = %instrument_id,
                    observations = series.len(),
                    required = config.min_volatility_observations,
                    "Insufficient history for volatility estimate"
                );
                missing.push(instrument_id.clone());
                continue;
            }

            let window_start = series.len().saturating_sub(config.volatility_window);
            match annualized_volatility(&series[window_start..]) {
                Some(vol) => {
                    vols.insert(instrument_id.clone(), vol);
                }
                None => {
                    warn!(
                        instrument = %instrument_id,
                        "Degenerate return series, volatility undefined"
                    );
                    missing.push(instrument_id.clone());
                }
            }
        }

        missing.sort();
        Self { vols, missing }
    }

    /// 직접 구성합니다 (테스트/외부 추정치 주입용).
    pub fn from_vols(vols: HashMap<String, f64>) -> Self {
        Self {
            vols,
            missing: Vec::new(),
        }
    }

    /// 종목의 연율화 변동성을 조회합니다.
    pub fn get(&self, instrument_id: &str) -> Option<f64> {
        self.vols.get(instrument_id).copied()
    }

    /// 히스토리 부족으로 빠진 종목 목록.
    pub fn missing(&self) -> &[String] {
        &self.missing
    }

    /// 테이블에 있는 종목 수.
    pub fn len(&self) -> usize {
        self.vols.len()
    }

    /// 테이블이 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.vols.is_empty()
    }
}

/// 수익률 슬라이스의 연율화 표본 변동성.
///
/// 표본 표준편차(n-1 분모)에 √252를 곱합니다. 분산이 0이면
/// (가격 변동 없음) None을 반환합니다.
pub fn annualized_volatility(returns: &[f64]) -> Option<f64> {
    if returns.len() < 2 {
        return None;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns
        .iter()
        .map(|r| {
            let d = r - mean;
            d * d
        })
        .sum::<f64>()
        / (n - 1.0);

    if variance <= 0.0 {
        return None;
    }

    Some(variance.sqrt() * (TRADING_DAYS_PER_YEAR as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annualized_volatility() {
        // 일간 변동성 1%의 교대 수익률
        let returns: Vec<f64> = (0..100)
            .map(|i| if i % 2 == 0 { 0.01 } else { -0.01 })
            .collect();

        let vol = annualized_volatility(&returns).unwrap();
        let daily = (0.01f64 * 0.01 * 100.0 / 99.0).sqrt();
        assert!((vol - daily * (252.0f64).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_flat_series_undefined() {
        let returns = vec![0.0; 50];
        assert!(annualized_volatility(&returns).is_none());
    }

    #[test]
    fn test_table_excludes_short_history() {
        let mut history = ReturnsHistory::new();
        history.insert("KTB_10Y", vec![0.01, -0.005].repeat(40)); // 80개
        history.insert("EQ_KOSPI200", vec![0.02, -0.01, 0.015]); // 3개

        let config = PortfolioConfig::default();
        let table = VolatilityTable::from_history(&history, &config);

        assert!(table.get("KTB_10Y").is_some());
        assert!(table.get("EQ_KOSPI200").is_none());
        assert_eq!(table.missing(), &["EQ_KOSPI200".to_string()]);
    }

    #[test]
    fn test_window_uses_tail() {
        // 앞쪽은 변동성 큼, 윈도우(뒤쪽)는 작음
        let mut returns = vec![0.05, -0.05].repeat(50); // 100개
        returns.extend(vec![0.001, -0.001].repeat(40)); // 마지막 80개는 저변동

        let mut history = ReturnsHistory::new();
        history.insert("A", returns);

        let config = PortfolioConfig {
            volatility_window: 63,
            ..Default::default()
        };
        let table = VolatilityTable::from_history(&history, &config);

        // 윈도우가 저변동 구간만 덮으므로 연율화 변동성이 작아야 함
        assert!(table.get("A").unwrap() < 0.05);
    }
}
