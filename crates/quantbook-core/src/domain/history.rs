//! 수익률 히스토리 입력.
//!
//! 외부 시점별(point-in-time) 데이터 계층이 공급하는 종목별
//! 일간 수익률 시계열입니다. 기준일 이후 데이터가 섞이지 않도록
//! 보장하는 것은 호출자의 책임입니다.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 종목별 일간 수익률 히스토리.
///
/// 각 시계열은 시간 오름차순이며 마지막 원소가 가장 최근
/// 세션입니다. 시계열 길이는 종목마다 다를 수 있습니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReturnsHistory {
    /// 종목 ID → 일간 수익률 (소수, 0.01 = +1%)
    pub series: HashMap<String, Vec<f64>>,
}

impl ReturnsHistory {
    /// 빈 히스토리를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 종목 시계열을 추가합니다.
    pub fn insert(&mut self, instrument_id: impl Into<String>, returns: Vec<f64>) {
        self.series.insert(instrument_id.into(), returns);
    }

    /// 종목의 수익률 시계열을 조회합니다.
    pub fn get(&self, instrument_id: &str) -> Option<&[f64]> {
        self.series.get(instrument_id).map(|v| v.as_slice())
    }

    /// 종목의 관측치 수를 반환합니다.
    pub fn observations(&self, instrument_id: &str) -> usize {
        self.series.get(instrument_id).map_or(0, |v| v.len())
    }

    /// 주어진 종목들에 공통으로 존재하는 관측치 수 (최솟값).
    pub fn common_length(&self, instruments: &[&str]) -> usize {
        instruments
            .iter()
            .map(|id| self.observations(id))
            .min()
            .unwrap_or(0)
    }

    /// 비중이 주어진 포트폴리오의 수익률 시계열을 만듭니다.
    ///
    /// 공통 구간(각 시계열의 마지막 n개)으로 정렬해 합산합니다.
    /// 히스토리가 없는 종목은 건너뜁니다.
    pub fn portfolio_returns(&self, weights: &[(String, f64)]) -> Vec<f64> {
        let available: Vec<(&str, f64)> = weights
            .iter()
            .filter(|(id, _)| self.series.contains_key(id.as_str()))
            .map(|(id, w)| (id.as_str(), *w))
            .collect();

        if available.is_empty() {
            return Vec::new();
        }

        let ids: Vec<&str> = available.iter().map(|(id, _)| *id).collect();
        let n = self.common_length(&ids);
        if n == 0 {
            return Vec::new();
        }

        let mut portfolio = vec![0.0; n];
        for (id, weight) in &available {
            let series = &self.series[*id];
            let tail = &series[series.len() - n..];
            for (p, r) in portfolio.iter_mut().zip(tail) {
                *p += weight * r;
            }
        }
        portfolio
    }
}

/// 가격 시계열을 일간 수익률로 변환합니다.
///
/// 반환 길이는 `prices.len() - 1`입니다.
pub fn prices_to_returns(prices: &[f64]) -> Vec<f64> {
    if prices.len() < 2 {
        return Vec::new();
    }

    prices
        .windows(2)
        .map(|w| {
            if w[0] == 0.0 {
                0.0
            } else {
                (w[1] - w[0]) / w[0]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prices_to_returns() {
        let prices = vec![100.0, 101.0, 99.0, 102.0];
        let returns = prices_to_returns(&prices);

        assert_eq!(returns.len(), 3);
        assert!((returns[0] - 0.01).abs() < 1e-9);
    }

    #[test]
    fn test_portfolio_returns_aligns_tails() {
        let mut history = ReturnsHistory::new();
        history.insert("A", vec![0.05, 0.01, -0.02, 0.01]);
        history.insert("B", vec![0.02, 0.00, -0.01]); // 하나 짧음

        let weights = vec![("A".to_string(), 0.5), ("B".to_string(), 0.5)];
        let portfolio = history.portfolio_returns(&weights);

        // 공통 구간은 마지막 3개
        assert_eq!(portfolio.len(), 3);
        assert!((portfolio[0] - (0.5 * 0.01 + 0.5 * 0.02)).abs() < 1e-12);
    }

    #[test]
    fn test_portfolio_returns_skips_missing() {
        let mut history = ReturnsHistory::new();
        history.insert("A", vec![0.01, 0.02]);

        let weights = vec![
            ("A".to_string(), 0.6),
            ("MISSING".to_string(), 0.4),
        ];
        let portfolio = history.portfolio_returns(&weights);

        assert_eq!(portfolio.len(), 2);
        assert!((portfolio[1] - 0.6 * 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_empty_history() {
        let history = ReturnsHistory::new();
        assert_eq!(history.observations("A"), 0);
        assert!(history
            .portfolio_returns(&[("A".to_string(), 1.0)])
            .is_empty());
    }
}
