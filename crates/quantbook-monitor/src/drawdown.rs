//! 낙폭 계산 헬퍼.
//!
//! 브레이커 평가에 넣을 범위별 낙폭은 호출자가 자기 자본 곡선에서
//! 계산합니다. 이 모듈은 그 계산을 위한 헬퍼입니다.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// 자본 곡선의 현재 낙폭 (%, 음수가 손실).
///
/// 마지막 값이 직전 고점 대비 얼마나 내려왔는지를 퍼센트로
/// 반환합니다. 고점이거나 곡선이 비어 있으면 0입니다.
pub fn current_drawdown_pct(equity_curve: &[Decimal]) -> f64 {
    let last = match equity_curve.last() {
        Some(value) => *value,
        None => return 0.0,
    };

    let peak = equity_curve
        .iter()
        .copied()
        .max()
        .unwrap_or(last);

    if peak <= Decimal::ZERO {
        return 0.0;
    }

    let ratio = (last / peak).to_f64().unwrap_or(1.0);
    (ratio - 1.0) * 100.0
}

/// 자본 곡선의 최대 낙폭 (%, 음수).
///
/// 각 시점의 직전 고점 대비 하락률 중 최악값입니다.
pub fn max_drawdown_pct(equity_curve: &[Decimal]) -> f64 {
    let mut peak = Decimal::MIN;
    let mut worst = 0.0f64;

    for value in equity_curve {
        if *value > peak {
            peak = *value;
        }
        if peak > Decimal::ZERO {
            let dd = ((*value / peak).to_f64().unwrap_or(1.0) - 1.0) * 100.0;
            if dd < worst {
                worst = dd;
            }
        }
    }
    worst
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_current_drawdown() {
        let curve = vec![dec!(100), dec!(110), dec!(104.5)];
        // 고점 110 대비 104.5 → -5%
        assert!((current_drawdown_pct(&curve) + 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_at_peak_is_zero() {
        let curve = vec![dec!(100), dec!(105), dec!(110)];
        assert_eq!(current_drawdown_pct(&curve), 0.0);
    }

    #[test]
    fn test_max_drawdown_deeper_than_current() {
        // 중간에 -20%까지 빠졌다가 회복
        let curve = vec![dec!(100), dec!(80), dec!(95)];

        assert!((max_drawdown_pct(&curve) + 20.0).abs() < 1e-9);
        assert!((current_drawdown_pct(&curve) + 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_curve() {
        assert_eq!(current_drawdown_pct(&[]), 0.0);
        assert_eq!(max_drawdown_pct(&[]), 0.0);
    }
}
