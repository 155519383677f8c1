//! 모수적 (가우시안) VaR.
//!
//! 포트폴리오 수익률이 정규분포를 따른다고 가정합니다.
//! VaR = -(μ + σ·z), CVaR는 가우시안 기대 꼬리 손실의 폐형식
//! ES = -μ + σ·φ(z)/(1-c) 를 사용합니다.
//!
//! 히스토리가 최소 윈도우보다 짧을 때 과거 시뮬레이션의 자동
//! 폴백으로도 쓰입니다 (그 경우 디스패치가 신뢰도 경고를 답니다).

use quantbook_core::{VaRMethod, VaRResult};
use statrs::distribution::{Continuous, ContinuousCDF, Normal};

/// 가우시안 가정의 VaR / CVaR.
pub fn compute(portfolio_returns: &[f64], confidence_level: f64) -> VaRResult {
    let n = portfolio_returns.len() as f64;
    let mean = portfolio_returns.iter().sum::<f64>() / n;
    let variance = if portfolio_returns.len() > 1 {
        portfolio_returns
            .iter()
            .map(|r| {
                let d = r - mean;
                d * d
            })
            .sum::<f64>()
            / (n - 1.0)
    } else {
        0.0
    };
    let std_dev = variance.sqrt();

    // 표준정규는 고정 파라미터이므로 생성이 실패하지 않음
    let standard_normal = Normal::new(0.0, 1.0).expect("standard normal is well-defined");
    let z = standard_normal.inverse_cdf(1.0 - confidence_level);

    let var = -(mean + std_dev * z);
    let cvar = -mean + std_dev * standard_normal.pdf(z) / (1.0 - confidence_level);

    VaRResult::new(VaRMethod::Parametric, confidence_level, var, cvar)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 평균 0, 일간 변동성 1%에 가까운 결정적 시계열.
    fn zero_mean_returns() -> Vec<f64> {
        (0..500)
            .map(|i| if i % 2 == 0 { 0.01 } else { -0.01 })
            .collect()
    }

    #[test]
    fn test_var_matches_z_score() {
        let returns = zero_mean_returns();
        let result = compute(&returns, 0.95);

        // 평균 0이므로 VaR ≈ σ·1.645
        let sigma = (returns.iter().map(|r| r * r).sum::<f64>() / 499.0).sqrt();
        assert!((result.var_value - sigma * 1.6449).abs() < 1e-3);
    }

    #[test]
    fn test_cvar_exceeds_var() {
        let result = compute(&zero_mean_returns(), 0.95);
        assert!(result.cvar_value > result.var_value);

        // 가우시안 95%: ES/VaR ≈ 2.063/1.645 ≈ 1.254
        let ratio = result.cvar_value / result.var_value;
        assert!((ratio - 1.254).abs() < 0.01);
    }

    #[test]
    fn test_99_exceeds_95() {
        let returns = zero_mean_returns();
        let var_95 = compute(&returns, 0.95).var_value;
        let var_99 = compute(&returns, 0.99).var_value;
        assert!(var_99 > var_95);
    }

    #[test]
    fn test_positive_drift_reduces_var() {
        let flat: Vec<f64> = zero_mean_returns();
        let drifted: Vec<f64> = flat.iter().map(|r| r + 0.002).collect();

        let var_flat = compute(&flat, 0.95).var_value;
        let var_drifted = compute(&drifted, 0.95).var_value;
        assert!(var_drifted < var_flat);
    }

    #[test]
    fn test_degenerate_series_finite() {
        // 변동 없는 시계열도 유한한 결과 (σ=0 → VaR = -μ)
        let returns = vec![0.001; 10];
        let result = compute(&returns, 0.95);

        assert!(result.var_value.is_finite());
        assert!((result.var_value + 0.001).abs() < 1e-12);
    }
}
