//! 과거 시뮬레이션 VaR.
//!
//! 분포 가정 없이 포트폴리오의 실제 과거 수익률 분포에서
//! 백분위를 직접 읽습니다. 꼬리가 두꺼운 분포를 그대로 반영하지만
//! 히스토리에 없는 사건은 보지 못합니다.

use quantbook_core::{VaRMethod, VaRResult};

use super::empirical_tail;

/// 포트폴리오 수익률 시계열의 경험적 VaR / CVaR.
pub fn compute(portfolio_returns: &[f64], confidence_level: f64) -> VaRResult {
    let (var, cvar) = empirical_tail(portfolio_returns, confidence_level);
    VaRResult::new(VaRMethod::Historical, confidence_level, var, cvar)
}
