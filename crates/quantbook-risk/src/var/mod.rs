//! Value-at-Risk 계산기.
//!
//! 통계적 가정이 다른 세 가지 독립 추정 방법을 하나의 디스패치
//! 뒤에 둡니다. 클래스 계층이 아니라 순수 함수 세 개입니다.
//! 통계적으로 무관한 방법들이 상태를 공유할 이유가 없습니다.
//!
//! 세 방법 모두 동일한 입력으로 호출할 수 있어 교차 검증에
//! 쓸 수 있으며, 어떤 방법도 공유 상태를 변경하지 않습니다.

pub mod historical;
pub mod monte_carlo;
pub mod parametric;

use quantbook_core::{BookError, BookResult, PositionTarget, ReturnsHistory, VaRMethod, VaRResult};
use tracing::warn;

use crate::config::VarConfig;

/// 목표 포지션의 1일 VaR / CVaR를 추정합니다.
///
/// - **Historical**: 포트폴리오 과거 수익률 분포의 경험적 백분위.
///   히스토리가 최소 윈도우(기본 252 관측치)보다 짧으면 모수적
///   방법으로 자동 폴백하고 결과에 신뢰도 경고를 남깁니다.
/// - **Parametric**: 가우시안 가정의 폐형식.
/// - **MonteCarlo**: 종목별 Student-t 주변분포 + 수축 상관행렬
///   시뮬레이션.
///
/// 반환되는 `VaRResult.method`는 실제 사용된 방법입니다 (폴백 시
/// 요청한 방법과 다를 수 있습니다).
pub fn compute(
    history: &ReturnsHistory,
    targets: &[PositionTarget],
    confidence_level: f64,
    method: VaRMethod,
    config: &VarConfig,
) -> BookResult<VaRResult> {
    config.validate()?;

    if !(0.5..1.0).contains(&confidence_level) {
        return Err(BookError::Config(format!(
            "confidence level {} must be in [0.5, 1)",
            confidence_level
        )));
    }

    // 비중 0인 포지션은 분포에 기여하지 않으므로 제외
    // (짧은 히스토리로 공통 구간만 줄이는 것을 방지)
    let weights: Vec<(String, f64)> = targets
        .iter()
        .filter(|t| t.target_weight != 0.0)
        .map(|t| (t.instrument_id.clone(), t.target_weight))
        .collect();

    // 평탄한 북(브레이커 전량 평탄화 이후 등)은 에러가 아니라 0
    if weights.is_empty() {
        return Ok(
            VaRResult::new(method, confidence_level, 0.0, 0.0)
                .with_warning("no active positions, VaR is zero".to_string()),
        );
    }

    let portfolio = history.portfolio_returns(&weights);
    if portfolio.is_empty() {
        return Err(BookError::Data(
            "no return history available for any active position".to_string(),
        ));
    }

    match method {
        VaRMethod::Historical => {
            if portfolio.len() < config.min_history {
                warn!(
                    observations = portfolio.len(),
                    required = config.min_history,
                    "Short history, falling back to parametric VaR"
                );
                let result = parametric::compute(&portfolio, confidence_level);
                Ok(result.with_warning(format!(
                    "confidence_warning: history {} < {} observations, parametric fallback",
                    portfolio.len(),
                    config.min_history
                )))
            } else {
                Ok(historical::compute(&portfolio, confidence_level))
            }
        }
        VaRMethod::Parametric => {
            let result = parametric::compute(&portfolio, confidence_level);
            if portfolio.len() < config.min_history {
                Ok(result.with_warning(format!(
                    "confidence_warning: history {} < {} observations",
                    portfolio.len(),
                    config.min_history
                )))
            } else {
                Ok(result)
            }
        }
        VaRMethod::MonteCarlo => Ok(monte_carlo::compute(
            history,
            &weights,
            confidence_level,
            config,
        )),
    }
}

/// 오름차순 정렬된 수익률의 경험적 꼬리 (VaR, CVaR).
///
/// VaR는 (1 - 신뢰수준) 백분위의 음수, CVaR는 그 백분위 이하
/// 꼬리의 평균 음수입니다. 둘 다 손실을 양수로 보고합니다.
pub(crate) fn empirical_tail(returns: &[f64], confidence_level: f64) -> (f64, f64) {
    let mut sorted = returns.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let index = (((1.0 - confidence_level) * sorted.len() as f64) as usize)
        .min(sorted.len() - 1);

    let var = -sorted[index];
    let tail = &sorted[..=index];
    let cvar = -(tail.iter().sum::<f64>() / tail.len() as f64);
    (var, cvar)
}
