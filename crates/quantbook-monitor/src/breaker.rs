//! 서킷 브레이커 상태 머신.
//!
//! 낙폭과 경과 시간만으로 구동되는 자동 디레버리징입니다.
//! 범위(포트폴리오 / 전략 / 자산군)마다 독립 평가되며, 계산
//! 사이클당 한 번 호출됩니다.
//!
//! 전이 규칙 (기본 2단계):
//! - NORMAL → TIER_1: 낙폭 -5% 돌파, 총 노출 50% 축소
//! - TIER_1 → TIER_2: 낙폭 -10% 돌파, 해당 범위 전량 평탄화
//! - 재진입: 낙폭이 -3%보다 회복되고 진입 후 쿨다운(5세션)이
//!   지나면 3세션에 걸쳐 노출을 점진 복원 (즉시 복귀 아님)
//! - 램프 중 낙폭이 다시 악화되면 램프를 버리고 해당 단계를
//!   즉시 재적용 (모호성 없는 결정적 해소)
//!
//! 한 세션에 여러 임계값을 한꺼번에 뚫으면 가장 깊은 단계가
//! 즉시 적용됩니다.

use chrono::{Days, NaiveDate};
use quantbook_core::{BreakerLevel, CircuitBreakerState, RiskAlert};
use tracing::{info, warn};

use crate::config::BreakerConfig;

/// 다음 단계 접근 경고 비율 (임계값까지 거리의 70%).
const APPROACH_WARNING_RATIO: f64 = 0.7;

/// 다음 단계 접근 위험 비율 (임계값까지 거리의 90%).
const APPROACH_CRITICAL_RATIO: f64 = 0.9;

/// 서킷 브레이커 평가기.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    config: BreakerConfig,
}

impl CircuitBreaker {
    /// 검증된 설정으로 생성합니다.
    pub fn new(config: BreakerConfig) -> quantbook_core::BookResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// 설정 참조를 반환합니다.
    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    /// 낙폭이 요구하는 단계를 계산합니다 (가장 깊은 돌파 단계).
    fn tier_for(&self, drawdown_pct: f64) -> BreakerLevel {
        if let Some(tier3) = self.config.tier3_drawdown_pct {
            if drawdown_pct <= tier3 {
                return BreakerLevel::Tier3;
            }
        }
        if drawdown_pct <= self.config.tier2_drawdown_pct {
            BreakerLevel::Tier2
        } else if drawdown_pct <= self.config.tier1_drawdown_pct {
            BreakerLevel::Tier1
        } else {
            BreakerLevel::Normal
        }
    }

    /// 한 범위의 상태를 한 세션만큼 평가합니다.
    ///
    /// 새 상태와, 전이가 발생했으면 알림 페이로드를 반환합니다.
    /// 입력 상태는 변경하지 않습니다. 호출자가 반환 상태를
    /// 영속화할지 결정합니다.
    pub fn evaluate(
        &self,
        state: &CircuitBreakerState,
        drawdown_pct: f64,
        as_of: NaiveDate,
    ) -> (CircuitBreakerState, Option<RiskAlert>) {
        let mut next = state.clone();
        next.drawdown_pct = drawdown_pct;

        let required = self.tier_for(drawdown_pct);

        // 악화: 더 깊은 단계가 요구되면 즉시 진입
        if required > state.level {
            next.level = required;
            next.entered_at = Some(as_of);
            next.cooldown_until =
                Some(as_of + Days::new(self.config.cooldown_sessions as u64));
            next.ramp_progress = 0.0;

            warn!(
                scope = %state.scope,
                drawdown = drawdown_pct,
                from = %state.level,
                to = %required,
                "Circuit breaker escalated"
            );
            let alert =
                RiskAlert::transition(state.scope.clone(), state.level, required, drawdown_pct);
            return (next, Some(alert));
        }

        // 램프 중 악화: 현재 단계가 다시 요구되면 램프를 버리고 재적용
        if state.is_ramping() && required == state.level {
            next.ramp_progress = 0.0;
            next.entered_at = Some(as_of);
            next.cooldown_until =
                Some(as_of + Days::new(self.config.cooldown_sessions as u64));

            warn!(
                scope = %state.scope,
                drawdown = drawdown_pct,
                level = %state.level,
                "Re-entry ramp abandoned, tier re-applied"
            );
            let alert =
                RiskAlert::transition(state.scope.clone(), state.level, state.level, drawdown_pct);
            return (next, Some(alert));
        }

        // 회복: 쿨다운이 끝나고 낙폭이 재진입 수준보다 회복되면 램프 전진
        if state.level.is_derisked()
            && drawdown_pct > self.config.reentry_drawdown_pct
            && state.cooldown_elapsed(as_of)
        {
            next.ramp_progress =
                (state.ramp_progress + 1.0 / self.config.ramp_sessions as f64).min(1.0);

            if next.ramp_progress >= 1.0 {
                let old_level = state.level;
                next.level = BreakerLevel::Normal;
                next.entered_at = None;
                next.cooldown_until = None;
                next.ramp_progress = 0.0;

                info!(
                    scope = %state.scope,
                    drawdown = drawdown_pct,
                    "Re-entry ramp complete, back to normal"
                );
                let alert = RiskAlert::transition(
                    state.scope.clone(),
                    old_level,
                    BreakerLevel::Normal,
                    drawdown_pct,
                );
                return (next, Some(alert));
            }
        }
        // 그 외(쿨다운 중이거나 낙폭이 어중간한 구간): 상태 유지,
        // 진행 중이던 램프도 전진하지 않음

        (next, None)
    }

    /// 상태의 노출 스칼라.
    ///
    /// 포트폴리오 구성기가 다음 사이클에 요청할 수 있는 비중의
    /// 상한입니다. 램프 중에는 단계 스칼라에서 1.0으로 선형
    /// 보간됩니다.
    pub fn exposure_scalar(&self, state: &CircuitBreakerState) -> f64 {
        let base = match state.level {
            BreakerLevel::Normal => 1.0,
            BreakerLevel::Tier1 => self.config.tier1_exposure_scalar,
            BreakerLevel::Tier2 | BreakerLevel::Tier3 => 0.0,
        };
        base + (1.0 - base) * state.ramp_progress
    }

    /// 다음 단계 임계값에 접근 중이면 경고 문자열을 반환합니다.
    pub fn approach_warning(&self, state: &CircuitBreakerState) -> Option<String> {
        let next_threshold = match state.level {
            BreakerLevel::Normal => self.config.tier1_drawdown_pct,
            BreakerLevel::Tier1 => self.config.tier2_drawdown_pct,
            BreakerLevel::Tier2 => self.config.tier3_drawdown_pct?,
            BreakerLevel::Tier3 => return None,
        };

        if state.drawdown_pct >= 0.0 {
            return None;
        }

        let usage = state.drawdown_pct / next_threshold;
        if usage >= 1.0 {
            return None; // 이미 돌파, 다음 평가에서 전이
        }

        if usage >= APPROACH_CRITICAL_RATIO {
            Some(format!(
                "CRITICAL: {} drawdown {:.2}% is {:.0}% of the way to {} threshold",
                state.scope,
                state.drawdown_pct,
                usage * 100.0,
                next_threshold
            ))
        } else if usage >= APPROACH_WARNING_RATIO {
            Some(format!(
                "WARNING: {} drawdown {:.2}% is {:.0}% of the way to {} threshold",
                state.scope,
                state.drawdown_pct,
                usage * 100.0,
                next_threshold
            ))
        } else {
            None
        }
    }
}
