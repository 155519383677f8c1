//! 리스크 모니터 오케스트레이션.
//!
//! 사이클 하나의 흐름: VaR (세 방법 × 신뢰수준) → 스트레스 재연
//! → 범위별 브레이커 평가 → 리포트 조립.
//!
//! VaR와 스트레스는 서로 의존성이 없는 순수 계산이므로 실행
//! 순서에 의미가 없습니다. 브레이커 평가만 이전 상태를 입력으로
//! 받으며, 새 상태는 리포트에 담아 반환할 뿐 이 컴포넌트가
//! 직접 영속화하지 않습니다.

use chrono::{NaiveDate, Utc};
use quantbook_core::{
    AggregatedSignal, BookResult, BreakerScope, CircuitBreakerState, PositionTarget,
    ReturnsHistory, RiskReport, VaRMethod,
};
use quantbook_risk::config::{StressConfig, VarConfig};
use quantbook_risk::{replay, var};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;

use crate::breaker::CircuitBreaker;
use crate::config::{BookConfig, BreakerConfig};

/// 한 계산 사이클의 입력.
///
/// 외부 오케스트레이터가 모든 데이터를 미리 조회해 넘깁니다.
/// 이 코어는 아무것도 다시 가져오지 않고 재시도하지도 않습니다.
#[derive(Debug)]
pub struct MonitorInputs<'a> {
    /// 기준 일자
    pub as_of: NaiveDate,
    /// 이번 패스의 집계 시그널
    pub aggregated_signals: &'a [AggregatedSignal],
    /// 이번 패스의 목표 포지션
    pub position_targets: &'a [PositionTarget],
    /// 종목별 수익률 히스토리 (시점별 조회는 호출자 책임)
    pub returns: &'a ReturnsHistory,
    /// 포트폴리오 명목가치 (스트레스 손익 환산 기준)
    pub portfolio_value: Decimal,
    /// 범위별 현재 낙폭 (%)
    pub drawdowns: &'a HashMap<BreakerScope, f64>,
    /// 직전 사이클의 브레이커 상태 (값으로 전달, 변경 없음)
    pub breaker_states: &'a [CircuitBreakerState],
    /// 구성 단계에서 넘어온 경고 (제외 종목 등)
    pub construction_warnings: &'a [String],
    /// 스트레스 재연 수행 여부 (주간 주기는 호출자가 결정)
    pub include_stress: bool,
}

/// 리스크 모니터.
pub struct RiskMonitor {
    var_config: VarConfig,
    stress_config: StressConfig,
    breaker: CircuitBreaker,
}

impl RiskMonitor {
    /// 검증된 설정으로 생성합니다.
    pub fn new(
        var_config: VarConfig,
        stress_config: StressConfig,
        breaker_config: BreakerConfig,
    ) -> BookResult<Self> {
        var_config.validate()?;
        stress_config.validate()?;
        Ok(Self {
            var_config,
            stress_config,
            breaker: CircuitBreaker::new(breaker_config)?,
        })
    }

    /// 북 전체 설정에서 생성합니다.
    pub fn from_config(config: &BookConfig) -> BookResult<Self> {
        Self::new(
            config.var.clone(),
            config.stress.clone(),
            config.breaker.clone(),
        )
    }

    /// 브레이커 평가기 참조 (노출 스칼라 조회용).
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// 한 계산 사이클을 실행해 리스크 리포트를 만듭니다.
    ///
    /// 어떤 하위 계산이라도 실패하면 에러를 반환하며, 이때
    /// 전달받은 브레이커 상태는 그대로 남습니다. 부분 실패한
    /// 계산으로 리스크 상태를 전진시키지 않는 것이 안전 속성입니다.
    pub fn run(&self, inputs: MonitorInputs<'_>) -> BookResult<RiskReport> {
        let mut warnings = Vec::new();

        // 집계 단계의 성능 저하를 리포트 경고로 표면화
        for signal in inputs.aggregated_signals {
            if signal.conflict_flag {
                warnings.push(format!(
                    "signal {} dampened: same-class producer conflict",
                    signal.instrument_id
                ));
            }
            if signal.veto_applied {
                warnings.push(format!(
                    "signal {} flattened by regime veto",
                    signal.instrument_id
                ));
            }
        }
        warnings.extend(inputs.construction_warnings.iter().cloned());

        // VaR: 세 방법 × 설정된 신뢰수준 전부 (교차 검증용)
        let mut var_results = Vec::new();
        for &confidence_level in &self.var_config.confidence_levels {
            for method in [
                VaRMethod::Historical,
                VaRMethod::Parametric,
                VaRMethod::MonteCarlo,
            ] {
                let result = var::compute(
                    inputs.returns,
                    inputs.position_targets,
                    confidence_level,
                    method,
                    &self.var_config,
                )?;
                for warning in &result.warnings {
                    warnings.push(format!(
                        "VaR {} {:.0}%: {}",
                        result.method,
                        confidence_level * 100.0,
                        warning
                    ));
                }
                var_results.push(result);
            }
        }

        // 스트레스 재연 (자문용, 브레이커와 무관)
        let mut stress_results = Vec::new();
        if inputs.include_stress {
            for scenario in &self.stress_config.scenarios {
                stress_results.push(replay(
                    scenario,
                    inputs.position_targets,
                    inputs.portfolio_value,
                ));
            }
        }

        // 범위별 브레이커 평가 (범위 간 독립)
        let mut breaker_states = Vec::new();
        let mut transitions = Vec::new();
        for prior in inputs.breaker_states {
            let drawdown = match inputs.drawdowns.get(&prior.scope) {
                Some(drawdown) => *drawdown,
                None => {
                    warn!(scope = %prior.scope, "No drawdown input, state carried forward");
                    warnings.push(format!(
                        "scope {} had no drawdown input, breaker state unchanged",
                        prior.scope
                    ));
                    breaker_states.push(prior.clone());
                    continue;
                }
            };

            let (next, alert) = self.breaker.evaluate(prior, drawdown, inputs.as_of);
            if let Some(warning) = self.breaker.approach_warning(&next) {
                warnings.push(warning);
            }
            if let Some(alert) = alert {
                // 모든 전이는 트리거 시점의 전체 컨텍스트를 담아 발행
                transitions.push(
                    alert
                        .with_positions(inputs.position_targets.to_vec())
                        .with_signals(inputs.aggregated_signals.to_vec()),
                );
            }
            breaker_states.push(next);
        }

        info!(
            as_of = %inputs.as_of,
            var_results = var_results.len(),
            stress_results = stress_results.len(),
            transitions = transitions.len(),
            warnings = warnings.len(),
            "Risk cycle complete"
        );

        Ok(RiskReport {
            id: Uuid::new_v4(),
            as_of: inputs.as_of,
            generated_at: Utc::now(),
            aggregated_signals: inputs.aggregated_signals.to_vec(),
            position_targets: inputs.position_targets.to_vec(),
            var_results,
            stress_results,
            breaker_states,
            transitions,
            warnings,
        })
    }
}
