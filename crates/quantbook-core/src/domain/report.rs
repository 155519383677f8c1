//! 리스크 리포트 및 알림 페이로드.
//!
//! 한 번의 계산 사이클이 하류(영속화/알림/프레젠테이션 계층)에
//! 전달하는 유일한 산출물입니다. 전달 자체(로그 싱크, 웹훅 등)는
//! 외부 책임이며 이 코어는 페이로드만 만듭니다.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    AggregatedSignal, BreakerLevel, BreakerScope, CircuitBreakerState, PositionTarget,
    StressResult, VaRResult,
};

/// 서킷 브레이커 전이 알림.
///
/// 모든 전이는 트리거 시점의 전체 컨텍스트를 담아 발행됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAlert {
    /// 알림 ID
    pub id: Uuid,
    /// 전이가 발생한 범위
    pub scope: BreakerScope,
    /// 이전 단계
    pub old_level: BreakerLevel,
    /// 새 단계
    pub new_level: BreakerLevel,
    /// 트리거 시점 낙폭 (%)
    pub drawdown_pct: f64,
    /// 트리거 시점 포지션 스냅샷
    pub position_snapshot: Vec<PositionTarget>,
    /// 트리거 시점 활성 시그널
    pub active_signals: Vec<AggregatedSignal>,
    /// 전이 요약 (사람이 읽는 한 줄)
    pub summary: String,
    /// 발생 시각
    pub occurred_at: DateTime<Utc>,
}

impl RiskAlert {
    /// 전이 알림을 생성합니다.
    pub fn transition(
        scope: BreakerScope,
        old_level: BreakerLevel,
        new_level: BreakerLevel,
        drawdown_pct: f64,
    ) -> Self {
        let summary = format!(
            "{}: {} -> {} at drawdown {:.2}%",
            scope, old_level, new_level, drawdown_pct
        );
        Self {
            id: Uuid::new_v4(),
            scope,
            old_level,
            new_level,
            drawdown_pct,
            position_snapshot: Vec::new(),
            active_signals: Vec::new(),
            summary,
            occurred_at: Utc::now(),
        }
    }

    /// 포지션 스냅샷을 첨부합니다.
    pub fn with_positions(mut self, positions: Vec<PositionTarget>) -> Self {
        self.position_snapshot = positions;
        self
    }

    /// 활성 시그널을 첨부합니다.
    pub fn with_signals(mut self, signals: Vec<AggregatedSignal>) -> Self {
        self.active_signals = signals;
        self
    }

    /// 디레버리징 방향의 전이인지 확인합니다 (완화/해제는 false).
    pub fn is_escalation(&self) -> bool {
        self.new_level > self.old_level
    }
}

/// 한 번의 계산 사이클 리스크 리포트.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskReport {
    /// 리포트 ID
    pub id: Uuid,
    /// 기준 일자
    pub as_of: NaiveDate,
    /// 생성 시각
    pub generated_at: DateTime<Utc>,
    /// 집계된 시그널
    pub aggregated_signals: Vec<AggregatedSignal>,
    /// 포지션 목표
    pub position_targets: Vec<PositionTarget>,
    /// VaR 결과 (세 방법 × 설정된 신뢰수준)
    pub var_results: Vec<VaRResult>,
    /// 스트레스 재연 결과 (자문용)
    pub stress_results: Vec<StressResult>,
    /// 전 범위의 브레이커 상태
    pub breaker_states: Vec<CircuitBreakerState>,
    /// 이번 사이클에 발생한 전이 알림
    pub transitions: Vec<RiskAlert>,
    /// 성능 저하 경고 모음 (폴백, 제외 종목, 감쇠된 충돌 등)
    pub warnings: Vec<String>,
}

impl RiskReport {
    /// 이번 사이클에 브레이커 전이가 있었는지 확인합니다.
    pub fn has_transitions(&self) -> bool {
        !self.transitions.is_empty()
    }

    /// 특정 방법의 VaR 결과를 조회합니다.
    pub fn var_by_method(
        &self,
        method: crate::domain::VaRMethod,
        confidence_level: f64,
    ) -> Option<&VaRResult> {
        self.var_results.iter().find(|r| {
            r.method == method && (r.confidence_level - confidence_level).abs() < 1e-9
        })
    }

    /// 특정 범위의 브레이커 상태를 조회합니다.
    pub fn breaker_for(&self, scope: &BreakerScope) -> Option<&CircuitBreakerState> {
        self.breaker_states.iter().find(|s| &s.scope == scope)
    }
}
