//! 스트레스 테스터.
//!
//! 고정된 역사적 위기 쇼크를 현재 포지션에 재연해 자문용 손실
//! 추정치를 만듭니다. 출력은 엄격히 자문용입니다: 이 컴포넌트는
//! `PositionTarget`을 변경하지 않고 서킷 브레이커 전이도
//! 트리거하지 않습니다. 사람이 검토할 리포트만 생성합니다.

pub mod catalog;

use chrono::NaiveDate;
use quantbook_core::{PositionShock, PositionTarget, StressResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// 역사적 위기 시나리오.
///
/// 명명된 날짜 구간과 종목(또는 종목 패밀리 접두사)별 수익률
/// 쇼크의 집합입니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressScenario {
    /// 시나리오 ID
    pub id: String,
    /// 사람이 읽는 이름
    pub name: String,
    /// 역사적 구간 시작
    pub start: NaiveDate,
    /// 역사적 구간 끝
    pub end: NaiveDate,
    /// 종목 ID 또는 패밀리 접두사 → 수익률 쇼크 (-0.15 = -15%)
    pub shocks: HashMap<String, f64>,
}

impl StressScenario {
    /// 종목에 적용할 쇼크를 찾습니다.
    ///
    /// 정확한 종목 ID 일치가 패밀리 접두사 일치보다 우선하며,
    /// 접두사가 여럿 일치하면 가장 긴(가장 구체적인) 것을 씁니다.
    /// 정의된 쇼크가 없으면 0 (평탄 가정)입니다. 포트폴리오
    /// 합계가 해석 가능하도록 종목을 제외하지 않습니다.
    ///
    /// 반환: (쇼크, 정확 일치 여부)
    pub fn shock_for(&self, instrument_id: &str) -> (f64, bool) {
        if let Some(shock) = self.shocks.get(instrument_id) {
            return (*shock, true);
        }

        let best_prefix = self
            .shocks
            .iter()
            .filter(|(family, _)| instrument_id.starts_with(family.as_str()))
            .max_by_key(|(family, _)| family.len());

        match best_prefix {
            Some((_, shock)) => (*shock, false),
            None => (0.0, false),
        }
    }
}

/// 시나리오를 현재 포지션에 재연합니다.
///
/// `portfolio_value`는 비중을 통화 손익으로 환산하는 기준
/// 명목가치입니다.
pub fn replay(
    scenario: &StressScenario,
    targets: &[PositionTarget],
    portfolio_value: Decimal,
) -> StressResult {
    let mut breakdown = Vec::with_capacity(targets.len());
    let mut total_pnl = Decimal::ZERO;

    for target in targets {
        let (shock, exact_match) = scenario.shock_for(&target.instrument_id);
        let pnl_fraction = target.target_weight * shock;
        let pnl = portfolio_value
            * Decimal::from_f64_retain(pnl_fraction).unwrap_or(Decimal::ZERO);

        total_pnl += pnl;
        breakdown.push(PositionShock {
            instrument_id: target.instrument_id.clone(),
            weight: target.target_weight,
            shock_pct: shock,
            pnl,
            exact_match,
        });
    }

    debug!(
        scenario = %scenario.id,
        pnl = %total_pnl,
        "Stress scenario replayed"
    );

    StressResult {
        scenario_id: scenario.id.clone(),
        scenario_date_range: (scenario.start, scenario.end),
        shocked_pnl: total_pnl,
        position_breakdown: breakdown,
    }
}
