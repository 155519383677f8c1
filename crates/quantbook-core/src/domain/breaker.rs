//! 서킷 브레이커 상태 타입.
//!
//! 이 코어에서 유일하게 수명이 긴 가변 엔티티입니다. 포트폴리오 /
//! 전략별 / 자산군별 세 계층이 각각 독립 인스턴스를 가지며,
//! 상태 전이는 관측된 낙폭과 경과 시간만으로 결정됩니다.
//!
//! 전이 로직은 `quantbook-monitor`에 있습니다. 이 모듈은 외부에
//! 영속화했다가 복원할 수 있는 상태 레코드만 정의합니다
//! (싱글턴이 아니라 값으로 전달하고 값으로 돌려받습니다).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::AssetClass;

/// 브레이커가 감시하는 범위.
///
/// 범위별로 독립적으로 평가됩니다. 한 범위의 발동이 다른 범위를
/// 강제로 발동시키지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BreakerScope {
    /// 북 전체
    Portfolio,
    /// 개별 전략
    Strategy {
        /// 전략 ID
        strategy_id: String,
    },
    /// 자산군
    AssetClass {
        /// 대상 자산군
        asset_class: AssetClass,
    },
}

impl BreakerScope {
    /// 전략 범위를 생성합니다.
    pub fn strategy(strategy_id: impl Into<String>) -> Self {
        Self::Strategy {
            strategy_id: strategy_id.into(),
        }
    }

    /// 자산군 범위를 생성합니다.
    pub fn asset_class(asset_class: AssetClass) -> Self {
        Self::AssetClass { asset_class }
    }
}

impl fmt::Display for BreakerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Portfolio => write!(f, "portfolio"),
            Self::Strategy { strategy_id } => write!(f, "strategy:{}", strategy_id),
            Self::AssetClass { asset_class } => write!(f, "asset_class:{}", asset_class),
        }
    }
}

/// 브레이커 단계.
///
/// 숫자가 클수록 더 깊은 디레버리징입니다. 기본 설정은 TIER_2까지만
/// 사용하며 TIER_3는 선택적 세 번째 임계값이 설정된 경우에만
/// 도달합니다.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakerLevel {
    /// 정상 운영
    #[default]
    Normal,
    /// 1단계: 총 노출 50% 축소
    Tier1,
    /// 2단계: 해당 범위 전량 평탄화
    Tier2,
    /// 3단계 (선택적 설정)
    Tier3,
}

impl BreakerLevel {
    /// 디레버리징 단계인지 확인합니다.
    pub fn is_derisked(self) -> bool {
        self != Self::Normal
    }
}

impl fmt::Display for BreakerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Normal => "NORMAL",
            Self::Tier1 => "TIER_1",
            Self::Tier2 => "TIER_2",
            Self::Tier3 => "TIER_3",
        };
        write!(f, "{}", s)
    }
}

/// 한 범위의 서킷 브레이커 상태.
///
/// 시스템 시작 시 NORMAL로 생성되고 프로세스 재시작으로만
/// 소멸합니다. 마지막으로 영속화된 스냅샷에서 복원 가능해야 하며,
/// 영속화 자체는 외부 책임입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerState {
    /// 감시 범위
    pub scope: BreakerScope,
    /// 현재 단계
    pub level: BreakerLevel,
    /// 마지막 평가 시점의 낙폭 (%, 음수가 손실)
    pub drawdown_pct: f64,
    /// 현재 단계에 진입한 일자 (NORMAL이면 None)
    pub entered_at: Option<NaiveDate>,
    /// 재진입 쿨다운이 끝나는 일자
    pub cooldown_until: Option<NaiveDate>,
    /// 재진입 램프 진행도 (0.0 ~ 1.0, 램프 중이 아니면 0)
    pub ramp_progress: f64,
}

impl CircuitBreakerState {
    /// 시스템 시작 상태(NORMAL)를 생성합니다.
    pub fn normal(scope: BreakerScope) -> Self {
        Self {
            scope,
            level: BreakerLevel::Normal,
            drawdown_pct: 0.0,
            entered_at: None,
            cooldown_until: None,
            ramp_progress: 0.0,
        }
    }

    /// 재진입 램프가 진행 중인지 확인합니다.
    pub fn is_ramping(&self) -> bool {
        self.level.is_derisked() && self.ramp_progress > 0.0
    }

    /// 쿨다운이 끝났는지 확인합니다.
    pub fn cooldown_elapsed(&self, as_of: NaiveDate) -> bool {
        match self.cooldown_until {
            Some(until) => as_of >= until,
            None => true,
        }
    }
}
