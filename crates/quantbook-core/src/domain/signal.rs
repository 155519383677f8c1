//! 방향성 시그널 도메인 타입.
//!
//! 이 모듈은 시그널 집계의 입출력 타입을 정의합니다:
//! - `DirectionalSignal` - 생산자 한 곳의 한 종목에 대한 의견
//! - `AggregatedSignal` - 종목당 하나로 합쳐진 순방향 뷰
//!
//! 생산자(퀀트 모델/전략)의 내부는 이 코어의 관심사가 아닙니다.
//! 집계기는 오직 `DirectionalSignal`의 형태에만 의존합니다.

use crate::domain::AssetClass;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 시그널 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    /// 매수 방향
    Long,
    /// 매도 방향
    Short,
    /// 중립 (방향 없음)
    Neutral,
}

impl Direction {
    /// 방향의 부호 (+1 / -1 / 0).
    pub fn sign(self) -> f64 {
        match self {
            Self::Long => 1.0,
            Self::Short => -1.0,
            Self::Neutral => 0.0,
        }
    }

    /// 순점수의 부호에서 방향을 결정합니다.
    pub fn from_score(score: f64) -> Self {
        if score > 0.0 {
            Self::Long
        } else if score < 0.0 {
            Self::Short
        } else {
            Self::Neutral
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Long => "LONG",
            Self::Short => "SHORT",
            Self::Neutral => "NEUTRAL",
        };
        write!(f, "{}", s)
    }
}

/// 시그널 강도 등급.
///
/// 고정 서수 매핑으로 승수를 부여합니다. 생산자가 강도를
/// 보고하지 않으면 `None`으로 취급되어 집계에서 제외됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalStrength {
    /// 강한 확신
    Strong,
    /// 보통 확신
    Moderate,
    /// 약한 확신
    Weak,
    /// 시그널 없음
    None,
}

impl SignalStrength {
    /// 강도 승수 (STRONG=1.0, MODERATE=0.6, WEAK=0.3, NONE=0).
    pub fn multiplier(self) -> f64 {
        match self {
            Self::Strong => 1.0,
            Self::Moderate => 0.6,
            Self::Weak => 0.3,
            Self::None => 0.0,
        }
    }
}

/// 생산자 한 곳의 한 종목, 한 일자에 대한 방향성 시그널.
///
/// 불변 객체입니다. 외부 생산자가 생성하며 집계 패스마다 한 번
/// 소비됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectionalSignal {
    /// 시그널을 생성한 생산자 ID
    pub producer_id: String,
    /// 대상 종목 ID
    pub instrument_id: String,
    /// 종목의 자산군
    pub asset_class: AssetClass,
    /// 시그널 방향
    pub direction: Direction,
    /// 시그널 강도 등급
    pub strength: SignalStrength,
    /// 확신도 (0.0 ~ 1.0)
    pub confidence: f64,
    /// 기준 일자
    pub as_of: NaiveDate,
}

impl DirectionalSignal {
    /// 새 방향성 시그널을 생성합니다. 확신도는 [0, 1]로 클램핑됩니다.
    pub fn new(
        producer_id: impl Into<String>,
        instrument_id: impl Into<String>,
        asset_class: AssetClass,
        direction: Direction,
        strength: SignalStrength,
        confidence: f64,
        as_of: NaiveDate,
    ) -> Self {
        Self {
            producer_id: producer_id.into(),
            instrument_id: instrument_id.into(),
            asset_class,
            direction,
            strength,
            confidence: confidence.clamp(0.0, 1.0),
            as_of,
        }
    }

    /// 집계에 기여하는 시그널인지 확인합니다.
    ///
    /// 강도 NONE 또는 중립 방향은 기여하지 않습니다.
    pub fn is_contributing(&self) -> bool {
        self.strength != SignalStrength::None && self.direction != Direction::Neutral
    }

    /// 부호가 적용된 생산자 판독값 (방향 부호 × 확신도).
    pub fn signed_reading(&self) -> f64 {
        self.direction.sign() * self.confidence
    }
}

/// 종목당 하나로 집계된 순방향 시그널.
///
/// 매 패스마다 재계산되며 이 코어에서 영속화하지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedSignal {
    /// 대상 종목 ID
    pub instrument_id: String,
    /// 종목의 자산군
    pub asset_class: AssetClass,
    /// 순방향
    pub net_direction: Direction,
    /// 순점수 (-1.0 ~ 1.0)
    pub net_score: f64,
    /// 기여한 생산자 ID 목록
    pub contributing_producers: Vec<String>,
    /// 동일 자산군 생산자 간 부호 충돌 여부
    pub conflict_flag: bool,
    /// 레짐 거부권 적용 여부
    pub veto_applied: bool,
}

impl AggregatedSignal {
    /// 기여 생산자가 없는 중립 시그널을 생성합니다.
    pub fn neutral(instrument_id: impl Into<String>, asset_class: AssetClass) -> Self {
        Self {
            instrument_id: instrument_id.into(),
            asset_class,
            net_direction: Direction::Neutral,
            net_score: 0.0,
            contributing_producers: Vec::new(),
            conflict_flag: false,
            veto_applied: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    #[test]
    fn test_direction_sign() {
        assert_eq!(Direction::Long.sign(), 1.0);
        assert_eq!(Direction::Short.sign(), -1.0);
        assert_eq!(Direction::Neutral.sign(), 0.0);
    }

    #[test]
    fn test_direction_from_score() {
        assert_eq!(Direction::from_score(0.4), Direction::Long);
        assert_eq!(Direction::from_score(-0.1), Direction::Short);
        assert_eq!(Direction::from_score(0.0), Direction::Neutral);
    }

    #[test]
    fn test_strength_multiplier_ordering() {
        assert!(SignalStrength::Strong.multiplier() > SignalStrength::Moderate.multiplier());
        assert!(SignalStrength::Moderate.multiplier() > SignalStrength::Weak.multiplier());
        assert_eq!(SignalStrength::None.multiplier(), 0.0);
    }

    #[test]
    fn test_confidence_clamping() {
        let signal = DirectionalSignal::new(
            "macro_rates",
            "KTB_10Y",
            AssetClass::Rates,
            Direction::Long,
            SignalStrength::Strong,
            1.7,
            date(),
        );
        assert_eq!(signal.confidence, 1.0);
    }

    #[test]
    fn test_contributing() {
        let none_strength = DirectionalSignal::new(
            "fx_carry",
            "FX_USDKRW",
            AssetClass::Fx,
            Direction::Long,
            SignalStrength::None,
            0.8,
            date(),
        );
        assert!(!none_strength.is_contributing());

        let neutral = DirectionalSignal::new(
            "fx_carry",
            "FX_USDKRW",
            AssetClass::Fx,
            Direction::Neutral,
            SignalStrength::Strong,
            0.8,
            date(),
        );
        assert!(!neutral.is_contributing());
    }

    #[test]
    fn test_signed_reading() {
        let signal = DirectionalSignal::new(
            "regime_overlay",
            "EQ_KOSPI200",
            AssetClass::Equity,
            Direction::Short,
            SignalStrength::Strong,
            0.9,
            date(),
        );
        assert!((signal.signed_reading() + 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_neutral_aggregate() {
        let agg = AggregatedSignal::neutral("KTB_10Y", AssetClass::Rates);
        assert_eq!(agg.net_direction, Direction::Neutral);
        assert_eq!(agg.net_score, 0.0);
        assert!(agg.contributing_producers.is_empty());
        assert!(!agg.conflict_flag);
    }
}
