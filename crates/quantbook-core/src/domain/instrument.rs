//! 종목 분류 타입.
//!
//! 북이 거래하는 종목 유니버스의 자산군 분류를 정의합니다.
//! 시그널 가중치, 브레이커 범위, 스트레스 쇼크 패밀리가
//! 모두 이 분류를 기준으로 동작합니다.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 북이 다루는 자산군.
///
/// 닫힌 열거형입니다. 생산자 가중 행렬과 자산군별 서킷 브레이커는
/// 이 분류를 키로 사용합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetClass {
    /// 금리 (국채, 스왑)
    Rates,
    /// 외환
    Fx,
    /// 주식
    Equity,
    /// 크레딧
    Credit,
    /// 원자재
    Commodity,
}

impl AssetClass {
    /// 전체 자산군 목록.
    pub fn all() -> [AssetClass; 5] {
        [
            Self::Rates,
            Self::Fx,
            Self::Equity,
            Self::Credit,
            Self::Commodity,
        ]
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Rates => "RATES",
            Self::Fx => "FX",
            Self::Equity => "EQUITY",
            Self::Credit => "CREDIT",
            Self::Commodity => "COMMODITY",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(AssetClass::Rates.to_string(), "RATES");
        assert_eq!(AssetClass::Fx.to_string(), "FX");
    }

    #[test]
    fn test_serde_naming() {
        let json = serde_json::to_string(&AssetClass::Equity).unwrap();
        assert_eq!(json, "\"EQUITY\"");
    }

    #[test]
    fn test_all_is_exhaustive() {
        assert_eq!(AssetClass::all().len(), 5);
    }
}
