//! 리스크 측정 결과 타입.
//!
//! VaR 계산기와 스트레스 테스터의 출력입니다. 둘 다 순수 계산
//! 결과이며 공유 상태를 변경하지 않습니다. 스트레스 결과는
//! 자문용(advisory)일 뿐 포지션이나 브레이커에 영향을 주지 않습니다.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// VaR 추정 방법.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VaRMethod {
    /// 과거 수익률 분포의 경험적 백분위
    Historical,
    /// 가우시안 가정의 폐형식
    Parametric,
    /// Student-t 주변분포 + 상관 시뮬레이션
    MonteCarlo,
}

impl fmt::Display for VaRMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Historical => "HISTORICAL",
            Self::Parametric => "PARAMETRIC",
            Self::MonteCarlo => "MONTE_CARLO",
        };
        write!(f, "{}", s)
    }
}

/// 1일 VaR / CVaR 추정 결과.
///
/// `var_value`와 `cvar_value`는 포트폴리오 가치 대비 손실 비율의
/// 양수 크기입니다 (0.023 = 1일 손실 2.3%).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaRResult {
    /// 실제 사용된 추정 방법 (폴백 시 요청과 다를 수 있음)
    pub method: VaRMethod,
    /// 신뢰수준 (0.95 또는 0.99)
    pub confidence_level: f64,
    /// Value-at-Risk (손실 비율, 양수)
    pub var_value: f64,
    /// Conditional VaR / 기대 꼬리 손실 (손실 비율, 양수)
    pub cvar_value: f64,
    /// 성능 저하 경고 (짧은 히스토리 폴백, 고유값 보정 등)
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl VaRResult {
    /// 경고 없이 생성합니다.
    pub fn new(method: VaRMethod, confidence_level: f64, var_value: f64, cvar_value: f64) -> Self {
        Self {
            method,
            confidence_level,
            var_value,
            cvar_value,
            warnings: Vec::new(),
        }
    }

    /// 경고를 추가합니다.
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    /// 성능 저하 없이 계산되었는지 확인합니다.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// 스트레스 시나리오 적용 시 한 종목의 손익 내역.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionShock {
    /// 종목 ID
    pub instrument_id: String,
    /// 적용 시점 목표 비중
    pub weight: f64,
    /// 적용된 쇼크 (수익률, -0.15 = -15%)
    pub shock_pct: f64,
    /// 종목 손익 (통화 단위)
    pub pnl: Decimal,
    /// 정확 일치 쇼크인지 (false면 패밀리 접두사 일치 또는 무쇼크)
    pub exact_match: bool,
}

/// 스트레스 시나리오 재연 결과.
///
/// 자문 전용입니다. 이 결과가 포지션을 변경하거나 브레이커를
/// 발동시키는 일은 없습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressResult {
    /// 시나리오 ID
    pub scenario_id: String,
    /// 시나리오가 참조하는 역사적 구간 (시작, 끝)
    pub scenario_date_range: (NaiveDate, NaiveDate),
    /// 포트폴리오 총 손익 (통화 단위)
    pub shocked_pnl: Decimal,
    /// 종목별 손익 내역
    pub position_breakdown: Vec<PositionShock>,
}

impl StressResult {
    /// 손실 시나리오인지 확인합니다.
    pub fn is_loss(&self) -> bool {
        self.shocked_pnl < Decimal::ZERO
    }

    /// 가장 큰 손실을 낸 종목을 반환합니다.
    pub fn worst_position(&self) -> Option<&PositionShock> {
        self.position_breakdown
            .iter()
            .min_by(|a, b| a.pnl.cmp(&b.pnl))
    }
}
