//! 포트폴리오 구성.
//!
//! 집계된 방향성 시그널을 리스크 예산 기반 목표 비중으로
//! 변환합니다:
//! - 후행 실현 변동성 역가중 리스크 패리티 기반 배분
//! - 확신도(순점수) 오버레이
//! - 레짐 배분 승수 (보간 램프 적용)
//! - 집중도 한도 및 레버리지 상한
//! - 드리프트 임계값 기반 리밸런싱 판단
//!
//! # 예제
//!
//! ```rust,ignore
//! use quantbook_portfolio::{construct, PortfolioConfig, VolatilityTable};
//!
//! let vols = VolatilityTable::from_history(&history, &config);
//! let outcome = construct(&aggregated, &regime, &prior_weights, &vols, &config)?;
//! for target in &outcome.targets {
//!     println!("{}: {:.4}", target.instrument_id, target.target_weight);
//! }
//! ```

pub mod config;
pub mod constructor;
pub mod volatility;

pub use config::PortfolioConfig;
pub use constructor::{construct, ConstructionOutcome};
pub use volatility::{VolatilityTable, TRADING_DAYS_PER_YEAR};
