//! 시그널 집계.
//!
//! 이 crate는 독립적이고 서로 충돌할 수 있는 N개 생산자의
//! 방향성 시그널을 종목당 하나의 순방향 뷰로 합칩니다:
//! - 자산군별 생산자 가중치
//! - 단일 거부권(레짐 오버레이) 규칙
//! - 동일 자산군 충돌 감쇠
//!
//! # 예제
//!
//! ```rust,ignore
//! use quantbook_signal::{aggregate, SignalConfig};
//!
//! let config = SignalConfig::default_book();
//! let aggregated = aggregate(&signals, &config)?;
//! for signal in &aggregated {
//!     println!("{}: {:.3}", signal.instrument_id, signal.net_score);
//! }
//! ```

pub mod aggregator;
pub mod config;

pub use aggregator::aggregate;
pub use config::{ProducerConfig, SignalConfig, VetoRule};
