//! 리스크 코어의 에러 타입.
//!
//! 이 모듈은 파이프라인 전반에서 사용되는 에러 타입을 정의합니다.
//!
//! 에러 분류 원칙:
//! - 설정 오류는 구조적 문제이므로 시작 시점에 즉시 실패합니다
//! - 데이터 부족(짧은 히스토리, 관측치 부족)은 에러가 아니라
//!   경고와 함께 점진적으로 성능이 저하되는 경로입니다
//! - 수치 불안정(준특이 상관행렬)은 내부에서 보정되며 에러로
//!   표면화되지 않습니다

use thiserror::Error;

/// 리스크 코어 에러.
#[derive(Debug, Error)]
pub enum BookError {
    /// 설정 에러 (검증 단계에서 즉시 실패)
    #[error("설정 에러: {0}")]
    Config(String),

    /// 데이터 에러 (구조적으로 사용 불가능한 입력)
    #[error("데이터 에러: {0}")]
    Data(String),

    /// 계산 에러 (내부 불변식 위반)
    #[error("계산 에러: {0}")]
    Computation(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),
}

/// 리스크 코어 작업을 위한 Result 타입.
pub type BookResult<T> = Result<T, BookError>;

impl BookError {
    /// 재시도해도 해결되지 않는 구조적 에러인지 확인합니다.
    ///
    /// 이 코어는 이미 조회된 데이터에 대한 순수 계산이므로
    /// 모든 에러가 구조적입니다. 재시도는 외부 데이터 계층의 몫입니다.
    pub fn is_structural(&self) -> bool {
        matches!(self, BookError::Config(_) | BookError::Data(_))
    }

    /// 설정 에러인지 확인합니다.
    pub fn is_config(&self) -> bool {
        matches!(self, BookError::Config(_))
    }
}

impl From<serde_json::Error> for BookError {
    fn from(err: serde_json::Error) -> Self {
        BookError::Serialization(err.to_string())
    }
}
