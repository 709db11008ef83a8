//! 수집 엔진 에러 타입
//!
//! [`IngestError`]는 수집 엔진 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<IngestError> for LogHarborError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use logharbor_core::error::{ConfigError, LogHarborError, ParseError, StorageError};

/// 수집 엔진 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// 라인 파싱 실패 (`halt` 정책에서만 실행을 중단시킴)
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// 저장소 에러
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// 마스터 로그를 열거나 읽을 수 없음
    #[error("master log {path}: {source}")]
    MasterLog {
        /// 마스터 로그 경로
        path: String,
        /// 원인 I/O 에러
        #[source]
        source: std::io::Error,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 호스트 패턴 컴파일 에러
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl From<IngestError> for LogHarborError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Parse(e) => LogHarborError::Parse(e),
            IngestError::Storage(e) => LogHarborError::Storage(e),
            IngestError::MasterLog { path, source } => LogHarborError::Io(std::io::Error::new(
                source.kind(),
                format!("master log {path}: {source}"),
            )),
            IngestError::Config { field, reason } => {
                LogHarborError::Config(ConfigError::InvalidValue { field, reason })
            }
            IngestError::Regex(e) => LogHarborError::Config(ConfigError::InvalidValue {
                field: "hosts".to_owned(),
                reason: e.to_string(),
            }),
        }
    }
}
