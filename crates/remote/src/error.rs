//! 원격 수집 에러 타입
//!
//! `From<RemoteError> for LogHarborError` 구현으로 CLI에서 설정 에러로 보고됩니다.

use logharbor_core::error::{ConfigError, LogHarborError};

/// 원격 수집 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// 설정에 없는 호스트를 지정함
    #[error("unknown host '{host}'")]
    UnknownHost {
        /// 지정한 호스트 이름
        host: String,
    },

    /// 그룹이 설정에 없는 호스트를 참조함
    #[error("group '{group}' refers to unknown host '{host}'")]
    UnknownGroupHost {
        /// 그룹 이름
        group: String,
        /// 참조된 호스트 이름
        host: String,
    },

    /// 출력 디렉토리에 쓸 수 없음
    #[error("unable to write to output directory {path}: {reason}")]
    OutputDir {
        /// 출력 디렉토리 경로
        path: String,
        /// 실패 사유
        reason: String,
    },
}

impl From<RemoteError> for LogHarborError {
    fn from(err: RemoteError) -> Self {
        let field = match &err {
            RemoteError::UnknownHost { .. } => "hosts",
            RemoteError::UnknownGroupHost { .. } => "groups.hosts",
            RemoteError::OutputDir { .. } => "pull.output_dir",
        };
        LogHarborError::Config(ConfigError::InvalidValue {
            field: field.to_owned(),
            reason: err.to_string(),
        })
    }
}
