//! 에러 타입 — 도메인별 에러 정의

/// logharbor 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum LogHarborError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 라인 파싱 에러
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// 스토리지 에러
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 마스터 로그 라인 파싱 에러
///
/// `line`은 마스터 로그 내 1부터 시작하는 라인 번호입니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// `:` 구분자가 없음
    #[error("line {line}: missing ':' delimiter between preamble and message")]
    MissingDelimiter { line: u64 },

    /// 프리앰블에서 알려진 호스트를 찾지 못함
    #[error("line {line}: no known host in preamble '{preamble}'")]
    UnknownHost { line: u64, preamble: String },
}

impl ParseError {
    /// 실패한 라인 번호를 반환합니다.
    pub fn line(&self) -> u64 {
        match self {
            Self::MissingDelimiter { line } | Self::UnknownHost { line, .. } => *line,
        }
    }
}

/// 스토리지 에러
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// 스토리지 파일을 생성하거나 열 수 없음
    #[error("unable to open store {path}: {reason}")]
    Open { path: String, reason: String },

    /// 스토리지 파일에 쓸 수 없음
    #[error("unable to write to store {path}")]
    NotWritable { path: String },

    /// 스키마 확인/생성 실패
    #[error("schema error: {0}")]
    Schema(String),

    /// 유일성 제약 위반 (중복 해시)
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// 쿼리 실패
    #[error("query failed: {0}")]
    Query(String),
}

impl StorageError {
    /// 배치 범위에서 처리 가능한 에러인지 확인합니다.
    ///
    /// 제약 위반만 배치 단위로 격리되며, 나머지는 실행 전체를 중단시킵니다.
    pub fn is_batch_local(&self) -> bool {
        matches!(self, Self::Constraint(_))
    }
}
