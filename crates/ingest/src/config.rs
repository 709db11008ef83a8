//! 수집 엔진 설정
//!
//! [`IngestConfig`]는 core의 [`IngestSettings`]를 기반으로
//! 엔진이 실행 중에 사용하는 값을 담습니다.
//!
//! # 사용 예시
//! ```ignore
//! use logharbor_core::config::LogHarborConfig;
//! use logharbor_ingest::config::IngestConfig;
//!
//! let core_config = LogHarborConfig::default();
//! let config = IngestConfig::from_core(&core_config.ingest);
//! ```

use serde::{Deserialize, Serialize};

use logharbor_core::config::{ConflictPolicy, IngestSettings, MAX_BATCH_SIZE, ParseFailurePolicy};

use crate::error::IngestError;

/// 수집 엔진 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// 마스터 로그 파일 경로
    pub master_log: String,
    /// 배치 최대 크기
    pub batch_size: usize,
    /// 파싱 실패 정책
    pub parse_failure: ParseFailurePolicy,
    /// 중복 해시 충돌 정책
    pub conflict: ConflictPolicy,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self::from_core(&IngestSettings::default())
    }
}

impl IngestConfig {
    /// core의 `IngestSettings`에서 엔진 설정을 생성합니다.
    pub fn from_core(core: &IngestSettings) -> Self {
        Self {
            master_log: core.master_log.clone(),
            batch_size: core.batch_size,
            parse_failure: core.parse_failure,
            conflict: core.conflict,
        }
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(IngestError::Config {
                field: "batch_size".to_owned(),
                reason: format!("must be 1-{}", MAX_BATCH_SIZE),
            });
        }

        if self.master_log.trim().is_empty() {
            return Err(IngestError::Config {
                field: "master_log".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        Ok(())
    }
}

/// 수집 엔진 설정 빌더
#[derive(Default)]
pub struct IngestConfigBuilder {
    config: IngestConfig,
}

impl IngestConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 마스터 로그 경로를 설정합니다.
    pub fn master_log(mut self, path: impl Into<String>) -> Self {
        self.config.master_log = path.into();
        self
    }

    /// 배치 크기를 설정합니다.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    /// 파싱 실패 정책을 설정합니다.
    pub fn parse_failure(mut self, policy: ParseFailurePolicy) -> Self {
        self.config.parse_failure = policy;
        self
    }

    /// 충돌 정책을 설정합니다.
    pub fn conflict(mut self, policy: ConflictPolicy) -> Self {
        self.config.conflict = policy;
        self
    }

    /// 설정을 검증하고 `IngestConfig`를 생성합니다.
    pub fn build(self) -> Result<IngestConfig, IngestError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
