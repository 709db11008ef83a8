//! 설정 관리 — logharbor.toml 파싱 및 런타임 설정
//!
//! [`LogHarborConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`LOGHARBOR_INGEST_BATCH_SIZE=200` 형식)
//! 3. 설정 파일 (`logharbor.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # fn example() -> Result<(), logharbor_core::error::LogHarborError> {
//! use logharbor_core::config::LogHarborConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = LogHarborConfig::load("logharbor.toml")?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = LogHarborConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, LogHarborError};
use crate::types::HostRegistry;

/// 배치 최대 크기
///
/// 행당 5개의 바인딩 파라미터를 사용하며, SQLite 기본 한도(999) 안에 들어가야 합니다.
pub const MAX_BATCH_SIZE: usize = 999 / 5;

/// logharbor 통합 설정
///
/// `logharbor.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogHarborConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 로그 데이터베이스 설정
    #[serde(default)]
    pub store: StoreConfig,
    /// 수집(인덱싱) 설정
    #[serde(default)]
    pub ingest: IngestSettings,
    /// 원격 로그 가져오기 설정
    #[serde(default)]
    pub pull: PullConfig,
    /// 원격 호스트 목록
    #[serde(default)]
    pub hosts: Vec<HostConfig>,
    /// 호스트 그룹 목록 (그룹별 감시 로그 파일)
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
}

impl LogHarborConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    /// 3. 유효성 검증
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LogHarborError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LogHarborError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LogHarborError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LogHarborError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LogHarborError> {
        toml::from_str(toml_str).map_err(|e| {
            LogHarborError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 설정된 호스트로 [`HostRegistry`]를 만듭니다 (선언 순서 유지).
    pub fn host_registry(&self) -> HostRegistry {
        self.hosts.iter().map(|h| h.host.clone()).collect()
    }

    /// 호스트 식별자로 호스트 설정을 찾습니다.
    pub fn host(&self, name: &str) -> Option<&HostConfig> {
        self.hosts.iter().find(|h| h.host == name)
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOGHARBOR_{SECTION}_{FIELD}`
    /// 예: `LOGHARBOR_STORE_PATH=/srv/logs/db.sqlite`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LOGHARBOR_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOGHARBOR_GENERAL_LOG_FORMAT");

        // Store
        override_string(&mut self.store.path, "LOGHARBOR_STORE_PATH");

        // Ingest
        override_string(
            &mut self.ingest.master_log,
            "LOGHARBOR_INGEST_MASTER_LOG",
        );
        override_usize(
            &mut self.ingest.batch_size,
            "LOGHARBOR_INGEST_BATCH_SIZE",
        );
        override_policy(
            &mut self.ingest.parse_failure,
            "LOGHARBOR_INGEST_PARSE_FAILURE",
        );
        override_policy(&mut self.ingest.conflict, "LOGHARBOR_INGEST_CONFLICT");

        // Pull
        override_string(&mut self.pull.output_dir, "LOGHARBOR_PULL_OUTPUT_DIR");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogHarborError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.store.path.trim().is_empty() {
            return Err(invalid("store.path", "must not be empty".to_owned()));
        }

        if self.ingest.master_log.trim().is_empty() {
            return Err(invalid("ingest.master_log", "must not be empty".to_owned()));
        }

        if self.ingest.batch_size == 0 || self.ingest.batch_size > MAX_BATCH_SIZE {
            return Err(invalid(
                "ingest.batch_size",
                format!("must be 1-{}", MAX_BATCH_SIZE),
            ));
        }

        // 호스트 검증
        let mut seen = HashSet::new();
        for host in &self.hosts {
            if host.host.trim().is_empty() {
                return Err(invalid("hosts.host", "must not be empty".to_owned()));
            }
            if host.port == 0 {
                return Err(invalid(
                    "hosts.port",
                    format!("host '{}' has port 0", host.host),
                ));
            }
            if !seen.insert(host.host.as_str()) {
                return Err(invalid(
                    "hosts.host",
                    format!("duplicate host '{}'", host.host),
                ));
            }
        }

        // 그룹 검증: 와일드카드 또는 알려진 호스트만 허용
        for group in &self.groups {
            match &group.hosts {
                GroupHosts::Wildcard(w) if w != WILDCARD => {
                    return Err(invalid(
                        "groups.hosts",
                        format!(
                            "group '{}': expected \"{}\" or a list of hosts, got \"{}\"",
                            group.name, WILDCARD, w
                        ),
                    ));
                }
                GroupHosts::Wildcard(_) => {}
                GroupHosts::List(names) => {
                    if let Some(unknown) = names.iter().find(|n| !seen.contains(n.as_str())) {
                        return Err(invalid(
                            "groups.hosts",
                            format!("group '{}' refers to unknown host '{}'", group.name, unknown),
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: String) -> LogHarborError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 로그 데이터베이스 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite 데이터베이스 파일 경로
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "database/database.sqlite".to_owned(),
        }
    }
}

/// 파싱 실패 시 배치 처리 정책
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseFailurePolicy {
    /// 조립 중인 배치 전체를 폐기하고 다음 배치로 진행 (기본값)
    #[default]
    DiscardBatch,
    /// 실패한 라인만 건너뛰고 배치는 유지
    SkipLine,
    /// 조립 중인 배치를 폐기하고 실행을 중단
    Halt,
}

impl ParseFailurePolicy {
    /// 설정 파일/CLI에서 사용하는 이름을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DiscardBatch => "discard_batch",
            Self::SkipLine => "skip_line",
            Self::Halt => "halt",
        }
    }
}

impl std::str::FromStr for ParseFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "discard_batch" => Ok(Self::DiscardBatch),
            "skip_line" => Ok(Self::SkipLine),
            "halt" => Ok(Self::Halt),
            other => Err(format!(
                "unknown parse failure policy '{other}' (expected: discard_batch, skip_line, halt)"
            )),
        }
    }
}

/// 중복 해시 충돌 처리 정책
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// 삽입 시 충돌 행만 무시하고 나머지를 커밋 (기본값)
    #[default]
    Ignore,
    /// 삽입 전에 저장소를 조회해 이미 있는 해시를 제거
    PreFilter,
}

impl ConflictPolicy {
    /// 설정 파일/CLI에서 사용하는 이름을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ignore => "ignore",
            Self::PreFilter => "pre_filter",
        }
    }
}

impl std::str::FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ignore" => Ok(Self::Ignore),
            "pre_filter" => Ok(Self::PreFilter),
            other => Err(format!(
                "unknown conflict policy '{other}' (expected: ignore, pre_filter)"
            )),
        }
    }
}

/// 수집(인덱싱) 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    /// 마스터 로그 파일 경로
    pub master_log: String,
    /// 배치 크기 (이 개수만큼 모이면 플러시)
    pub batch_size: usize,
    /// 파싱 실패 정책
    pub parse_failure: ParseFailurePolicy,
    /// 중복 해시 충돌 정책
    pub conflict: ConflictPolicy,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            master_log: "master.log".to_owned(),
            batch_size: 100,
            parse_failure: ParseFailurePolicy::default(),
            conflict: ConflictPolicy::default(),
        }
    }
}

/// 원격 로그 가져오기 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PullConfig {
    /// 로그 사본을 보관할 로컬 디렉토리
    pub output_dir: String,
}

impl Default for PullConfig {
    fn default() -> Self {
        Self {
            output_dir: "/home/logging/logs".to_owned(),
        }
    }
}

/// 원격 호스트 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    /// 호스트 식별자 (ssh/scp 대상 주소)
    pub host: String,
    /// SSH 포트
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    /// SSH 사용자
    pub user: String,
}

fn default_ssh_port() -> u16 {
    22
}

/// 모든 호스트를 의미하는 그룹 와일드카드
pub const WILDCARD: &str = "*";

/// 그룹의 호스트 지정 방식
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupHosts {
    /// `"*"`: 모든 호스트
    Wildcard(String),
    /// 호스트 식별자 목록
    List(Vec<String>),
}

impl GroupHosts {
    /// 와일드카드 여부를 확인합니다.
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard(w) if w == WILDCARD)
    }
}

/// 호스트 그룹 설정
///
/// 같은 이름의 그룹이 여러 번 선언되면 호스트와 로그 목록이 병합됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    /// 그룹 이름
    pub name: String,
    /// 대상 호스트
    pub hosts: GroupHosts,
    /// 감시할 원격 로그 파일 경로
    #[serde(default)]
    pub logs: Vec<String>,
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_policy<T>(target: &mut T, env_key: &str)
where
    T: std::str::FromStr<Err = String>,
{
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(reason) => warn!(
                env_key,
                value = val.as_str(),
                reason = reason.as_str(),
                "failed to parse policy from env var, ignoring"
            ),
        }
    }
}
