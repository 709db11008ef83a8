//! 도메인 타입 — 시스템 전역에서 사용되는 공통 타입
//!
//! 수집 엔진, 원격 스크립트 생성기, CLI가 공유하는 데이터 구조를 정의합니다.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha1::{Digest, Sha1};

/// `created_at` 컬럼의 저장 형식 (UTC, 초 단위)
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 호스트 레지스트리
///
/// 설정에서 읽은 호스트 식별자의 순서 있는 집합입니다.
/// 한 번 생성되면 실행 동안 변경되지 않으며, 라인 파싱에만 사용됩니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostRegistry {
    hosts: Vec<String>,
}

impl HostRegistry {
    /// 호스트 식별자 목록으로 레지스트리를 생성합니다.
    ///
    /// 빈 식별자는 무시하고, 중복은 첫 번째 등장 위치를 유지합니다.
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self::default();
        for host in hosts {
            let host = host.into();
            if !host.is_empty() && !registry.contains(&host) {
                registry.hosts.push(host);
            }
        }
        registry
    }

    /// 등록 순서대로 호스트 식별자를 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.hosts.iter().map(String::as_str)
    }

    /// 호스트가 등록되어 있는지 확인합니다.
    pub fn contains(&self, host: &str) -> bool {
        self.hosts.iter().any(|h| h == host)
    }

    /// 등록된 호스트 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// 레지스트리가 비어있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for HostRegistry {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// 원시 라인의 콘텐츠 해시 (SHA-1, 160비트)
///
/// 줄바꿈 문자를 포함한 원시 바이트 전체에 대한 다이제스트입니다.
/// 동일한 바이트열은 항상 동일한 해시를 가지며, 중복 제거 키로 사용됩니다.
/// 텍스트 표현은 소문자 16진수 40자입니다.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; 20]);

impl ContentHash {
    /// 원시 바이트의 해시를 계산합니다.
    pub fn digest(raw: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(raw);
        Self(hasher.finalize().into())
    }

    /// 해시 바이트를 반환합니다.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// 소문자 16진수 문자열로 변환합니다.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

/// 16진수 해시 문자열 파싱 실패
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid content hash '{0}': expected 40 hex characters")]
pub struct InvalidContentHash(pub String);

impl FromStr for ContentHash {
    type Err = InvalidContentHash;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| InvalidContentHash(s.to_owned()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// 영속화된 로그 레코드
///
/// `hash`가 자연 키이며, 저장 후에는 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// 원시 라인의 콘텐츠 해시 (유일)
    pub hash: ContentHash,
    /// 원본 호스트
    pub host: String,
    /// 호스트 수집 루트 기준 원본 파일 경로
    pub file: String,
    /// 메시지 본문 (줄바꿈 제외)
    pub message: String,
    /// 저장 시각 (UTC)
    pub created_at: NaiveDateTime,
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}:{}", self.host, self.file, self.message)
    }
}

/// 배치 삽입 시 유일성 충돌 처리 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnConflict {
    /// 충돌한 행만 건너뛰고 나머지는 커밋
    Ignore,
    /// 충돌 시 배치 전체를 실패 처리
    Fail,
}

/// 배치 삽입 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InsertOutcome {
    /// 제출된 행 수
    pub submitted: usize,
    /// 실제로 저장된 행 수
    pub inserted: usize,
}

impl InsertOutcome {
    /// 이미 저장되어 있어 건너뛴 행 수를 반환합니다.
    pub fn skipped(&self) -> usize {
        self.submitted.saturating_sub(self.inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_keeps_order_and_drops_duplicates() {
        let registry = HostRegistry::new(["web02", "web01", "web02", "", "db01"]);
        let hosts: Vec<&str> = registry.iter().collect();
        assert_eq!(hosts, vec!["web02", "web01", "db01"]);
        assert_eq!(registry.len(), 3);
        assert!(registry.contains("db01"));
        assert!(!registry.contains("db02"));
    }

    #[test]
    fn empty_registry() {
        let registry: HostRegistry = Vec::<String>::new().into_iter().collect();
        assert!(registry.is_empty());
    }

    #[test]
    fn content_hash_matches_sha1_hex() {
        // sha1("abc")
        let hash = ContentHash::digest(b"abc");
        assert_eq!(hash.to_hex(), "a9993e364706816aba3e25717850c26c9cd0d89d");
        assert_eq!(hash.to_string(), hash.to_hex());
    }

    #[test]
    fn content_hash_includes_line_terminator() {
        let with_newline = ContentHash::digest(b"./web01/app.log:ok\n");
        let without_newline = ContentHash::digest(b"./web01/app.log:ok");
        assert_ne!(with_newline, without_newline);
        assert_eq!(with_newline, ContentHash::digest(b"./web01/app.log:ok\n"));
    }

    #[test]
    fn content_hash_parses_from_hex() {
        let hash = ContentHash::digest(b"line\n");
        let parsed: ContentHash = hash.to_hex().parse().unwrap();
        assert_eq!(parsed, hash);

        assert!("not-hex".parse::<ContentHash>().is_err());
        assert!("abcd".parse::<ContentHash>().is_err());
    }

    #[test]
    fn content_hash_serializes_as_hex_string() {
        let hash = ContentHash::digest(b"abc");
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, "\"a9993e364706816aba3e25717850c26c9cd0d89d\"");
        let back: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }

    #[test]
    fn insert_outcome_skipped() {
        let outcome = InsertOutcome {
            submitted: 10,
            inserted: 7,
        };
        assert_eq!(outcome.skipped(), 3);
        assert_eq!(InsertOutcome::default().skipped(), 0);
    }
}
