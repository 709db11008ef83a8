//! 배치 내 중복 제거
//!
//! [`Batch`]는 콘텐츠 해시를 키로 하는 맵입니다. 같은 해시가 다시 들어오면
//! 나중 것이 앞의 것을 덮어씁니다 (원시 바이트가 같으므로 값도 같습니다).
//!
//! 실행 간 중복은 여기서 걸러내지 않습니다. 저장소의 해시 유일성 제약이
//! 최종 기준이며, `pre_filter` 정책에서만 [`Batch::retain_absent`]로
//! 이미 저장된 해시를 미리 제거합니다.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDateTime;

use logharbor_core::types::{ContentHash, LogRecord};

use crate::parser::ParsedLine;

/// 저장 대기 중인 레코드 (`created_at`은 플러시 시점에 채워짐)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRecord {
    pub hash: ContentHash,
    pub host: String,
    pub file: String,
    pub message: String,
}

impl PendingRecord {
    pub fn new(hash: ContentHash, parsed: ParsedLine) -> Self {
        Self {
            hash,
            host: parsed.host,
            file: parsed.file,
            message: parsed.message,
        }
    }

    /// 저장 시각을 붙여 [`LogRecord`]로 변환합니다.
    pub fn into_record(self, created_at: NaiveDateTime) -> LogRecord {
        LogRecord {
            hash: self.hash,
            host: self.host,
            file: self.file,
            message: self.message,
            created_at,
        }
    }
}

/// 조립 중인 배치
///
/// 파싱에 실패한 라인의 해시는 `rejected`에 기록됩니다. 하나라도 있으면
/// 배치가 오염(poisoned)된 것으로 보고, 크기 계산에는 함께 포함됩니다.
#[derive(Debug)]
pub struct Batch {
    records: HashMap<ContentHash, PendingRecord>,
    rejected: HashSet<ContentHash>,
    capacity: usize,
}

impl Batch {
    /// 최대 크기 `capacity`의 빈 배치를 생성합니다.
    pub fn new(capacity: usize) -> Self {
        Self {
            records: HashMap::with_capacity(capacity),
            rejected: HashSet::new(),
            capacity,
        }
    }

    /// 레코드를 추가합니다. 같은 해시가 이미 있었으면 `false`를 반환합니다.
    pub fn push(&mut self, record: PendingRecord) -> bool {
        self.records.insert(record.hash, record).is_none()
    }

    /// 파싱에 실패한 라인을 기록합니다. 같은 해시가 이미 있었으면 `false`를 반환합니다.
    pub fn reject(&mut self, hash: ContentHash) -> bool {
        self.rejected.insert(hash)
    }

    /// 파싱 실패 라인이 섞여 있는지 확인합니다.
    pub fn is_poisoned(&self) -> bool {
        !self.rejected.is_empty()
    }

    /// 서로 다른 해시의 수 (파싱 실패 라인 포함)
    pub fn len(&self) -> usize {
        self.records.len() + self.rejected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 배치에 담긴 레코드의 해시 목록
    pub fn hashes(&self) -> Vec<ContentHash> {
        self.records.keys().copied().collect()
    }

    /// `present`에 포함된 해시의 레코드를 제거하고, 제거된 수를 반환합니다.
    pub fn retain_absent(&mut self, present: &HashSet<ContentHash>) -> usize {
        let before = self.records.len();
        self.records.retain(|hash, _| !present.contains(hash));
        before - self.records.len()
    }

    /// 레코드를 모두 꺼내고 배치를 비웁니다. 해시 순으로 정렬됩니다.
    pub fn drain(&mut self) -> Vec<PendingRecord> {
        self.rejected.clear();
        let mut records: Vec<PendingRecord> = self.records.drain().map(|(_, r)| r).collect();
        records.sort_by(|a, b| a.hash.cmp(&b.hash));
        records
    }

    /// 배치를 비우고 버려진 항목 수를 반환합니다.
    pub fn clear(&mut self) -> usize {
        let dropped = self.len();
        self.records.clear();
        self.rejected.clear();
        dropped
    }
}
