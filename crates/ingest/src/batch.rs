//! 배치 삽입기 -- 배치가 가득 차면 저장소에 한 번의 쓰기로 플러시합니다.
//!
//! 스트림이 끝나면 [`BatchInserter::finish`]로 남은 부분 배치를 플러시합니다.
//! 플러시는 배치 단위로 원자적이며 재시도하지 않습니다. 실패한 배치는
//! 이전에 커밋된 배치에 영향을 주지 않습니다.
//!
//! # 충돌 정책
//! - [`ConflictPolicy::Ignore`]: `INSERT OR IGNORE`로 충돌 행만 건너뜁니다.
//! - [`ConflictPolicy::PreFilter`]: 저장소를 먼저 조회해 이미 있는 해시를 제거한 뒤
//!   엄격한 `INSERT`를 수행합니다. 그래도 충돌이 나면 해당 배치만 실패합니다.

use std::time::Instant;

use chrono::{NaiveDateTime, SubsecRound, Utc};

use logharbor_core::config::ConflictPolicy;
use logharbor_core::error::StorageError;
use logharbor_core::metrics as m;
use logharbor_core::pipeline::RecordStore;
use logharbor_core::types::{ContentHash, LogRecord, OnConflict};

use crate::dedup::{Batch, PendingRecord};

/// 한 번의 플러시 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    /// 배치가 커밋됨
    Committed {
        /// 배치의 서로 다른 레코드 수
        submitted: usize,
        /// 새로 저장된 레코드 수
        inserted: usize,
    },
    /// 모든 레코드가 이미 저장되어 있어 쓰기를 건너뜀 (`pre_filter`)
    AlreadyStored {
        /// 배치의 서로 다른 레코드 수
        submitted: usize,
    },
    /// 파싱 실패 라인이 섞여 있어 쓰기 없이 폐기됨
    Discarded {
        /// 폐기된 항목 수 (파싱 실패 라인 포함)
        entries: usize,
    },
    /// 유일성 제약 위반으로 배치 전체가 롤백됨
    Failed {
        /// 배치의 레코드 수
        submitted: usize,
        /// 실패 사유
        reason: String,
    },
}

impl FlushOutcome {
    /// 이미 저장되어 있어 건너뛴 레코드 수
    pub fn store_duplicates(&self) -> usize {
        match self {
            Self::Committed {
                submitted,
                inserted,
            } => submitted.saturating_sub(*inserted),
            Self::AlreadyStored { submitted } => *submitted,
            Self::Discarded { .. } | Self::Failed { .. } => 0,
        }
    }
}

/// 배치 삽입기
///
/// 저장소를 가변으로 빌려 한 번의 실행 동안 사용합니다.
pub struct BatchInserter<'s, S: RecordStore + ?Sized> {
    store: &'s mut S,
    conflict: ConflictPolicy,
    batch: Batch,
    duplicates: u64,
    flushes: u64,
}

impl<'s, S: RecordStore + ?Sized> BatchInserter<'s, S> {
    /// 배치 크기 `batch_size`로 삽입기를 생성합니다.
    pub fn new(store: &'s mut S, batch_size: usize, conflict: ConflictPolicy) -> Self {
        Self {
            store,
            conflict,
            batch: Batch::new(batch_size.max(1)),
            duplicates: 0,
            flushes: 0,
        }
    }

    /// 레코드를 배치에 추가하고, 배치가 가득 차면 플러시합니다.
    pub fn push(&mut self, record: PendingRecord) -> Result<Option<FlushOutcome>, StorageError> {
        if !self.batch.push(record) {
            self.note_duplicate();
        }
        self.flush_if_full()
    }

    /// 파싱에 실패한 라인을 배치에 기록합니다 (배치 오염).
    ///
    /// 오염된 배치는 크기 경계까지 계속 채워진 뒤 쓰기 없이 폐기됩니다.
    pub fn reject(&mut self, hash: ContentHash) -> Result<Option<FlushOutcome>, StorageError> {
        if !self.batch.reject(hash) {
            self.note_duplicate();
        }
        self.flush_if_full()
    }

    /// 남은 부분 배치를 플러시합니다. 비어 있으면 `None`을 반환합니다.
    pub fn finish(&mut self) -> Result<Option<FlushOutcome>, StorageError> {
        if self.batch.is_empty() {
            return Ok(None);
        }
        self.flush().map(Some)
    }

    /// 조립 중인 배치를 쓰기 없이 버립니다. 버려진 항목 수를 반환합니다.
    pub fn discard(&mut self) -> usize {
        let entries = self.batch.clear();
        if entries > 0 {
            metrics::counter!(m::INGEST_BATCHES_DISCARDED_TOTAL).increment(1);
            tracing::warn!(entries, "discarded in-progress batch");
        }
        entries
    }

    /// 배치 내에서 병합된 중복 라인 수
    pub fn duplicates(&self) -> u64 {
        self.duplicates
    }

    /// 저장소에 쓰기를 시도한 플러시 횟수 (폐기된 배치 제외)
    pub fn flushes(&self) -> u64 {
        self.flushes
    }

    /// 현재 배치의 항목 수
    pub fn pending(&self) -> usize {
        self.batch.len()
    }

    fn note_duplicate(&mut self) {
        self.duplicates += 1;
        metrics::counter!(m::INGEST_BATCH_DUPLICATES_TOTAL).increment(1);
    }

    fn flush_if_full(&mut self) -> Result<Option<FlushOutcome>, StorageError> {
        if self.batch.is_full() {
            self.flush().map(Some)
        } else {
            Ok(None)
        }
    }

    fn flush(&mut self) -> Result<FlushOutcome, StorageError> {
        if self.batch.is_poisoned() {
            let entries = self.discard();
            return Ok(FlushOutcome::Discarded { entries });
        }

        let mut prefiltered = 0;
        if self.conflict == ConflictPolicy::PreFilter {
            let present = self.store.query_by_hash(&self.batch.hashes())?;
            prefiltered = self.batch.retain_absent(&present);
        }

        let pending = self.batch.drain();
        let submitted = pending.len() + prefiltered;
        if pending.is_empty() {
            tracing::debug!(submitted, prefiltered, "batch already stored");
            metrics::counter!(m::INGEST_STORE_DUPLICATES_TOTAL).increment(prefiltered as u64);
            return Ok(FlushOutcome::AlreadyStored { submitted });
        }

        let created_at = now();
        let records: Vec<LogRecord> = pending
            .into_iter()
            .map(|p| p.into_record(created_at))
            .collect();
        let on_conflict = match self.conflict {
            ConflictPolicy::Ignore => OnConflict::Ignore,
            ConflictPolicy::PreFilter => OnConflict::Fail,
        };

        let started = Instant::now();
        let result = self.store.insert_batch(&records, on_conflict);
        self.flushes += 1;
        metrics::histogram!(m::INGEST_FLUSH_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        metrics::counter!(m::INGEST_RECORDS_SUBMITTED_TOTAL).increment(submitted as u64);

        match result {
            Ok(outcome) => {
                let inserted = outcome.inserted;
                let skipped = submitted.saturating_sub(inserted);
                metrics::counter!(m::INGEST_BATCHES_FLUSHED_TOTAL, m::LABEL_RESULT => "success")
                    .increment(1);
                metrics::counter!(m::INGEST_RECORDS_INSERTED_TOTAL).increment(inserted as u64);
                metrics::counter!(m::INGEST_STORE_DUPLICATES_TOTAL).increment(skipped as u64);
                tracing::debug!(
                    submitted,
                    inserted,
                    skipped,
                    conflict_policy = self.conflict.as_str(),
                    "batch flushed"
                );
                Ok(FlushOutcome::Committed {
                    submitted,
                    inserted,
                })
            }
            Err(e) if e.is_batch_local() => {
                metrics::counter!(m::INGEST_BATCHES_FLUSHED_TOTAL, m::LABEL_RESULT => "failure")
                    .increment(1);
                tracing::warn!(submitted, error = %e, "batch rejected by store, continuing");
                Ok(FlushOutcome::Failed {
                    submitted,
                    reason: e.to_string(),
                })
            }
            Err(e) => {
                metrics::counter!(m::INGEST_BATCHES_FLUSHED_TOTAL, m::LABEL_RESULT => "failure")
                    .increment(1);
                Err(e)
            }
        }
    }
}

/// 현재 UTC 시각 (초 단위 절삭)
fn now() -> NaiveDateTime {
    Utc::now().naive_utc().trunc_subsecs(0)
}
