//! 파이프라인 trait — 모듈 확장 포인트 정의

use std::collections::HashSet;

use crate::error::StorageError;
use crate::types::{ContentHash, InsertOutcome, LogRecord, OnConflict};

/// 로그 레코드 저장소 trait
///
/// 배치 단위 삽입과 해시 존재 여부 조회를 제공합니다.
/// 해시 유일성은 저장소 계층에서 강제되어야 하며, 실행 간 중복 제거의
/// 최종 기준이 됩니다.
pub trait RecordStore {
    /// 레코드 묶음을 하나의 원자적 쓰기로 저장합니다.
    ///
    /// `OnConflict::Ignore`이면 이미 존재하는 해시의 행만 건너뛰고 나머지를 커밋합니다.
    /// `OnConflict::Fail`이면 충돌 시 아무 행도 저장하지 않고
    /// [`StorageError::Constraint`]를 반환합니다.
    fn insert_batch(
        &mut self,
        records: &[LogRecord],
        on_conflict: OnConflict,
    ) -> Result<InsertOutcome, StorageError>;

    /// 주어진 해시 중 이미 저장된 것들을 반환합니다.
    fn query_by_hash(&self, hashes: &[ContentHash]) -> Result<HashSet<ContentHash>, StorageError>;
}

/// 진행률 보고 trait
///
/// 값이 바뀔 때만 `report`가 호출되며, 마지막에 `complete`가 한 번 호출됩니다.
pub trait ProgressReporter {
    /// 두 번째 패스를 시작하기 전에 전체 라인 수와 함께 호출됩니다.
    fn begin(&mut self, _total_lines: u64) {}

    /// 진행률(0~99)이 바뀌었을 때 호출됩니다.
    fn report(&mut self, percent: u8);

    /// 스트림 처리가 끝났을 때 호출됩니다 (100%).
    fn complete(&mut self);
}
