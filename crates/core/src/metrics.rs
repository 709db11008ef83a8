//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::histogram!()`
//! 매크로를 호출합니다. 레코더가 설치되지 않으면 호출은 아무 일도 하지 않습니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `logharbor_`
//! - 모듈명: `ingest_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency)
//!
//! # 사용 예시
//!
//! ```ignore
//! use logharbor_core::metrics;
//! use metrics::counter;
//!
//! counter!(logharbor_core::metrics::INGEST_LINES_READ_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 충돌 정책 레이블 키 (ignore, pre_filter)
pub const LABEL_CONFLICT_POLICY: &str = "conflict_policy";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

// ─── Ingest 메트릭 ──────────────────────────────────────────────────

/// Ingest: 마스터 로그에서 읽은 라인 수 (counter)
pub const INGEST_LINES_READ_TOTAL: &str = "logharbor_ingest_lines_read_total";

/// Ingest: 저장소에 제출된 레코드 수 (counter)
pub const INGEST_RECORDS_SUBMITTED_TOTAL: &str = "logharbor_ingest_records_submitted_total";

/// Ingest: 실제로 저장된 레코드 수 (counter)
pub const INGEST_RECORDS_INSERTED_TOTAL: &str = "logharbor_ingest_records_inserted_total";

/// Ingest: 배치 내 중복으로 병합된 라인 수 (counter)
pub const INGEST_BATCH_DUPLICATES_TOTAL: &str = "logharbor_ingest_batch_duplicates_total";

/// Ingest: 이미 저장되어 있어 건너뛴 레코드 수 (counter)
pub const INGEST_STORE_DUPLICATES_TOTAL: &str = "logharbor_ingest_store_duplicates_total";

/// Ingest: 파싱 에러 수 (counter)
pub const INGEST_PARSE_ERRORS_TOTAL: &str = "logharbor_ingest_parse_errors_total";

/// Ingest: 플러시된 배치 수 (counter, label: result)
pub const INGEST_BATCHES_FLUSHED_TOTAL: &str = "logharbor_ingest_batches_flushed_total";

/// Ingest: 파싱 실패로 폐기된 배치 수 (counter)
pub const INGEST_BATCHES_DISCARDED_TOTAL: &str = "logharbor_ingest_batches_discarded_total";

/// Ingest: 배치 플러시 소요 시간 (histogram, 초)
pub const INGEST_FLUSH_DURATION_SECONDS: &str = "logharbor_ingest_flush_duration_seconds";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 배치 플러시 소요 시간 히스토그램 버킷 (초)
///
/// 100us ~ 10s 범위, 로그 단위 분포
pub const FLUSH_DURATION_BUCKETS: [f64; 10] = [
    0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 10.0,
];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(
        INGEST_LINES_READ_TOTAL,
        "Total number of raw lines read from the master log"
    );
    describe_counter!(
        INGEST_RECORDS_SUBMITTED_TOTAL,
        "Total number of log records submitted to the store"
    );
    describe_counter!(
        INGEST_RECORDS_INSERTED_TOTAL,
        "Total number of log records newly persisted"
    );
    describe_counter!(
        INGEST_BATCH_DUPLICATES_TOTAL,
        "Total number of content-identical lines collapsed within a batch"
    );
    describe_counter!(
        INGEST_STORE_DUPLICATES_TOTAL,
        "Total number of records skipped because their hash was already stored"
    );
    describe_counter!(
        INGEST_PARSE_ERRORS_TOTAL,
        "Total number of master log lines that failed to parse"
    );
    describe_counter!(
        INGEST_BATCHES_FLUSHED_TOTAL,
        "Total number of batch flushes by result"
    );
    describe_counter!(
        INGEST_BATCHES_DISCARDED_TOTAL,
        "Total number of batches discarded because of a parse failure"
    );
    describe_histogram!(
        INGEST_FLUSH_DURATION_SECONDS,
        "Time to write a single batch to the store in seconds"
    );
}
