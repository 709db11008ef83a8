//! 수집 엔진 오케스트레이션 -- 리더/파서/중복 제거/배치 삽입의 전체 흐름을 관리합니다.
//!
//! # 내부 흐름
//! ```text
//! MasterLogReader -> LineParser -> Batch (dedup) -> BatchInserter -> RecordStore
//! ```
//!
//! 단일 스레드에서 순차적으로 실행되며, 저장소와 호스트 레지스트리는
//! 호출자가 만들어 [`IngestEngineBuilder`]로 명시적으로 넘깁니다.

use std::path::Path;

use serde::Serialize;

use logharbor_core::config::ParseFailurePolicy;
use logharbor_core::metrics as m;
use logharbor_core::pipeline::{ProgressReporter, RecordStore};
use logharbor_core::types::HostRegistry;

use crate::batch::{BatchInserter, FlushOutcome};
use crate::config::IngestConfig;
use crate::dedup::PendingRecord;
use crate::error::IngestError;
use crate::parser::LineParser;
use crate::progress::ProgressTracker;
use crate::reader::MasterLogReader;

/// 한 번의 수집 실행 결과
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// 마스터 로그 경로
    pub master_log: String,
    /// 읽은 라인 수
    pub lines_read: u64,
    /// 플러시된 배치의 서로 다른 레코드 수
    pub records_submitted: u64,
    /// 새로 저장된 레코드 수
    pub records_inserted: u64,
    /// 배치 내에서 병합된 중복 라인 수
    pub batch_duplicates: u64,
    /// 이미 저장되어 있어 건너뛴 레코드 수
    pub store_duplicates: u64,
    /// 파싱에 실패한 라인 수
    pub parse_failures: u64,
    /// 저장소에 커밋된 배치 수 (모두 이미 저장되어 쓰기를 건너뛴 배치 제외)
    pub batches_flushed: u64,
    /// 파싱 실패로 폐기된 배치 수
    pub batches_discarded: u64,
    /// 유일성 제약 위반으로 롤백된 배치 수
    pub batches_failed: u64,
}

impl IngestReport {
    fn absorb(&mut self, outcome: FlushOutcome) {
        match outcome {
            FlushOutcome::Committed {
                submitted,
                inserted,
            } => {
                self.batches_flushed += 1;
                self.records_submitted += submitted as u64;
                self.records_inserted += inserted as u64;
                self.store_duplicates += submitted.saturating_sub(inserted) as u64;
            }
            FlushOutcome::AlreadyStored { submitted } => {
                self.records_submitted += submitted as u64;
                self.store_duplicates += submitted as u64;
            }
            FlushOutcome::Discarded { .. } => self.batches_discarded += 1,
            FlushOutcome::Failed { submitted, .. } => {
                self.batches_failed += 1;
                self.records_submitted += submitted as u64;
            }
        }
    }
}

/// 수집 엔진
///
/// 저장소 핸들과 호스트 레지스트리를 소유합니다.
///
/// # 사용 예시
/// ```ignore
/// use logharbor_ingest::{IngestEngineBuilder, NoProgress, SqliteStore};
///
/// let mut engine = IngestEngineBuilder::new()
///     .config(config)
///     .registry(registry)
///     .store(SqliteStore::open("database/database.sqlite")?)
///     .build()?;
///
/// let report = engine.run(&mut NoProgress)?;
/// ```
pub struct IngestEngine<S: RecordStore> {
    config: IngestConfig,
    registry: HostRegistry,
    parser: LineParser,
    store: S,
}

impl<S: RecordStore> IngestEngine<S> {
    /// 설정된 마스터 로그를 수집합니다.
    pub fn run(&mut self, progress: &mut dyn ProgressReporter) -> Result<IngestReport, IngestError> {
        let path = self.config.master_log.clone();
        self.ingest_file(path, progress)
    }

    /// 지정한 마스터 로그 파일을 수집합니다.
    ///
    /// - 마스터 로그를 열 수 없으면 즉시 실패합니다.
    /// - 파싱 실패는 [`ParseFailurePolicy`]에 따라 처리합니다.
    /// - 유일성 제약 위반은 해당 배치만 실패시키고 계속 진행합니다.
    /// - 그 밖의 저장소 에러는 실행을 중단시킵니다. 이미 커밋된 배치는 유지됩니다.
    pub fn ingest_file(
        &mut self,
        path: impl AsRef<Path>,
        progress: &mut dyn ProgressReporter,
    ) -> Result<IngestReport, IngestError> {
        let reader = MasterLogReader::open(path.as_ref())?;
        let total = reader.total_lines();
        let policy = self.config.parse_failure;

        tracing::info!(
            path = %reader.path().display(),
            total_lines = total,
            batch_size = self.config.batch_size,
            parse_failure = policy.as_str(),
            conflict = self.config.conflict.as_str(),
            "ingesting master log"
        );

        let mut report = IngestReport {
            master_log: reader.path().display().to_string(),
            ..IngestReport::default()
        };
        let mut tracker = ProgressTracker::new(total);
        progress.begin(total);

        let parser = &self.parser;
        let mut inserter =
            BatchInserter::new(&mut self.store, self.config.batch_size, self.config.conflict);

        for line in reader.lines()? {
            let line = line?;
            if let Some(percent) = tracker.advance(line.index()) {
                progress.report(percent);
            }
            report.lines_read += 1;
            metrics::counter!(m::INGEST_LINES_READ_TOTAL).increment(1);

            let hash = line.hash();
            let flushed = match parser.parse(&line) {
                Ok(parsed) => inserter.push(PendingRecord::new(hash, parsed))?,
                Err(err) => {
                    report.parse_failures += 1;
                    metrics::counter!(m::INGEST_PARSE_ERRORS_TOTAL).increment(1);
                    match policy {
                        ParseFailurePolicy::SkipLine => {
                            tracing::warn!(error = %err, "skipping unparseable line");
                            None
                        }
                        ParseFailurePolicy::DiscardBatch => {
                            tracing::warn!(error = %err, "unparseable line, batch will be discarded");
                            inserter.reject(hash)?
                        }
                        ParseFailurePolicy::Halt => {
                            inserter.discard();
                            tracing::error!(error = %err, "unparseable line, halting");
                            return Err(err.into());
                        }
                    }
                }
            };
            if let Some(outcome) = flushed {
                report.absorb(outcome);
            }
        }

        if let Some(outcome) = inserter.finish()? {
            report.absorb(outcome);
        }
        report.batch_duplicates = inserter.duplicates();
        progress.complete();

        tracing::info!(
            lines_read = report.lines_read,
            inserted = report.records_inserted,
            store_duplicates = report.store_duplicates,
            parse_failures = report.parse_failures,
            batches_flushed = report.batches_flushed,
            batches_discarded = report.batches_discarded,
            batches_failed = report.batches_failed,
            "master log ingested"
        );
        Ok(report)
    }

    /// 엔진 설정
    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// 호스트 레지스트리
    pub fn registry(&self) -> &HostRegistry {
        &self.registry
    }

    /// 저장소에 대한 불변 참조
    pub fn store(&self) -> &S {
        &self.store
    }

    /// 엔진을 해체하고 저장소를 돌려받습니다.
    pub fn into_store(self) -> S {
        self.store
    }
}

/// 수집 엔진 빌더
pub struct IngestEngineBuilder<S> {
    config: IngestConfig,
    registry: HostRegistry,
    store: Option<S>,
}

impl<S: RecordStore> IngestEngineBuilder<S> {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: IngestConfig::default(),
            registry: HostRegistry::default(),
            store: None,
        }
    }

    /// 엔진 설정을 지정합니다.
    pub fn config(mut self, config: IngestConfig) -> Self {
        self.config = config;
        self
    }

    /// 호스트 레지스트리를 지정합니다.
    pub fn registry(mut self, registry: HostRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// 저장소를 지정합니다.
    pub fn store(mut self, store: S) -> Self {
        self.store = Some(store);
        self
    }

    /// 엔진을 빌드합니다.
    ///
    /// 설정이 유효하지 않거나, 레지스트리가 비어 있거나, 저장소가 없으면 실패합니다.
    pub fn build(self) -> Result<IngestEngine<S>, IngestError> {
        self.config.validate()?;
        let parser = LineParser::new(&self.registry)?;
        let store = self.store.ok_or_else(|| IngestError::Config {
            field: "store".to_owned(),
            reason: "no record store configured".to_owned(),
        })?;

        Ok(IngestEngine {
            config: self.config,
            registry: self.registry,
            parser,
            store,
        })
    }
}

impl<S: RecordStore> Default for IngestEngineBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;

    fn registry() -> HostRegistry {
        HostRegistry::new(["web01", "web02"])
    }

    #[test]
    fn builder_requires_store() {
        let result = IngestEngineBuilder::<SqliteStore>::new()
            .registry(registry())
            .build();
        assert!(matches!(result, Err(IngestError::Config { .. })));
    }

    #[test]
    fn builder_rejects_empty_registry() {
        let result = IngestEngineBuilder::new()
            .store(SqliteStore::open_in_memory().unwrap())
            .build();
        assert!(matches!(result, Err(IngestError::Config { .. })));
    }

    #[test]
    fn builder_rejects_invalid_config() {
        let config = IngestConfig {
            batch_size: 0,
            ..Default::default()
        };
        let result = IngestEngineBuilder::new()
            .config(config)
            .registry(registry())
            .store(SqliteStore::open_in_memory().unwrap())
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn engine_accessors() {
        let engine = IngestEngineBuilder::new()
            .registry(registry())
            .store(SqliteStore::open_in_memory().unwrap())
            .build()
            .unwrap();
        assert_eq!(engine.registry().len(), 2);
        assert_eq!(engine.config().batch_size, 100);
        assert_eq!(engine.store().count().unwrap(), 0);
    }

    #[test]
    fn missing_master_log_is_fatal() {
        let mut engine = IngestEngineBuilder::new()
            .registry(registry())
            .store(SqliteStore::open_in_memory().unwrap())
            .build()
            .unwrap();
        let err = engine
            .ingest_file("/nonexistent/master.log", &mut crate::progress::NoProgress)
            .unwrap_err();
        assert!(matches!(err, IngestError::MasterLog { .. }));
    }

    #[test]
    fn report_absorbs_outcomes() {
        let mut report = IngestReport::default();
        report.absorb(FlushOutcome::Committed {
            submitted: 5,
            inserted: 3,
        });
        report.absorb(FlushOutcome::Discarded { entries: 5 });
        report.absorb(FlushOutcome::Failed {
            submitted: 2,
            reason: "UNIQUE".to_owned(),
        });
        assert_eq!(report.batches_flushed, 1);
        assert_eq!(report.batches_discarded, 1);
        assert_eq!(report.batches_failed, 1);
        assert_eq!(report.records_submitted, 7);
        assert_eq!(report.records_inserted, 3);
        assert_eq!(report.store_duplicates, 2);
    }

    #[test]
    fn already_stored_batch_is_not_counted_as_flushed() {
        let mut report = IngestReport::default();
        report.absorb(FlushOutcome::AlreadyStored { submitted: 4 });
        assert_eq!(report.batches_flushed, 0);
        assert_eq!(report.records_submitted, 4);
        assert_eq!(report.store_duplicates, 4);
        assert_eq!(report.records_inserted, 0);
    }
}
