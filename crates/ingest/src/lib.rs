#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`reader`]: 마스터 로그 2패스 스트리밍 (라인 수 계산 후 순차 읽기)
//! - [`parser`]: 호스트 레지스트리 기반 라인 파서
//! - [`dedup`]: 콘텐츠 해시 키 배치 (배치 내 중복 병합)
//! - [`batch`]: 배치 삽입기 (크기 경계 플러시, 충돌 정책)
//! - [`store`]: SQLite 저장소 ([`RecordStore`](logharbor_core::pipeline::RecordStore) 구현)
//! - [`progress`]: 진행률 계산 및 출력
//! - [`engine`]: 전체 흐름 오케스트레이션
//! - [`config`]: 엔진 설정 (core 설정 기반)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! MasterLogReader -> LineParser -> Batch -> BatchInserter -> SqliteStore
//!       |                |           |            |
//!   2-pass read     host regex   hash dedup   atomic flush
//! ```

pub mod batch;
pub mod config;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod parser;
pub mod progress;
pub mod reader;
pub mod store;

// --- 주요 타입 re-export ---

// 엔진
pub use engine::{IngestEngine, IngestEngineBuilder, IngestReport};

// 설정
pub use config::{IngestConfig, IngestConfigBuilder};

// 에러
pub use error::IngestError;

// 구성 요소
pub use batch::{BatchInserter, FlushOutcome};
pub use dedup::{Batch, PendingRecord};
pub use parser::{LineParser, ParsedLine};
pub use progress::{NoProgress, ProgressTracker, StreamProgress};
pub use reader::{MasterLogReader, RawLine};

// 저장소
pub use store::{SearchQuery, SqliteStore, StoredRecord};
