//! SQLite 로그 저장소
//!
//! [`SqliteStore`]는 [`RecordStore`] trait의 기본 구현입니다.
//!
//! # 스키마
//! ```sql
//! CREATE TABLE logs (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     hash TEXT NOT NULL UNIQUE,
//!     host TEXT NOT NULL,
//!     file TEXT NOT NULL,
//!     message TEXT NOT NULL,
//!     created_at DATETIME NOT NULL
//! );
//! ```
//! `hash`, `host`, `file`, `created_at`에 인덱스가 있습니다.
//! 테이블은 없을 때만 생성되며, 이후에는 추가만 됩니다.

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::path::Path;

use chrono::NaiveDateTime;
use rusqlite::{Connection, ErrorCode, OpenFlags, OptionalExtension, params_from_iter};
use serde::Serialize;

use logharbor_core::config::MAX_BATCH_SIZE;
use logharbor_core::error::StorageError;
use logharbor_core::pipeline::RecordStore;
use logharbor_core::types::{CREATED_AT_FORMAT, ContentHash, InsertOutcome, LogRecord, OnConflict};

/// 로그 테이블 이름
pub const LOGS_TABLE: &str = "logs";

const SCHEMA: &str = "
CREATE TABLE logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    hash TEXT NOT NULL UNIQUE,
    host TEXT NOT NULL,
    file TEXT NOT NULL,
    message TEXT NOT NULL,
    created_at DATETIME NOT NULL
);
CREATE INDEX logs_hash_index ON logs (hash);
CREATE INDEX logs_host_index ON logs (host);
CREATE INDEX logs_file_index ON logs (file);
CREATE INDEX logs_created_at_index ON logs (created_at);
";

const SELECT_COLUMNS: &str = "SELECT id, hash, host, file, message, created_at FROM logs";

/// `IN (...)` 조회 한 번에 바인딩할 최대 해시 수
const MAX_QUERY_PARAMS: usize = 999;

/// 저장된 레코드 (대리 키 포함)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredRecord {
    /// 저장소 내부 증가 ID
    pub id: i64,
    #[serde(flatten)]
    pub record: LogRecord,
}

/// 저장소 검색 조건
///
/// 모든 조건은 AND로 결합되며, 결과는 최신 레코드부터 반환됩니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// 메시지 부분 문자열
    pub text: Option<String>,
    /// 호스트 (정확히 일치)
    pub host: Option<String>,
    /// 파일 경로 부분 문자열
    pub file: Option<String>,
    /// 최대 결과 수
    pub limit: usize,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            text: None,
            host: None,
            file: None,
            limit: 50,
        }
    }
}

impl SearchQuery {
    /// 메시지 부분 문자열 조건으로 검색 조건을 생성합니다.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// SQLite 기반 로그 저장소
///
/// 실행당 한 번 열고, 엔진에 명시적으로 넘겨 사용합니다.
pub struct SqliteStore {
    conn: Connection,
    path: String,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// 저장소를 엽니다.
    ///
    /// - 상위 디렉토리와 파일이 없으면 생성합니다.
    /// - 기존 파일에 쓸 수 없으면 [`StorageError::NotWritable`]을 반환합니다.
    /// - `logs` 테이블이 없으면 테이블과 인덱스 4개를 생성합니다.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let shown = path.display().to_string();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Open {
                path: shown.clone(),
                reason: e.to_string(),
            })?;
        }

        if path.exists() {
            check_writable(path, &shown)?;
        } else {
            tracing::info!(path = %shown, "creating log database");
        }

        let conn = Connection::open(path).map_err(|e| StorageError::Open {
            path: shown.clone(),
            reason: e.to_string(),
        })?;

        let mut store = Self { conn, path: shown };
        store.ensure_schema()?;
        Ok(store)
    }

    /// 기존 저장소를 읽기 전용으로 엽니다.
    ///
    /// 파일을 만들거나 스키마를 생성하지 않습니다. `logs` 테이블이 없으면
    /// [`StorageError::Schema`]를 반환합니다.
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let shown = path.display().to_string();

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| StorageError::Open {
            path: shown.clone(),
            reason: e.to_string(),
        })?;

        let store = Self { conn, path: shown };
        if !store.has_logs_table()? {
            return Err(StorageError::Schema(format!(
                "{} has no {LOGS_TABLE} table",
                store.path
            )));
        }
        Ok(store)
    }

    /// 메모리 저장소를 엽니다 (테스트/벤치마크용).
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(|e| StorageError::Open {
            path: ":memory:".to_owned(),
            reason: e.to_string(),
        })?;
        let mut store = Self {
            conn,
            path: ":memory:".to_owned(),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    /// 저장소 경로
    pub fn path(&self) -> &str {
        &self.path
    }

    /// `logs` 테이블이 없을 때만 스키마를 생성합니다.
    ///
    /// 생성했으면 `true`를 반환합니다.
    pub fn ensure_schema(&mut self) -> Result<bool, StorageError> {
        if self.has_logs_table()? {
            return Ok(false);
        }

        let path = self.path.clone();
        let tx = self
            .conn
            .transaction()
            .map_err(|e| write_error(&path, e))?;
        tx.execute_batch(SCHEMA)
            .map_err(|e| StorageError::Schema(e.to_string()))?;
        tx.commit().map_err(|e| StorageError::Schema(e.to_string()))?;

        tracing::info!(path = %self.path, "created logs table and indices");
        Ok(true)
    }

    fn has_logs_table(&self) -> Result<bool, StorageError> {
        let exists: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [LOGS_TABLE],
                |row| row.get(0),
            )
            .map_err(|e| StorageError::Schema(e.to_string()))?;
        Ok(exists > 0)
    }

    /// 전체 레코드 수
    pub fn count(&self) -> Result<u64, StorageError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM logs", [], |row| row.get(0))
            .map_err(query_error)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// 해시로 레코드를 찾습니다.
    pub fn find_by_hash(&self, hash: &ContentHash) -> Result<Option<StoredRecord>, StorageError> {
        self.conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE hash = ?1"),
                [hash.to_hex()],
                row_to_record,
            )
            .optional()
            .map_err(query_error)
    }

    /// 조건에 맞는 레코드를 최신순으로 검색합니다.
    pub fn search(&self, query: &SearchQuery) -> Result<Vec<StoredRecord>, StorageError> {
        let mut where_clauses = Vec::new();
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(text) = query.text.as_deref().filter(|t| !t.is_empty()) {
            where_clauses.push("instr(message, ?) > 0");
            param_values.push(Box::new(text.to_owned()));
        }
        if let Some(host) = query.host.as_deref() {
            where_clauses.push("host = ?");
            param_values.push(Box::new(host.to_owned()));
        }
        if let Some(file) = query.file.as_deref().filter(|f| !f.is_empty()) {
            where_clauses.push("instr(file, ?) > 0");
            param_values.push(Box::new(file.to_owned()));
        }
        param_values.push(Box::new(i64::try_from(query.limit).unwrap_or(i64::MAX)));

        let where_sql = if where_clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", where_clauses.join(" AND "))
        };
        let sql = format!("{SELECT_COLUMNS}{where_sql} ORDER BY id DESC LIMIT ?");

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = self.conn.prepare(&sql).map_err(query_error)?;
        let rows = stmt
            .query_map(params_ref.as_slice(), row_to_record)
            .map_err(query_error)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(query_error)
    }

    /// 호스트별 레코드 수 (호스트 이름순)
    pub fn host_counts(&self) -> Result<Vec<(String, u64)>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT host, COUNT(*) FROM logs GROUP BY host ORDER BY host")
            .map_err(query_error)?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?)))
            .map_err(query_error)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(query_error)
    }
}

impl RecordStore for SqliteStore {
    fn insert_batch(
        &mut self,
        records: &[LogRecord],
        on_conflict: OnConflict,
    ) -> Result<InsertOutcome, StorageError> {
        if records.is_empty() {
            return Ok(InsertOutcome::default());
        }

        let path = self.path.clone();
        let tx = self
            .conn
            .transaction()
            .map_err(|e| write_error(&path, e))?;
        let mut inserted = 0;
        for chunk in records.chunks(MAX_BATCH_SIZE) {
            let values: Vec<String> = chunk
                .iter()
                .flat_map(|r| {
                    [
                        r.hash.to_hex(),
                        r.host.clone(),
                        r.file.clone(),
                        r.message.clone(),
                        r.created_at.format(CREATED_AT_FORMAT).to_string(),
                    ]
                })
                .collect();
            inserted += tx
                .execute(&insert_sql(on_conflict, chunk.len()), params_from_iter(values.iter()))
                .map_err(|e| write_error(&path, e))?;
        }
        tx.commit().map_err(|e| write_error(&path, e))?;

        Ok(InsertOutcome {
            submitted: records.len(),
            inserted,
        })
    }

    fn query_by_hash(&self, hashes: &[ContentHash]) -> Result<HashSet<ContentHash>, StorageError> {
        let mut present = HashSet::new();
        for chunk in hashes.chunks(MAX_QUERY_PARAMS) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!("SELECT hash FROM logs WHERE hash IN ({placeholders})");
            let mut stmt = self.conn.prepare(&sql).map_err(query_error)?;
            let rows = stmt
                .query_map(params_from_iter(chunk.iter().map(ContentHash::to_hex)), |row| {
                    row.get::<_, String>(0)
                })
                .map_err(query_error)?;
            for row in rows {
                let hex = row.map_err(query_error)?;
                let hash = hex
                    .parse::<ContentHash>()
                    .map_err(|e| StorageError::Query(e.to_string()))?;
                present.insert(hash);
            }
        }
        Ok(present)
    }
}

/// 기존 파일을 실제로 쓰기 모드로 열어 봅니다.
///
/// 권한 비트만으로는 소유자가 다른 파일을 판별할 수 없습니다.
fn check_writable(path: &Path, shown: &str) -> Result<(), StorageError> {
    match OpenOptions::new().append(true).open(path) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(StorageError::NotWritable {
                path: shown.to_owned(),
            })
        }
        Err(e) => Err(StorageError::Open {
            path: shown.to_owned(),
            reason: e.to_string(),
        }),
    }
}

fn insert_sql(on_conflict: OnConflict, rows: usize) -> String {
    let verb = match on_conflict {
        OnConflict::Ignore => "INSERT OR IGNORE",
        OnConflict::Fail => "INSERT",
    };
    let placeholders = vec!["(?, ?, ?, ?, ?)"; rows].join(", ");
    format!("{verb} INTO logs (hash, host, file, message, created_at) VALUES {placeholders}")
}

/// 쓰기 중 발생한 에러를 변환합니다. 읽기 전용 DB는 `NotWritable`이 됩니다.
fn write_error(path: &str, e: rusqlite::Error) -> StorageError {
    match e.sqlite_error_code() {
        Some(ErrorCode::ReadOnly) | Some(ErrorCode::PermissionDenied) => StorageError::NotWritable {
            path: path.to_owned(),
        },
        _ => query_error(e),
    }
}

fn query_error(e: rusqlite::Error) -> StorageError {
    match e.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => StorageError::Constraint(e.to_string()),
        _ => StorageError::Query(e.to_string()),
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredRecord> {
    let id: i64 = row.get(0)?;
    let hash_str: String = row.get(1)?;
    let created_at_str: String = row.get(5)?;

    let hash = hash_str.parse::<ContentHash>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let created_at = NaiveDateTime::parse_from_str(&created_at_str, CREATED_AT_FORMAT).map_err(
        |e| rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e)),
    )?;

    Ok(StoredRecord {
        id,
        record: LogRecord {
            hash,
            host: row.get(2)?,
            file: row.get(3)?,
            message: row.get(4)?,
            created_at,
        },
    })
}
