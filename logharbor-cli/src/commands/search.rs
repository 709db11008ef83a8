//! `logharbor search` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use logharbor_core::config::LogHarborConfig;
use logharbor_core::error::StorageError;
use logharbor_core::types::CREATED_AT_FORMAT;
use logharbor_ingest::{SearchQuery, SqliteStore, StoredRecord};

use crate::cli::SearchArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `search` command.
pub fn execute(
    args: SearchArgs,
    config: &LogHarborConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let store = open_existing(&config.store.path)?;
    let query = build_query(args);
    debug!(?query, "searching log database");

    let records = store.search(&query)?;
    writer.render(&SearchResults {
        text: query.text.unwrap_or_default(),
        host: query.host,
        file: query.file,
        records,
    })?;
    Ok(())
}

/// Opens the log database without creating it.
pub(crate) fn open_existing(path: &str) -> Result<SqliteStore, CliError> {
    if !Path::new(path).exists() {
        return Err(StorageError::Open {
            path: path.to_owned(),
            reason: "log database does not exist, run `logharbor ingest` first".to_owned(),
        }
        .into());
    }
    Ok(SqliteStore::open_read_only(path)?)
}

fn build_query(args: SearchArgs) -> SearchQuery {
    let mut query = SearchQuery::text(args.text).limit(args.limit);
    if let Some(host) = args.host {
        query = query.host(host);
    }
    if let Some(file) = args.file {
        query = query.file(file);
    }
    query
}

/// Search results, newest first.
#[derive(Serialize)]
pub struct SearchResults {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub records: Vec<StoredRecord>,
}

impl Render for SearchResults {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if self.records.is_empty() {
            writeln!(w, "No records match '{}'.", self.text)?;
            return Ok(());
        }

        for stored in &self.records {
            let record = &stored.record;
            writeln!(
                w,
                "{} {}{}:{}",
                record.created_at.format(CREATED_AT_FORMAT).to_string().dimmed(),
                record.host.bold(),
                record.file,
                record.message
            )?;
        }
        writeln!(w)?;
        writeln!(w, "{} record(s)", self.records.len())?;
        Ok(())
    }
}
