//! `logharbor ingest` command handler

use std::io::Write;

use tracing::info;

use logharbor_core::config::{IngestSettings, LogHarborConfig};
use logharbor_ingest::{
    IngestConfig, IngestEngineBuilder, IngestReport, NoProgress, SqliteStore, StreamProgress,
};

use crate::cli::{IngestArgs, OutputFormat};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `ingest` command.
///
/// The progress indicator is only drawn for text output so that JSON output stays parseable.
pub fn execute(
    args: IngestArgs,
    config: &LogHarborConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let settings = apply_overrides(&config.ingest, args);
    let ingest_config = IngestConfig::from_core(&settings);
    // flags bypass load-time validation; reject them before touching the store
    ingest_config.validate()?;

    let store = SqliteStore::open(&config.store.path)?;
    info!(
        store = store.path(),
        master_log = %ingest_config.master_log,
        "starting ingest"
    );

    let mut engine = IngestEngineBuilder::new()
        .config(ingest_config)
        .registry(config.host_registry())
        .store(store)
        .build()?;

    let report = match writer.format() {
        OutputFormat::Text => engine.run(&mut StreamProgress::new(std::io::stdout()))?,
        OutputFormat::Json => engine.run(&mut NoProgress)?,
    };

    writer.render(&report)?;
    Ok(())
}

/// CLI flags win over `[ingest]` settings.
fn apply_overrides(settings: &IngestSettings, args: IngestArgs) -> IngestSettings {
    let mut settings = settings.clone();
    if let Some(master_log) = args.master_log {
        settings.master_log = master_log;
    }
    if let Some(batch_size) = args.batch_size {
        settings.batch_size = batch_size;
    }
    if let Some(policy) = args.parse_failure {
        settings.parse_failure = policy;
    }
    if let Some(policy) = args.conflict {
        settings.conflict = policy;
    }
    settings
}

impl Render for IngestReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Ingest: {}", self.master_log.bold())?;
        writeln!(w, "  Lines read:        {}", self.lines_read)?;
        writeln!(
            w,
            "  Records inserted:  {}",
            self.records_inserted.to_string().green()
        )?;
        writeln!(w, "  Already stored:    {}", self.store_duplicates)?;
        writeln!(w, "  Duplicate lines:   {}", self.batch_duplicates)?;
        if self.parse_failures > 0 {
            writeln!(
                w,
                "  Parse failures:    {}",
                self.parse_failures.to_string().yellow()
            )?;
        } else {
            writeln!(w, "  Parse failures:    0")?;
        }
        writeln!(
            w,
            "  Batches:           {} flushed, {} discarded, {} failed",
            self.batches_flushed, self.batches_discarded, self.batches_failed
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logharbor_core::config::{ConflictPolicy, ParseFailurePolicy};

    #[test]
    fn test_flags_override_settings() {
        let args = IngestArgs {
            master_log: Some("/tmp/master.log".to_owned()),
            batch_size: Some(10),
            parse_failure: Some(ParseFailurePolicy::Halt),
            conflict: None,
        };
        let settings = apply_overrides(&IngestSettings::default(), args);
        assert_eq!(settings.master_log, "/tmp/master.log");
        assert_eq!(settings.batch_size, 10);
        assert_eq!(settings.parse_failure, ParseFailurePolicy::Halt);
        assert_eq!(settings.conflict, ConflictPolicy::Ignore);
    }

    #[test]
    fn test_no_flags_keeps_settings() {
        let settings = apply_overrides(&IngestSettings::default(), IngestArgs::default());
        assert_eq!(settings.master_log, "master.log");
        assert_eq!(settings.batch_size, 100);
    }

    #[test]
    fn test_report_render_text() {
        colored::control::set_override(false);
        let report = IngestReport {
            master_log: "master.log".to_owned(),
            lines_read: 10,
            records_inserted: 7,
            store_duplicates: 1,
            batch_duplicates: 2,
            batches_flushed: 1,
            ..IngestReport::default()
        };
        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("rendering should succeed");
        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("Ingest: master.log"));
        assert!(output.contains("Records inserted:  7"));
        assert!(output.contains("1 flushed, 0 discarded, 0 failed"));
    }

    #[test]
    fn test_report_json_fields() {
        let report = IngestReport {
            parse_failures: 3,
            ..IngestReport::default()
        };
        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["parse_failures"].as_u64(), Some(3));
        assert!(json.get("batches_discarded").is_some());
    }
}
