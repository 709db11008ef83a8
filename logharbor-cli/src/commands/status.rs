//! `logharbor status` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use logharbor_core::config::LogHarborConfig;

use crate::commands::search::open_existing;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `status` command.
pub fn execute(config: &LogHarborConfig, writer: &OutputWriter) -> Result<(), CliError> {
    let report = build_status_report(config)?;
    writer.render(&report)?;
    Ok(())
}

fn build_status_report(config: &LogHarborConfig) -> Result<StatusReport, CliError> {
    let path = config.store.path.clone();
    let configured_hosts = config.hosts.len();

    // a missing database is reported, not created
    if !Path::new(&path).exists() {
        return Ok(StatusReport {
            store_path: path,
            exists: false,
            total_records: 0,
            configured_hosts,
            hosts: Vec::new(),
        });
    }

    let store = open_existing(&path)?;
    let hosts = store
        .host_counts()?
        .into_iter()
        .map(|(host, records)| HostStatus {
            configured: config.host(&host).is_some(),
            host,
            records,
        })
        .collect();

    Ok(StatusReport {
        store_path: path,
        exists: true,
        total_records: store.count()?,
        configured_hosts,
        hosts,
    })
}

/// Log database summary.
#[derive(Serialize)]
pub struct StatusReport {
    pub store_path: String,
    pub exists: bool,
    pub total_records: u64,
    pub configured_hosts: usize,
    pub hosts: Vec<HostStatus>,
}

/// Stored record count for one host.
#[derive(Serialize)]
pub struct HostStatus {
    pub host: String,
    pub records: u64,
    /// Whether the host is still listed in `[[hosts]]`.
    pub configured: bool,
}

impl Render for StatusReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Log database: {}", self.store_path.bold())?;
        if !self.exists {
            writeln!(w, "  Status: {}", "not created yet".yellow())?;
            writeln!(w, "  Configured hosts: {}", self.configured_hosts)?;
            return Ok(());
        }

        writeln!(w, "  Total records: {}", self.total_records)?;
        writeln!(w, "  Configured hosts: {}", self.configured_hosts)?;
        writeln!(w)?;
        writeln!(w, "{:<40} {:>12}", "HOST", "RECORDS")?;
        writeln!(w, "{}", "-".repeat(53))?;
        for host in &self.hosts {
            let marker = if host.configured { "" } else { " (unconfigured)" };
            writeln!(w, "{:<40} {:>12}{}", host.host, host.records, marker)?;
        }
        Ok(())
    }
}
