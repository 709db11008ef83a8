//! `logharbor pull` command handler

use std::io::Write;

use serde::Serialize;
use tracing::{info, warn};

use logharbor_core::config::LogHarborConfig;
use logharbor_remote::{CollectionPlan, PullScript, check_output_dir};

use crate::cli::PullArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `pull` command.
///
/// The output directory must already exist and be writable; the script is only printed.
pub fn execute(args: PullArgs, config: &LogHarborConfig, writer: &OutputWriter) -> Result<(), CliError> {
    let output_dir = args
        .output_dir
        .unwrap_or_else(|| config.pull.output_dir.clone());
    check_output_dir(&output_dir)?;

    let plan = CollectionPlan::from_config(config, &args.hosts)?;
    if plan.is_empty() {
        warn!("no logs configured for the selected hosts");
    }
    info!(
        hosts = plan.len(),
        logs = plan.total_logs(),
        output_dir = %output_dir,
        "rendering pull script"
    );

    let script = PullScript::new(&plan, output_dir, &config.ingest.master_log).render();
    writer.render(&ScriptOutput::new("pull", &plan, script))?;
    Ok(())
}

/// A rendered shell script plus what it covers.
#[derive(Serialize)]
pub struct ScriptOutput {
    pub kind: &'static str,
    pub hosts: usize,
    pub logs: usize,
    pub script: String,
}

impl ScriptOutput {
    pub fn new(kind: &'static str, plan: &CollectionPlan, script: String) -> Self {
        Self {
            kind,
            hosts: plan.len(),
            logs: plan.total_logs(),
            script,
        }
    }
}

impl Render for ScriptOutput {
    // the script itself, so that `logharbor pull | sh` works
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        w.write_all(self.script.as_bytes())
    }
}
