//! `logharbor tail` command handler

use tracing::{info, warn};

use logharbor_core::config::LogHarborConfig;
use logharbor_remote::{CollectionPlan, TailScript};

use crate::cli::TailArgs;
use crate::commands::pull::ScriptOutput;
use crate::error::CliError;
use crate::output::OutputWriter;

/// Execute the `tail` command.
pub fn execute(args: TailArgs, config: &LogHarborConfig, writer: &OutputWriter) -> Result<(), CliError> {
    let plan = CollectionPlan::from_config(config, &args.hosts)?;
    if plan.is_empty() {
        warn!("no logs configured for the selected hosts");
    }
    info!(hosts = plan.len(), logs = plan.total_logs(), "rendering tail script");

    let script = TailScript::new(&plan).render();
    writer.render(&ScriptOutput::new("tail", &plan, script))?;
    Ok(())
}
