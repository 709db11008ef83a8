//! `logharbor config` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use logharbor_core::config::LogHarborConfig;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Sections accepted by `config show --section`.
const SECTIONS: [&str; 6] = ["general", "store", "ingest", "pull", "hosts", "groups"];

/// Execute the `config` command.
pub fn execute(args: ConfigArgs, config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => execute_validate(config_path, writer),
        ConfigAction::Show { section } => execute_show(config_path, section, writer),
    }
}

/// Load and validate the configuration file, reporting any errors.
///
/// # Errors
///
/// Returns `CliError::Config` if validation fails (parse errors, invalid values, unknown hosts).
fn execute_validate(config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    info!(path = %config_path.display(), "validating configuration");

    let report = match LogHarborConfig::load(config_path) {
        Ok(config) => ConfigValidationReport {
            source: config_path.display().to_string(),
            valid: true,
            hosts: config.hosts.len(),
            groups: config.groups.len(),
            errors: Vec::new(),
        },
        Err(e) => ConfigValidationReport {
            source: config_path.display().to_string(),
            valid: false,
            hosts: 0,
            groups: 0,
            errors: vec![e.to_string()],
        },
    };

    writer.render(&report)?;

    if !report.valid {
        return Err(CliError::Config("configuration is invalid".to_owned()));
    }
    Ok(())
}

/// Display the effective configuration (file + env overrides + defaults).
fn execute_show(
    config_path: &Path,
    section: Option<String>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    info!(path = %config_path.display(), "loading configuration");

    let config = LogHarborConfig::load(config_path)?;
    let report = ConfigReport {
        source: config_path.display().to_string(),
        config_toml: render_toml(&config, section.as_deref())?,
        section,
    };

    writer.render(&report)?;
    Ok(())
}

/// Serialize the whole configuration or a single top-level section.
fn render_toml(config: &LogHarborConfig, section: Option<&str>) -> Result<String, CliError> {
    let full = toml::to_string_pretty(config)
        .map_err(|e| CliError::Command(format!("failed to serialize configuration: {e}")))?;

    let Some(name) = section else {
        return Ok(full);
    };
    if !SECTIONS.contains(&name) {
        return Err(CliError::Command(format!(
            "unknown section: {} (expected: {})",
            name,
            SECTIONS.join(", ")
        )));
    }

    let table: toml::Table = toml::from_str(&full)
        .map_err(|e| CliError::Command(format!("failed to reparse configuration: {e}")))?;
    let mut selected = toml::Table::new();
    if let Some(value) = table.get(name) {
        selected.insert(name.to_owned(), value.clone());
    }
    toml::to_string_pretty(&selected)
        .map_err(|e| CliError::Command(format!("failed to serialize section {name}: {e}")))
}

/// Configuration display report.
///
/// The `config_toml` field is skipped during JSON serialization (only used for text rendering).
#[derive(Serialize)]
pub struct ConfigReport {
    /// Configuration file path
    pub source: String,
    /// Optional section name (None = full config)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip)]
    pub config_toml: String,
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if let Some(ref section) = self.section {
            let section_label = format!("[{}]", section);
            writeln!(
                w,
                "Configuration {} (source: {})",
                section_label.bold(),
                self.source
            )?;
        } else {
            writeln!(w, "Configuration (source: {})", self.source.bold())?;
        }

        writeln!(w)?;
        write!(w, "{}", self.config_toml)?;
        Ok(())
    }
}

/// Configuration validation report.
#[derive(Serialize)]
pub struct ConfigValidationReport {
    /// Configuration file path
    pub source: String,
    /// Whether the configuration is valid
    pub valid: bool,
    /// Number of configured hosts
    pub hosts: usize,
    /// Number of configured groups
    pub groups: usize,
    /// Validation error messages (empty if valid)
    pub errors: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Config Validation: {}", self.source.bold())?;

        if self.valid {
            writeln!(w, "  Result: {}", "VALID".green().bold())?;
            writeln!(w, "  Hosts: {}, groups: {}", self.hosts, self.groups)?;
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            for err in &self.errors {
                writeln!(w, "  Error: {}", err.red())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
[ingest]
batch_size = 25

[[hosts]]
host = "web01"
user = "deploy"

[[groups]]
name = "web"
hosts = "*"
logs = ["/var/log/syslog"]
"#;

    #[test]
    fn test_render_toml_full() {
        let config = LogHarborConfig::parse(CONFIG).unwrap();
        let toml = render_toml(&config, None).unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("batch_size = 25"));
        assert!(toml.contains("[[hosts]]"));
    }

    #[test]
    fn test_render_toml_single_section() {
        let config = LogHarborConfig::parse(CONFIG).unwrap();
        let toml = render_toml(&config, Some("ingest")).unwrap();
        assert!(toml.contains("[ingest]"));
        assert!(toml.contains("batch_size = 25"));
        assert!(!toml.contains("[general]"));
        assert!(!toml.contains("[[hosts]]"));
    }

    #[test]
    fn test_render_toml_array_section() {
        let config = LogHarborConfig::parse(CONFIG).unwrap();
        let toml = render_toml(&config, Some("groups")).unwrap();
        assert!(toml.contains("[[groups]]"));
        assert!(toml.contains("/var/log/syslog"));
        assert!(!toml.contains("[ingest]"));
    }

    #[test]
    fn test_render_toml_unknown_section() {
        let config = LogHarborConfig::default();
        let err = render_toml(&config, Some("ebpf")).unwrap_err();
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("unknown section"));
    }

    #[test]
    fn test_config_report_render_text_specific_section() {
        let report = ConfigReport {
            source: "/etc/logharbor.toml".to_owned(),
            section: Some("store".to_owned()),
            config_toml: "path = \"db.sqlite\"".to_owned(),
        };
        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("text rendering should succeed");
        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("[store]"), "should show section name");
        assert!(output.contains("db.sqlite"), "should show config content");
    }

    #[test]
    fn test_config_report_json_skips_toml() {
        let report = ConfigReport {
            source: "test.toml".to_owned(),
            section: None,
            config_toml: "x = 1".to_owned(),
        };
        let parsed = serde_json::to_value(&report).expect("serialize");
        assert_eq!(parsed["source"].as_str(), Some("test.toml"));
        assert!(parsed.get("section").is_none());
        assert!(parsed.get("config_toml").is_none());
    }

    #[test]
    fn test_config_validation_report_invalid() {
        let report = ConfigValidationReport {
            source: "bad.toml".to_owned(),
            valid: false,
            hosts: 0,
            groups: 0,
            errors: vec!["group 'web' refers to unknown host 'web09'".to_owned()],
        };
        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("text rendering should succeed");
        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("INVALID"));
        assert!(output.contains("web09"));
    }
}
