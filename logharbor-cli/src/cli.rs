//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use logharbor_core::config::{ConflictPolicy, ParseFailurePolicy};

/// logharbor -- collect, deduplicate and index logs from remote hosts.
///
/// Use `logharbor <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "logharbor", version, about, long_about = None)]
pub struct Cli {
    /// Path to the logharbor.toml configuration file.
    #[arg(short, long, global = true, default_value = "logharbor.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index the master log into the log database.
    Ingest(IngestArgs),

    /// Search indexed log messages.
    Search(SearchArgs),

    /// Show log database statistics.
    Status,

    /// Print a shell script that copies remote logs and builds the master log.
    Pull(PullArgs),

    /// Print a shell script that follows every watched remote log.
    Tail(TailArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- ingest ----

/// Index the master log.
#[derive(Args, Debug, Default)]
pub struct IngestArgs {
    /// Master log to read (overrides `ingest.master_log`).
    #[arg(long)]
    pub master_log: Option<String>,

    /// Records per batch, 1-199 (overrides `ingest.batch_size`).
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// What to do with unparseable lines: discard_batch, skip_line, halt.
    #[arg(long)]
    pub parse_failure: Option<ParseFailurePolicy>,

    /// How to handle hashes already in the database: ignore, pre_filter.
    #[arg(long)]
    pub conflict: Option<ConflictPolicy>,
}

// ---- search ----

/// Search indexed log messages, newest first.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Substring to look for in the message.
    pub text: String,

    /// Only records from this host.
    #[arg(long)]
    pub host: Option<String>,

    /// Only records whose file path contains this substring.
    #[arg(long)]
    pub file: Option<String>,

    /// Maximum number of records.
    #[arg(long, default_value_t = 50)]
    pub limit: usize,
}

// ---- pull / tail ----

/// Print the pull script.
#[derive(Args, Debug, Default)]
pub struct PullArgs {
    /// Local directory for log copies (overrides `pull.output_dir`).
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Restrict to these hosts (repeatable).
    #[arg(long = "host")]
    pub hosts: Vec<String>,
}

/// Print the tail script.
#[derive(Args, Debug, Default)]
pub struct TailArgs {
    /// Restrict to these hosts (repeatable).
    #[arg(long = "host")]
    pub hosts: Vec<String>,
}

// ---- config ----

/// Manage logharbor configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, store, ingest, pull, hosts, groups).
        #[arg(long)]
        section: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_ingest_defaults() {
        let cli = Cli::try_parse_from(["logharbor", "ingest"]).expect("parse succeeded");
        match cli.command {
            Commands::Ingest(args) => {
                assert!(args.master_log.is_none());
                assert!(args.batch_size.is_none());
                assert!(args.parse_failure.is_none());
                assert!(args.conflict.is_none());
            }
            _ => panic!("expected Ingest command"),
        }
    }

    #[test]
    fn test_cli_parse_ingest_overrides() {
        let cli = Cli::try_parse_from([
            "logharbor",
            "ingest",
            "--master-log",
            "/tmp/master.log",
            "--batch-size",
            "50",
            "--parse-failure",
            "skip_line",
            "--conflict",
            "pre_filter",
        ])
        .expect("parse succeeded");
        match cli.command {
            Commands::Ingest(args) => {
                assert_eq!(args.master_log.as_deref(), Some("/tmp/master.log"));
                assert_eq!(args.batch_size, Some(50));
                assert_eq!(args.parse_failure, Some(ParseFailurePolicy::SkipLine));
                assert_eq!(args.conflict, Some(ConflictPolicy::PreFilter));
            }
            _ => panic!("expected Ingest command"),
        }
    }

    #[test]
    fn test_cli_parse_ingest_unknown_policy_fails() {
        let args = Cli::try_parse_from(["logharbor", "ingest", "--parse-failure", "retry"]);
        assert!(args.is_err(), "unknown policy should be rejected");
    }

    #[test]
    fn test_cli_parse_search() {
        let cli = Cli::try_parse_from([
            "logharbor", "search", "timeout", "--host", "web01", "--limit", "5",
        ])
        .expect("parse succeeded");
        match cli.command {
            Commands::Search(args) => {
                assert_eq!(args.text, "timeout");
                assert_eq!(args.host.as_deref(), Some("web01"));
                assert!(args.file.is_none());
                assert_eq!(args.limit, 5);
            }
            _ => panic!("expected Search command"),
        }
    }

    #[test]
    fn test_cli_parse_search_requires_text() {
        assert!(Cli::try_parse_from(["logharbor", "search"]).is_err());
    }

    #[test]
    fn test_cli_parse_pull_repeated_hosts() {
        let cli = Cli::try_parse_from([
            "logharbor",
            "pull",
            "--output-dir",
            "/srv/logs",
            "--host",
            "web01",
            "--host",
            "db01",
        ])
        .expect("parse succeeded");
        match cli.command {
            Commands::Pull(args) => {
                assert_eq!(args.output_dir.as_deref(), Some("/srv/logs"));
                assert_eq!(args.hosts, ["web01", "db01"]);
            }
            _ => panic!("expected Pull command"),
        }
    }

    #[test]
    fn test_cli_parse_tail() {
        let cli = Cli::try_parse_from(["logharbor", "tail"]).expect("parse succeeded");
        match cli.command {
            Commands::Tail(args) => assert!(args.hosts.is_empty()),
            _ => panic!("expected Tail command"),
        }
    }

    #[test]
    fn test_cli_parse_config_show_section() {
        let cli = Cli::try_parse_from(["logharbor", "config", "show", "--section", "ingest"])
            .expect("parse succeeded");
        match cli.command {
            Commands::Config(config_args) => match config_args.action {
                ConfigAction::Show { section } => {
                    assert_eq!(section, Some("ingest".to_owned()));
                }
                _ => panic!("expected Show action"),
            },
            _ => panic!("expected Config command"),
        }
    }

    #[test]
    fn test_cli_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "logharbor",
            "status",
            "-c",
            "/etc/logharbor.toml",
            "--output",
            "json",
            "--log-level",
            "debug",
        ])
        .expect("parse succeeded");
        assert_eq!(cli.config, PathBuf::from("/etc/logharbor.toml"));
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_cli_parse_missing_command_fails() {
        assert!(Cli::try_parse_from(["logharbor"]).is_err());
    }

    #[test]
    fn test_cli_verify_command_structure() {
        let cmd = Cli::command();
        assert_eq!(cmd.get_name(), "logharbor");
        let subcommands: Vec<_> = cmd.get_subcommands().map(|s| s.get_name()).collect();
        for name in ["ingest", "search", "status", "pull", "tail", "config"] {
            assert!(subcommands.contains(&name), "should have '{name}' subcommand");
        }
        cmd.debug_assert();
    }
}
