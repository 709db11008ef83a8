//! Command handlers -- one module per subcommand

pub mod config;
pub mod ingest;
pub mod pull;
pub mod search;
pub mod status;
pub mod tail;
