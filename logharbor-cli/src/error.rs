//! CLI-specific error types and exit code mapping

use logharbor_core::error::{LogHarborError, StorageError};
use logharbor_ingest::IngestError;
use logharbor_remote::RemoteError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from logharbor-core.
    #[error("{0}")]
    Core(#[from] LogHarborError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                        |
    /// |------|------------------------------------------------|
    /// | 0    | Success                                        |
    /// | 1    | General / command error                        |
    /// | 2    | Configuration error                            |
    /// | 3    | Log database cannot be created, opened or written |
    /// | 4    | Unparseable line under the `halt` policy       |
    /// | 10   | IO error (e.g. master log cannot be opened)    |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Io(_) => 10,
            Self::Core(core) => match core {
                LogHarborError::Config(_) => 2,
                LogHarborError::Storage(_) => 3,
                LogHarborError::Parse(_) => 4,
                LogHarborError::Io(_) => 10,
            },
            Self::JsonSerialize(_) | Self::Command(_) => 1,
        }
    }
}

impl From<IngestError> for CliError {
    fn from(e: IngestError) -> Self {
        Self::Core(e.into())
    }
}

impl From<StorageError> for CliError {
    fn from(e: StorageError) -> Self {
        Self::Core(e.into())
    }
}

impl From<RemoteError> for CliError {
    fn from(e: RemoteError) -> Self {
        Self::Core(e.into())
    }
}
