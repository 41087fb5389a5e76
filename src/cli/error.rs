//! CLI error types and exit codes

use crate::config::ConfigError;

/// Fatal CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Invalid configuration from flags or environment
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Terminal I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Standard input closed while an answer was expected
    #[error("end of input")]
    EndOfInput,
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::EndOfInput => 0,
            Self::Config(_) | Self::Io(_) => 1,
        }
    }
}

/// How the last menu action ended; decides the exit code when input runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionStatus {
    /// Completed, or nothing has run yet
    #[default]
    Success,
    /// URL rejected or discovery failed
    DiscoveryFailed,
    /// Menu or format index rejected
    SelectionFailed,
    /// Download failed
    DownloadFailed,
    /// Conversion failed
    ConversionFailed,
}

impl ActionStatus {
    /// Exit code reported for this status.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Success => 0,
            Self::DiscoveryFailed => 2,
            Self::SelectionFailed => 3,
            Self::DownloadFailed => 4,
            Self::ConversionFailed => 5,
        }
    }
}
