use thiserror::Error;
use trustledger_core::ConfigError;
use trustledger_journal::JournalError;

/// Errors surfaced by CLI commands.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("journal: {0}")]
    Journal(#[from] JournalError),
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("script: {0}")]
    Script(String),
    #[error("JSON output: {0}")]
    Json(#[from] serde_json::Error),
    /// The command ran but its check did not pass.
    #[error("{0}")]
    Failed(String),
}
