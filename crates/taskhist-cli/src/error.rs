//! Errors that stop a replay before its first step.

use std::path::PathBuf;

use thiserror::Error;

use taskhist_history::ConfigError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid script: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Json(_) => 1,
            CliError::Config(_) => 2,
            CliError::Io { .. } => 3,
        }
    }
}
