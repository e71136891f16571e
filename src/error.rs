use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Wordlist not found at {}", path.display())]
    WordlistNotFound { path: PathBuf },

    #[error("Target unreachable: {0}")]
    UnreachableTarget(String),

    #[error("External tool error: {tool} - {message}")]
    ExternalTool { tool: String, message: String },

    #[error("{probe} probe error: {message}")]
    Probe {
        probe: &'static str,
        message: String,
    },

    #[error("Failed to write results to {}: {message}", path.display())]
    Persistence { path: PathBuf, message: String },
}

impl ReconError {
    /// Shorthand for probe-level failures that abort the current probe.
    pub fn probe(probe: &'static str, message: impl Into<String>) -> Self {
        ReconError::Probe {
            probe,
            message: message.into(),
        }
    }
}

pub type ReconResult<T> = std::result::Result<T, ReconError>;
