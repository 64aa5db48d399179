//! Error types for the research assistant

use std::path::PathBuf;
use stepgraph_core::GraphError;
use thiserror::Error;

/// Result type alias for research assistant operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Top-level error for running the workflow
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Graph construction or execution failed
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Reading the reviewer's decision failed
    #[error("Approval prompt failed: {0}")]
    Prompt(String),
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl ConfigError {
    pub(crate) fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Failures raised by the mock research steps
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    #[error("research topic is empty")]
    EmptyTopic,

    #[error("no search queries to execute")]
    NoQueries,

    #[error("no search results to synthesize")]
    NoResults,

    #[error("iteration counter overflowed")]
    CounterOverflow,
}
