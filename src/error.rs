//! Error taxonomy for TrendLens.
//!
//! Every tool handler converts these into a structured JSON error object
//! (`error` + `message` keys) at the dispatch boundary, so transports never
//! see a raw error trace.

use thiserror::Error;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum TrendLensError {
    /// A request parameter failed validation (bad date, inverted range that
    /// cannot be recovered, wrong shape).
    #[error("invalid parameter '{param}': {message}")]
    Validation { param: String, message: String },

    /// Configuration could not be loaded or parsed. Fatal at startup.
    #[error("config error: {0}")]
    Config(String),

    /// Snapshot storage could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),

    /// A downstream collaborator (crawler, platform source) failed.
    #[error("downstream failure: {0}")]
    Downstream(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl TrendLensError {
    /// Short stable category name used as the `error` key in envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "ValidationError",
            Self::Config(_) => "ConfigError",
            Self::Storage(_) | Self::Io(_) | Self::Json(_) | Self::Yaml(_) => "StorageError",
            Self::Downstream(_) => "DownstreamError",
        }
    }

    /// Convenience constructor for parameter validation failures.
    pub fn validation(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            param: param.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TrendLensError>;
