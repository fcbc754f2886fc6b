//! Error types shared across flowdraw crates.

use std::path::PathBuf;

/// Top-level error type for flowdraw operations.
///
/// Variants map onto how far a failure reaches: `MalformedInput`,
/// `Import`, `Render`, `Timeout` and `Decode` are per-file, `Walk` and
/// `Config` end the whole run.
#[derive(Debug, thiserror::Error)]
pub enum FlowdrawError {
    #[error("Malformed flow: {message}")]
    MalformedInput { message: String },

    #[error("Import error: {message}")]
    Import { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Render timed out: {message}")]
    Timeout { message: String },

    #[error("Decode error: {message}")]
    Decode { message: String },

    #[error("Walk error at {path}: {source}")]
    Walk {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using FlowdrawError.
pub type FlowdrawResult<T> = Result<T, FlowdrawError>;

impl FlowdrawError {
    pub fn malformed_input(msg: impl Into<String>) -> Self {
        Self::MalformedInput {
            message: msg.into(),
        }
    }

    pub fn import(msg: impl Into<String>) -> Self {
        Self::Import {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout {
            message: msg.into(),
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn walk(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Walk {
            path: path.into(),
            source,
        }
    }

    /// Whether this error should stop a whole run rather than a single file.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Walk { .. } | Self::Config { .. })
    }
}
