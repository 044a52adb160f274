//! Error types shared across deskrec crates.

use std::path::PathBuf;

/// Top-level error type for deskrec operations.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("Device unavailable: {message}")]
    DeviceUnavailable { message: String },

    #[error("Encoder launch failed: {message}")]
    Launch { message: String },

    #[error("Encoder exited with an error: {message}")]
    Encoding { message: String },

    #[error("Segment reassembly failed: {message}")]
    Reassembly { message: String },

    #[error("Track merge failed: {message}")]
    Merge { message: String },

    #[error("Session error: {message}")]
    Session { message: String },

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

/// Result type alias using RecordError.
pub type RecordResult<T> = Result<T, RecordError>;

impl RecordError {
    pub fn device_unavailable(msg: impl Into<String>) -> Self {
        Self::DeviceUnavailable {
            message: msg.into(),
        }
    }

    pub fn launch(msg: impl Into<String>) -> Self {
        Self::Launch {
            message: msg.into(),
        }
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding {
            message: msg.into(),
        }
    }

    pub fn reassembly(msg: impl Into<String>) -> Self {
        Self::Reassembly {
            message: msg.into(),
        }
    }

    pub fn merge(msg: impl Into<String>) -> Self {
        Self::Merge {
            message: msg.into(),
        }
    }

    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}
