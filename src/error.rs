// ============================================================
// Error taxonomy
// ============================================================
// Every fallible library operation returns PipelineError.
// The binaries wrap it in anyhow at the top level.
//
// Low-level I/O errors are carried through unmodified
// (#[error(transparent)]) so callers see the original cause.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    // ========== Configuration ==========
    /// A required configuration key is missing or has an invalid value
    #[error("configuration error at '{key}': {reason}")]
    Configuration { key: String, reason: String },

    /// Unknown dataset acquisition mode
    #[error("invalid mode '{mode}'. Options: [{}]", .valid.join(", "))]
    InvalidMode { mode: String, valid: Vec<String> },

    // ========== Acquisition ==========
    /// Remote server answered with a non-success status
    #[error("transfer of '{url}' failed with HTTP status {status}")]
    Transfer { url: String, status: u16 },

    /// Archive could not be opened or unpacked
    #[error("cannot extract '{}': {reason}", .archive.display())]
    Extraction { archive: PathBuf, reason: String },

    /// Preprocessing found nothing to work on
    #[error("no raw files matching '{pattern}' under '{}'", .dir.display())]
    MissingData { dir: PathBuf, pattern: String },

    /// A record set or tensor failed its shape checks
    #[error("validation failed: {reason}")]
    Validation { reason: String },

    // ========== Infrastructure ==========
    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error("checkpoint error: {0}")]
    Checkpoint(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl PipelineError {
    pub fn config(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration { key: key.into(), reason: reason.into() }
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation { reason: reason.into() }
    }

    /// Transient transfer failures worth another attempt:
    /// server-side 5xx, 429 throttling, timeouts and refused connections.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transfer { status, .. } => *status >= 500 || *status == 429,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
