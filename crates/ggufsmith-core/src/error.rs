//! Error types for ggufsmith.
//!
//! Every step of the conversion pipeline reports failures through
//! [`ForgeError`]. Whether a failure ends the run is decided by the pipeline
//! step that receives it, not by the error itself: a missing tool aborts the
//! run when it is the converter but only empties the quantization step.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the ggufsmith library.
#[derive(Debug, Error)]
pub enum ForgeError {
    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // External tool errors
    #[error("{tool} not found: {path}")]
    ToolNotFound { tool: String, path: PathBuf },

    #[error("Conversion failed: {message}")]
    ConversionFailed { message: String },

    // Input errors
    #[error("Invalid quantization types: {}", invalid.join(", "))]
    InvalidProfiles {
        invalid: Vec<String>,
        valid: Vec<String>,
    },

    #[error("Input stream closed")]
    InputClosed,
}

/// Result type alias for ggufsmith operations.
pub type Result<T> = std::result::Result<T, ForgeError>;

impl From<std::io::Error> for ForgeError {
    fn from(err: std::io::Error) -> Self {
        ForgeError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl ForgeError {
    /// Create an IO error with a short description of what was being done.
    pub fn io(context: &str, path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        ForgeError::Io {
            message: format!("{context}: {err}"),
            path: Some(path.into()),
            source: Some(err),
        }
    }
}
