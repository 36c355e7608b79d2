//! Error types for the forge document store.
//!
//! Every failure the rename engine can report maps to one variant here, and
//! each variant maps to a process exit code for the operator CLI.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for forge store operations.
#[derive(Debug, Error)]
pub enum ForgeError {
    // Usage errors
    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Unknown identifier kind: {0}")]
    UnknownKind(String),

    #[error("Project not found: {project_id}")]
    ProjectNotFound { project_id: String },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error at {path:?}: {message}")]
    Json {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error("Refusing to rename {from} to {to}: destination already exists")]
    RenameCollision { from: PathBuf, to: PathBuf },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias for forge operations.
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

impl From<serde_json::Error> for ForgeError {
    fn from(err: serde_json::Error) -> Self {
        ForgeError::Json {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl ForgeError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        ForgeError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Create a parse error with path context.
    pub fn json_with_path(err: serde_json::Error, path: impl Into<PathBuf>) -> Self {
        ForgeError::Json {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ForgeError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// True for errors caused by operator input rather than store state.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            ForgeError::Validation { .. }
                | ForgeError::UnknownKind(_)
                | ForgeError::ProjectNotFound { .. }
        )
    }

    /// Convert to a process exit code.
    ///
    /// - 2: usage or validation error (same code clap uses for bad flags)
    /// - 1: store read, parse, write, rename or config failure
    pub fn exit_code(&self) -> i32 {
        if self.is_usage_error() {
            2
        } else {
            1
        }
    }
}
