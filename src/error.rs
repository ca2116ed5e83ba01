//! Structured error types for board commands and storage backends.

use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    MissingRequiredField,
    InvalidFieldValue,
    InvalidTarget,

    // Not found errors
    ProjectNotFound,
    NodeNotFound,

    // Internal errors
    StorageFailed,
    InternalError,
}

/// Structured error for rejected commands.
///
/// A command that returns one of these has left the registry untouched.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CoreError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl CoreError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    // Convenience constructors

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{} is required", field),
        )
        .with_field(field)
    }

    pub fn invalid_value(field: &str, reason: &str) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, reason).with_field(field)
    }

    pub fn invalid_target(node_id: &str, reason: &str) -> Self {
        Self::new(
            ErrorCode::InvalidTarget,
            format!("Node {}: {}", node_id, reason),
        )
    }

    pub fn project_not_found(project_id: &str) -> Self {
        Self::new(
            ErrorCode::ProjectNotFound,
            format!("Project not found: {}", project_id),
        )
    }

    pub fn node_not_found(node_id: &str) -> Self {
        Self::new(
            ErrorCode::NodeNotFound,
            format!("Node not found: {}", node_id),
        )
    }

    pub fn storage(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::StorageFailed, err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }

    /// Whether the command was rejected because of its input rather than
    /// the environment.
    pub fn is_user_error(&self) -> bool {
        !matches!(
            self.code,
            ErrorCode::StorageFailed | ErrorCode::InternalError
        )
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CoreError {}

impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io { .. } => CoreError::storage(err),
            // The registry always encodes; a failure here is a bug, not the disk.
            StorageError::Serialize { .. } => CoreError::internal(err),
        }
    }
}

/// Result type for board commands.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Failures raised by a [`crate::store::Storage`] backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O failed for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode value for key '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}
