//! Core error types for flowfocus-core.
//!
//! Nothing in the notification subsystem is fatal. These errors surface at
//! module boundaries so callers can log them, and the service layer turns
//! every one of them into "no notification exists".

use std::path::PathBuf;
use thiserror::Error;

use crate::planner::SemanticType;

/// Core error type for flowfocus-core.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Reading or writing the settings file failed
    #[error("Storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Data directory could not be resolved or created
    #[error("Failed to access data directory: {0}")]
    DataDir(String),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A call into the OS notification subsystem failed
    #[error("Notification backend failed during {operation}: {message}")]
    Backend {
        operation: &'static str,
        message: String,
    },

    /// Reminder time was not a valid "HH:MM" wall-clock time
    #[error("Invalid reminder time '{0}': expected HH:MM with 0<=HH<24 and 0<=MM<60")]
    InvalidReminderTime(String),

    /// Settings key does not name a boolean notification setting
    #[error("Unknown notification setting: {0}")]
    UnknownSetting(String),

    /// Descriptor trigger does not match its semantic type
    #[error("Invalid descriptor for {kind}: {message}")]
    InvalidDescriptor { kind: SemanticType, message: String },

    /// Previous handles of a recurring type could not all be cancelled
    #[error("{count} stale {kind} notification(s) could not be cancelled")]
    StaleHandles { kind: SemanticType, count: usize },
}

impl NotifyError {
    /// Shorthand for backend failures.
    pub fn backend(operation: &'static str, message: impl Into<String>) -> Self {
        NotifyError::Backend {
            operation,
            message: message.into(),
        }
    }
}

/// Result type alias for NotifyError
pub type Result<T, E = NotifyError> = std::result::Result<T, E>;
