//! Error types for the preprocessing configuration model.
//!
//! Advisory findings (conflicting features, missing requirements, ML-ready
//! shortfalls) are plain values, see [`crate::rules::ValidationResult`] and
//! [`crate::ml_ready::MlReadyViolation`]. This module covers operational
//! failures: rejected editor events, unknown inputs, blocked submissions and
//! backend API errors.
//!
//! Errors are serializable as `{code, message}` so a frontend can show them
//! directly.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

use crate::editor::ConfigMode;
use crate::types::ColumnType;

/// The main error type for configuration editing and submission.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An event was sent that only makes sense in the other mode.
    #[error("{event} is not allowed in {mode} mode")]
    ModeMismatch {
        mode: ConfigMode,
        event: &'static str,
    },

    /// Column was not found among the loaded column descriptors.
    #[error("Column '{0}' not found in dataset")]
    UnknownColumn(String),

    /// Options of one data type were sent for a column of another.
    #[error("Column '{column}' is {expected}, but {actual} options were provided")]
    ColumnTypeMismatch {
        column: String,
        expected: ColumnType,
        actual: ColumnType,
    },

    /// The backend reported a data type label this crate does not know.
    #[error("Unknown preprocessing data type '{0}'")]
    UnknownDataType(String),

    /// The requested output filename is not acceptable.
    #[error("Invalid output filename '{0}'")]
    InvalidOutputFilename(String),

    /// Submission was blocked by validation findings.
    #[error("Preprocessing blocked by {} validation error(s)", .0.len())]
    SubmissionBlocked(Vec<String>),

    /// No session has been started (or the user signed out).
    #[error("No active session")]
    NoSession,

    /// No file is open in the current session.
    #[error("No file open")]
    NoFileOpen,

    /// Invalid settings provided.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// The backend API answered with an error.
    #[error("API error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Api {
        status: Option<u16>,
        message: String,
    },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport error (only with the "api" feature).
    #[cfg(feature = "api")]
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ConfigError>,
    },
}

impl ConfigError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ConfigError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error code for frontend handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ModeMismatch { .. } => "MODE_MISMATCH",
            Self::UnknownColumn(_) => "UNKNOWN_COLUMN",
            Self::ColumnTypeMismatch { .. } => "COLUMN_TYPE_MISMATCH",
            Self::UnknownDataType(_) => "UNKNOWN_DATA_TYPE",
            Self::InvalidOutputFilename(_) => "INVALID_OUTPUT_FILENAME",
            Self::SubmissionBlocked(_) => "SUBMISSION_BLOCKED",
            Self::NoSession => "NO_SESSION",
            Self::NoFileOpen => "NO_FILE_OPEN",
            Self::InvalidSettings(_) => "INVALID_SETTINGS",
            Self::Api { .. } => "API_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            #[cfg(feature = "api")]
            Self::HttpRequest(_) => "HTTP_REQUEST_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Blocking messages carried by a rejected submission, if any.
    pub fn blocking_messages(&self) -> &[String] {
        match self {
            Self::SubmissionBlocked(messages) => messages,
            Self::WithContext { source, .. } => source.blocking_messages(),
            _ => &[],
        }
    }

    /// Check if the user can fix this and retry without re-entering options.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::WithContext { source, .. } => source.is_recoverable(),
            Self::Io(_) | Self::Json(_) => false,
            _ => true,
        }
    }
}

/// Serialized as a struct with `code` and `message` fields.
impl Serialize for ConfigError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ConfigError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, serde_json::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ConfigError::Json(e).with_context(context))
    }
}
