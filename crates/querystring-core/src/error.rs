//! Error types for querystring rendering.
//!
//! Every failure aborts the render call it happened in: either a complete
//! query string is produced or one of these errors is returned before any
//! output exists.

use serde::Serialize;
use thiserror::Error;

/// Main error type for querystring operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Malformed instruction list (conflicting markers, bad operator, misused option)
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// A value could not be turned into a parameter token
    #[error("Normalization error: {0}")]
    Normalization(String),

    /// Both ONLY and DISCARD reached the mutation engine
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Source data of a kind that cannot seed a store
    #[error("Unsupported source data: {0}")]
    UnsupportedSource(String),

    /// Render options failed validation
    #[error("Invalid render options: {0}")]
    InvalidOptions(String),
}

/// Specialized result type for querystring operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Structured error response for hosts that report tag failures as data.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorResponse {
    /// Error details
    pub error: ErrorDetail,
    /// Optional name of the template the failing tag belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

/// Error detail structure.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorDetail {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Syntax(_) => "SYNTAX_ERROR",
            Self::Normalization(_) => "NORMALIZATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::UnsupportedSource(_) => "UNSUPPORTED_SOURCE",
            Self::InvalidOptions(_) => "INVALID_OPTIONS",
        }
    }

    /// Converts the error into an `ErrorResponse`.
    #[must_use]
    pub fn into_error_response(self) -> ErrorResponse {
        self.into_error_response_for(None)
    }

    /// Converts the error into an `ErrorResponse` naming the failing template.
    #[must_use]
    pub fn into_error_response_for(self, template: Option<String>) -> ErrorResponse {
        ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
            },
            template,
        }
    }

    /// Returns true if this error points at a bug in the caller rather than bad template input.
    #[must_use]
    pub const fn is_programming_error(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::InvalidOptions(_))
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::InvalidOptions(err.to_string())
    }
}
