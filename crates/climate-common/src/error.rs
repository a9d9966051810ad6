//! Error types for the climate measurement services.

use thiserror::Error;

/// Result type alias using ClimateError.
pub type ClimateResult<T> = Result<T, ClimateError>;

/// Primary error type for measurement operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClimateError {
    // === Request Errors ===
    #[error("Invalid date format for {field}: {value}")]
    InvalidDate { field: String, value: String },

    #[error("'from' has to be before 'to'")]
    InvalidRange,

    #[error("Invalid cities number: {0}")]
    InvalidLimit(String),

    #[error("Missing parameter {0}")]
    MissingKey(String),

    #[error("At least one of average_temperature, average_temperature_uncertainty must be supplied")]
    MissingUpdateField,

    #[error("Validation failed: {}", .0.join(", "))]
    ValidationFailed(Vec<String>),

    #[error("No measurement found for city {city} on {day}")]
    NotFound { city: String, day: String },

    // === Engine Errors ===
    #[error("Search engine does not seem to be reachable: {0}")]
    UpstreamUnavailable(String),

    #[error("Search engine request failed: {0}")]
    SearchFailed(String),

    #[error("Malformed search engine response: {0}")]
    MalformedResponse(String),

    // === Infrastructure Errors ===
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ClimateError {
    /// Shorthand for an invalid date in the named field.
    pub fn invalid_date(field: impl Into<String>, value: impl Into<String>) -> Self {
        ClimateError::InvalidDate {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Get the HTTP status code for this error.
    ///
    /// An unreachable engine is reported as 400 rather than a 5xx; clients
    /// already depend on that status.
    pub fn http_status_code(&self) -> u16 {
        match self {
            ClimateError::InvalidDate { .. }
            | ClimateError::InvalidRange
            | ClimateError::InvalidLimit(_)
            | ClimateError::MissingKey(_)
            | ClimateError::MissingUpdateField
            | ClimateError::ValidationFailed(_)
            | ClimateError::UpstreamUnavailable(_) => 400,

            ClimateError::NotFound { .. } => 404,

            ClimateError::SearchFailed(_) | ClimateError::MalformedResponse(_) => 502,

            ClimateError::Internal(_) => 500,
        }
    }

    /// Client-facing messages for this error.
    ///
    /// Validation failures expand to one message per violation, everything
    /// else is a single message.
    pub fn messages(&self) -> Vec<String> {
        match self {
            ClimateError::ValidationFailed(violations) => violations.clone(),
            other => vec![other.to_string()],
        }
    }

    /// Whether the error was caused by the search engine rather than the request.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            ClimateError::UpstreamUnavailable(_)
                | ClimateError::SearchFailed(_)
                | ClimateError::MalformedResponse(_)
        )
    }
}

impl From<serde_json::Error> for ClimateError {
    fn from(err: serde_json::Error) -> Self {
        ClimateError::MalformedResponse(format!("JSON error: {}", err))
    }
}
