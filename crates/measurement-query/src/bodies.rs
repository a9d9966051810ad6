//! Client-facing response bodies.

use serde::{Deserialize, Serialize};

use climate_common::{ClimateError, Measurement};

/// Body of `GET /api/measurements`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitiesResponse {
    pub cities: Vec<Measurement>,
}

/// Error body, always in list form: `{"errors": ["..."]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub errors: Vec<String>,
}

impl ErrorResponse {
    pub fn new(errors: Vec<String>) -> Self {
        Self { errors }
    }

    pub fn single(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
        }
    }
}

impl From<&ClimateError> for ErrorResponse {
    fn from(err: &ClimateError) -> Self {
        Self::new(err.messages())
    }
}
