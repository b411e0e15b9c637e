//! Error types for the webhook library

use std::time::Duration;
use thiserror::Error;

/// Failure while querying the metrics backend
///
/// These never reach the admission caller; `UsageSource` implementations
/// collapse them into an absent observation.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid metrics backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("metrics backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("metrics backend returned HTTP {0}")]
    HttpStatus(u16),

    #[error("metrics backend reported {error_type}: {error}")]
    Backend { error_type: String, error: String },

    #[error("metrics backend value is not a number: {0:?}")]
    InvalidValue(String),

    #[error("metrics query timed out after {0:?}")]
    Timeout(Duration),
}

/// Admission review that cannot be answered
#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("malformed AdmissionReview: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("AdmissionReview has no request")]
    MissingRequest,
}
