//! Error types for SparkPost operations.
//!
//! Every non-success HTTP response is surfaced as [`Error::Api`], which carries the
//! status code and the messages parsed from the `errors` array of the response body.
//! The remaining variants cover transport, decoding and configuration failures.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Main error type for SparkPost operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The API answered with a non-success status
    #[error("{0}")]
    Api(ApiError),

    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Operation timed out
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Could not connect to the API host
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Response or payload was not valid JSON for the expected shape
    #[error("JSON error: {0}")]
    JsonError(String),

    /// Invalid endpoint or request path
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Specialized result type for SparkPost operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A single entry of the `errors` array returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    /// Short error message
    pub message: String,
    /// Longer explanation, when the API provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Vendor error code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl fmt::Display for ApiErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.description {
            Some(description) => write!(f, "{}: {description}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Failure response from the SparkPost API.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    /// HTTP status of the response
    pub status: StatusCode,
    /// URI that was called
    pub uri: String,
    /// Errors parsed from the response body (empty if the body had none)
    pub errors: Vec<ApiErrorDetail>,
    /// Raw response body
    pub body: String,
}

impl ApiError {
    /// Build an API error from a response status and its body text.
    ///
    /// Bodies that are not JSON, or JSON without an `errors` array, yield an empty
    /// error list; the raw text is always kept in [`ApiError::body`].
    #[must_use]
    pub fn new(status: StatusCode, uri: impl Into<String>, body: impl Into<String>) -> Self {
        let body = body.into();
        let errors = parse_error_details(&body);
        Self {
            status,
            uri: uri.into(),
            errors,
            body,
        }
    }

    /// Returns true if the API reported that the resource does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }

    /// Returns the error messages, one per entry of the `errors` array.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Call to {} returned {}, errors: [{}]",
            self.uri,
            self.status.as_u16(),
            self.messages().join(", ")
        )
    }
}

fn parse_error_details(body: &str) -> Vec<ApiErrorDetail> {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return Vec::new();
    };

    let Some(entries) = value.get("errors").and_then(Value::as_array) else {
        return Vec::new();
    };

    entries
        .iter()
        .map(|entry| ApiErrorDetail {
            message: entry
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            description: entry
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            // codes are documented as strings but older endpoints send numbers
            code: entry.get("code").and_then(|code| match code {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }),
        })
        .collect()
}

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Api(err) if err.is_not_found() => "NOT_FOUND",
            Self::Api(_) => "API_ERROR",
            Self::HttpError(_) => "HTTP_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::JsonError(_) => "JSON_ERROR",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::ValidationError(_) => "VALIDATION_ERROR",
        }
    }

    /// HTTP status of an API failure.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api(err) => Some(err.status),
            _ => None,
        }
    }

    /// Returns true for API failures with status 404.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api(err) if err.is_not_found())
    }

    /// Returns true if repeating the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api(err) => {
                err.status == StatusCode::TOO_MANY_REQUESTS || err.status.is_server_error()
            }
            Self::Timeout(_) | Self::ServiceUnavailable(_) => true,
            _ => false,
        }
    }
}

impl From<ApiError> for Error {
    fn from(err: ApiError) -> Self {
        Self::Api(err)
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::ServiceUnavailable(err.to_string())
        } else if err.is_decode() {
            Self::JsonError(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}
