//! Error types for skillkit
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use crate::http::ApiError;
use thiserror::Error;

/// Maximum number of characters of a response body kept in an error
pub const BODY_SNIPPET_LIMIT: usize = 500;

/// The main error type for skillkit
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Unknown account '{selector}' (available: {})", available.join(", "))]
    UnknownAccount {
        selector: String,
        available: Vec<String>,
    },

    #[error("Multiple accounts configured and none selected (available: {})", available.join(", "))]
    AmbiguousAccount { available: Vec<String> },

    #[error("Unknown environment '{name}' (available: {})", available.join(", "))]
    UnknownEnvironment {
        name: String,
        available: Vec<String>,
    },

    // ============================================================================
    // Request Errors
    // ============================================================================
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    #[error("Rate limit persisted after {attempts} attempts: {message}")]
    RateLimited { message: String, attempts: u32 },

    #[error("Deadline exceeded after {attempts} attempts{}", last_failure(last_error.as_deref()))]
    DeadlineExceeded {
        attempts: u32,
        /// Failure of the attempt that would have been retried
        last_error: Option<Box<Error>>,
    },

    // ============================================================================
    // Response Errors
    // ============================================================================
    #[error("API returned errors: {}", join_messages(errors))]
    Application { errors: Vec<ApiError> },

    #[error("Unexpected response shape at '{path}': {message}")]
    Shape { path: String, message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create an HTTP status error, truncating the body to a short snippet
    pub fn http_status(status: u16, body: impl AsRef<str>) -> Self {
        Self::HttpStatus {
            status,
            body: snippet(body.as_ref()),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a deadline error carrying the last retryable failure
    pub fn deadline(attempts: u32, last_error: Option<Error>) -> Self {
        Self::DeadlineExceeded {
            attempts,
            last_error: last_error.map(Box::new),
        }
    }

    /// Create a shape error
    pub fn shape(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Shape {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Check if this error belongs to the transient transport class
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => !e.is_builder(),
            Error::Decode { .. } | Error::RateLimited { .. } => true,
            Error::HttpStatus { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }
}

/// Check if an HTTP status code is retryable (429 or any 5xx)
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || status >= 500
}

/// Truncate a body to [`BODY_SNIPPET_LIMIT`] characters
pub fn snippet(body: &str) -> String {
    match body.char_indices().nth(BODY_SNIPPET_LIMIT) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

fn last_failure(error: Option<&Error>) -> String {
    error.map(|e| format!(" (last error: {e})")).unwrap_or_default()
}

fn join_messages(errors: &[ApiError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for skillkit
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
