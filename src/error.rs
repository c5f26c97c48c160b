//! Error types for treegate
//!
//! This module defines the error hierarchy used throughout the application.
//! We use `thiserror` for library-style errors that are part of the API.
//! Nothing in the rewrite layer is fatal: a failed rewrite degrades to
//! "return the original response" at the call site, with the error logged.

use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Back-office API error: {0}")]
    Backend(#[from] BackendError),

    #[error("Start node lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {field}")]
    Missing { field: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Back-office upstream API errors
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Back-office API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Unauthorized: invalid or expired upstream token")]
    Unauthorized,

    #[error("Invalid response from back-office API: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    /// Create an appropriate error from an HTTP status code and response body
    pub fn from_response(status: u16, body: &str) -> Self {
        match status {
            401 => BackendError::Unauthorized,
            404 => BackendError::NotFound {
                resource: "requested resource".into(),
            },
            _ => BackendError::Api {
                status,
                message: if body.is_empty() {
                    format!("HTTP {}", status)
                } else {
                    body.to_string()
                },
            },
        }
    }
}

/// A hierarchy path string contained a token that is not an integer.
///
/// Paths arrive from the host as comma-joined id lists (`"-1,1054,2001"`);
/// anything else is a contract violation of the host response and is
/// surfaced as this error rather than a panic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed hierarchy path '{path}': invalid token '{token}'")]
pub struct PathError {
    pub path: String,
    pub token: String,
}

/// Start node assignment lookup errors
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Back-office API error: {0}")]
    Backend(#[from] BackendError),

    #[error("Assignment store error: {0}")]
    Store(String),
}

/// Errors raised while rewriting an intercepted response body.
///
/// These never escape the dispatcher: any variant is caught, logged,
/// and the original response body is returned unmodified.
#[derive(Error, Debug)]
pub enum RewriteError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("unexpected response shape: {0}")]
    Shape(#[from] serde_json::Error),

    #[error("response body is not valid UTF-8")]
    NotText,

    #[error("Back-office API error: {0}")]
    Backend(#[from] BackendError),
}

/// Errors raised by tree/menu filters and the upload guard
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Start node lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("Back-office API error: {0}")]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Path(#[from] PathError),
}

/// Session resolution errors
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("missing '{header}' header")]
    MissingHeader { header: String },

    #[error("invalid value in '{header}' header")]
    InvalidHeader { header: String },
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for back-office API operations
pub type BackendResult<T> = std::result::Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_from_response() {
        assert!(matches!(
            BackendError::from_response(401, ""),
            BackendError::Unauthorized
        ));

        assert!(matches!(
            BackendError::from_response(404, ""),
            BackendError::NotFound { .. }
        ));

        let api_err = BackendError::from_response(500, "Internal server error");
        assert!(matches!(api_err, BackendError::Api { status: 500, .. }));

        let api_err = BackendError::from_response(502, "");
        match api_err {
            BackendError::Api { message, .. } => assert_eq!(message, "HTTP 502"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_path_error_display() {
        let err = PathError {
            path: "-1,abc,5".to_string(),
            token: "abc".to_string(),
        };
        assert!(err.to_string().contains("'abc'"));
        assert!(err.to_string().contains("-1,abc,5"));
    }
}
