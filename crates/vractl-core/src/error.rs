//! Unified error handling for vractl-core
//!
//! Wraps transport, API, validation, and polling failures with consistent
//! helper methods.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use vractl_core::CoreError;
//!
//! let err = CoreError::RequestTimeout(Duration::from_secs(600));
//! assert!(err.is_timeout());
//! assert!(!err.is_not_found());
//! ```

use std::time::Duration;
use thiserror::Error;

use crate::params::Violation;

/// Core error type for catalog and request operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// The platform answered with a non-success HTTP status
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The request never reached the platform, or the response was unreadable
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A response body did not have the expected shape
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Request did not complete within the configured wait time
    #[error("Request did not complete in {} seconds", .0.as_secs())]
    RequestTimeout(Duration),

    /// Request completed in the FAILED state
    #[error("The vRA request failed: {0}")]
    RequestFailed(String),

    /// One or more request options failed validation
    #[error("{}", format_violations(.0))]
    Validation(Vec<Violation>),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Progress output could not be written
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl CoreError {
    /// Returns true if this is a "not found" error (404)
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::Api { status: 404, .. })
    }

    /// Returns true if this is an authentication/authorization error (401/403)
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, CoreError::Api { status: 401 | 403, .. })
    }

    /// Returns true if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, CoreError::Api { status, .. } if *status >= 500)
    }

    /// Returns true if this is a timeout error
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            CoreError::Http(e) => e.is_timeout(),
            CoreError::RequestTimeout(_) => true,
            _ => false,
        }
    }

    /// Returns true if the request never reached the platform
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        match self {
            CoreError::Http(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }
}
