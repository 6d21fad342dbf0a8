//! Error types for the site canary

use std::fmt;

pub type Result<T> = std::result::Result<T, CanaryError>;

#[derive(Debug)]
pub enum CanaryError {
    /// IO operation failed
    Io(std::io::Error),

    /// HTTP request failed
    Http(reqwest::Error),

    /// JSON serialization/deserialization failed
    Json(serde_json::Error),

    /// Configuration error
    Config(String),

    /// Target list missing or not a list of strings
    TargetList { path: String, reason: String },

    /// Metrics sink rejected or failed to accept a batch
    Emission(String),

    /// Generic error with message
    Other(String),
}

impl CanaryError {
    /// Whether this error aborts an invocation before any probing happens
    pub fn is_configuration(&self) -> bool {
        matches!(self, CanaryError::Config(_) | CanaryError::TargetList { .. })
    }
}

impl fmt::Display for CanaryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanaryError::Io(err) => write!(f, "IO error: {}", err),
            CanaryError::Http(err) => write!(f, "HTTP error: {}", err),
            CanaryError::Json(err) => write!(f, "JSON error: {}", err),
            CanaryError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CanaryError::TargetList { path, reason } => {
                write!(f, "Configuration error: target list {}: {}", path, reason)
            }
            CanaryError::Emission(msg) => write!(f, "Emission error: {}", msg),
            CanaryError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for CanaryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CanaryError::Io(err) => Some(err),
            CanaryError::Http(err) => Some(err),
            CanaryError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CanaryError {
    fn from(err: std::io::Error) -> Self {
        CanaryError::Io(err)
    }
}

impl From<reqwest::Error> for CanaryError {
    fn from(err: reqwest::Error) -> Self {
        CanaryError::Http(err)
    }
}

impl From<serde_json::Error> for CanaryError {
    fn from(err: serde_json::Error) -> Self {
        CanaryError::Json(err)
    }
}
