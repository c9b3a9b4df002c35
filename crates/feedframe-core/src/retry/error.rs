//! Transport error type for retry classification.

use std::fmt;

use crate::error::FailureKind;

/// Error returned by a single HTTP exchange (curl failure or HTTP status).
/// Kept separate from `anyhow` so callers can classify and decide retries.
#[derive(Debug)]
pub enum FetchError {
    /// Curl reported an error (timeout, connection reset, DNS, etc.).
    Curl(curl::Error),
    /// The request could not be built (bad header, multipart part rejected).
    Request(String),
    /// HTTP response had a non-2xx status.
    Http(u32),
}

impl FetchError {
    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u32> {
        match self {
            FetchError::Http(code) => Some(*code),
            _ => None,
        }
    }

    pub fn kind(&self) -> FailureKind {
        if super::classify_upstream(self).is_retryable() {
            FailureKind::Transient
        } else {
            FailureKind::Fatal
        }
    }
}

impl From<curl::Error> for FetchError {
    fn from(e: curl::Error) -> Self {
        FetchError::Curl(e)
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Curl(e) => write!(f, "{}", e),
            FetchError::Request(msg) => write!(f, "invalid request: {}", msg),
            FetchError::Http(code) => write!(f, "HTTP {}", code),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Curl(e) => Some(e),
            FetchError::Request(_) | FetchError::Http(_) => None,
        }
    }
}
