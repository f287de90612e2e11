//! File loader error types.

use thiserror::Error;

/// Loader error variants.
#[derive(Debug, Clone, Error)]
#[allow(missing_docs)]
pub enum LoaderError {
    #[error("no address for {target}")]
    Unresolvable { target: String },

    #[error("invalid url: {reason}")]
    InvalidUrl { reason: String },

    #[error("network error: {message}")]
    Network { message: String },

    #[error("server returned HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("not in local cache and cloud loading is disabled")]
    NotCachedLocally,

    #[error("no async runtime available: {message}")]
    Runtime { message: String },
}

impl LoaderError {
    /// Creates unresolvable target error.
    #[must_use]
    pub fn unresolvable(target: impl Into<String>) -> Self {
        Self::Unresolvable {
            target: target.into(),
        }
    }

    /// Creates invalid url error.
    #[must_use]
    pub fn invalid_url(reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            reason: reason.into(),
        }
    }

    /// Creates network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates runtime error.
    #[must_use]
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
        }
    }

    /// Returns whether a later retry may succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Network { .. } | Self::NotCachedLocally => true,
            Self::HttpStatus { status } => *status >= 500 || *status == 429,
            Self::Unresolvable { .. } | Self::InvalidUrl { .. } | Self::Runtime { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(LoaderError::network("reset").is_recoverable());
        assert!(LoaderError::HttpStatus { status: 503 }.is_recoverable());
        assert!(LoaderError::HttpStatus { status: 429 }.is_recoverable());
        assert!(!LoaderError::HttpStatus { status: 404 }.is_recoverable());
        assert!(!LoaderError::invalid_url("empty").is_recoverable());
    }
}
