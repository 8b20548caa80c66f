//! Error types.

use std::time::Duration;
use thiserror::Error;

/// Result alias for lookup operations.
pub type Result<T> = std::result::Result<T, ResolverError>;

/// Errors returned to callers of [`DnsResolver`](crate::DnsResolver).
#[derive(Debug, Error)]
pub enum ResolverError {
    /// The host string is empty or not a syntactically valid name.
    /// No network query was issued.
    #[error("invalid host {host:?}: {reason}")]
    InvalidInput {
        /// The rejected input.
        host: String,
        /// What was wrong with it.
        reason: &'static str,
    },

    /// Every candidate in the primary tier and the last-resort tier failed.
    #[error("no configured resolver could resolve {host}")]
    Exhausted {
        /// The host that was looked up.
        host: String,
    },

    /// The optional overall deadline elapsed before any candidate answered.
    #[error("resolving {host} exceeded the overall deadline of {timeout:?}")]
    DeadlineExceeded {
        /// The host that was looked up.
        host: String,
        /// The configured deadline.
        timeout: Duration,
    },

    /// The blocking wrapper was called from within an async runtime.
    #[error("blocking lookup called from within an async runtime")]
    InsideRuntime,

    /// The blocking wrapper could not start its runtime.
    #[error("runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

impl ResolverError {
    /// Returns `true` if the lookup ran out of candidates.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    /// Returns `true` if the host was rejected before any query.
    #[must_use]
    pub const fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }
}

/// Why a single candidate server failed.
///
/// These are recovered inside the engine and drive the fallback loop; they
/// are public so [`Transport`](crate::Transport) implementations can report them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    /// The server did not answer within the attempt window.
    #[error("{endpoint}: timed out")]
    Timeout {
        /// Dialed endpoint.
        endpoint: String,
    },

    /// Socket or protocol level failure.
    #[error("{endpoint}: {message}")]
    Transport {
        /// Dialed endpoint.
        endpoint: String,
        /// Underlying error text.
        message: String,
    },

    /// The server answered without any address of the requested family.
    #[error("{endpoint}: no records")]
    NoRecords {
        /// Dialed endpoint.
        endpoint: String,
    },

    /// A server given by hostname could not itself be located.
    #[error("{endpoint}: server address could not be resolved")]
    UnresolvableServer {
        /// Formatted endpoint of the server.
        endpoint: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_names_host() {
        let err = ResolverError::Exhausted {
            host: "example.com".into(),
        };
        assert!(err.is_exhausted());
        assert!(!err.is_invalid_input());
        assert_eq!(
            err.to_string(),
            "no configured resolver could resolve example.com"
        );
    }

    #[test]
    fn attempt_error_display() {
        let err = AttemptError::Timeout {
            endpoint: "8.8.8.8:53".into(),
        };
        assert_eq!(err.to_string(), "8.8.8.8:53: timed out");
    }
}
