//! Completion-layer error kinds and value helpers.
//!
//! ```rust
//! use wmodel::CompletionError;
//!
//! let invalid = CompletionError::invalid_request("missing model");
//! assert!(!invalid.retryable);
//!
//! let transport = CompletionError::transport("connection reset");
//! assert!(transport.retryable);
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionErrorKind {
    Authentication,
    RateLimited,
    InvalidRequest,
    Timeout,
    Transport,
    Protocol,
    Unavailable,
    Other,
}

impl CompletionErrorKind {
    /// Transient transport-level trouble can be retried with the same
    /// request; protocol violations and rejected requests cannot.
    fn retryable_by_default(self) -> bool {
        matches!(
            self,
            CompletionErrorKind::RateLimited
                | CompletionErrorKind::Timeout
                | CompletionErrorKind::Transport
                | CompletionErrorKind::Unavailable
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionError {
    pub kind: CompletionErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl CompletionError {
    pub fn new(kind: CompletionErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
        }
    }

    fn of_kind(kind: CompletionErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind, message, kind.retryable_by_default())
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::of_kind(CompletionErrorKind::Authentication, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::of_kind(CompletionErrorKind::RateLimited, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::of_kind(CompletionErrorKind::InvalidRequest, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::of_kind(CompletionErrorKind::Timeout, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::of_kind(CompletionErrorKind::Transport, message)
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::of_kind(CompletionErrorKind::Protocol, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::of_kind(CompletionErrorKind::Unavailable, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::of_kind(CompletionErrorKind::Other, message)
    }
}

impl Display for CompletionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for CompletionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_kinds_default_to_retryable() {
        for error in [
            CompletionError::rate_limited("slow down"),
            CompletionError::timeout("deadline"),
            CompletionError::transport("reset"),
            CompletionError::unavailable("overloaded"),
        ] {
            assert!(error.retryable, "{error} should be retryable");
        }

        for error in [
            CompletionError::authentication("bad key"),
            CompletionError::invalid_request("missing model"),
            CompletionError::protocol("garbled frame"),
            CompletionError::other("misc"),
        ] {
            assert!(!error.retryable, "{error} should not be retryable");
        }
    }
}
