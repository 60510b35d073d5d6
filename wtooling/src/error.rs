//! Error type shared by tool registration, validation, and execution.

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolErrorKind {
    NotFound,
    InvalidArguments,
    Execution,
    Timeout,
    Protocol,
    Other,
}

impl ToolErrorKind {
    /// Only timeouts are worth retrying unchanged; every other kind needs a
    /// different request or a fixed tool first.
    fn retryable_by_default(self) -> bool {
        matches!(self, ToolErrorKind::Timeout)
    }
}

/// A classified tool failure, optionally tagged with the tool name and call
/// id it belongs to so hook consumers can correlate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub message: String,
    pub retryable: bool,
    pub tool_name: Option<String>,
    pub tool_call_id: Option<String>,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
            tool_name: None,
            tool_call_id: None,
        }
    }

    fn of_kind(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind, message, kind.retryable_by_default())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::of_kind(ToolErrorKind::NotFound, message)
    }

    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::of_kind(ToolErrorKind::InvalidArguments, message)
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::of_kind(ToolErrorKind::Execution, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::of_kind(ToolErrorKind::Timeout, message)
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::of_kind(ToolErrorKind::Protocol, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::of_kind(ToolErrorKind::Other, message)
    }

    pub fn with_tool_name(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = Some(tool_name.into());
        self
    }

    pub fn with_tool_call_id(mut self, tool_call_id: impl Into<String>) -> Self {
        self.tool_call_id = Some(tool_call_id.into());
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    /// True when the caller supplied a bad request rather than the tool
    /// itself failing.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self.kind,
            ToolErrorKind::InvalidArguments | ToolErrorKind::NotFound
        )
    }
}

impl Display for ToolError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(tool_name) = &self.tool_name {
            write!(f, " [tool={tool_name}")?;
            if let Some(tool_call_id) = &self.tool_call_id {
                write!(f, ", call_id={tool_call_id}")?;
            }
            f.write_str("]")?;
        }
        write!(f, ": {}", self.message)
    }
}

impl Error for ToolError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_timeouts_are_retryable_by_default() {
        assert!(ToolError::timeout("slow").is_retryable());

        for error in [
            ToolError::not_found("missing"),
            ToolError::invalid_arguments("bad args"),
            ToolError::execution("boom"),
            ToolError::protocol("garbled"),
            ToolError::other("misc"),
        ] {
            assert!(!error.is_retryable(), "{error} should not be retryable");
        }
    }

    #[test]
    fn user_errors_cover_bad_requests_only() {
        assert!(ToolError::invalid_arguments("bad args").is_user_error());
        assert!(ToolError::not_found("missing").is_user_error());
        assert!(!ToolError::execution("boom").is_user_error());
        assert!(!ToolError::timeout("slow").is_user_error());
    }

    #[test]
    fn display_nests_call_context_after_the_kind() {
        let bare = ToolError::execution("boom");
        assert_eq!(bare.to_string(), "Execution: boom");

        let named = ToolError::execution("boom").with_tool_name("get_commerce_offers");
        assert_eq!(named.to_string(), "Execution [tool=get_commerce_offers]: boom");

        let full = named.with_tool_call_id("call_7");
        assert_eq!(
            full.to_string(),
            "Execution [tool=get_commerce_offers, call_id=call_7]: boom"
        );
    }
}
