//! Diagnostics for the decorator lowering pass.
//!
//! Two failure classes exist (and only two): a programmer error in user
//! code — writing to a decorated private method — and configuration errors
//! reported once at pass construction. Everything else either succeeds or
//! propagates a host error.

use serde::{Deserialize, Serialize};

use crate::span::Span;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Suggestion,
    Message,
}

/// Diagnostic codes owned by this pass.
pub mod codes {
    /// Write (assignment, update, destructuring target) to a decorated
    /// private method.
    pub const DECORATED_PRIVATE_METHOD_WRITE: u32 = 9501;
    /// Decorator version string not in the supported set.
    pub const UNKNOWN_DECORATOR_VERSION: u32 = 9502;
    /// Host compiler version too old for the requested decorator version.
    pub const HOST_VERSION_TOO_OLD: u32 = 9503;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub code: u32,
    pub span: Span,
    pub message_text: String,
}

impl Diagnostic {
    pub fn error(span: Span, message: impl Into<String>, code: u32) -> Self {
        Self {
            category: DiagnosticCategory::Error,
            code,
            span,
            message_text: message.into(),
        }
    }

    /// Configuration errors have no source location.
    pub fn config_error(message: impl Into<String>, code: u32) -> Self {
        Self::error(Span::dummy(), message, code)
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "error DL{}: {}", self.code, self.message_text)
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_constructor() {
        let d = Diagnostic::error(
            Span::new(4, 6),
            "bad write",
            codes::DECORATED_PRIVATE_METHOD_WRITE,
        );
        assert_eq!(d.category, DiagnosticCategory::Error);
        assert_eq!(d.code, codes::DECORATED_PRIVATE_METHOD_WRITE);
        assert_eq!(d.span, Span::new(4, 6));
    }

    #[test]
    fn test_config_error_has_dummy_span() {
        let d = Diagnostic::config_error("unknown version", codes::UNKNOWN_DECORATOR_VERSION);
        assert!(d.span.is_dummy());
        assert!(d.to_string().contains("9502"));
    }
}
