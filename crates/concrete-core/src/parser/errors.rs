//! Error formatting for parser errors
//!
//! Converts Chumsky parser errors into user-friendly diagnostic messages

use crate::ast::Span;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use chumsky::error::{Rich, RichReason};

/// Convert Chumsky error reason to readable message
pub fn format_error_reason(reason: &RichReason<char>) -> String {
    match reason {
        RichReason::ExpectedFound { found, .. } => match found {
            Some(c) => format!("unexpected '{}'", c.escape_debug()),
            None => "unexpected end of input".to_string(),
        },
        RichReason::Custom(msg) => msg.to_string(),
    }
}

/// Convert Chumsky parse errors to diagnostics
pub fn errors_to_diagnostics(errors: Vec<Rich<char>>, filename: &str) -> Vec<Diagnostic> {
    errors
        .into_iter()
        .map(|e| {
            let span = Span::new(e.span().start, e.span().end);
            let message = format_error_reason(e.reason());
            let mut diag = Diagnostic::error(
                DiagnosticKind::Parse,
                message.clone(),
                span,
                filename.to_string(),
            );

            if message == "unexpected end of input" {
                diag = diag.with_help("Did you forget to close a tape with ']'?".to_string());
            }

            diag
        })
        .collect()
}
