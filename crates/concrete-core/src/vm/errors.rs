//! Error types for engine runtime errors

use super::snapshot::EngineSnapshot;
use super::value::ConversionError;
use crate::ast::{FrameId, Span};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use thiserror::Error;

/// Everything that can stop the engine. None of these are retried: the
/// engine moves to its terminal `error` state carrying a [`Failure`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid category of current block: {0}")]
    InvalidBlockCategory(String),

    #[error("no executor found for identifier '{0}'")]
    NoExecutorForIdentifier(String),

    #[error("missing reference '{0}'")]
    MissingReference(String),

    #[error("unknown label '{0}'")]
    UnknownLabel(String),

    #[error("unresolved label '{0}'")]
    UnresolvedLabel(String),

    #[error("inner tape called out of context, reference '{0}'")]
    ClosureCapturedOutOfContext(String),

    #[error("step budget of {0} steps exceeded")]
    StepBudgetExceeded(u64),

    #[error("expected an identifier, found {0}")]
    NotAnIdentifier(String),

    #[error("frame {0} is neither live nor closed")]
    FrameNotFound(FrameId),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// Raised by an executor, e.g. wrong arity or argument shape
    #[error("{0}")]
    Executor(String),

    /// A signal arrived in a state that does not accept it
    #[error("cannot {signal} while the engine is {state}")]
    NotSteppable { signal: &'static str, state: String },
}

impl EngineError {
    pub fn executor(message: impl Into<String>) -> Self {
        EngineError::Executor(message.into())
    }
}

/// Terminal error of one program run: the triggering error, the source
/// location of the block at head, and the full engine state for diagnosis
#[derive(Debug, Clone, Error)]
#[error("runtime error: {error}")]
pub struct Failure {
    pub error: EngineError,
    pub span: Option<Span>,
    pub snapshot: Box<EngineSnapshot>,
}

impl Failure {
    /// Convert to a diagnostic when a source location is known
    pub fn to_diagnostic(&self, filename: &str) -> Option<Diagnostic> {
        let span = self.span?;
        Some(
            Diagnostic::error(
                DiagnosticKind::Runtime,
                self.error.to_string(),
                span,
                filename.to_string(),
            )
            .with_note(format!(
                "engine stopped in state '{}' after {} steps",
                self.snapshot.state, self.snapshot.steps
            )),
        )
    }

    /// Format the failure with a source snippet if a location is known
    pub fn format_with_source(&self, source: &str, filename: &str) -> String {
        match self.to_diagnostic(filename) {
            Some(diagnostic) => diagnostic.format(source),
            None => self.to_string(),
        }
    }
}
