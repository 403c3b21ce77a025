pub mod ast;
pub mod diagnostics;
pub mod parser;
pub mod pipeline;
pub mod vm;

// Re-export commonly used types for convenience
pub use ast::{Block, Tape, TapeBlock};
pub use diagnostics::{Diagnostic, Severity};
pub use pipeline::{Pipeline, PipelineError};
pub use vm::{Engine, EngineConfig, HostValue};
