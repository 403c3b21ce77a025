pub mod builtins;

use concrete_core::pipeline::{Pipeline, PipelineError};
use concrete_core::vm::{Engine, HostValue};
use std::cell::RefCell;
use std::rc::Rc;

// Re-export builtins for convenience
pub use builtins::{Builtin, BuiltinExecutor, Output};

/// Output sink writing to the process's stdout
pub fn stdout_output() -> Output {
    Rc::new(RefCell::new(std::io::stdout()))
}

/// Register every built-in operation on `engine`, with `print!` writing to
/// stdout
pub fn install(engine: &mut Engine) {
    install_with_output(engine, stdout_output());
}

/// Register every built-in operation on `engine`, with `print!` writing to
/// `output`
pub fn install_with_output(engine: &mut Engine, output: Output) {
    for builtin in Builtin::ALL {
        let executor = Rc::new(BuiltinExecutor::new(builtin, output.clone()));
        for identifier in builtin.identifiers() {
            engine.register_executor(*identifier, executor.clone());
        }
    }
}

/// Execute a Concrete program with the built-in operations installed.
/// This is a convenience function that creates a pipeline, parses and runs.
pub fn run_program(source: String, filename: String) -> Result<Vec<HostValue>, PipelineError> {
    let pipeline = Pipeline::new(source, filename);
    run_pipeline(&pipeline, stdout_output())
}

/// Run an already configured pipeline with `print!` writing to `output`
pub fn run_pipeline(pipeline: &Pipeline, output: Output) -> Result<Vec<HostValue>, PipelineError> {
    pipeline.run_with(|engine| install_with_output(engine, output))
}

/// Interpret source text and return the program's results as host values
pub fn interpret(source: &str) -> Result<Vec<HostValue>, PipelineError> {
    run_program(source.to_string(), "<input>".to_string())
}
