// Common test utilities: running programs with captured output

use concrete_core::pipeline::{Pipeline, PipelineError};
use concrete_core::vm::HostValue;
use concrete_stdlib::{Output, run_pipeline};
use std::cell::RefCell;
use std::rc::Rc;

/// Output of one program run: its results and everything `print!` wrote
pub struct Captured {
    pub results: Result<Vec<HostValue>, PipelineError>,
    pub printed: String,
}

pub fn run_captured(source: &str) -> Captured {
    let buffer = Rc::new(RefCell::new(Vec::new()));
    let output: Output = buffer.clone();
    let pipeline = Pipeline::new(source.to_string(), "test.concrete".to_string());
    let results = run_pipeline(&pipeline, output);
    let printed = String::from_utf8(buffer.borrow().clone()).expect("print! wrote invalid UTF-8");
    Captured { results, printed }
}

pub fn run(source: &str) -> Vec<HostValue> {
    match run_captured(source).results {
        Ok(results) => results,
        Err(e) => panic!("program failed: {}\n{}", e.format_display(), source),
    }
}

pub fn numbers(values: &[f64]) -> Vec<HostValue> {
    values.iter().copied().map(HostValue::Number).collect()
}
