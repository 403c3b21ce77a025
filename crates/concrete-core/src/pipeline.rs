//! Parse → load → run, with errors from every stage in one type

use crate::ast::{Block, Tape};
use crate::diagnostics::Diagnostic;
use crate::parser;
use crate::vm::value::to_host_values;
use crate::vm::{
    ConversionError, Engine, EngineConfig, EngineError, Failure, HostValue, Runner,
};
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("parse failed with {} error(s)", .0.len())]
    Parse(Vec<Diagnostic>),
    #[error(transparent)]
    Runtime(Box<Failure>),
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl PipelineError {
    /// One line per error, without source snippets
    pub fn format_display(&self) -> String {
        match self {
            PipelineError::Parse(diagnostics) => diagnostics
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n"),
            other => other.to_string(),
        }
    }

    /// Format with caret-underlined source snippets where locations are known
    pub fn format_with_source(&self, source: &str, filename: &str) -> String {
        match self {
            PipelineError::Parse(diagnostics) => diagnostics
                .iter()
                .map(|d| d.format(source))
                .collect::<Vec<_>>()
                .join("\n"),
            PipelineError::Runtime(failure) => failure.format_with_source(source, filename),
            other => format!("error: {other}"),
        }
    }
}

pub struct Pipeline {
    source: String,
    filename: String,
    config: EngineConfig,
}

impl Pipeline {
    pub fn new(source: String, filename: String) -> Self {
        Pipeline {
            source,
            filename,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn parse(&self) -> Result<Rc<Tape>, PipelineError> {
        parser::parse(&self.source, &self.filename).map_err(PipelineError::Parse)
    }

    /// A fresh engine carrying this pipeline's configuration
    pub fn engine(&self) -> Engine {
        Engine::with_config(self.config)
    }

    /// Run `tape` to completion on `engine`
    pub fn execute_with_engine(
        &self,
        tape: Rc<Tape>,
        engine: Engine,
    ) -> Result<Vec<Block>, PipelineError> {
        let mut runner = Runner::new(engine);
        runner.load_program(tape)?;
        runner
            .run()?
            .into_result()
            .map_err(PipelineError::Runtime)
    }

    /// Parse and run, with `install` populating the engine's executors.
    /// Empty programs finish without starting an engine.
    pub fn run_with(
        &self,
        install: impl FnOnce(&mut Engine),
    ) -> Result<Vec<HostValue>, PipelineError> {
        let tape = self.parse()?;
        if tape.is_empty() {
            return Ok(Vec::new());
        }

        let mut engine = self.engine();
        install(&mut engine);
        let results = self.execute_with_engine(tape, engine)?;
        Ok(to_host_values(&results)?)
    }
}
