//! Run driver
//!
//! Sends step signals to one [`Engine`], either one at a time (`Mode::Pause`,
//! a debugger stepping through) or until the program ends (`Mode::Run`). A
//! step is only sent after the engine reported it is ready for one; in
//! `Mode::Run` every `ReadyToStep` is answered with the next step.

use super::engine::{Engine, Notification, State};
use super::errors::{EngineError, Failure};
use super::executor::Executor;
use crate::ast::{Block, Tape};
use std::rc::Rc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Pause,
    Run,
}

/// How a program ended
#[derive(Debug, Clone)]
pub enum Outcome {
    Halted(Vec<Block>),
    Errored(Box<Failure>),
}

impl Outcome {
    pub fn into_result(self) -> Result<Vec<Block>, Box<Failure>> {
        match self {
            Outcome::Halted(results) => Ok(results),
            Outcome::Errored(failure) => Err(failure),
        }
    }
}

pub struct Runner {
    engine: Engine,
    mode: Mode,
    ready: bool,
    outcome: Option<Outcome>,
}

impl Runner {
    pub fn new(engine: Engine) -> Self {
        Runner {
            engine,
            mode: Mode::default(),
            ready: false,
            outcome: None,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        debug!("runner mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
    }

    /// True when the last notification was `ReadyToStep`
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn register_executor(&mut self, identifier: impl Into<String>, executor: Rc<dyn Executor>) {
        self.engine.register_executor(identifier, executor);
    }

    /// Load a program. In `Mode::Run` it runs straight to the end.
    pub fn load_program(&mut self, tape: Rc<Tape>) -> Result<(), EngineError> {
        let notification = self.engine.load_program(tape)?;
        self.drive(notification)
    }

    /// Send a step. Refused unless the engine is ready for it. In
    /// `Mode::Pause` that is exactly one step.
    pub fn step(&mut self) -> Result<Option<&Outcome>, EngineError> {
        if !self.ready {
            return Err(EngineError::NotSteppable {
                signal: "step",
                state: self.waiting_on(),
            });
        }
        self.ready = false;
        let notification = self.engine.step()?;
        self.drive(notification)?;
        Ok(self.outcome.as_ref())
    }

    /// Switch to `Mode::Run` and step until the program ends
    pub fn run(&mut self) -> Result<Outcome, EngineError> {
        self.set_mode(Mode::Run);
        if self.outcome.is_none() {
            self.step()?;
        }
        self.outcome.clone().ok_or(EngineError::NotSteppable {
            signal: "finish",
            state: self.engine.state().to_string(),
        })
    }

    fn drive(&mut self, mut notification: Notification) -> Result<(), EngineError> {
        loop {
            self.receive(notification);
            if !self.ready || self.mode == Mode::Pause {
                return Ok(());
            }
            self.ready = false;
            notification = self.engine.step()?;
        }
    }

    fn receive(&mut self, notification: Notification) {
        match notification {
            Notification::ReadyToStep => self.ready = true,
            Notification::Halted(results) => self.outcome = Some(Outcome::Halted(results)),
            Notification::Error(failure) => self.outcome = Some(Outcome::Errored(failure)),
        }
    }

    fn waiting_on(&self) -> String {
        match self.engine.state() {
            State::Empty => "waiting for a program".to_string(),
            state => state.to_string(),
        }
    }
}
