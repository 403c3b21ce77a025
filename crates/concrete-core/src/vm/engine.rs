//! The stepwise engine
//!
//! A finite-state machine that makes progress only when it receives a step
//! signal. Every state it idles in reports [`Notification::ReadyToStep`];
//! the transient states (`check_past_tape_edge`, `execute_op`) run their
//! entry action and move on within the same step.
//!
//! ```text
//! uninitialized -> empty -> run { check_past_tape_edge, read, execute_value,
//!                                 execute_op, advance, no_advance, return, pop }
//!                        -> halted | error
//! ```

use super::EngineConfig;
use super::closures::ClosureStore;
use super::errors::{EngineError, Failure};
use super::executor::{Command, Executor, ExecutorContext, Registry, TapeCall};
use super::frame::Frame;
use super::resolution::{Bindings, Storage};
use super::snapshot::{EngineSnapshot, FrameSnapshot};
use crate::ast::{Block, Category, FrameId, Span, Tape, TapeBlock};
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    #[default]
    Uninitialized,
    Empty,
    Run(RunState),
    Halted,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    CheckPastTapeEdge,
    Read,
    ExecuteValue,
    ExecuteOp,
    Advance { skip_next: bool },
    NoAdvance,
    Return,
    Pop,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Uninitialized => write!(f, "uninitialized"),
            State::Empty => write!(f, "empty"),
            State::Run(run) => write!(f, "run.{run}"),
            State::Halted => write!(f, "halted"),
            State::Error => write!(f, "error"),
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::CheckPastTapeEdge => "check_past_tape_edge",
            RunState::Read => "read",
            RunState::ExecuteValue => "execute_value",
            RunState::ExecuteOp => "execute_op",
            RunState::Advance { .. } => "advance",
            RunState::NoAdvance => "no_advance",
            RunState::Return => "return",
            RunState::Pop => "pop",
        };
        write!(f, "{name}")
    }
}

/// What the engine reports after each signal
#[derive(Debug, Clone)]
pub enum Notification {
    ReadyToStep,
    Halted(Vec<Block>),
    Error(Box<Failure>),
}

impl Notification {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Notification::ReadyToStep)
    }
}

pub struct Engine {
    config: EngineConfig,
    state: State,
    registry: Registry,
    active: Option<Frame>,
    /// Callers of the active frame, outermost first
    stack: Vec<Frame>,
    closures: ClosureStore,
    next_frame_id: u64,
    steps: u64,
    current_block: Option<Block>,
    should_execute_else: bool,
    results: Option<Vec<Block>>,
    failure: Option<Box<Failure>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let mut engine = Engine {
            config,
            state: State::default(),
            registry: Registry::new(),
            active: None,
            stack: Vec::new(),
            closures: ClosureStore::new(),
            next_frame_id: 0,
            steps: 0,
            current_block: None,
            should_execute_else: false,
            results: None,
            failure: None,
        };
        engine.set_state(State::Empty);
        engine
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn active_frame(&self) -> Option<&Frame> {
        self.active.as_ref()
    }

    pub fn call_stack(&self) -> &[Frame] {
        &self.stack
    }

    pub fn closures(&self) -> &ClosureStore {
        &self.closures
    }

    pub fn current_block(&self) -> Option<&Block> {
        self.current_block.as_ref()
    }

    pub fn results(&self) -> Option<&[Block]> {
        self.results.as_deref()
    }

    pub fn failure(&self) -> Option<&Failure> {
        self.failure.as_deref()
    }

    /// Add or replace the executor for `identifier`. Allowed at any time,
    /// including mid-run.
    pub fn register_executor(&mut self, identifier: impl Into<String>, executor: Rc<dyn Executor>) {
        let identifier = identifier.into();
        debug!("registering executor '{}'", identifier);
        self.registry.register(identifier, executor);
    }

    /// Install frame 0 over `tape` and settle into the first suspension point
    pub fn load_program(&mut self, tape: Rc<Tape>) -> Result<Notification, EngineError> {
        if self.state != State::Empty {
            return Err(self.not_steppable("load a program"));
        }

        self.stack.clear();
        self.closures = ClosureStore::new();
        self.next_frame_id = 0;
        self.steps = 0;

        let root = TapeBlock::new(tape);
        let loaded = self.allocate_frame(&root, Vec::new()).and_then(|frame| {
            debug!("loaded program with {} cells as frame {}", root.tape.len(), frame.id);
            self.active = Some(frame);
            self.enter(RunState::CheckPastTapeEdge)
        });
        Ok(loaded.unwrap_or_else(|error| self.fail(error)))
    }

    /// Send one step signal
    pub fn step(&mut self) -> Result<Notification, EngineError> {
        let State::Run(current) = self.state else {
            return Err(self.not_steppable("step"));
        };

        let next = match current {
            RunState::Read => self.branch(),
            RunState::ExecuteValue | RunState::Pop => Ok(RunState::Advance { skip_next: false }),
            RunState::Advance { .. } | RunState::NoAdvance => Ok(RunState::CheckPastTapeEdge),
            RunState::Return => Ok(RunState::Pop),
            RunState::CheckPastTapeEdge | RunState::ExecuteOp => Ok(current),
        };

        let notification = next.and_then(|state| self.enter(state));
        Ok(notification.unwrap_or_else(|error| self.fail(error)))
    }

    /// Snapshot of the whole engine
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            state: self.state.to_string(),
            steps: self.steps,
            current_block: self.current_block.as_ref().map(ToString::to_string),
            active: self.active.as_ref().map(FrameSnapshot::from),
            stack: self.stack.iter().map(FrameSnapshot::from).collect(),
            closures: self
                .closures
                .iter()
                .map(|(id, bindings)| {
                    let bindings = bindings
                        .iter()
                        .map(|(label, block)| (label.clone(), block.to_string()))
                        .collect();
                    (id.to_string(), bindings)
                })
                .collect(),
        }
    }

    fn set_state(&mut self, state: State) {
        trace!("{} -> {}", self.state, state);
        self.state = state;
    }

    fn not_steppable(&self, signal: &'static str) -> EngineError {
        EngineError::NotSteppable {
            signal,
            state: self.state.to_string(),
        }
    }

    /// Run entry actions starting at `state` until a suspension point or a
    /// terminal state is reached
    fn enter(&mut self, mut state: RunState) -> Result<Notification, EngineError> {
        loop {
            self.set_state(State::Run(state));
            state = match state {
                RunState::CheckPastTapeEdge => match self.check_past_tape_edge()? {
                    Some(next) => next,
                    None => return Ok(self.halt()),
                },
                RunState::Read => {
                    self.current_block = self.active()?.block_at_head().cloned();
                    return Ok(Notification::ReadyToStep);
                }
                RunState::ExecuteValue => {
                    self.execute_value()?;
                    return Ok(Notification::ReadyToStep);
                }
                RunState::ExecuteOp => self.execute_op()?,
                RunState::Advance { skip_next } => {
                    let active = self.active_mut()?;
                    active.advance_or_jump();
                    if skip_next {
                        active.advance_or_jump();
                    }
                    return Ok(Notification::ReadyToStep);
                }
                RunState::NoAdvance => return Ok(Notification::ReadyToStep),
                RunState::Return => {
                    if self.stack.is_empty() {
                        return Ok(self.halt());
                    }
                    self.return_to_caller()?;
                    return Ok(Notification::ReadyToStep);
                }
                RunState::Pop => {
                    self.pop()?;
                    return Ok(Notification::ReadyToStep);
                }
            };
        }
    }

    /// `None` means the program is finished
    fn check_past_tape_edge(&mut self) -> Result<Option<RunState>, EngineError> {
        self.steps += 1;
        if self.steps > self.config.step_budget {
            return Err(EngineError::StepBudgetExceeded(self.config.step_budget));
        }

        if !self.active()?.is_beyond_edge() {
            return Ok(Some(RunState::Read));
        }
        if self.stack.is_empty() {
            return Ok(None);
        }
        Ok(Some(RunState::Return))
    }

    fn branch(&self) -> Result<RunState, EngineError> {
        match self.current_block.as_ref().map(Block::category) {
            Some(Category::Value) => Ok(RunState::ExecuteValue),
            Some(Category::Op) => Ok(RunState::ExecuteOp),
            None => Err(EngineError::InvalidBlockCategory("nothing".into())),
        }
    }

    fn execute_value(&mut self) -> Result<(), EngineError> {
        let active = self.active_mut()?;
        if !active.is_comma_at_head() {
            active.clear_arguments();
        }
        // Chains that leave this frame are chased through the bindings
        match active.append_block_at_head_value_to_arguments() {
            Err(EngineError::UnresolvedLabel(_)) => {
                let value = self.head_value_across_frames()?;
                self.active_mut()?.append_block_to_arguments(value);
                Ok(())
            }
            other => other,
        }
    }

    fn head_value_across_frames(&self) -> Result<Block, EngineError> {
        let active = self.active()?;
        let block = active
            .block_at_head()
            .cloned()
            .ok_or_else(|| EngineError::InvalidBlockCategory("nothing".into()))?;
        if let Block::ValueIdentifier { label } = &block {
            if active.reference(label).is_none() {
                return Err(EngineError::UnresolvedLabel(label.clone()));
            }
        }
        self.bindings()?.dereference(&block, true)
    }

    fn execute_op(&mut self) -> Result<RunState, EngineError> {
        let block = self
            .current_block
            .clone()
            .ok_or_else(|| EngineError::InvalidBlockCategory("nothing".into()))?;
        let identifier = block
            .identifier()
            .ok_or_else(|| EngineError::InvalidBlockCategory(block.kind().into()))?;
        let executor = self.dispatch(identifier)?;

        let mut activation = {
            let active = self.active()?;
            let ctx = ExecutorContext {
                engine: &*self,
                frame_id: active.id,
                head: active.head,
                arguments: &active.arguments,
                next_block: active.block_at(active.head + 1),
                should_execute_else: self.should_execute_else,
            };
            executor.invoke(&ctx)?
        };

        let mut response = None;
        loop {
            let command = activation.resume(response.take())?;
            trace!("{} emitted {:?}", block, command);
            match command {
                Command::Done => return Ok(RunState::Advance { skip_next: false }),
                Command::DoneSkipNextBlock => return Ok(RunState::Advance { skip_next: true }),
                Command::DoneNoAdvance => return Ok(RunState::NoAdvance),
                Command::ExplicitReturn => return Ok(RunState::Return),
                Command::PlaceResult(result) => self.active_mut()?.place_result(result),
                Command::PlaceBlockAtAddress { address, block } => {
                    self.place_block_at_address(&address, block)?
                }
                Command::RequestBlockAtAddress(address) => {
                    response = Some(self.bindings()?.dereference(&address, false)?);
                }
                Command::MoveHeadToAddress(address) => {
                    let label = address
                        .identifier()
                        .ok_or_else(|| EngineError::NotAnIdentifier(address.to_string()))?;
                    self.active_mut()?.move_head_to_label(label)?;
                }
                Command::CallTape { tape, arguments } => self.push_frame(&tape, arguments)?,
                Command::ClearArguments => self.active_mut()?.clear_arguments(),
                Command::SetShouldExecuteElse(flag) => self.should_execute_else = flag,
                Command::SetJumpAfter { target, blocks } => {
                    self.active_mut()?.schedule_jump(target, blocks)
                }
            }
        }
    }

    /// Labels bound to a tape value call that tape; everything else goes
    /// through the registry
    fn dispatch(&self, identifier: &str) -> Result<Rc<dyn Executor>, EngineError> {
        if self.active()?.reference(identifier).is_some() {
            let bound = self
                .bindings()?
                .dereference(&Block::value_identifier(identifier), true)?;
            if let Block::Tape(tape) = bound {
                debug!("dispatching '{}' to tape call", identifier);
                return Ok(Rc::new(TapeCall::new(tape)));
            }
        }

        debug!("dispatching '{}' to registered executor", identifier);
        self.registry
            .get(identifier)
            .ok_or_else(|| EngineError::NoExecutorForIdentifier(identifier.to_string()))
    }

    fn place_block_at_address(&mut self, address: &Block, block: Block) -> Result<(), EngineError> {
        let resolution = self.bindings()?.resolve(address)?;
        match resolution.storage {
            Storage::Stack => self
                .frame_mut(resolution.frame_id)?
                .set_block_by_label(&resolution.label, block),
            Storage::Closed => {
                if self.closures.set(resolution.frame_id, &resolution.label, block) {
                    Ok(())
                } else {
                    Err(EngineError::UnknownLabel(resolution.label))
                }
            }
        }
    }

    fn allocate_frame(&mut self, tape: &TapeBlock, arguments: Vec<Block>) -> Result<Frame, EngineError> {
        let id = FrameId(self.next_frame_id);
        self.next_frame_id += 1;
        Frame::new(id, tape, arguments)
    }

    fn push_frame(&mut self, tape: &TapeBlock, arguments: Vec<Block>) -> Result<(), EngineError> {
        let frame = self.allocate_frame(tape, arguments)?;
        let caller = self
            .active
            .replace(frame)
            .ok_or_else(|| self.not_steppable("call a tape"))?;
        debug!(
            "push frame {} (depth {})",
            self.active().map(|frame| frame.id.to_string()).unwrap_or_default(),
            self.stack.len() + 1
        );
        self.stack.push(caller);
        Ok(())
    }

    fn return_to_caller(&mut self) -> Result<(), EngineError> {
        let result = self.active()?.arguments.first().cloned();
        if let (Some(result), Some(caller)) = (result, self.stack.last_mut()) {
            caller.place_result(result);
        }
        Ok(())
    }

    fn pop(&mut self) -> Result<(), EngineError> {
        let finished = self
            .active
            .take()
            .ok_or_else(|| self.not_steppable("pop a frame"))?;

        let closed = finished.close_references();
        if !closed.is_empty() {
            debug!("closing {} references of frame {}", closed.len(), finished.id);
            self.closures.insert(finished.id, closed);
        }

        self.active = self.stack.pop();
        if self.active.is_none() {
            return Err(self.not_steppable("pop the root frame"));
        }
        debug!("pop frame {} (depth {})", finished.id, self.stack.len());
        Ok(())
    }

    fn halt(&mut self) -> Notification {
        let results = match self.active.as_mut() {
            Some(active) => {
                active.halt();
                active.arguments.clone()
            }
            None => Vec::new(),
        };
        debug!("halted after {} steps with {} results", self.steps, results.len());
        self.set_state(State::Halted);
        self.results = Some(results.clone());
        Notification::Halted(results)
    }

    fn fail(&mut self, error: EngineError) -> Notification {
        warn!("engine error in state {}: {}", self.state, error);
        let span = self.span_at_head();
        if let Some(active) = self.active.as_mut() {
            active.halt();
        }
        let failure = Box::new(Failure {
            error,
            span,
            snapshot: Box::new(self.snapshot()),
        });
        self.set_state(State::Error);
        self.failure = Some(failure.clone());
        Notification::Error(failure)
    }

    fn span_at_head(&self) -> Option<Span> {
        self.active.as_ref().and_then(Frame::span_at_head)
    }

    fn active(&self) -> Result<&Frame, EngineError> {
        self.active
            .as_ref()
            .ok_or_else(|| self.not_steppable("read the active frame"))
    }

    fn active_mut(&mut self) -> Result<&mut Frame, EngineError> {
        let state = self.state.to_string();
        self.active.as_mut().ok_or(EngineError::NotSteppable {
            signal: "write the active frame",
            state,
        })
    }

    fn frame_mut(&mut self, id: FrameId) -> Result<&mut Frame, EngineError> {
        if let Some(active) = self.active.as_mut().filter(|frame| frame.id == id) {
            return Ok(active);
        }
        self.stack
            .iter_mut()
            .rev()
            .find(|frame| frame.id == id)
            .ok_or(EngineError::FrameNotFound(id))
    }

    fn bindings(&self) -> Result<Bindings<'_>, EngineError> {
        Ok(Bindings {
            active: self.active()?,
            stack: &self.stack,
            closures: &self.closures,
        })
    }
}
