//! Executor protocol
//!
//! An op block is carried out by an [`Executor`]. Invoking one yields an
//! [`Activation`] the engine pulls [`Command`]s from until it sees one of
//! the `Done*` commands or `ExplicitReturn`. Executors never touch engine
//! state directly; everything goes through commands.

use super::engine::Engine;
use super::errors::EngineError;
use crate::ast::{Block, FrameId, TapeBlock};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Write a block at `head + 1` on the active frame
    PlaceResult(Block),
    PlaceBlockAtAddress { address: Block, block: Block },
    /// Fetch the block at an address; it is handed to the next `resume`
    RequestBlockAtAddress(Block),
    MoveHeadToAddress(Block),
    CallTape { tape: TapeBlock, arguments: Vec<Block> },
    ExplicitReturn,
    ClearArguments,
    SetShouldExecuteElse(bool),
    /// Once the `blocks` blocks after the op have run, jump to cell `target`
    SetJumpAfter { target: usize, blocks: usize },
    Done,
    DoneNoAdvance,
    DoneSkipNextBlock,
}

impl Command {
    /// True for commands that end an activation
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Command::Done
                | Command::DoneNoAdvance
                | Command::DoneSkipNextBlock
                | Command::ExplicitReturn
        )
    }
}

/// Read-only view of the engine handed to an executor
#[derive(Clone, Copy)]
pub struct ExecutorContext<'e> {
    pub engine: &'e Engine,
    pub frame_id: FrameId,
    pub head: usize,
    pub arguments: &'e [Block],
    /// The block right after the op, if any
    pub next_block: Option<&'e Block>,
    pub should_execute_else: bool,
}

pub trait Executor {
    fn invoke(&self, ctx: &ExecutorContext<'_>) -> Result<Box<dyn Activation>, EngineError>;
}

pub trait Activation {
    /// Produce the next command. `response` carries the block fetched for
    /// the previous `RequestBlockAtAddress`, if there was one.
    fn resume(&mut self, response: Option<Block>) -> Result<Command, EngineError>;
}

/// An activation replaying a fixed list of commands
#[derive(Debug, Clone, Default)]
pub struct Script {
    commands: VecDeque<Command>,
}

impl Script {
    pub fn new(commands: impl IntoIterator<Item = Command>) -> Self {
        Script {
            commands: commands.into_iter().collect(),
        }
    }

    pub fn boxed(commands: impl IntoIterator<Item = Command>) -> Box<dyn Activation> {
        Box::new(Self::new(commands))
    }
}

impl Activation for Script {
    fn resume(&mut self, _response: Option<Block>) -> Result<Command, EngineError> {
        Ok(self.commands.pop_front().unwrap_or(Command::Done))
    }
}

/// Calling a tape value: the pending arguments become its parameters
#[derive(Debug, Clone)]
pub struct TapeCall {
    tape: TapeBlock,
}

impl TapeCall {
    pub fn new(tape: TapeBlock) -> Self {
        TapeCall { tape }
    }
}

impl Executor for TapeCall {
    fn invoke(&self, ctx: &ExecutorContext<'_>) -> Result<Box<dyn Activation>, EngineError> {
        Ok(Script::boxed([
            Command::ClearArguments,
            Command::CallTape {
                tape: self.tape.clone(),
                arguments: ctx.arguments.to_vec(),
            },
            Command::DoneNoAdvance,
        ]))
    }
}

/// Executors by identifier. Entries can be added or replaced at any time.
#[derive(Clone, Default)]
pub struct Registry {
    executors: BTreeMap<String, Rc<dyn Executor>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, identifier: impl Into<String>, executor: Rc<dyn Executor>) {
        self.executors.insert(identifier.into(), executor);
    }

    pub fn get(&self, identifier: &str) -> Option<Rc<dyn Executor>> {
        self.executors.get(identifier).cloned()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.executors.contains_key(identifier)
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.executors.keys().map(String::as_str)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.executors.keys()).finish()
    }
}

/// Executor built from a closure returning a command list
pub struct FnExecutor<F>(F);

impl<F> FnExecutor<F>
where
    F: Fn(&ExecutorContext<'_>) -> Result<Vec<Command>, EngineError>,
{
    pub fn new(f: F) -> Self {
        FnExecutor(f)
    }
}

impl<F> Executor for FnExecutor<F>
where
    F: Fn(&ExecutorContext<'_>) -> Result<Vec<Command>, EngineError>,
{
    fn invoke(&self, ctx: &ExecutorContext<'_>) -> Result<Box<dyn Activation>, EngineError> {
        Ok(Script::boxed((self.0)(ctx)?))
    }
}
