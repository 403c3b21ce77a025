//! Control flow: calling tapes, jumps, returns and conditionals

use concrete_core::ast::Block;
use concrete_core::vm::{Command, EngineError};

/// `call!` takes its tape from the last argument; the rest become the
/// tape's parameters
pub fn call(arguments: &[Block]) -> Result<Vec<Command>, EngineError> {
    let mut arguments = arguments.to_vec();
    let tape = match arguments.pop() {
        Some(Block::Tape(tape)) => tape,
        Some(other) => {
            return Err(EngineError::executor(format!(
                "Final argument to call! must be a tape, got {}",
                other.kind()
            )));
        }
        None => {
            return Err(EngineError::executor(
                "call! requires at least one argument, a tape",
            ));
        }
    };
    Ok(vec![
        Command::ClearArguments,
        Command::CallTape { tape, arguments },
        Command::DoneNoAdvance,
    ])
}

/// `address jump!` always jumps; `condition, address jump!` only when the
/// condition is truthy
pub fn jump(arguments: &[Block]) -> Result<Vec<Command>, EngineError> {
    let address = match arguments {
        [address] => address,
        [condition, address, ..] => {
            if !condition.truthy() {
                return Ok(vec![Command::Done]);
            }
            address
        }
        [] => return Err(EngineError::executor("jump! requires an address")),
    };
    Ok(vec![
        Command::MoveHeadToAddress(address.clone()),
        Command::ClearArguments,
        Command::DoneNoAdvance,
    ])
}

/// `condition while! body _` runs the two blocks after it and then jumps
/// back to the cell holding the condition, so the condition is read again.
/// A falsy condition skips the body instead.
pub fn while_block(arguments: &[Block], head: usize) -> Result<Vec<Command>, EngineError> {
    let Some(condition_cell) = head.checked_sub(1) else {
        return Err(EngineError::executor(
            "while! needs a condition block before it",
        ));
    };
    if arguments.first().is_some_and(Block::truthy) {
        Ok(vec![
            Command::ClearArguments,
            Command::SetJumpAfter {
                target: condition_cell,
                blocks: 2,
            },
            Command::Done,
        ])
    } else {
        Ok(vec![Command::ClearArguments, Command::DoneSkipNextBlock])
    }
}

pub fn explicit_return() -> Vec<Command> {
    vec![Command::ExplicitReturn]
}

/// `if!` runs the block after it only when its first argument is truthy,
/// and arms the following `else!` otherwise
pub fn if_block(arguments: &[Block]) -> Vec<Command> {
    let condition = arguments.first().is_some_and(Block::truthy);
    if condition {
        vec![
            Command::ClearArguments,
            Command::SetShouldExecuteElse(false),
            Command::Done,
        ]
    } else {
        vec![
            Command::ClearArguments,
            Command::SetShouldExecuteElse(true),
            Command::DoneSkipNextBlock,
        ]
    }
}

pub fn else_block(should_execute_else: bool) -> Vec<Command> {
    let done = if should_execute_else {
        Command::Done
    } else {
        Command::DoneSkipNextBlock
    };
    vec![Command::ClearArguments, done]
}
