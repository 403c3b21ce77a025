// Minimal executors so the engine can be driven without the stdlib

use concrete_core::ast::Block;
use concrete_core::parser;
use concrete_core::vm::{Command, Engine, EngineError, ExecutorContext, FnExecutor, Notification};
use std::rc::Rc;

fn call(ctx: &ExecutorContext<'_>) -> Result<Vec<Command>, EngineError> {
    let mut arguments = ctx.arguments.to_vec();
    let Some(Block::Tape(tape)) = arguments.pop() else {
        return Err(EngineError::executor("call! requires a tape"));
    };
    Ok(vec![
        Command::ClearArguments,
        Command::CallTape { tape, arguments },
        Command::DoneNoAdvance,
    ])
}

fn jump(ctx: &ExecutorContext<'_>) -> Result<Vec<Command>, EngineError> {
    let address = ctx
        .arguments
        .first()
        .cloned()
        .ok_or_else(|| EngineError::executor("jump! requires an address"))?;
    Ok(vec![
        Command::MoveHeadToAddress(address),
        Command::ClearArguments,
        Command::DoneNoAdvance,
    ])
}

fn set(ctx: &ExecutorContext<'_>) -> Result<Vec<Command>, EngineError> {
    match ctx.arguments {
        [block, address, ..] => Ok(vec![Command::PlaceBlockAtAddress {
            address: address.clone(),
            block: block.clone(),
        }]),
        _ => Err(EngineError::executor("set! requires a block and an address")),
    }
}

fn add(ctx: &ExecutorContext<'_>) -> Result<Vec<Command>, EngineError> {
    let sum = ctx
        .arguments
        .iter()
        .map(|block| match block {
            Block::Number(n) => *n,
            _ => f64::NAN,
        })
        .sum();
    Ok(vec![Command::PlaceResult(Block::Number(sum))])
}

fn explicit_return(_: &ExecutorContext<'_>) -> Result<Vec<Command>, EngineError> {
    Ok(vec![Command::ExplicitReturn])
}

pub fn install(engine: &mut Engine) {
    engine.register_executor("call", Rc::new(FnExecutor::new(call)));
    engine.register_executor("jump", Rc::new(FnExecutor::new(jump)));
    engine.register_executor("set", Rc::new(FnExecutor::new(set)));
    engine.register_executor("add", Rc::new(FnExecutor::new(add)));
    engine.register_executor("return", Rc::new(FnExecutor::new(explicit_return)));
}

/// An engine with the minimal executors and `source` loaded
pub fn loaded(source: &str) -> (Engine, Notification) {
    let tape = parser::parse(source, "test.concrete").expect("Parse failed");
    let mut engine = Engine::new();
    install(&mut engine);
    let notification = engine.load_program(tape).expect("load");
    (engine, notification)
}

/// Step until a terminal notification
pub fn finish(engine: &mut Engine, mut notification: Notification) -> Notification {
    while !notification.is_terminal() {
        notification = engine.step().expect("step");
    }
    notification
}

pub fn run(source: &str) -> Result<Vec<Block>, EngineError> {
    let (mut engine, notification) = loaded(source);
    match finish(&mut engine, notification) {
        Notification::Halted(results) => Ok(results),
        Notification::Error(failure) => Err(failure.error),
        Notification::ReadyToStep => unreachable!("finish only returns terminal notifications"),
    }
}
