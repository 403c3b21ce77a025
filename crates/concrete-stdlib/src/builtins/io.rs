use super::Output;
use concrete_core::ast::Block;
use concrete_core::vm::value::to_host_values;
use concrete_core::vm::{Command, EngineError, ExecutorContext};
use tracing::debug;

/// Write the argument list as one space-separated line
pub fn print(arguments: &[Block], output: &Output) -> Result<Vec<Command>, EngineError> {
    let line = to_host_values(arguments)?
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");

    let mut sink = output.borrow_mut();
    writeln!(sink, "{line}")
        .and_then(|_| sink.flush())
        .map_err(|e| EngineError::executor(format!("print! failed to write output: {e}")))?;
    Ok(vec![Command::Done])
}

pub fn debug(ctx: &ExecutorContext<'_>) -> Vec<Command> {
    debug!(
        frame = %ctx.frame_id,
        head = ctx.head,
        "debug! snapshot:\n{}",
        ctx.engine.snapshot().to_json()
    );
    vec![Command::Done]
}
