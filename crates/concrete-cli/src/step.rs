//! `step` subcommand handler: drive a paused runner one step at a time

use crate::utils::{parse_or_exit, read_source_or_exit};
use concrete_core::vm::{Engine, EngineConfig, EngineError, Mode, Outcome, Runner};
use std::process;

/// One line describing where the engine stopped
pub fn describe(engine: &Engine) -> String {
    let state = engine.state().to_string();
    let Some(frame) = engine.active_frame() else {
        return format!("{:>6}  {state}", engine.steps());
    };
    let block = engine
        .current_block()
        .map(ToString::to_string)
        .unwrap_or_else(|| "-".to_string());
    let arguments = frame
        .arguments
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "{:>6}  {state:<16} frame {} head {:<4} block {block:<12} args [{arguments}]",
        engine.steps(),
        frame.id,
        frame.head,
    )
}

/// Step a loaded runner until the program ends, reporting the engine after
/// every step
pub fn step_to_end(
    runner: &mut Runner,
    mut on_step: impl FnMut(&Engine),
) -> Result<Outcome, EngineError> {
    runner.set_mode(Mode::Pause);
    on_step(runner.engine());
    loop {
        if let Some(outcome) = runner.outcome() {
            return Ok(outcome.clone());
        }
        runner.step()?;
        on_step(runner.engine());
    }
}

pub fn handle_step(file: &str, config: EngineConfig) {
    let source = read_source_or_exit(file);
    let tape = parse_or_exit(&source, file);

    let mut engine = Engine::with_config(config);
    concrete_stdlib::install(&mut engine);
    let mut runner = Runner::new(engine);

    let outcome = runner
        .load_program(tape)
        .and_then(|_| step_to_end(&mut runner, |engine| println!("{}", describe(engine))));

    match outcome {
        Ok(Outcome::Halted(results)) => {
            let results = results
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            println!("halted with [{results}]");
        }
        Ok(Outcome::Errored(failure)) => {
            eprintln!("{}", failure.format_with_source(&source, file));
            process::exit(1);
        }
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
