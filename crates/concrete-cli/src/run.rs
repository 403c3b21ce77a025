//! `run` subcommand handler

use crate::utils::read_source_or_exit;
use concrete_core::pipeline::Pipeline;
use concrete_core::vm::EngineConfig;
use concrete_stdlib::{run_pipeline, stdout_output};
use std::process;
use tracing::debug;

/// Execute a Concrete file and print its results as JSON
pub fn handle_run(file: &str, config: EngineConfig) {
    let source = read_source_or_exit(file);
    debug!("running '{}' with a budget of {} steps", file, config.step_budget);
    let pipeline = Pipeline::new(source, file.to_string()).with_config(config);

    match run_pipeline(&pipeline, stdout_output()) {
        Ok(results) => match serde_json::to_string(&results) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing results: {e}");
                process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("{}", e.format_with_source(pipeline.source(), file));
            process::exit(1);
        }
    }
}
