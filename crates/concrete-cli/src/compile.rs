//! `compile` subcommand handler

use crate::utils::{compiled_path, parse_or_exit, read_source_or_exit};
use concrete_core::ast::Tape;
use std::fs;
use std::process;

/// Serialize a parsed tape to RON
pub fn to_ron(tape: &Tape) -> Result<String, ron::Error> {
    ron::ser::to_string_pretty(tape, ron::ser::PrettyConfig::default())
}

/// Parse a Concrete file and write its tape as RON
pub fn handle_compile(file: &str, output: Option<&str>) {
    let source = read_source_or_exit(file);
    let tape = parse_or_exit(&source, file);

    let Some(output_file) = output.map(str::to_string).or_else(|| compiled_path(file)) else {
        eprintln!("Error: Cannot compile from stdin without --output flag");
        process::exit(1);
    };

    let serialized = match to_ron(&tape) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error serializing tape: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = fs::write(&output_file, serialized) {
        eprintln!("Error writing to '{output_file}': {e}");
        process::exit(1);
    }

    println!("Compiled '{file}' to '{output_file}'");
}
