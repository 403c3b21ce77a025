//! Debug subcommand: `tape`

use crate::utils::{parse_or_exit, read_source_or_exit};

/// Print the parsed tape for debugging
pub fn handle_tape(file: &str) {
    let source = read_source_or_exit(file);
    let tape = parse_or_exit(&source, file);
    println!("{tape:#?}");
}
