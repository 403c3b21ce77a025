//! Shared CLI utilities for reading input and formatting errors

use concrete_core::ast::Tape;
use concrete_core::diagnostics::Diagnostic;
use concrete_core::parser;
use std::fs;
use std::io::{self, Read};
use std::process;
use std::rc::Rc;

/// Read source code from a file or stdin.
/// If `file` is "-", reads from stdin. Otherwise reads from the specified file.
pub fn read_source(file: &str) -> io::Result<String> {
    if file == "-" {
        let mut source = String::new();
        io::stdin().read_to_string(&mut source)?;
        Ok(source)
    } else {
        fs::read_to_string(file)
    }
}

/// Read `file` or exit with a message
pub fn read_source_or_exit(file: &str) -> String {
    match read_source(file) {
        Ok(content) => content,
        Err(err) => {
            eprintln!("Error reading file '{file}': {err}");
            process::exit(1);
        }
    }
}

/// Parse `source` or print the diagnostics and exit
pub fn parse_or_exit(source: &str, file: &str) -> Rc<Tape> {
    match parser::parse(source, file) {
        Ok(tape) => tape,
        Err(errors) => {
            format_parse_errors(&errors, source);
            process::exit(1);
        }
    }
}

/// Format and print parse errors to stderr
pub fn format_parse_errors(errors: &[Diagnostic], source: &str) {
    for error in errors {
        eprintln!("{}", error.format(source));
    }
}

/// Default output path for `compile`: the input with a `.concretec` extension
pub fn compiled_path(file: &str) -> Option<String> {
    if file == "-" {
        return None;
    }
    let path = std::path::Path::new(file);
    Some(path.with_extension("concretec").to_string_lossy().to_string())
}
