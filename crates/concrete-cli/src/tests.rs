//! Tests for CLI utilities

use super::compile::to_ron;
use super::step::{describe, step_to_end};
use super::utils::*;
use concrete_core::ast::{Block, Tape};
use concrete_core::parser;
use concrete_core::vm::{Engine, Mode, Outcome, Runner};
use std::fs;

#[test]
fn test_read_source_from_file() {
    let temp_path = std::env::temp_dir().join("concrete_cli_test_read.concrete");
    let content = "1, 2 add! _";
    fs::write(&temp_path, content).unwrap();

    let result = read_source(temp_path.to_str().unwrap());
    assert_eq!(result.unwrap(), content);

    // Cleanup
    let _ = fs::remove_file(temp_path);
}

#[test]
fn test_read_source_nonexistent_file() {
    let result = read_source("/nonexistent/file/path.concrete");
    assert!(result.is_err());
}

#[test]
fn test_compiled_path() {
    assert_eq!(
        compiled_path("programs/fib.concrete"),
        Some("programs/fib.concretec".to_string())
    );
    assert_eq!(compiled_path("-"), None);
}

#[test]
fn test_compiled_tape_reads_back() {
    let tape = parser::parse("a: 5 [ a, a * _ ] call! _", "test.concrete").unwrap();
    let ron = to_ron(&tape).unwrap();
    let restored: Tape = ron::from_str(&ron).unwrap();
    assert_eq!(restored, *tape);
}

#[test]
fn test_describe_step() {
    let tape = parser::parse("7", "test.concrete").unwrap();
    let mut engine = Engine::new();
    assert!(describe(&engine).contains("empty"));

    engine.load_program(tape).unwrap();
    let line = describe(&engine);
    assert!(line.contains("run.read"));
    assert!(line.contains("block 7"));
    assert!(line.contains("args []"));
}

#[test]
fn test_step_to_end_reports_every_step() {
    let tape = parser::parse("7", "test.concrete").unwrap();
    let mut engine = Engine::new();
    concrete_stdlib::install(&mut engine);
    let mut runner = Runner::new(engine);
    runner.set_mode(Mode::Run);
    runner.load_program(tape).unwrap();

    let mut lines = Vec::new();
    let outcome = step_to_end(&mut runner, |engine| lines.push(describe(engine))).unwrap();
    assert!(matches!(outcome, Outcome::Halted(ref results) if *results == vec![Block::Number(7.0)]));
    assert_eq!(runner.mode(), Mode::Pause);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("halted"));
}

#[test]
fn test_step_to_end_pauses_after_each_step() {
    let tape = parser::parse("7", "test.concrete").unwrap();
    let mut runner = Runner::new(Engine::new());
    runner.load_program(tape).unwrap();

    let mut lines = Vec::new();
    step_to_end(&mut runner, |engine| lines.push(describe(engine))).unwrap();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].contains("run.read"));
    assert!(lines[3].contains("halted"));
}
