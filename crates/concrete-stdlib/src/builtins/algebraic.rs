//! Arithmetic, comparison and logic operations
//!
//! Each is a left fold over the host values of the argument list, seeded
//! with the first argument. Booleans have no block form, so comparison and
//! logic results become 1 or 0.

use super::Builtin;
use concrete_core::ast::Block;
use concrete_core::vm::{Command, EngineError, HostValue};
use std::cmp::Ordering;

pub fn reduce(builtin: Builtin, arguments: &[Block]) -> Result<Vec<Command>, EngineError> {
    let result = fold(builtin.name(), arguments, |a, b| apply(builtin, a, b))?;
    Ok(vec![Command::PlaceResult(result.into_block())])
}

pub fn not(arguments: &[Block]) -> Result<Vec<Command>, EngineError> {
    let first = arguments.first().ok_or_else(|| missing_argument("not"))?;
    let result = boolean(!truthy(&first.as_host()?));
    Ok(vec![Command::PlaceResult(result.into_block())])
}

fn fold(
    name: &str,
    arguments: &[Block],
    op: impl Fn(HostValue, HostValue) -> HostValue,
) -> Result<HostValue, EngineError> {
    let mut values = arguments.iter().map(Block::as_host);
    let mut memo = values.next().ok_or_else(|| missing_argument(name))??;
    for value in values {
        memo = op(memo, value?);
    }
    Ok(memo)
}

fn missing_argument(name: &str) -> EngineError {
    EngineError::executor(format!("{name}! requires at least one argument, got zero"))
}

fn apply(builtin: Builtin, a: HostValue, b: HostValue) -> HostValue {
    match builtin {
        Builtin::Add => add(a, b),
        Builtin::Subtract => HostValue::Number(a.to_number() - b.to_number()),
        Builtin::Multiply => HostValue::Number(a.to_number() * b.to_number()),
        Builtin::Divide => HostValue::Number(a.to_number() / b.to_number()),
        Builtin::Modulo => HostValue::Number(a.to_number() % b.to_number()),
        Builtin::Greater => boolean(compare(&a, &b) == Some(Ordering::Greater)),
        Builtin::Less => boolean(compare(&a, &b) == Some(Ordering::Less)),
        Builtin::GreaterEqual => boolean(matches!(
            compare(&a, &b),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        Builtin::LessEqual => boolean(matches!(
            compare(&a, &b),
            Some(Ordering::Less | Ordering::Equal)
        )),
        Builtin::Equal => boolean(compare(&a, &b) == Some(Ordering::Equal)),
        Builtin::And => boolean(truthy(&a) && truthy(&b)),
        Builtin::Or => boolean(truthy(&a) || truthy(&b)),
        _ => HostValue::Null,
    }
}

/// Strings concatenate, everything else adds numerically
fn add(a: HostValue, b: HostValue) -> HostValue {
    match (&a, &b) {
        (HostValue::String(_), _) | (_, HostValue::String(_)) => {
            HostValue::String(format!("{a}{b}"))
        }
        _ => HostValue::Number(a.to_number() + b.to_number()),
    }
}

/// Two strings compare lexically, anything else numerically. NaN compares
/// as nothing.
fn compare(a: &HostValue, b: &HostValue) -> Option<Ordering> {
    match (a, b) {
        (HostValue::String(a), HostValue::String(b)) => Some(a.cmp(b)),
        _ => a.to_number().partial_cmp(&b.to_number()),
    }
}

fn truthy(value: &HostValue) -> bool {
    value.clone().into_block().truthy()
}

fn boolean(value: bool) -> HostValue {
    HostValue::Number(if value { 1.0 } else { 0.0 })
}
