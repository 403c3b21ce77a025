//! Conversion between blocks and host values

use crate::ast::{Block, format_number};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A program result as seen from outside the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HostValue {
    Null,
    Number(f64),
    String(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("cannot convert {kind} block '{block}' to a host value")]
    Unconvertible { kind: &'static str, block: String },
}

impl HostValue {
    /// Numeric coercion: blank is 0, strings parse after trimming, an empty
    /// string is 0 and anything unparsable is NaN
    pub fn to_number(&self) -> f64 {
        match self {
            HostValue::Null => 0.0,
            HostValue::Number(n) => *n,
            HostValue::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
        }
    }

    pub fn into_block(self) -> Block {
        match self {
            HostValue::Null => Block::Blank,
            HostValue::Number(n) => Block::Number(n),
            HostValue::String(s) => Block::String(s),
        }
    }
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Null => write!(f, "null"),
            HostValue::Number(n) => write!(f, "{}", format_number(*n)),
            HostValue::String(s) => write!(f, "{s}"),
        }
    }
}

impl TryFrom<&Block> for HostValue {
    type Error = ConversionError;

    fn try_from(block: &Block) -> Result<Self, Self::Error> {
        match block {
            Block::Number(n) => Ok(HostValue::Number(*n)),
            Block::String(s) => Ok(HostValue::String(s.clone())),
            Block::Blank => Ok(HostValue::Null),
            other => Err(ConversionError::Unconvertible {
                kind: other.kind(),
                block: other.to_string(),
            }),
        }
    }
}

impl Block {
    pub fn as_host(&self) -> Result<HostValue, ConversionError> {
        HostValue::try_from(self)
    }
}

/// Convert a final argument list to host values
pub fn to_host_values(blocks: &[Block]) -> Result<Vec<HostValue>, ConversionError> {
    blocks.iter().map(Block::as_host).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Tape, TapeBlock};
    use std::rc::Rc;

    #[test]
    fn test_literals_convert() {
        assert_eq!(Block::Number(2.5).as_host(), Ok(HostValue::Number(2.5)));
        assert_eq!(
            Block::from("hi").as_host(),
            Ok(HostValue::String("hi".into()))
        );
        assert_eq!(Block::Blank.as_host(), Ok(HostValue::Null));
    }

    #[test]
    fn test_tape_and_identifiers_do_not_convert() {
        let tape = Block::Tape(TapeBlock::new(Rc::new(Tape::default())));
        assert!(matches!(
            tape.as_host(),
            Err(ConversionError::Unconvertible { kind: "Tape", .. })
        ));
        assert!(Block::address("a").as_host().is_err());
        assert!(Block::op("add").as_host().is_err());
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(HostValue::Null.to_number(), 0.0);
        assert_eq!(HostValue::String(" 12 ".into()).to_number(), 12.0);
        assert_eq!(HostValue::String(String::new()).to_number(), 0.0);
        assert!(HostValue::String("abc".into()).to_number().is_nan());
    }

    #[test]
    fn test_host_values_serialize_untagged() {
        let values = vec![
            HostValue::Number(1.0),
            HostValue::String("x".into()),
            HostValue::Null,
        ];
        assert_eq!(
            serde_json::to_string(&values).expect("serialize"),
            r#"[1.0,"x",null]"#
        );
    }
}
