//! Tape and block definitions for Concrete
//!
//! A program is a [`Tape`]: an ordered row of cells, each holding a [`Block`].
//! Tapes are immutable templates once parsed and are shared by reference
//! between every frame that activates them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

mod span;

pub use span::{Location, Span};

/// Identity of one frame activation. Handed out by a monotonically
/// increasing counter and never reused within one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FrameId(pub u64);

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Broad category of a block, used by the engine to branch on `read`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Value,
    Op,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Block {
    Number(f64),
    String(String),
    Blank,
    Tape(TapeBlock),
    AddressIdentifier {
        label: String,
        /// Owning frame, stamped by capture analysis for local/param labels
        #[serde(default, skip_serializing_if = "Option::is_none")]
        frame_id: Option<FrameId>,
    },
    ValueIdentifier {
        label: String,
    },
    Op {
        identifier: String,
    },
}

impl Block {
    pub fn address(label: impl Into<String>) -> Self {
        Block::AddressIdentifier {
            label: label.into(),
            frame_id: None,
        }
    }

    pub fn value_identifier(label: impl Into<String>) -> Self {
        Block::ValueIdentifier {
            label: label.into(),
        }
    }

    pub fn op(identifier: impl Into<String>) -> Self {
        Block::Op {
            identifier: identifier.into(),
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Block::Op { .. } => Category::Op,
            _ => Category::Value,
        }
    }

    /// Name of the concrete variant, e.g. `"Number"` or `"AddressIdentifier"`
    pub fn kind(&self) -> &'static str {
        match self {
            Block::Number(_) => "Number",
            Block::String(_) => "String",
            Block::Blank => "Blank",
            Block::Tape(_) => "Tape",
            Block::AddressIdentifier { .. } => "AddressIdentifier",
            Block::ValueIdentifier { .. } => "ValueIdentifier",
            Block::Op { .. } => "Op",
        }
    }

    /// Check the category and, optionally, the kind of this block
    pub fn is(&self, category: Category, kind: Option<&str>) -> bool {
        self.category() == category && kind.is_none_or(|k| k == self.kind())
    }

    /// The label or op name this block refers to, if any
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Block::AddressIdentifier { label, .. } | Block::ValueIdentifier { label } => {
                Some(label)
            }
            Block::Op { identifier } => Some(identifier),
            _ => None,
        }
    }

    /// Frame stamp carried by captured address blocks
    pub fn frame_id(&self) -> Option<FrameId> {
        match self {
            Block::AddressIdentifier { frame_id, .. } => *frame_id,
            _ => None,
        }
    }

    pub fn is_value_identifier(&self) -> bool {
        matches!(self, Block::ValueIdentifier { .. })
    }

    /// Host truthiness: zero, NaN, the empty string and blank are falsy
    pub fn truthy(&self) -> bool {
        match self {
            Block::Number(n) => *n != 0.0 && !n.is_nan(),
            Block::String(s) => !s.is_empty(),
            Block::Blank => false,
            _ => true,
        }
    }

    pub fn as_tape(&self) -> Option<&TapeBlock> {
        match self {
            Block::Tape(tape) => Some(tape),
            _ => None,
        }
    }
}

impl From<f64> for Block {
    fn from(n: f64) -> Self {
        Block::Number(n)
    }
}

impl From<&str> for Block {
    fn from(s: &str) -> Self {
        Block::String(s.to_string())
    }
}

impl From<String> for Block {
    fn from(s: String) -> Self {
        Block::String(s)
    }
}

/// Format a number the way the host does: whole numbers without a fraction
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Block::Number(n) => write!(f, "{}", format_number(*n)),
            Block::String(s) => write!(f, "{s:?}"),
            Block::Blank => write!(f, "_"),
            Block::Tape(tape) => write!(f, "<tape/{}>", tape.tape.cells.len()),
            Block::AddressIdentifier { label, .. } => write!(f, "@{label}"),
            Block::ValueIdentifier { label } => write!(f, "{label}"),
            Block::Op { identifier } => write!(f, "{identifier}!"),
        }
    }
}

/// A tape value together with the frames owning its upvalues.
///
/// The stamp table is filled by capture analysis of the frame the tape
/// literal sits on, so a tape that escapes that frame still knows where its
/// free labels live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TapeBlock {
    pub tape: Rc<Tape>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub upvalue_frames: BTreeMap<String, FrameId>,
}

impl TapeBlock {
    pub fn new(tape: Rc<Tape>) -> Self {
        TapeBlock {
            tape,
            upvalue_frames: BTreeMap::new(),
        }
    }
}

/// One cell of a tape template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub block: Block,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub span: Option<Span>,
}

impl Cell {
    pub fn new(block: Block, span: Option<Span>) -> Self {
        Cell { block, span }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceKind {
    Local,
    Param,
    Upvalue,
}

/// How a label is bound from the point of view of one tape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub kind: ReferenceKind,
    /// Cell index for locals, parameter index for params, absent for upvalues
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl Reference {
    pub fn local(index: usize) -> Self {
        Reference {
            kind: ReferenceKind::Local,
            index: Some(index),
        }
    }

    pub fn param(index: usize) -> Self {
        Reference {
            kind: ReferenceKind::Param,
            index: Some(index),
        }
    }

    pub fn upvalue() -> Self {
        Reference {
            kind: ReferenceKind::Upvalue,
            index: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub label: String,
    pub default: Block,
}

/// An immutable tape template
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Tape {
    pub cells: Vec<Cell>,
    /// `commas[i]` is true when cell `i` is preceded by a comma
    pub commas: Vec<bool>,
    pub label_index: BTreeMap<String, usize>,
    pub references: BTreeMap<String, Reference>,
    pub params: Vec<Param>,
}

impl Tape {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn index_of_label(&self, label: &str) -> Option<usize> {
        self.label_index.get(label).copied()
    }

    pub fn reference(&self, label: &str) -> Option<&Reference> {
        self.references.get(label)
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.cells.iter().map(|cell| &cell.block)
    }

    pub fn span_at(&self, index: usize) -> Option<Span> {
        self.cells.get(index).and_then(|cell| cell.span)
    }
}
