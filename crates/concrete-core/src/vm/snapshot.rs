use super::frame::Frame;
use crate::ast::FrameId;
use serde::Serialize;
use std::collections::BTreeMap;

/// Serializable picture of the engine, attached to failures and used by the
/// `debug` executor and the stepping CLI
#[derive(Debug, Clone, Default, Serialize)]
pub struct EngineSnapshot {
    pub state: String,
    pub steps: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_block: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<FrameSnapshot>,
    /// Caller frames, outermost first
    pub stack: Vec<FrameSnapshot>,
    pub closures: BTreeMap<String, BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FrameSnapshot {
    pub id: FrameId,
    pub head: usize,
    pub halted: bool,
    pub arguments: Vec<String>,
    pub cells: Vec<String>,
}

impl From<&Frame> for FrameSnapshot {
    fn from(frame: &Frame) -> Self {
        FrameSnapshot {
            id: frame.id,
            head: frame.head,
            halted: frame.halted,
            arguments: frame.arguments.iter().map(ToString::to_string).collect(),
            cells: frame.cells().iter().map(ToString::to_string).collect(),
        }
    }
}

impl EngineSnapshot {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }
}
