use crate::ast::{Block, FrameId};
use serde::Serialize;
use std::collections::BTreeMap;

/// Bindings of terminated frames that something still refers to, keyed by
/// the dead frame's id. Entries live as long as the engine.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClosureStore {
    frames: BTreeMap<FrameId, BTreeMap<String, Block>>,
}

impl ClosureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, frame_id: FrameId, bindings: BTreeMap<String, Block>) {
        self.frames.insert(frame_id, bindings);
    }

    pub fn contains(&self, frame_id: FrameId) -> bool {
        self.frames.contains_key(&frame_id)
    }

    pub fn get(&self, frame_id: FrameId, label: &str) -> Option<&Block> {
        self.frames.get(&frame_id)?.get(label)
    }

    /// Overwrite a closed binding. Returns false when no such binding exists.
    pub fn set(&mut self, frame_id: FrameId, label: &str, block: Block) -> bool {
        match self
            .frames
            .get_mut(&frame_id)
            .and_then(|bindings| bindings.get_mut(label))
        {
            Some(slot) => {
                *slot = block;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FrameId, &BTreeMap<String, Block>)> {
        self.frames.iter()
    }
}
