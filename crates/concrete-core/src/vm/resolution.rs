//! Cross-frame resolution of labels and addresses
//!
//! A binding lives either on a frame that is still on the call stack or in
//! the closure store, once its frame has terminated. [`resolve`] decides
//! which, without touching any values; [`Bindings`] then reads through the
//! resolution and optionally keeps chasing value identifiers.

use super::closures::ClosureStore;
use super::errors::EngineError;
use super::frame::Frame;
use crate::ast::{Block, FrameId, ReferenceKind};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Storage {
    Stack,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub storage: Storage,
    pub frame_id: FrameId,
    pub label: String,
}

impl Resolution {
    fn new(storage: Storage, frame_id: FrameId, label: &str) -> Self {
        Resolution {
            storage,
            frame_id,
            label: label.to_string(),
        }
    }

    fn at(frame_id: FrameId, label: &str, closures: &ClosureStore) -> Self {
        let storage = if closures.contains(frame_id) {
            Storage::Closed
        } else {
            Storage::Stack
        };
        Resolution::new(storage, frame_id, label)
    }
}

/// Locate the storage behind `block` as seen from `active`
pub fn resolve(
    block: &Block,
    active: &Frame,
    closures: &ClosureStore,
) -> Result<Resolution, EngineError> {
    let label = block
        .identifier()
        .ok_or_else(|| EngineError::NotAnIdentifier(block.to_string()))?;

    if let Some(stamp) = block.frame_id() {
        return Ok(Resolution::at(stamp, label, closures));
    }

    let descriptor = active
        .reference(label)
        .ok_or_else(|| EngineError::MissingReference(label.to_string()))?;

    match descriptor.kind {
        ReferenceKind::Local | ReferenceKind::Param => {
            Ok(Resolution::new(Storage::Stack, active.id, label))
        }
        ReferenceKind::Upvalue => {
            let owner = descriptor
                .frame_id
                .ok_or_else(|| EngineError::ClosureCapturedOutOfContext(label.to_string()))?;
            Ok(Resolution::at(owner, label, closures))
        }
    }
}

/// Read access to every binding an engine holds: the active frame, the
/// frames below it and the closure store
#[derive(Clone, Copy)]
pub struct Bindings<'e> {
    pub active: &'e Frame,
    pub stack: &'e [Frame],
    pub closures: &'e ClosureStore,
}

impl<'e> Bindings<'e> {
    pub fn frame(&self, id: FrameId) -> Option<&'e Frame> {
        if self.active.id == id {
            return Some(self.active);
        }
        self.stack.iter().rev().find(|frame| frame.id == id)
    }

    pub fn resolve(&self, block: &Block) -> Result<Resolution, EngineError> {
        resolve(block, self.active, self.closures)
    }

    /// Read the block stored at a resolved location
    pub fn fetch(&self, resolution: &Resolution) -> Result<Block, EngineError> {
        match resolution.storage {
            Storage::Stack => {
                let frame = self
                    .frame(resolution.frame_id)
                    .ok_or(EngineError::FrameNotFound(resolution.frame_id))?;
                frame.block_by_label(&resolution.label).cloned()
            }
            Storage::Closed => self
                .closures
                .get(resolution.frame_id, &resolution.label)
                .cloned()
                .ok_or_else(|| EngineError::UnresolvedLabel(resolution.label.clone())),
        }
    }

    /// Resolve and fetch `block`. With `recursive` set, a fetched value
    /// identifier is resolved again from the frame that owns it, until a
    /// block that is not a value identifier turns up.
    pub fn dereference(&self, block: &Block, recursive: bool) -> Result<Block, EngineError> {
        let mut resolution = self.resolve(block)?;
        let mut seen = BTreeSet::new();

        loop {
            if !seen.insert((resolution.frame_id, resolution.label.clone())) {
                return Err(EngineError::UnresolvedLabel(resolution.label));
            }
            let fetched = self.fetch(&resolution)?;
            let Block::ValueIdentifier { label } = &fetched else {
                return Ok(fetched);
            };
            if !recursive {
                return Ok(fetched);
            }
            resolution = self.resolve_from_owner(&resolution, label)?;
        }
    }

    fn resolve_from_owner(
        &self,
        owner: &Resolution,
        label: &str,
    ) -> Result<Resolution, EngineError> {
        let identifier = Block::value_identifier(label);
        match owner.storage {
            Storage::Stack => {
                let frame = self
                    .frame(owner.frame_id)
                    .ok_or(EngineError::FrameNotFound(owner.frame_id))?;
                resolve(&identifier, frame, self.closures)
            }
            // A dead frame only kept its captured bindings
            Storage::Closed => match self.closures.get(owner.frame_id, label) {
                Some(_) => Ok(Resolution::new(Storage::Closed, owner.frame_id, label)),
                None => Err(EngineError::MissingReference(label.to_string())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TapeBlock;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn root_frame(source: &str) -> Frame {
        let tape = TapeBlock::new(parse(source, "test.concrete").expect("Parse failed"));
        Frame::new(FrameId(0), &tape, Vec::new()).expect("frame")
    }

    /// Activate the tape found at `index` on `caller` as frame `id`
    fn nested_frame(caller: &Frame, index: usize, id: u64) -> Frame {
        let tape = caller.block_at(index).and_then(Block::as_tape).expect("tape");
        Frame::new(FrameId(id), tape, Vec::new()).expect("frame")
    }

    #[test]
    fn test_local_resolves_to_active_stack_frame() {
        let frame = root_frame("a: 5 a");
        let closures = ClosureStore::new();
        let resolution = resolve(&Block::value_identifier("a"), &frame, &closures).expect("resolve");
        assert_eq!(resolution, Resolution::new(Storage::Stack, FrameId(0), "a"));
    }

    #[test]
    fn test_missing_reference() {
        let frame = root_frame("1");
        let closures = ClosureStore::new();
        assert_eq!(
            resolve(&Block::value_identifier("x"), &frame, &closures),
            Err(EngineError::MissingReference("x".into()))
        );
    }

    #[test]
    fn test_non_identifier_fails() {
        let frame = root_frame("1");
        let closures = ClosureStore::new();
        assert!(matches!(
            resolve(&Block::Number(1.0), &frame, &closures),
            Err(EngineError::NotAnIdentifier(_))
        ));
    }

    #[test]
    fn test_upvalue_resolves_to_live_owner() {
        let root = root_frame("a: 5 [ a ] call! _");
        let inner = nested_frame(&root, 1, 1);
        let closures = ClosureStore::new();
        let stack = vec![root];
        let bindings = Bindings {
            active: &inner,
            stack: &stack,
            closures: &closures,
        };

        let resolution = bindings.resolve(&Block::value_identifier("a")).expect("resolve");
        assert_eq!(resolution, Resolution::new(Storage::Stack, FrameId(0), "a"));
        assert_eq!(
            bindings.dereference(&Block::value_identifier("a"), true),
            Ok(Block::Number(5.0))
        );
    }

    #[test]
    fn test_upvalue_resolves_to_closed_owner() {
        let root = root_frame("a: 5 [ a ] call! _");
        let inner = nested_frame(&root, 1, 1);
        let mut closures = ClosureStore::new();
        closures.insert(FrameId(0), root.close_references());

        let bindings = Bindings {
            active: &inner,
            stack: &[],
            closures: &closures,
        };
        let resolution = bindings.resolve(&Block::value_identifier("a")).expect("resolve");
        assert_eq!(resolution.storage, Storage::Closed);
        assert_eq!(
            bindings.dereference(&Block::value_identifier("a"), false),
            Ok(Block::Number(5.0))
        );
    }

    #[test]
    fn test_stamped_address_uses_stamp() {
        let root = root_frame("a: 1 @a");
        let address = root.block_at(1).cloned().expect("address");
        let other = root_frame("");
        let mut closures = ClosureStore::new();

        let resolution = resolve(&address, &other, &closures).expect("resolve");
        assert_eq!(resolution, Resolution::new(Storage::Stack, FrameId(0), "a"));

        closures.insert(FrameId(0), BTreeMap::from([("a".into(), Block::Number(1.0))]));
        let resolution = resolve(&address, &other, &closures).expect("resolve");
        assert_eq!(resolution.storage, Storage::Closed);
    }

    #[test]
    fn test_recursive_chase_crosses_frames() {
        let root = root_frame("a: b, b: 7 [ a ] call! _");
        let inner = nested_frame(&root, 2, 1);
        let closures = ClosureStore::new();
        let stack = vec![root];
        let bindings = Bindings {
            active: &inner,
            stack: &stack,
            closures: &closures,
        };

        let identifier = Block::value_identifier("a");
        assert_eq!(
            bindings.dereference(&identifier, false),
            Ok(Block::value_identifier("b"))
        );
        assert_eq!(bindings.dereference(&identifier, true), Ok(Block::Number(7.0)));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let root = root_frame("a: 5 [ a ] call! _");
        let inner = nested_frame(&root, 1, 1);
        let closures = ClosureStore::new();
        let identifier = Block::value_identifier("a");
        let first = resolve(&identifier, &inner, &closures).expect("resolve");
        let second = resolve(&identifier, &inner, &closures).expect("resolve");
        assert_eq!(first, second);
    }

    #[test]
    fn test_chase_cycle_fails() {
        let root = root_frame("a: b b: a a");
        let closures = ClosureStore::new();
        let bindings = Bindings {
            active: &root,
            stack: &[],
            closures: &closures,
        };
        assert!(matches!(
            bindings.dereference(&Block::value_identifier("a"), true),
            Err(EngineError::UnresolvedLabel(_))
        ));
    }
}
