//! Capture analysis
//!
//! Runs once per activation, before the frame exists. It decides which of
//! the frame's own bindings outlive it (because a nested tape or an address
//! on the tape points at them) and stamps those nested tapes and addresses
//! with the identity of the frame that owns each binding.

use super::errors::EngineError;
use crate::ast::{Block, FrameId, ReferenceKind, TapeBlock};
use serde::Serialize;
use std::collections::BTreeMap;
use std::rc::Rc;

/// How a label is bound from the point of view of one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameReference {
    pub kind: ReferenceKind,
    pub index: Option<usize>,
    /// Owner of the binding: this frame for locals and params, the stamped
    /// frame for upvalues
    pub frame_id: Option<FrameId>,
    /// True when the binding has to survive this frame
    pub captured: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaptureAnalysis {
    pub references: BTreeMap<String, FrameReference>,
    /// The tape's cells with nested tapes and addresses stamped
    pub cells: Vec<Block>,
}

pub fn analyze(frame_id: FrameId, tape_block: &TapeBlock) -> Result<CaptureAnalysis, EngineError> {
    let tape = &tape_block.tape;

    let mut references: BTreeMap<String, FrameReference> = tape
        .references
        .iter()
        .map(|(label, reference)| {
            let owner = match reference.kind {
                ReferenceKind::Upvalue => tape_block.upvalue_frames.get(label).copied(),
                ReferenceKind::Local | ReferenceKind::Param => Some(frame_id),
            };
            let descriptor = FrameReference {
                kind: reference.kind,
                index: reference.index,
                frame_id: owner,
                captured: false,
            };
            (label.clone(), descriptor)
        })
        .collect();

    let mut cells = Vec::with_capacity(tape.len());
    for block in tape.blocks() {
        let stamped = match block {
            Block::Tape(nested) => Block::Tape(stamp_nested(frame_id, nested, &mut references)?),
            Block::AddressIdentifier { label, .. } => match references.get_mut(label) {
                Some(descriptor) if descriptor.kind != ReferenceKind::Upvalue => {
                    descriptor.captured = true;
                    Block::AddressIdentifier {
                        label: label.clone(),
                        frame_id: Some(frame_id),
                    }
                }
                _ => block.clone(),
            },
            other => other.clone(),
        };
        cells.push(stamped);
    }

    Ok(CaptureAnalysis { references, cells })
}

fn stamp_nested(
    frame_id: FrameId,
    nested: &TapeBlock,
    references: &mut BTreeMap<String, FrameReference>,
) -> Result<TapeBlock, EngineError> {
    let inner = Rc::clone(&nested.tape);
    let mut stamped = nested.clone();

    let upvalues = inner
        .references
        .iter()
        .filter(|(_, reference)| reference.kind == ReferenceKind::Upvalue);

    for (label, _) in upvalues {
        let descriptor = references
            .get_mut(label)
            .ok_or_else(|| EngineError::MissingReference(label.clone()))?;

        let owner = match descriptor.kind {
            ReferenceKind::Local | ReferenceKind::Param => {
                descriptor.captured = true;
                frame_id
            }
            ReferenceKind::Upvalue => descriptor
                .frame_id
                .ok_or_else(|| EngineError::ClosureCapturedOutOfContext(label.clone()))?,
        };
        stamped.upvalue_frames.insert(label.clone(), owner);
    }

    Ok(stamped)
}
