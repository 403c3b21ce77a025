//! One activation of a tape

use super::capture::{self, FrameReference};
use super::errors::EngineError;
use crate::ast::{Block, FrameId, ReferenceKind, Span, TapeBlock};
use std::collections::{BTreeMap, BTreeSet};

/// A live activation: head cursor, pending arguments, parameter bindings and
/// its own copy of the tape's cells.
///
/// The cells are copied from the template when the frame is created, so two
/// activations of the same tape never observe each other's writes.
#[derive(Debug, Clone)]
pub struct Frame {
    pub id: FrameId,
    tape: TapeBlock,
    cells: Vec<Block>,
    commas: Vec<bool>,
    pub head: usize,
    pub halted: bool,
    pub arguments: Vec<Block>,
    actual_argument_cells: Vec<Block>,
    references: BTreeMap<String, FrameReference>,
    scheduled_jump: Option<ScheduledJump>,
}

/// A jump taken in place of an advance once `remaining` advances have run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScheduledJump {
    target: usize,
    remaining: usize,
}

impl Frame {
    /// Bind `tape` to the passed arguments. Parameters without a passed
    /// argument take their default.
    pub fn new(id: FrameId, tape: &TapeBlock, passed: Vec<Block>) -> Result<Self, EngineError> {
        let analysis = capture::analyze(id, tape)?;

        let mut passed = passed.into_iter();
        let actual_argument_cells = tape
            .tape
            .params
            .iter()
            .map(|param| passed.next().unwrap_or_else(|| param.default.clone()))
            .collect();

        Ok(Frame {
            id,
            tape: tape.clone(),
            cells: analysis.cells,
            commas: tape.tape.commas.clone(),
            head: 0,
            halted: false,
            arguments: Vec::new(),
            actual_argument_cells,
            references: analysis.references,
            scheduled_jump: None,
        })
    }

    pub fn tape(&self) -> &TapeBlock {
        &self.tape
    }

    pub fn cells(&self) -> &[Block] {
        &self.cells
    }

    pub fn reference(&self, label: &str) -> Option<&FrameReference> {
        self.references.get(label)
    }

    pub fn references(&self) -> &BTreeMap<String, FrameReference> {
        &self.references
    }

    pub fn is_beyond_edge(&self) -> bool {
        self.head >= self.cells.len()
    }

    pub fn advance(&mut self) {
        self.head += 1;
    }

    /// After the current block and `blocks` more have finished, move the
    /// head to `target` instead of advancing. Replaces any earlier schedule.
    pub fn schedule_jump(&mut self, target: usize, blocks: usize) {
        self.scheduled_jump = Some(ScheduledJump {
            target,
            remaining: blocks + 1,
        });
    }

    /// Advance, unless a scheduled jump is due
    pub fn advance_or_jump(&mut self) {
        if let Some(jump) = self.scheduled_jump.as_mut() {
            jump.remaining -= 1;
            if jump.remaining == 0 {
                self.head = jump.target;
                self.scheduled_jump = None;
                return;
            }
        }
        self.advance();
    }

    pub fn halt(&mut self) {
        self.halted = true;
    }

    pub fn block_at_head(&self) -> Option<&Block> {
        self.block_at(self.head)
    }

    pub fn block_at(&self, index: usize) -> Option<&Block> {
        self.cells.get(index)
    }

    /// Source location of the block at head, if it came from the template
    pub fn span_at_head(&self) -> Option<Span> {
        self.tape.tape.span_at(self.head)
    }

    pub fn is_comma_at_head(&self) -> bool {
        self.is_comma_at(self.head)
    }

    pub fn is_comma_at(&self, index: usize) -> bool {
        self.commas.get(index).copied().unwrap_or(false)
    }

    /// Write `block` one cell to the right of head
    pub fn place_result(&mut self, block: Block) {
        self.write_cell(self.head + 1, block);
    }

    fn write_cell(&mut self, index: usize, block: Block) {
        if index >= self.cells.len() {
            self.cells.resize(index + 1, Block::Blank);
            self.commas.resize(index + 1, false);
        }
        self.cells[index] = block;
    }

    pub fn append_block_to_arguments(&mut self, block: Block) {
        self.arguments.push(block);
    }

    pub fn clear_arguments(&mut self) {
        self.arguments.clear();
    }

    /// Append the value at head to the arguments, chasing value identifiers
    /// through this frame's own bindings until a plain block is found
    pub fn append_block_at_head_value_to_arguments(&mut self) -> Result<(), EngineError> {
        let Some(block) = self.block_at_head().cloned() else {
            return Err(EngineError::InvalidBlockCategory("nothing".into()));
        };
        let value = self.chase(block)?;
        self.append_block_to_arguments(value);
        Ok(())
    }

    fn chase(&self, mut block: Block) -> Result<Block, EngineError> {
        let mut seen = BTreeSet::new();
        while let Block::ValueIdentifier { label } = block {
            if !seen.insert(label.clone()) {
                return Err(EngineError::UnresolvedLabel(label));
            }
            block = self.block_by_label(&label)?.clone();
        }
        Ok(block)
    }

    pub fn block_by_label(&self, label: &str) -> Result<&Block, EngineError> {
        let slot = match self.param_index(label) {
            Some(index) => self.actual_argument_cells.get(index),
            None => self
                .tape
                .tape
                .index_of_label(label)
                .and_then(|index| self.cells.get(index)),
        };
        slot.ok_or_else(|| EngineError::UnresolvedLabel(label.to_string()))
    }

    pub fn set_block_by_label(&mut self, label: &str, block: Block) -> Result<(), EngineError> {
        if let Some(index) = self.param_index(label) {
            if let Some(slot) = self.actual_argument_cells.get_mut(index) {
                *slot = block;
                return Ok(());
            }
        }
        let index = self
            .tape
            .tape
            .index_of_label(label)
            .ok_or_else(|| EngineError::UnknownLabel(label.to_string()))?;
        self.write_cell(index, block);
        Ok(())
    }

    fn param_index(&self, label: &str) -> Option<usize> {
        self.references
            .get(label)
            .filter(|reference| reference.kind == ReferenceKind::Param)
            .and_then(|reference| reference.index)
    }

    /// Snapshot the current value of every captured binding
    pub fn close_references(&self) -> BTreeMap<String, Block> {
        self.references
            .iter()
            .filter(|(_, reference)| reference.captured)
            .filter_map(|(label, _)| {
                let block = self.block_by_label(label).ok()?;
                Some((label.clone(), block.clone()))
            })
            .collect()
    }

    pub fn move_head_to_label(&mut self, label: &str) -> Result<(), EngineError> {
        self.head = self
            .tape
            .tape
            .index_of_label(label)
            .ok_or_else(|| EngineError::UnknownLabel(label.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    fn frame(source: &str) -> Frame {
        let tape = TapeBlock::new(parse(source, "test.concrete").expect("Parse failed"));
        Frame::new(FrameId(0), &tape, Vec::new()).expect("frame")
    }

    #[test]
    fn test_edge_and_advance() {
        let mut frame = frame("1 2");
        assert!(!frame.is_beyond_edge());
        frame.advance();
        frame.advance();
        assert!(frame.is_beyond_edge());
        assert_eq!(frame.block_at_head(), None);
    }

    #[test]
    fn test_scheduled_jump_replaces_an_advance() {
        let mut frame = frame("go while! body! _ after");
        frame.head = 1;
        frame.schedule_jump(0, 2);

        // The op's own advance, then the two blocks after it
        frame.advance_or_jump();
        assert_eq!(frame.head, 2);
        frame.advance_or_jump();
        assert_eq!(frame.head, 3);
        frame.advance_or_jump();
        assert_eq!(frame.head, 0);

        // The schedule is used up
        frame.advance_or_jump();
        assert_eq!(frame.head, 1);
    }

    #[test]
    fn test_empty_frame_is_beyond_edge() {
        assert!(frame("").is_beyond_edge());
    }

    #[test]
    fn test_comma_at_head() {
        let mut frame = frame("1, 2");
        assert!(!frame.is_comma_at_head());
        frame.advance();
        assert!(frame.is_comma_at_head());
    }

    #[test]
    fn test_place_result_targets_next_cell() {
        let mut frame = frame("1 add! _");
        frame.advance();
        frame.place_result(Block::Number(9.0));
        assert_eq!(frame.block_at(2), Some(&Block::Number(9.0)));
    }

    #[test]
    fn test_place_result_past_end_grows_cells() {
        let mut frame = frame("1, 2 add!");
        frame.head = 2;
        frame.place_result(Block::Number(3.0));
        assert_eq!(frame.cells().len(), 4);
        assert_eq!(frame.block_at(3), Some(&Block::Number(3.0)));
        assert!(!frame.is_comma_at(3));
    }

    #[test]
    fn test_writes_do_not_touch_template() {
        let tape = TapeBlock::new(parse("a: 1", "test.concrete").expect("Parse failed"));
        let mut first = Frame::new(FrameId(0), &tape, Vec::new()).expect("frame");
        let second = Frame::new(FrameId(1), &tape, Vec::new()).expect("frame");

        first.set_block_by_label("a", Block::Number(2.0)).expect("set");
        assert_eq!(first.block_by_label("a"), Ok(&Block::Number(2.0)));
        assert_eq!(second.block_by_label("a"), Ok(&Block::Number(1.0)));
        assert_eq!(tape.tape.cells[0].block, Block::Number(1.0));
    }

    #[test]
    fn test_arguments_accumulate_and_clear() {
        let mut frame = frame("");
        frame.append_block_to_arguments(Block::Number(1.0));
        frame.append_block_to_arguments(Block::Number(2.0));
        assert_eq!(frame.arguments.len(), 2);
        frame.clear_arguments();
        assert!(frame.arguments.is_empty());
    }

    #[test]
    fn test_identifier_chase() {
        let mut frame = frame("abcd: efgh, efgh: 5 abcd");
        frame.head = 2;
        frame
            .append_block_at_head_value_to_arguments()
            .expect("chase");
        assert_eq!(frame.arguments, vec![Block::Number(5.0)]);
    }

    #[test]
    fn test_identifier_chase_unbound_label() {
        let mut frame = frame("nowhere");
        assert_eq!(
            frame.append_block_at_head_value_to_arguments(),
            Err(EngineError::UnresolvedLabel("nowhere".into()))
        );
    }

    #[test]
    fn test_identifier_chase_cycle_fails() {
        let mut frame = frame("a: b b: a a");
        frame.head = 2;
        assert!(matches!(
            frame.append_block_at_head_value_to_arguments(),
            Err(EngineError::UnresolvedLabel(_))
        ));
    }

    #[test]
    fn test_params_bind_passed_or_default() {
        let tape = parse("(n, m: 2)[ n ]", "test.concrete").expect("Parse failed");
        let inner = tape.cells[0].block.as_tape().expect("tape");

        let frame = Frame::new(FrameId(1), inner, vec![Block::Number(5.0)]).expect("frame");
        assert_eq!(frame.block_by_label("n"), Ok(&Block::Number(5.0)));
        assert_eq!(frame.block_by_label("m"), Ok(&Block::Number(2.0)));

        let frame = Frame::new(FrameId(2), inner, Vec::new()).expect("frame");
        assert_eq!(frame.block_by_label("n"), Ok(&Block::Blank));
    }

    #[test]
    fn test_set_param_by_label() {
        let tape = parse("(n)[ n ]", "test.concrete").expect("Parse failed");
        let inner = tape.cells[0].block.as_tape().expect("tape");
        let mut frame = Frame::new(FrameId(1), inner, vec![Block::Number(1.0)]).expect("frame");
        frame.set_block_by_label("n", Block::Number(4.0)).expect("set");
        assert_eq!(frame.block_by_label("n"), Ok(&Block::Number(4.0)));
    }

    #[test]
    fn test_set_unknown_label() {
        let mut frame = frame("1");
        assert_eq!(
            frame.set_block_by_label("x", Block::Blank),
            Err(EngineError::UnknownLabel("x".into()))
        );
    }

    #[test]
    fn test_close_references_snapshots_captured_only() {
        let mut frame = frame("a: 5 b: 6 [ a ] call! _");
        let closed = frame.close_references();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed.get("a"), Some(&Block::Number(5.0)));

        frame.set_block_by_label("a", Block::Number(7.0)).expect("set");
        assert_eq!(closed.get("a"), Some(&Block::Number(5.0)));
    }

    #[test]
    fn test_move_head_to_label() {
        let mut frame = frame("1 2 end: 3");
        frame.move_head_to_label("end").expect("move");
        assert_eq!(frame.head, 2);
        assert_eq!(
            frame.move_head_to_label("missing"),
            Err(EngineError::UnknownLabel("missing".into()))
        );
    }
}
