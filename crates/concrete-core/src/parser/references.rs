//! Tape layout and reference analysis
//!
//! Every tape learns how each label it mentions is bound: `Local` for labels
//! placed on its own cells, `Param` for its parameters, `Upvalue` for labels
//! bound by an enclosing tape. A label a nested tape needs as an upvalue is
//! also an upvalue of every intermediate tape, so capture analysis can hand
//! the owning frame down one level at a time.

use super::{RawBlock, RawCell, RawParam};
use crate::ast::{Block, Cell, Param, Reference, ReferenceKind, Span, Tape, TapeBlock};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

struct Layout<'f> {
    filename: &'f str,
    diagnostics: Vec<Diagnostic>,
}

/// Lay out the root tape of a program
pub fn layout_root(cells: Vec<RawCell>, filename: &str) -> Result<Tape, Vec<Diagnostic>> {
    let mut layout = Layout {
        filename,
        diagnostics: Vec::new(),
    };
    let tape = layout.tape(Vec::new(), cells, &[]);

    if layout.diagnostics.is_empty() {
        Ok(tape)
    } else {
        Err(layout.diagnostics)
    }
}

impl Layout<'_> {
    fn error(&mut self, message: String, span: Span) {
        self.diagnostics.push(Diagnostic::error(
            DiagnosticKind::Parse,
            message,
            span,
            self.filename.to_string(),
        ));
    }

    /// `enclosing` holds the bound labels of every enclosing tape, outermost first
    fn tape(
        &mut self,
        raw_params: Vec<RawParam>,
        raw_cells: Vec<RawCell>,
        enclosing: &[BTreeSet<String>],
    ) -> Tape {
        let mut references = BTreeMap::new();
        let mut label_index = BTreeMap::new();
        let mut params = Vec::with_capacity(raw_params.len());

        for (index, param) in raw_params.into_iter().enumerate() {
            if references.contains_key(&param.label) {
                self.error(format!("duplicate parameter '{}'", param.label), param.span);
                continue;
            }
            references.insert(param.label.clone(), Reference::param(index));
            params.push(Param {
                label: param.label,
                default: param.default.map(literal).unwrap_or(Block::Blank),
            });
        }

        for (index, cell) in raw_cells.iter().enumerate() {
            for (label, span) in &cell.labels {
                if references.contains_key(label) {
                    self.error(format!("duplicate label '{label}'"), *span);
                    continue;
                }
                references.insert(label.clone(), Reference::local(index));
                label_index.insert(label.clone(), index);
            }
        }

        let own: BTreeSet<String> = references.keys().cloned().collect();
        let mut scopes = enclosing.to_vec();
        scopes.push(own);

        let mut used = BTreeSet::new();
        let mut cells = Vec::with_capacity(raw_cells.len());
        let mut commas = Vec::with_capacity(raw_cells.len());

        for raw in raw_cells {
            let block = match raw.block {
                RawBlock::Tape {
                    params,
                    cells: nested,
                } => {
                    let nested = self.tape(params, nested, &scopes);
                    used.extend(
                        nested
                            .references
                            .iter()
                            .filter(|(_, r)| r.kind == ReferenceKind::Upvalue)
                            .map(|(label, _)| label.clone()),
                    );
                    Block::Tape(TapeBlock::new(Rc::new(nested)))
                }
                RawBlock::Address(label) => {
                    used.insert(label.clone());
                    Block::address(label)
                }
                RawBlock::Value(label) => {
                    used.insert(label.clone());
                    Block::value_identifier(label)
                }
                RawBlock::Op(identifier) => {
                    used.insert(identifier.clone());
                    Block::op(identifier)
                }
                other => literal(other),
            };
            cells.push(Cell::new(block, Some(raw.span)));
            commas.push(raw.comma);
        }

        for label in used {
            if references.contains_key(&label) {
                continue;
            }
            if enclosing.iter().any(|scope| scope.contains(&label)) {
                references.insert(label, Reference::upvalue());
            }
        }

        Tape {
            cells,
            commas,
            label_index,
            references,
            params,
        }
    }
}

fn literal(raw: RawBlock) -> Block {
    match raw {
        RawBlock::Number(n) => Block::Number(n),
        RawBlock::String(s) => Block::String(s),
        _ => Block::Blank,
    }
}
