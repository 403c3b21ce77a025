//! Source parser: turns Concrete source text into a root [`Tape`]
//!
//! Parsing happens in two passes. The chumsky grammar produces a raw cell
//! tree, then [`references`] lays out each tape and computes its
//! label/reference tables.

use crate::ast::{Span, Tape};
use crate::diagnostics::Diagnostic;
use chumsky::prelude::*;
use std::rc::Rc;

mod errors;
mod lexer;
mod literals;
mod references;

/// A block as read from source, before tapes are laid out
#[derive(Debug, Clone, PartialEq)]
pub enum RawBlock {
    Number(f64),
    String(String),
    Blank,
    Tape {
        params: Vec<RawParam>,
        cells: Vec<RawCell>,
    },
    Address(String),
    Value(String),
    Op(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawParam {
    pub label: String,
    pub default: Option<RawBlock>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawCell {
    pub labels: Vec<(String, Span)>,
    pub block: RawBlock,
    pub comma: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
enum Item {
    Comma,
    Cell(RawCell),
}

/// Attach each comma to the cell following it
fn attach_commas(items: Vec<Item>) -> Vec<RawCell> {
    let mut cells = Vec::new();
    let mut pending_comma = false;
    for item in items {
        match item {
            Item::Comma => pending_comma = true,
            Item::Cell(mut cell) => {
                cell.comma = pending_comma;
                pending_comma = false;
                cells.push(cell);
            }
        }
    }
    cells
}

pub fn parser<'a>() -> impl Parser<'a, &'a str, Vec<RawCell>, extra::Err<Rich<'a, char>>> {
    // Comments and whitespace
    let ws = lexer::ws();

    let ident = lexer::ident();

    let sequence = recursive(|sequence| {
        let param = ident
            .clone()
            .padded_by(ws.clone())
            .then(
                just(':')
                    .padded_by(ws.clone())
                    .ignore_then(literals::default_value())
                    .or_not(),
            )
            .map_with(|(label, default): (&str, Option<RawBlock>), e| RawParam {
                label: label.to_string(),
                default,
                span: Span::from_chumsky(e.span()),
            });

        let params = param
            .separated_by(just(',').padded_by(ws.clone()))
            .allow_trailing()
            .collect::<Vec<RawParam>>()
            .delimited_by(
                just('(').padded_by(ws.clone()),
                just(')').padded_by(ws.clone()),
            );

        let tape = params
            .or_not()
            .then(sequence.delimited_by(
                just('[').padded_by(ws.clone()),
                just(']').padded_by(ws.clone()),
            ))
            .map(|(params, cells)| RawBlock::Tape {
                params: params.unwrap_or_default(),
                cells,
            });

        let address = just('@')
            .ignore_then(ident.clone())
            .map(|label: &str| RawBlock::Address(label.to_string()));

        let symbolic = lexer::symbolic_op()
            .then_ignore(just('!').or_not())
            .map(|op: &str| RawBlock::Op(op.to_string()));

        let word = ident
            .clone()
            .then(just('!').or_not())
            .map(|(name, bang): (&str, Option<char>)| match bang {
                Some(_) => RawBlock::Op(name.to_string()),
                None => RawBlock::Value(name.to_string()),
            });

        // Numbers come before symbolic ops so `-1` is a literal
        let block = choice((
            literals::number(),
            literals::string(),
            literals::blank(),
            address,
            tape,
            symbolic,
            word,
        ))
        .boxed();

        let label = ident
            .clone()
            .then_ignore(just(':'))
            .map_with(|label: &str, e| (label.to_string(), Span::from_chumsky(e.span())))
            .padded_by(ws.clone());

        let cell = label
            .repeated()
            .collect::<Vec<_>>()
            .then(block.map_with(|block, e| (block, Span::from_chumsky(e.span()))))
            .map(|(labels, (block, span))| RawCell {
                labels,
                block,
                comma: false,
                span,
            });

        choice((just(',').to(Item::Comma), cell.map(Item::Cell)))
            .padded_by(ws.clone())
            .repeated()
            .collect::<Vec<Item>>()
            .map(attach_commas)
    });

    ws.clone().ignore_then(sequence).then_ignore(end())
}

/// Parse source text into the root tape of a program
pub fn parse(source: &str, filename: &str) -> Result<Rc<Tape>, Vec<Diagnostic>> {
    let (output, errs) = parser().parse(source).into_output_errors();

    if !errs.is_empty() {
        return Err(errors::errors_to_diagnostics(errs, filename));
    }

    let cells = output.unwrap_or_default();
    references::layout_root(cells, filename).map(Rc::new)
}
