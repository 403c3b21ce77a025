use chumsky::prelude::*;

/// Parser for line comments (// to end of line)
pub fn line_comment<'a>() -> impl Parser<'a, &'a str, (), extra::Err<Rich<'a, char>>> + Clone {
    just("//").then(none_of("\n").repeated()).ignored()
}

/// Parser for all whitespace and comments
pub fn ws<'a>() -> impl Parser<'a, &'a str, (), extra::Err<Rich<'a, char>>> + Clone {
    let ws_item = line_comment().or(one_of(" \t\r\n").ignored());
    ws_item.repeated()
}

/// Parser for identifiers: a letter followed by letters, digits, `_` or `-`
pub fn ident<'a>() -> impl Parser<'a, &'a str, &'a str, extra::Err<Rich<'a, char>>> + Clone {
    any()
        .filter(|c: &char| c.is_ascii_alphabetic())
        .then(
            any()
                .filter(|c: &char| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
                .repeated(),
        )
        .to_slice()
}

/// Parser for symbolic operator names. Two-character forms are tried first
/// so `>=` is not read as `>` followed by `=`.
pub fn symbolic_op<'a>() -> impl Parser<'a, &'a str, &'a str, extra::Err<Rich<'a, char>>> + Clone {
    choice((
        just(">=").to_slice(),
        just("<=").to_slice(),
        one_of("+-*/%><=~&|").to_slice(),
    ))
}
