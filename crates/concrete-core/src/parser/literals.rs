use super::RawBlock;
use chumsky::prelude::*;

/// Creates a parser for number literals (integers and decimals, optionally negative)
pub fn number<'a>() -> impl Parser<'a, &'a str, RawBlock, extra::Err<Rich<'a, char>>> + Clone {
    just('-')
        .or_not()
        .then(text::int(10))
        .then(just('.').then(text::digits(10)).or_not())
        .to_slice()
        .try_map(|s: &str, span| {
            s.parse::<f64>()
                .map(RawBlock::Number)
                .map_err(|_| Rich::custom(span, format!("invalid number literal '{s}'")))
        })
}

/// Creates a parser for double-quoted string literals with `\" \\ \n \t` escapes
pub fn string<'a>() -> impl Parser<'a, &'a str, RawBlock, extra::Err<Rich<'a, char>>> + Clone {
    let escape = just('\\').ignore_then(choice((
        just('\\'),
        just('"'),
        just('n').to('\n'),
        just('t').to('\t'),
    )));

    none_of("\\\"")
        .or(escape)
        .repeated()
        .collect::<String>()
        .delimited_by(just('"'), just('"'))
        .map(RawBlock::String)
}

/// Creates a parser for the blank literal `_`, refusing identifiers such as `_x`
pub fn blank<'a>() -> impl Parser<'a, &'a str, RawBlock, extra::Err<Rich<'a, char>>> + Clone {
    just('_')
        .then_ignore(any().filter(|c: &char| c.is_alphanumeric() || *c == '_').not())
        .to(RawBlock::Blank)
}

/// Literal blocks allowed as parameter defaults
pub fn default_value<'a>() -> impl Parser<'a, &'a str, RawBlock, extra::Err<Rich<'a, char>>> + Clone {
    choice((number(), string(), blank()))
}
