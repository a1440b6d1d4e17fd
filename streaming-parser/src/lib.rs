#![doc = include_str!("../README.md")]

mod char_locations;
mod demand;
mod error;
mod grouping;
mod location;
mod matcher;
mod number;
mod path;
mod token;
mod token_writer;
mod tokenizer;
mod tree;

pub use demand::{Demand, Flow, Subscriber};
pub use error::{ConfigError, ErrKind, Error, ErrorCategory, PathSyntaxError, SelectError};
pub use grouping::{Group, Grouping};
pub use location::Location;
pub use matcher::{PathEvent, PathMatcher};
pub use path::{Accessor, Fragment, Path, Segment};
pub use token::{Token, TokenEvent};
pub use token_writer::TokenWriter;
pub use tokenizer::{Mode, Tokenizer};
pub use tree::{group_to_value, TreeBuilder, TreeError};

/// Lazily tokenizes the given stream of characters as strict (RFC 4627) JSON.
/// Every token is tagged with the concrete path it was found at. If the stream
/// is not valid JSON, the tokens before the failure are yielded, then the
/// failure.
pub fn tokenize<CharsStream, PassThroughError>(
    stream: CharsStream,
) -> Tokenizer<CharsStream, PassThroughError>
where
    CharsStream: IntoIterator<Item = Result<char, PassThroughError>>,
{
    Tokenizer::new(stream, Mode::Strict)
}

/// Lazily tokenizes the given stream of characters with the lenient grammar.
/// Any number of top-level values may follow each other, and a
/// [`Token::DocumentEnd`] is yielded after each of them.
pub fn tokenize_lenient<CharsStream, PassThroughError>(
    stream: CharsStream,
) -> Tokenizer<CharsStream, PassThroughError>
where
    CharsStream: IntoIterator<Item = Result<char, PassThroughError>>,
{
    Tokenizer::new(stream, Mode::Lenient)
}

/// Tags every token event with the shortest fragment of the given patterns
/// that matches it. The matcher is strict; call [`PathMatcher::lenient`] on
/// the result for multi-document input.
///
/// Fails if no pattern is supplied.
pub fn match_paths<Tokens, Patterns>(
    tokens: Tokens,
    patterns: Patterns,
) -> Result<PathMatcher<Tokens::IntoIter>, ConfigError>
where
    Tokens: IntoIterator,
    Patterns: IntoIterator<Item = Path>,
{
    PathMatcher::new(tokens, patterns)
}

/// Coalesces matched path events into groups, one per matched subtree.
pub fn group_paths<Events, PassThroughError>(
    events: Events,
) -> Grouping<Events::IntoIter, PassThroughError>
where
    Events: IntoIterator<Item = Result<PathEvent, Error<PassThroughError>>>,
{
    Grouping::new(events)
}

/// Selects the subtrees matching any of the textual JSONPath `patterns` from
/// the given stream of characters.
///
/// The matcher follows `mode`: strict selection stops reading input once
/// every pattern is provably done, lenient selection reads every document.
/// Invalid patterns are reported before any input is read.
pub fn select<CharsStream, PassThroughError>(
    stream: CharsStream,
    patterns: &[&str],
    mode: Mode,
) -> Result<
    Grouping<PathMatcher<Tokenizer<CharsStream, PassThroughError>>, PassThroughError>,
    SelectError,
>
where
    CharsStream: IntoIterator<Item = Result<char, PassThroughError>>,
{
    let patterns = patterns
        .iter()
        .map(|text| Path::parse(text))
        .collect::<Result<Vec<_>, _>>()?;

    let matcher = PathMatcher::new(Tokenizer::new(stream, mode), patterns)?;
    let matcher = match mode {
        Mode::Strict => matcher.strict(),
        Mode::Lenient => matcher.lenient(),
    };
    Ok(Grouping::new(matcher))
}

/// Lazily renders the given tokens as compact JSON text. The output is
/// produced on demand, so the caller can flush it to an output target
/// incrementally.
pub fn to_json_text<Tokens>(tokens: Tokens) -> TokenWriter<Tokens>
where
    Tokens: IntoIterator<Item = Token>,
{
    TokenWriter::new(tokens)
}
