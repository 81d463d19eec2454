//! Recursive-descent grammar over a token sequence.
//!
//! Every rule is a function `(input, position) -> (value, next position)`
//! built from the shapes in [`crate::combinator`]. Most binary levels
//! collapse to their operand when no operator is present; `Expr` and
//! `ParamList` are always wrapped.

mod expr;
mod names;
mod path;
mod primary;
pub(crate) mod types;

use std::sync::Arc;

use crate::ast::{
    ArgumentList, EQName, EnclosedExpr, ItemType, KindTest, NCName, NameTest, Node, NodeTest,
    ParamList, Predicate, SequenceType, SingleType,
};
use crate::combinator::Parsed;
use crate::error::ParseResult;
use crate::input::{Input, ParseOptions};
use crate::lexer::tokenize;
use crate::registry;
use crate::token::Token;

pub use path::could_be_primary;

/// A grammar construct that can be parsed on its own.
pub trait Parse: Sized {
    fn parse(input: &Input, pos: usize) -> Parsed<Self>;
}

macro_rules! parse_with_rule {
    ($($ty:ty => $rule:path),+ $(,)?) => {
        $(
            impl Parse for $ty {
                fn parse(input: &Input, pos: usize) -> Parsed<Self> {
                    $rule(input, pos)
                }
            }
        )+
    };
}

parse_with_rule! {
    Arc<Node> => expr::expr,
    SequenceType => types::sequence_type,
    ItemType => types::item_type,
    SingleType => types::single_type,
    KindTest => registry::kind_test,
    NodeTest => path::node_test,
    NameTest => names::name_test,
    EQName => names::eq_name,
    NCName => names::nc_name,
    Predicate => path::predicate,
    ArgumentList => primary::argument_list,
    ParamList => primary::param_list,
    EnclosedExpr => primary::enclosed_expr,
}

/// Parses a single construct of type `T` at `pos`, leaving anything after it.
pub fn parse_as<T: Parse>(tokens: &[Token], pos: usize) -> Parsed<T> {
    let input = Input::new(tokens, ParseOptions::default());
    T::parse(&input, pos)
}

/// Parses the longest expression at the start of `source`.
///
/// Returns the tree and the index of the first unconsumed token.
pub fn parse(source: &str) -> Parsed<Arc<Node>> {
    parse_with(source, ParseOptions::default())
}

pub fn parse_with(source: &str, options: ParseOptions) -> Parsed<Arc<Node>> {
    let tokens = tokenize(source)?;
    parse_tokens_with(tokens, options)
}

pub fn parse_tokens(tokens: impl Into<Arc<[Token]>>) -> Parsed<Arc<Node>> {
    parse_tokens_with(tokens, ParseOptions::default())
}

pub fn parse_tokens_with(
    tokens: impl Into<Arc<[Token]>>,
    options: ParseOptions,
) -> Parsed<Arc<Node>> {
    let input = Input::new(tokens, options);
    log::debug!("parsing {} tokens", input.len());
    expr::expr(&input, 0)
}

/// Parses `source` and requires every token to be consumed.
///
/// Leftover tokens (after an optional trailing space) fail with
/// [`crate::error::ParseError::TrailingTokens`], error number 51.
pub fn parse_all(source: &str) -> ParseResult<Arc<Node>> {
    parse_all_with(source, ParseOptions::default())
}

pub fn parse_all_with(source: &str, options: ParseOptions) -> ParseResult<Arc<Node>> {
    let tokens = tokenize(source)?;
    parse_all_tokens_with(tokens, options)
}

pub fn parse_all_tokens(tokens: impl Into<Arc<[Token]>>) -> ParseResult<Arc<Node>> {
    parse_all_tokens_with(tokens, ParseOptions::default())
}

pub fn parse_all_tokens_with(
    tokens: impl Into<Arc<[Token]>>,
    options: ParseOptions,
) -> ParseResult<Arc<Node>> {
    let input = Input::new(tokens, options);
    let (node, next) = expr::expr(&input, 0)?;
    let end = input.skip_space(next);
    if end < input.len() {
        log::debug!("trailing tokens from {end} of {}", input.len());
        return Err(input.trailing(end));
    }
    Ok(node)
}
