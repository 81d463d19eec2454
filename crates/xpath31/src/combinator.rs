//! The four parse shapes every grammar rule is assembled from.
//!
//! Each shape skips at most one space before a token it consumes and
//! returns the position right after the last consumed token.

use std::sync::Arc;

use itertools::Itertools;

use crate::ast::{Chain, Node, Operator};
use crate::error::ParseResult;
use crate::input::Input;

/// A parsed value and the position after it.
pub type Parsed<T> = ParseResult<(T, usize)>;

/// `left (op1 op2 ... right)?`
///
/// Returns the left operand alone when the first operator token is absent.
/// Once the first operator token matches, the rest of the sequence is
/// mandatory.
pub fn single_op<L, R>(
    input: &Input,
    pos: usize,
    operator: &[&str],
    left: impl FnOnce(&Input, usize) -> Parsed<L>,
    right: impl FnOnce(&Input, usize) -> Parsed<R>,
) -> Parsed<(L, Option<R>)> {
    let (first, mut next) = left(input, pos)?;
    match operator.first() {
        Some(op) if input.at(next, op) => {}
        _ => return Ok(((first, None), next)),
    }
    for op in operator {
        let at = input.skip_space(next);
        if input.get(at) != Some(*op) {
            let expected = operator.iter().map(|o| format!("'{o}'")).join(" ");
            return Err(input.unexpected(at, expected));
        }
        next = at + 1;
    }
    let (second, next) = right(input, next)?;
    Ok(((first, Some(second)), next))
}

/// `left (op right)*` for any operator in `O`.
pub fn chain<O: Operator, L, R>(
    input: &Input,
    pos: usize,
    left: impl FnOnce(&Input, usize) -> Parsed<L>,
    right: impl Fn(&Input, usize) -> Parsed<R>,
) -> Parsed<(L, Vec<(O, R)>)> {
    let (first, mut next) = left(input, pos)?;
    let mut rest = Vec::new();
    while let Some(op) = input.peek(next).and_then(O::from_token) {
        let (operand, after) = right(input, input.skip_space(next) + 1)?;
        rest.push((op, operand));
        next = after;
    }
    Ok(((first, rest), next))
}

/// `op child`
pub fn leading_unary<T>(
    input: &Input,
    pos: usize,
    operator: &str,
    owner: &str,
    child: impl FnOnce(&Input, usize) -> Parsed<T>,
) -> Parsed<T> {
    let next = input.expect(pos, operator, owner)?;
    child(input, next)
}

/// `child op?`
pub fn trailing_unary<T>(
    input: &Input,
    pos: usize,
    operator: &str,
    child: impl FnOnce(&Input, usize) -> Parsed<T>,
) -> Parsed<(T, bool)> {
    let (value, next) = child(input, pos)?;
    if input.at(next, operator) {
        Ok(((value, true), input.skip_space(next) + 1))
    } else {
        Ok(((value, false), next))
    }
}

/// Items separated by `,` up to (not including) `close`; empty when `close`
/// comes first.
pub fn separated<T>(
    input: &Input,
    pos: usize,
    close: &str,
    item: impl Fn(&Input, usize) -> Parsed<T>,
) -> Parsed<Vec<T>> {
    if input.at(pos, close) {
        return Ok((Vec::new(), pos));
    }
    let ((first, rest), next) =
        chain::<crate::ast::Comma, _, _>(input, pos, |input, pos| item(input, pos), &item)?;
    let mut items = Vec::with_capacity(rest.len() + 1);
    items.push(first);
    items.extend(rest.into_iter().map(|(_, item)| item));
    Ok((items, next))
}

/// Returns the first operand alone when the chain is empty.
pub fn collapse<O, R>(
    first: Arc<Node>,
    rest: Vec<(O, R)>,
    wrap: impl FnOnce(Chain<O, R>) -> Node,
) -> Arc<Node> {
    if rest.is_empty() {
        first
    } else {
        Arc::new(wrap(Chain { first, rest }))
    }
}
