use std::sync::Arc;

use crate::ast::{
    Axis, AxisStep, EQName, Lookup, Node, NodeTest, Operator, PathExpr, PathOp, Postfix,
    PostfixExpr, Predicate, StepAxis,
};
use crate::chars::starts_name;
use crate::combinator::{Parsed, chain, collapse, leading_unary};
use crate::error::ParseError;
use crate::input::Input;
use crate::registry;

use super::expr::expr;
use super::names::{eq_name, name_test};
use super::primary::{argument_list, is_digits, key_specifier, primary_expr};

/// Unprefixed names that are never function calls when followed by `(`.
const RESERVED_FUNCTION_NAMES: &[&str] = &[
    "array",
    "empty-sequence",
    "function",
    "if",
    "item",
    "map",
    "switch",
    "typeswitch",
];

/// `/ RelativePath?`, `// RelativePath` or a bare relative path.
///
/// A lone `/` is accepted when whatever follows it cannot begin a step;
/// otherwise the step's own error is reported.
pub(crate) fn path_expr(input: &Input, pos: usize) -> Parsed<Arc<Node>> {
    let at = input.skip_space(pos);
    let Some(leading) = input.get(at).and_then(PathOp::from_token) else {
        return relative_path(input, at);
    };
    let after = at + 1;
    let step_at = input.skip_space(after);
    match relative_path(input, after) {
        Ok((relative, next)) => {
            let path = PathExpr {
                leading,
                relative: Some(relative),
            };
            Ok((Arc::new(Node::Path(path)), next))
        }
        Err(ParseError::UnexpectedToken { position, .. })
            if leading == PathOp::Slash
                && position == step_at
                && !can_start_step(input, step_at) =>
        {
            log::trace!("lone '/' at token {at}");
            let path = PathExpr {
                leading,
                relative: None,
            };
            Ok((Arc::new(Node::Path(path)), after))
        }
        Err(err) => Err(err),
    }
}

fn can_start_step(input: &Input, at: usize) -> bool {
    match input.get(at) {
        Some(token) => {
            starts_name(token)
                || is_digits(token)
                || matches!(
                    token,
                    "*" | "@" | "." | ".." | "(" | "$" | "?" | "[" | "'" | "\""
                )
        }
        None => false,
    }
}

pub(crate) fn relative_path(input: &Input, pos: usize) -> Parsed<Arc<Node>> {
    let ((first, rest), next) = chain::<PathOp, _, _>(input, pos, step_expr, step_expr)?;
    Ok((collapse(first, rest, Node::RelativePath), next))
}

fn is_axis_keyword(input: &Input, at: usize) -> bool {
    input.get(at).and_then(Axis::from_token).is_some() && input.at(at + 1, "::")
}

fn step_expr(input: &Input, pos: usize) -> Parsed<Arc<Node>> {
    let at = input.skip_space(pos);
    if !is_axis_keyword(input, at) && could_be_primary(input, at) {
        postfix_expr(input, at)
    } else {
        axis_step(input, at)
    }
}

fn is_reserved_call(name: &EQName) -> bool {
    match name.prefix() {
        None if name.uri().is_none() => {
            let local = name.local_name();
            registry::is_kind_test(local) || RESERVED_FUNCTION_NAMES.contains(&local)
        }
        _ => false,
    }
}

/// Decides between a postfix expression and an axis step by looking ahead.
pub fn could_be_primary(input: &Input, at: usize) -> bool {
    let Some(token) = input.get(at) else {
        return false;
    };
    match token {
        "(" | "." | "$" | "?" | "[" | "'" | "\"" => true,
        "function" if input.at(at + 1, "(") => true,
        "map" | "array" if input.at(at + 1, "{") => true,
        token if is_digits(token) => true,
        _ => match eq_name(input, at) {
            Ok((name, next)) => {
                input.at(next, "#") || (input.at(next, "(") && !is_reserved_call(&name))
            }
            Err(_) => false,
        },
    }
}

pub(crate) fn postfix_expr(input: &Input, pos: usize) -> Parsed<Arc<Node>> {
    let (primary, mut next) = primary_expr(input, pos)?;
    let mut suffixes = Vec::new();
    loop {
        let at = input.skip_space(next);
        let (suffix, after) = match input.get(at) {
            Some("[") => {
                let (predicate, after) = predicate(input, at)?;
                (Postfix::Predicate(predicate), after)
            }
            Some("(") => {
                let (args, after) = argument_list(input, at)?;
                (Postfix::Arguments(args), after)
            }
            Some("?") => {
                let (key, after) = leading_unary(input, at, "?", "Lookup", key_specifier)?;
                (Postfix::Lookup(Lookup { key }), after)
            }
            _ => break,
        };
        suffixes.push(suffix);
        next = after;
    }
    if suffixes.is_empty() {
        return Ok((primary, next));
    }
    Ok((Arc::new(Node::Postfix(PostfixExpr { primary, suffixes })), next))
}

pub(crate) fn axis_step(input: &Input, pos: usize) -> Parsed<Arc<Node>> {
    let at = input.skip_space(pos);
    if input.get(at) == Some("..") {
        return Ok((Arc::new(Node::ParentAxisStep), at + 1));
    }
    let (axis, next) = match input.get(at) {
        Some("@") => (Some(StepAxis::At), at + 1),
        Some(token) if is_axis_keyword(input, at) => match Axis::from_token(token) {
            Some(axis) => (Some(StepAxis::Named(axis)), input.skip_space(at + 1) + 1),
            None => (None, at),
        },
        _ => (None, at),
    };
    let (test, mut next) = node_test(input, next)?;
    let mut predicates = Vec::new();
    while input.at(next, "[") {
        let (predicate, after) = predicate(input, next)?;
        predicates.push(predicate);
        next = after;
    }
    let step = AxisStep {
        axis,
        test,
        predicates,
    };
    Ok((Arc::new(Node::AxisStep(step)), next))
}

pub(crate) fn node_test(input: &Input, pos: usize) -> Parsed<NodeTest> {
    let at = input.skip_space(pos);
    match input.get(at) {
        Some(keyword) if registry::is_kind_test(keyword) && input.at(at + 1, "(") => {
            let (test, next) = registry::kind_test(input, at)?;
            Ok((NodeTest::Kind(test), next))
        }
        _ => {
            let (test, next) = name_test(input, at)?;
            Ok((NodeTest::Name(test), next))
        }
    }
}

pub(crate) fn predicate(input: &Input, pos: usize) -> Parsed<Predicate> {
    let open = input.skip_space(pos);
    let next = input.expect(open, "[", "Predicate")?;
    input.enclosed(open, || {
        let (expr, next) = expr(input, next)?;
        let next = input.expect(next, "]", "Predicate")?;
        Ok((Predicate { expr }, next))
    })
}
