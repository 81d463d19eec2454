use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use xpgram_types::{Biggie, Decie, ValueError};

use crate::ast::{
    Argument, ArgumentList, EQName, EnclosedExpr, FunctionCall, InlineFunctionExpr, KeySpecifier,
    MapEntry, NCName, NamedFunctionRef, Node, Param, ParamList,
};
use crate::chars::starts_name;
use crate::combinator::{Parsed, leading_unary, separated};
use crate::input::Input;

use super::expr::{expr, expr_single};
use super::names::eq_name;
use super::types::sequence_type;

/// A single token carrying a whole exponent, such as `e10` or `E-3`.
static EXPONENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[eE][+-]?[0-9]+$").expect("BUG: invalid exponent regex"));

pub(crate) fn is_digits(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

pub(crate) fn primary_expr(input: &Input, pos: usize) -> Parsed<Arc<Node>> {
    let at = input.skip_space(pos);
    let Some(token) = input.get(at) else {
        return Err(input.unexpected(at, "PrimaryExpr"));
    };
    match token {
        "(" => parenthesized_expr(input, at),
        "." if input.get(at + 1).is_some_and(is_digits) => numeric_literal(input, at),
        "." => Ok((Arc::new(Node::ContextItem), at + 1)),
        "$" => var_ref(input, at),
        "?" => {
            let (key, next) = leading_unary(input, at, "?", "UnaryLookup", key_specifier)?;
            Ok((Arc::new(Node::UnaryLookup(key)), next))
        }
        "'" | "\"" => {
            let (value, next) = string_literal(input, at)?;
            Ok((Arc::new(Node::String(value)), next))
        }
        "[" => square_array(input, at),
        "function" if input.at(at + 1, "(") => inline_function(input, at),
        "map" if input.at(at + 1, "{") => map_constructor(input, at),
        "array" if input.at(at + 1, "{") => {
            let next = input.expect(at, "array", "CurlyArrayConstructor")?;
            let (body, next) = enclosed_expr(input, next)?;
            Ok((Arc::new(Node::CurlyArray(body)), next))
        }
        token if is_digits(token) => numeric_literal(input, at),
        _ => {
            let (name, next) = eq_name(input, at)?;
            if input.at(next, "#") {
                return named_function_ref(input, name, next);
            }
            if input.at(next, "(") {
                let (args, next) = argument_list(input, next)?;
                return Ok((Arc::new(Node::FunctionCall(FunctionCall { name, args })), next));
            }
            Err(input.unexpected(input.skip_space(next), "'(' or '#' after function name"))
        }
    }
}

/// Integer, decimal or double literal, assembled from the digit, dot and
/// exponent tokens the lexer produced for it. The pieces must be adjacent.
pub(crate) fn numeric_literal(input: &Input, pos: usize) -> Parsed<Arc<Node>> {
    let at = input.skip_space(pos);
    let (integer, fraction, decimal, mut next) = match input.get(at) {
        Some(digits) if is_digits(digits) => {
            if input.get(at + 1) == Some(".") {
                match input.get(at + 2).filter(|t| is_digits(t)) {
                    Some(fraction) => (Some(digits), Some(fraction), true, at + 3),
                    None => (Some(digits), None, true, at + 2),
                }
            } else {
                (Some(digits), None, false, at + 1)
            }
        }
        Some(".") if input.get(at + 1).is_some_and(is_digits) => {
            (None, input.get(at + 1), true, at + 2)
        }
        _ => return Err(input.unexpected(at, "NumericLiteral")),
    };

    let exponent = match input.get(next) {
        Some(token) if EXPONENT.is_match(token) => {
            next += 1;
            Some(token[1..].to_string())
        }
        Some("e" | "E") => match (input.get(next + 1), input.get(next + 2)) {
            (Some(sign @ ("+" | "-")), Some(digits)) if is_digits(digits) => {
                next += 3;
                Some(format!("{sign}{digits}"))
            }
            _ => None,
        },
        _ => None,
    };

    let integer = integer.unwrap_or("0");
    let node = if let Some(exponent) = exponent {
        let text = format!("{integer}.{}e{exponent}", fraction.unwrap_or("0"));
        let value = f64::from_str(&text).map_err(|_| ValueError::invalid_number(&text))?;
        if !value.is_finite() {
            return Err(ValueError::NonFinite(text).into());
        }
        Node::Double(value)
    } else if decimal {
        let text = format!("{integer}.{}", fraction.unwrap_or(""));
        Node::Decimal(Decie::from_str(&text)?)
    } else {
        Node::Integer(Biggie::from_str(integer)?)
    };
    Ok((Arc::new(node), next))
}

/// Quote, content, quote. The content token is taken as-is, even when it
/// is a single space.
pub(crate) fn string_literal(input: &Input, pos: usize) -> Parsed<String> {
    let at = input.skip_space(pos);
    match input.get(at) {
        Some(quote @ ("'" | "\"")) => input.enclosed(at, || {
            let content = input
                .get(at + 1)
                .ok_or_else(|| input.unexpected(at + 1, "StringLiteral"))?;
            if input.get(at + 2) != Some(quote) {
                return Err(input.unexpected(at + 2, format!("closing {quote} of StringLiteral")));
            }
            Ok((content.to_string(), at + 3))
        }),
        _ => Err(input.unexpected(at, "StringLiteral")),
    }
}

pub(crate) fn parenthesized_expr(input: &Input, pos: usize) -> Parsed<Arc<Node>> {
    let open = input.skip_space(pos);
    let next = input.expect(open, "(", "ParenthesizedExpr")?;
    input.enclosed(open, || {
        if input.at(next, ")") {
            return Ok((Arc::new(Node::Parenthesized(None)), input.skip_space(next) + 1));
        }
        let (inner, next) = expr(input, next)?;
        let next = input.expect(next, ")", "ParenthesizedExpr")?;
        Ok((Arc::new(Node::Parenthesized(Some(inner))), next))
    })
}

fn var_ref(input: &Input, pos: usize) -> Parsed<Arc<Node>> {
    let (name, next) = leading_unary(input, pos, "$", "VarRef", eq_name)?;
    Ok((Arc::new(Node::VarRef(name)), next))
}

pub(crate) fn key_specifier(input: &Input, pos: usize) -> Parsed<KeySpecifier> {
    let at = input.skip_space(pos);
    match input.get(at) {
        Some("*") => Ok((KeySpecifier::Wildcard, at + 1)),
        Some("(") => {
            let (inner, next) = parenthesized_expr(input, at)?;
            Ok((KeySpecifier::Parenthesized(inner), next))
        }
        Some(digits) if is_digits(digits) => {
            Ok((KeySpecifier::Integer(Biggie::from_str(digits)?), at + 1))
        }
        Some(name) if starts_name(name) => Ok((KeySpecifier::Name(NCName::new(name)), at + 1)),
        _ => Err(input.unexpected(at, "KeySpecifier")),
    }
}

/// `?` counts as a placeholder only when it is the whole argument.
fn argument(input: &Input, pos: usize) -> Parsed<Argument> {
    let at = input.skip_space(pos);
    if input.get(at) == Some("?") && matches!(input.peek(at + 1), Some("," | ")")) {
        return Ok((Argument::Placeholder, at + 1));
    }
    let (value, next) = expr_single(input, at)?;
    Ok((Argument::Expr(value), next))
}

pub(crate) fn argument_list(input: &Input, pos: usize) -> Parsed<ArgumentList> {
    let open = input.skip_space(pos);
    let next = input.expect(open, "(", "ArgumentList")?;
    input.enclosed(open, || {
        let (args, next) = separated(input, next, ")", argument)?;
        let next = input.expect(next, ")", "ArgumentList")?;
        Ok((ArgumentList { args }, next))
    })
}

fn named_function_ref(input: &Input, name: EQName, pos: usize) -> Parsed<Arc<Node>> {
    let next = input.expect(pos, "#", "NamedFunctionRef")?;
    let at = input.skip_space(next);
    match input.get(at) {
        Some(digits) if is_digits(digits) => {
            let arity = digits
                .parse()
                .map_err(|_| ValueError::invalid_number(digits))?;
            let node = Node::NamedFunctionRef(NamedFunctionRef { name, arity });
            Ok((Arc::new(node), at + 1))
        }
        _ => Err(input.unexpected(at, "IntegerLiteral of NamedFunctionRef")),
    }
}

fn param(input: &Input, pos: usize) -> Parsed<Param> {
    let (name, mut next) = leading_unary(input, pos, "$", "Param", eq_name)?;
    let mut ty = None;
    if input.at(next, "as") {
        let (declared, after) = sequence_type(input, input.skip_space(next) + 1)?;
        ty = Some(declared);
        next = after;
    }
    Ok((Param { name, ty }, next))
}

/// Parameters up to the closing parenthesis, which is left unconsumed.
pub(crate) fn param_list(input: &Input, pos: usize) -> Parsed<ParamList> {
    let (params, next) = separated(input, pos, ")", param)?;
    Ok((ParamList { params }, next))
}

fn inline_function(input: &Input, pos: usize) -> Parsed<Arc<Node>> {
    let next = input.expect(pos, "function", "InlineFunctionExpr")?;
    let open = input.skip_space(next);
    let next = input.expect(next, "(", "InlineFunctionExpr")?;
    let (params, mut next) = input.enclosed(open, || {
        let (params, next) = param_list(input, next)?;
        let next = input.expect(next, ")", "InlineFunctionExpr")?;
        Ok((params, next))
    })?;
    let mut result = None;
    if input.at(next, "as") {
        let (declared, after) = sequence_type(input, input.skip_space(next) + 1)?;
        result = Some(declared);
        next = after;
    }
    let (body, next) = enclosed_expr(input, next)?;
    let node = Node::InlineFunction(InlineFunctionExpr {
        params,
        result,
        body,
    });
    Ok((Arc::new(node), next))
}

pub(crate) fn enclosed_expr(input: &Input, pos: usize) -> Parsed<EnclosedExpr> {
    let open = input.skip_space(pos);
    let next = input.expect(open, "{", "EnclosedExpr")?;
    input.enclosed(open, || {
        if input.at(next, "}") {
            return Ok((EnclosedExpr::default(), input.skip_space(next) + 1));
        }
        let (inner, next) = expr(input, next)?;
        let next = input.expect(next, "}", "EnclosedExpr")?;
        Ok((EnclosedExpr { expr: Some(inner) }, next))
    })
}

fn map_entry(input: &Input, pos: usize) -> Parsed<MapEntry> {
    let (key, next) = expr_single(input, pos)?;
    let next = input.expect(next, ":", "MapConstructorEntry")?;
    let (value, next) = expr_single(input, next)?;
    Ok((MapEntry { key, value }, next))
}

fn map_constructor(input: &Input, pos: usize) -> Parsed<Arc<Node>> {
    let next = input.expect(pos, "map", "MapConstructor")?;
    let open = input.skip_space(next);
    let next = input.expect(next, "{", "MapConstructor")?;
    input.enclosed(open, || {
        let (entries, next) = separated(input, next, "}", map_entry)?;
        let next = input.expect(next, "}", "MapConstructor")?;
        Ok((Arc::new(Node::MapCons(entries)), next))
    })
}

fn square_array(input: &Input, pos: usize) -> Parsed<Arc<Node>> {
    let open = input.skip_space(pos);
    let next = input.expect(open, "[", "SquareArrayConstructor")?;
    input.enclosed(open, || {
        let (members, next) = separated(input, next, "]", expr_single)?;
        let next = input.expect(next, "]", "SquareArrayConstructor")?;
        Ok((Arc::new(Node::SquareArray(members)), next))
    })
}
