use std::sync::Arc;

use crate::ast::{
    AdditiveOp, AndOp, ArrowFunctionExpr, ArrowOp, ArrowSpecifier, BindingOp, Comma, ComparisonExpr,
    ComparisonOp, ConcatOp, ForExpr, IfExpr, IntersectExceptOp, LetExpr, MultiplicativeOp, Node,
    Operator, OrOp, QuantifiedExpr, Quantifier, RangeExpr, SimpleBinding, SimpleMapOp, TypeExpr,
    UnaryExpr, UnaryOp, UnionOp,
};
use crate::combinator::{Parsed, chain, collapse, single_op};
use crate::input::Input;

use super::names::eq_name;
use super::path::path_expr;
use super::primary::{argument_list, parenthesized_expr};
use super::types::{sequence_type, single_type};

/// `ExprSingle ("," ExprSingle)*`, always wrapped in an `Expr` node.
pub(crate) fn expr(input: &Input, pos: usize) -> Parsed<Arc<Node>> {
    let ((first, rest), next) = chain::<Comma, _, _>(input, pos, expr_single, expr_single)?;
    let mut items = Vec::with_capacity(rest.len() + 1);
    items.push(first);
    items.extend(rest.into_iter().map(|(_, item)| item));
    Ok((Arc::new(Node::Expr(items)), next))
}

/// Keyword forms are only taken when the keyword is followed by the token
/// that makes them unambiguous; `for` alone is a path step.
pub(crate) fn expr_single(input: &Input, pos: usize) -> Parsed<Arc<Node>> {
    let at = input.skip_space(pos);
    let _depth = input.enter(at)?;
    match input.get(at) {
        Some("for") if input.at(at + 1, "$") => for_expr(input, at),
        Some("let") if input.at(at + 1, "$") => let_expr(input, at),
        Some("some" | "every") if input.at(at + 1, "$") => quantified_expr(input, at),
        Some("if") if input.at(at + 1, "(") => if_expr(input, at),
        None => Err(input.unexpected(at, "ExprSingle")),
        _ => or_expr(input, at),
    }
}

fn simple_binding(input: &Input, pos: usize, op: BindingOp) -> Parsed<SimpleBinding> {
    let next = input.expect(pos, "$", "SimpleBinding")?;
    let (name, next) = eq_name(input, next)?;
    let next = input.expect(next, op.as_str(), "SimpleBinding")?;
    let (expr, next) = expr_single(input, next)?;
    Ok((SimpleBinding { name, op, expr }, next))
}

fn bindings(input: &Input, pos: usize, op: BindingOp) -> Parsed<Vec<SimpleBinding>> {
    let binding = |input: &Input, pos: usize| simple_binding(input, pos, op);
    let ((first, rest), next) = chain::<Comma, _, _>(input, pos, binding, binding)?;
    let mut all = vec![first];
    all.extend(rest.into_iter().map(|(_, binding)| binding));
    Ok((all, next))
}

fn for_expr(input: &Input, pos: usize) -> Parsed<Arc<Node>> {
    let next = input.expect(pos, "for", "ForExpr")?;
    let (bindings, next) = bindings(input, next, BindingOp::In)?;
    let next = input.expect(next, "return", "ForExpr")?;
    let (body, next) = expr_single(input, next)?;
    Ok((Arc::new(Node::For(ForExpr { bindings, body })), next))
}

fn let_expr(input: &Input, pos: usize) -> Parsed<Arc<Node>> {
    let next = input.expect(pos, "let", "LetExpr")?;
    let (bindings, next) = bindings(input, next, BindingOp::Assign)?;
    let next = input.expect(next, "return", "LetExpr")?;
    let (body, next) = expr_single(input, next)?;
    Ok((Arc::new(Node::Let(LetExpr { bindings, body })), next))
}

fn quantified_expr(input: &Input, pos: usize) -> Parsed<Arc<Node>> {
    let at = input.skip_space(pos);
    let Some(quantifier) = input.get(at).and_then(Quantifier::from_token) else {
        return Err(input.unexpected(at, "'some' or 'every'"));
    };
    let (bindings, next) = bindings(input, at + 1, BindingOp::In)?;
    let next = input.expect(next, "satisfies", "QuantifiedExpr")?;
    let (body, next) = expr_single(input, next)?;
    let node = Node::Quantified(QuantifiedExpr {
        quantifier,
        bindings,
        body,
    });
    Ok((Arc::new(node), next))
}

fn if_expr(input: &Input, pos: usize) -> Parsed<Arc<Node>> {
    let next = input.expect(pos, "if", "IfExpr")?;
    let open = input.skip_space(next);
    let next = input.expect(next, "(", "IfExpr")?;
    let (condition, next) = input.enclosed(open, || {
        let (condition, next) = expr(input, next)?;
        let next = input.expect(next, ")", "IfExpr")?;
        Ok((condition, next))
    })?;
    let next = input.expect(next, "then", "IfExpr")?;
    let (then_branch, next) = expr_single(input, next)?;
    let next = input.expect(next, "else", "IfExpr")?;
    let (else_branch, next) = expr_single(input, next)?;
    let node = Node::If(IfExpr {
        condition,
        then_branch,
        else_branch,
    });
    Ok((Arc::new(node), next))
}

fn or_expr(input: &Input, pos: usize) -> Parsed<Arc<Node>> {
    let ((first, rest), next) = chain::<OrOp, _, _>(input, pos, and_expr, and_expr)?;
    Ok((collapse(first, rest, Node::Or), next))
}

fn and_expr(input: &Input, pos: usize) -> Parsed<Arc<Node>> {
    let ((first, rest), next) = chain::<AndOp, _, _>(input, pos, comparison_expr, comparison_expr)?;
    Ok((collapse(first, rest, Node::And), next))
}

/// Comparisons do not associate: `a = b = c` leaves `= c` unconsumed.
fn comparison_expr(input: &Input, pos: usize) -> Parsed<Arc<Node>> {
    let (left, next) = string_concat_expr(input, pos)?;
    let Some(op) = input.peek(next).and_then(ComparisonOp::from_token) else {
        return Ok((left, next));
    };
    let (right, next) = string_concat_expr(input, input.skip_space(next) + 1)?;
    let node = Node::Comparison(ComparisonExpr { left, op, right });
    Ok((Arc::new(node), next))
}

fn string_concat_expr(input: &Input, pos: usize) -> Parsed<Arc<Node>> {
    let ((first, rest), next) = chain::<ConcatOp, _, _>(input, pos, range_expr, range_expr)?;
    Ok((collapse(first, rest, Node::StringConcat), next))
}

fn range_expr(input: &Input, pos: usize) -> Parsed<Arc<Node>> {
    let ((start, end), next) = single_op(input, pos, &["to"], additive_expr, additive_expr)?;
    let node = match end {
        Some(end) => Arc::new(Node::Range(RangeExpr { start, end })),
        None => start,
    };
    Ok((node, next))
}

fn additive_expr(input: &Input, pos: usize) -> Parsed<Arc<Node>> {
    let ((first, rest), next) =
        chain::<AdditiveOp, _, _>(input, pos, multiplicative_expr, multiplicative_expr)?;
    Ok((collapse(first, rest, Node::Additive), next))
}

fn multiplicative_expr(input: &Input, pos: usize) -> Parsed<Arc<Node>> {
    let ((first, rest), next) = chain::<MultiplicativeOp, _, _>(input, pos, union_expr, union_expr)?;
    Ok((collapse(first, rest, Node::Multiplicative), next))
}

fn union_expr(input: &Input, pos: usize) -> Parsed<Arc<Node>> {
    let ((first, rest), next) =
        chain::<UnionOp, _, _>(input, pos, intersect_except_expr, intersect_except_expr)?;
    Ok((collapse(first, rest, Node::Union), next))
}

fn intersect_except_expr(input: &Input, pos: usize) -> Parsed<Arc<Node>> {
    let ((first, rest), next) =
        chain::<IntersectExceptOp, _, _>(input, pos, instance_of_expr, instance_of_expr)?;
    Ok((collapse(first, rest, Node::IntersectExcept), next))
}

/// Wraps `expr` in `wrap` when the type operand is present.
fn typed<T>(
    (expr, ty): (Arc<Node>, Option<T>),
    wrap: impl FnOnce(TypeExpr<T>) -> Node,
) -> Arc<Node> {
    match ty {
        Some(ty) => Arc::new(wrap(TypeExpr { expr, ty })),
        None => expr,
    }
}

fn instance_of_expr(input: &Input, pos: usize) -> Parsed<Arc<Node>> {
    let (parts, next) = single_op(input, pos, &["instance", "of"], treat_expr, sequence_type)?;
    Ok((typed(parts, Node::InstanceOf), next))
}

fn treat_expr(input: &Input, pos: usize) -> Parsed<Arc<Node>> {
    let (parts, next) = single_op(input, pos, &["treat", "as"], castable_expr, sequence_type)?;
    Ok((typed(parts, Node::Treat), next))
}

fn castable_expr(input: &Input, pos: usize) -> Parsed<Arc<Node>> {
    let (parts, next) = single_op(input, pos, &["castable", "as"], cast_expr, single_type)?;
    Ok((typed(parts, Node::Castable), next))
}

fn cast_expr(input: &Input, pos: usize) -> Parsed<Arc<Node>> {
    let (parts, next) = single_op(input, pos, &["cast", "as"], arrow_expr, single_type)?;
    Ok((typed(parts, Node::Cast), next))
}

fn arrow_expr(input: &Input, pos: usize) -> Parsed<Arc<Node>> {
    let ((first, rest), next) = chain::<ArrowOp, _, _>(input, pos, unary_expr, arrow_function)?;
    Ok((collapse(first, rest, Node::Arrow), next))
}

fn arrow_function(input: &Input, pos: usize) -> Parsed<ArrowFunctionExpr> {
    let at = input.skip_space(pos);
    let (specifier, next) = match input.get(at) {
        Some("$") => {
            let (name, next) = eq_name(input, at + 1)?;
            (ArrowSpecifier::Var(name), next)
        }
        Some("(") => {
            let (inner, next) = parenthesized_expr(input, at)?;
            (ArrowSpecifier::Parenthesized(inner), next)
        }
        _ => {
            let (name, next) = eq_name(input, at)?;
            (ArrowSpecifier::Name(name), next)
        }
    };
    let (args, next) = argument_list(input, next)?;
    Ok((ArrowFunctionExpr { specifier, args }, next))
}

fn unary_expr(input: &Input, pos: usize) -> Parsed<Arc<Node>> {
    let mut ops = Vec::new();
    let mut next = pos;
    while let Some(op) = input.peek(next).and_then(UnaryOp::from_token) {
        ops.push(op);
        next = input.skip_space(next) + 1;
    }
    let (operand, next) = simple_map_expr(input, next)?;
    if ops.is_empty() {
        return Ok((operand, next));
    }
    Ok((Arc::new(Node::Unary(UnaryExpr { ops, operand })), next))
}

fn simple_map_expr(input: &Input, pos: usize) -> Parsed<Arc<Node>> {
    let ((first, rest), next) = chain::<SimpleMapOp, _, _>(input, pos, path_expr, path_expr)?;
    Ok((collapse(first, rest, Node::SimpleMap), next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{EQName, SyntaxKind};
    use crate::error::ParseError;
    use crate::input::ParseOptions;
    use crate::lexer::tokenize;

    fn single(source: &str) -> Arc<Node> {
        let input = Input::new(tokenize(source).unwrap(), ParseOptions::default());
        let (node, next) = expr_single(&input, 0).unwrap();
        assert_eq!(next, input.len(), "{source} not fully consumed");
        node
    }

    #[test]
    fn test_chains_collapse_to_operand() {
        assert_eq!(*single("1"), Node::Integer(1.into()));
        assert_eq!(single("1 + 2 * 3").kind(), SyntaxKind::AdditiveExpr);
        assert_eq!(single("1 * 2 + 3").kind(), SyntaxKind::AdditiveExpr);
        assert_eq!(single("a or b and c").kind(), SyntaxKind::OrExpr);
        assert_eq!(single("'a' || 'b'").kind(), SyntaxKind::StringConcatExpr);
        assert_eq!(single("1 to 3").kind(), SyntaxKind::RangeExpr);
        assert_eq!(single("a union b").kind(), SyntaxKind::UnionExpr);
        assert_eq!(single("a except b").kind(), SyntaxKind::IntersectExceptExpr);
        assert_eq!(single("a ! b").kind(), SyntaxKind::SimpleMapExpr);
    }

    #[test]
    fn test_additive_chain_is_flat() {
        let node = single("1 - 2 + 3");
        let Node::Additive(chain) = &*node else {
            panic!("expected additive, got {node:?}");
        };
        assert_eq!(chain.rest.len(), 2);
        assert_eq!(chain.rest[0].0, AdditiveOp::Minus);
    }

    #[test]
    fn test_keyword_forms() {
        assert_eq!(single("for $x in 1 to 3 return $x").kind(), SyntaxKind::ForExpr);
        assert_eq!(single("let $a := 1, $b := 2 return $a").kind(), SyntaxKind::LetExpr);
        assert_eq!(
            single("some $x in (1, 2) satisfies $x = 2").kind(),
            SyntaxKind::QuantifiedExpr
        );
        assert_eq!(single("if (1) then 2 else 3").kind(), SyntaxKind::IfExpr);
        assert_eq!(single("for").kind(), SyntaxKind::AxisStep);
    }

    #[test]
    fn test_let_bindings() {
        let node = single("let $a := 1, $b := $a return $b");
        let Node::Let(expr) = &*node else {
            panic!("expected let, got {node:?}");
        };
        assert_eq!(expr.bindings.len(), 2);
        assert_eq!(expr.bindings[1].name, EQName::local("b"));
        assert_eq!(expr.bindings[1].op, BindingOp::Assign);
    }

    #[test]
    fn test_type_operators() {
        assert_eq!(single("$a instance of xs:int").kind(), SyntaxKind::InstanceofExpr);
        assert_eq!(single("$a treat as item()").kind(), SyntaxKind::TreatExpr);
        assert_eq!(single("$a castable as xs:int?").kind(), SyntaxKind::CastableExpr);
        assert_eq!(single("$a cast as xs:int").kind(), SyntaxKind::CastExpr);
    }

    #[test]
    fn test_arrow_and_unary() {
        let node = single("$s => upper-case() => $f(1) => (f#1)()");
        let Node::Arrow(chain) = &*node else {
            panic!("expected arrow, got {node:?}");
        };
        assert!(matches!(chain.rest[0].1.specifier, ArrowSpecifier::Name(_)));
        assert!(matches!(chain.rest[1].1.specifier, ArrowSpecifier::Var(_)));
        assert!(matches!(chain.rest[2].1.specifier, ArrowSpecifier::Parenthesized(_)));

        let node = single("- - +1");
        let Node::Unary(unary) = &*node else {
            panic!("expected unary, got {node:?}");
        };
        assert_eq!(unary.ops.len(), 3);
        assert!(!unary.is_negated());
    }

    #[test]
    fn test_comparison_does_not_chain() {
        let input = Input::new(tokenize("1 = 2 = 3").unwrap(), ParseOptions::default());
        let (node, next) = expr_single(&input, 0).unwrap();
        assert_eq!(node.kind(), SyntaxKind::ComparisonExpr);
        assert_eq!(next, 5);
    }

    #[test]
    fn test_expr_always_wraps() {
        let input = Input::new(tokenize("1, 2").unwrap(), ParseOptions::default());
        let (node, _) = expr(&input, 0).unwrap();
        assert!(matches!(&*node, Node::Expr(items) if items.len() == 2));

        let input = Input::new(tokenize("1").unwrap(), ParseOptions::default());
        let (node, _) = expr(&input, 0).unwrap();
        assert!(matches!(&*node, Node::Expr(items) if items.len() == 1));
    }

    #[test]
    fn test_depth_limit() {
        let input = Input::new(
            tokenize("((((((1))))))").unwrap(),
            ParseOptions::default().with_max_depth(4),
        );
        let err = expr(&input, 0).unwrap_err();
        assert!(matches!(err, ParseError::TooDeep { limit: 4, .. }));
    }

    #[test]
    fn test_missing_operand() {
        let input = Input::new(tokenize("1 +").unwrap(), ParseOptions::default());
        let err = expr_single(&input, 0).unwrap_err();
        assert_eq!(err.position(), Some(3));
    }
}
