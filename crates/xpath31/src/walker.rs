//! Bottom-up structural rewriting of syntax trees.
//!
//! The callback sees every expression node after its children have been
//! rewritten, together with the kind of the construct that owns it. Subtrees
//! the callback leaves alone are shared with the input tree, so an identity
//! rewrite returns the very same root.

use std::convert::Infallible;
use std::sync::Arc;

use serde::Serialize;

use crate::ast::{
    Argument, ArgumentList, ArrowFunctionExpr, ArrowSpecifier, AxisStep, Chain, ComparisonExpr,
    EnclosedExpr,
    ForExpr, FunctionCall, IfExpr, InlineFunctionExpr, KeySpecifier, LetExpr, Lookup, MapEntry,
    Node, PathExpr, Postfix, PostfixExpr, Predicate, QuantifiedExpr, RangeExpr, SimpleBinding,
    SyntaxKind,
    TypeExpr, UnaryExpr,
};

/// How far the walker descends on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum RewriteMode {
    /// Every edge is visited before its owner.
    #[default]
    Eager,
    /// `let` bodies are left for the callback to descend into.
    Lazy,
}

pub fn rewrite(
    node: &Arc<Node>,
    f: impl FnMut(Arc<Node>, Option<SyntaxKind>) -> Arc<Node>,
) -> Arc<Node> {
    rewrite_with(node, f, RewriteMode::Eager)
}

pub fn rewrite_with(
    node: &Arc<Node>,
    mut f: impl FnMut(Arc<Node>, Option<SyntaxKind>) -> Arc<Node>,
    mode: RewriteMode,
) -> Arc<Node> {
    let result = try_rewrite_with(node, |node, parent| Ok::<_, Infallible>(f(node, parent)), mode);
    match result {
        Ok(node) => node,
        Err(never) => match never {},
    }
}

pub fn try_rewrite<E>(
    node: &Arc<Node>,
    f: impl FnMut(Arc<Node>, Option<SyntaxKind>) -> Result<Arc<Node>, E>,
) -> Result<Arc<Node>, E> {
    try_rewrite_with(node, f, RewriteMode::Eager)
}

/// The fallible walk; the first error returned by `f` aborts it.
pub fn try_rewrite_with<E>(
    node: &Arc<Node>,
    mut f: impl FnMut(Arc<Node>, Option<SyntaxKind>) -> Result<Arc<Node>, E>,
    mode: RewriteMode,
) -> Result<Arc<Node>, E> {
    let mut rewriter = Rewriter { f: &mut f, mode };
    let result = rewriter.visit(node, None)?;
    log::trace!(
        "{mode:?} rewrite of {} {}",
        node.kind(),
        if Arc::ptr_eq(&result, node) { "kept the root" } else { "built a new root" }
    );
    Ok(result)
}

fn keep<T: Clone>(changed: Option<T>, original: &T) -> T {
    changed.unwrap_or_else(|| original.clone())
}

struct Rewriter<'f, F> {
    f: &'f mut F,
    mode: RewriteMode,
}

impl<F, E> Rewriter<'_, F>
where
    F: FnMut(Arc<Node>, Option<SyntaxKind>) -> Result<Arc<Node>, E>,
{
    fn visit(&mut self, node: &Arc<Node>, parent: Option<SyntaxKind>) -> Result<Arc<Node>, E> {
        let current = match self.rebuild(node)? {
            Some(rebuilt) => Arc::new(rebuilt),
            None => Arc::clone(node),
        };
        (self.f)(current, parent)
    }

    /// `Some` only when the child came back as a different node.
    fn edge(&mut self, child: &Arc<Node>, parent: SyntaxKind) -> Result<Option<Arc<Node>>, E> {
        let rewritten = self.visit(child, Some(parent))?;
        Ok((!Arc::ptr_eq(&rewritten, child)).then_some(rewritten))
    }

    fn optional_edge(
        &mut self,
        child: &Option<Arc<Node>>,
        parent: SyntaxKind,
    ) -> Result<Option<Option<Arc<Node>>>, E> {
        match child {
            Some(child) => Ok(self.edge(child, parent)?.map(Some)),
            None => Ok(None),
        }
    }

    /// Copies the list only once one of its items changes.
    fn each<T: Clone>(
        &mut self,
        items: &[T],
        mut visit: impl FnMut(&mut Self, &T) -> Result<Option<T>, E>,
    ) -> Result<Option<Vec<T>>, E> {
        let mut rebuilt: Option<Vec<T>> = None;
        for (index, item) in items.iter().enumerate() {
            let changed = visit(self, item)?;
            if let Some(rebuilt) = rebuilt.as_mut() {
                rebuilt.push(changed.unwrap_or_else(|| item.clone()));
            } else if let Some(changed) = changed {
                let mut copy = items[..index].to_vec();
                copy.push(changed);
                rebuilt = Some(copy);
            }
        }
        Ok(rebuilt)
    }

    fn nodes(&mut self, items: &[Arc<Node>], parent: SyntaxKind) -> Result<Option<Vec<Arc<Node>>>, E> {
        self.each(items, |this, item| this.edge(item, parent))
    }

    fn chain<O: Copy, R: Clone>(
        &mut self,
        chain: &Chain<O, R>,
        parent: SyntaxKind,
        mut operand: impl FnMut(&mut Self, &R) -> Result<Option<R>, E>,
    ) -> Result<Option<Chain<O, R>>, E> {
        let first = self.edge(&chain.first, parent)?;
        let rest = self.each(&chain.rest, |this, (op, value)| {
            Ok(operand(this, value)?.map(|value| (*op, value)))
        })?;
        if first.is_none() && rest.is_none() {
            return Ok(None);
        }
        Ok(Some(Chain {
            first: keep(first, &chain.first),
            rest: keep(rest, &chain.rest),
        }))
    }

    fn node_chain<O: Copy>(
        &mut self,
        chain: &Chain<O>,
        parent: SyntaxKind,
    ) -> Result<Option<Chain<O>>, E> {
        self.chain(chain, parent, |this, operand| this.edge(operand, parent))
    }

    fn type_expr<T: Clone>(
        &mut self,
        expr: &TypeExpr<T>,
        parent: SyntaxKind,
    ) -> Result<Option<TypeExpr<T>>, E> {
        Ok(self.edge(&expr.expr, parent)?.map(|inner| TypeExpr {
            expr: inner,
            ty: expr.ty.clone(),
        }))
    }

    fn bindings(&mut self, bindings: &[SimpleBinding]) -> Result<Option<Vec<SimpleBinding>>, E> {
        self.each(bindings, |this, binding| {
            Ok(this
                .edge(&binding.expr, SyntaxKind::SimpleBinding)?
                .map(|expr| SimpleBinding {
                    expr,
                    ..binding.clone()
                }))
        })
    }

    fn predicates(&mut self, predicates: &[Predicate]) -> Result<Option<Vec<Predicate>>, E> {
        self.each(predicates, |this, predicate| this.predicate(predicate))
    }

    fn predicate(&mut self, predicate: &Predicate) -> Result<Option<Predicate>, E> {
        Ok(self
            .edge(&predicate.expr, SyntaxKind::Predicate)?
            .map(|expr| Predicate { expr }))
    }

    fn arguments(&mut self, list: &ArgumentList) -> Result<Option<ArgumentList>, E> {
        let args = self.each(&list.args, |this, arg| match arg {
            Argument::Expr(expr) => Ok(this.edge(expr, SyntaxKind::ArgumentList)?.map(Argument::Expr)),
            Argument::Placeholder => Ok(None),
        })?;
        Ok(args.map(|args| ArgumentList { args }))
    }

    fn enclosed(&mut self, enclosed: &EnclosedExpr) -> Result<Option<EnclosedExpr>, E> {
        Ok(self
            .optional_edge(&enclosed.expr, SyntaxKind::EnclosedExpr)?
            .map(|expr| EnclosedExpr { expr }))
    }

    fn key(&mut self, key: &KeySpecifier, parent: SyntaxKind) -> Result<Option<KeySpecifier>, E> {
        match key {
            KeySpecifier::Parenthesized(expr) => {
                Ok(self.edge(expr, parent)?.map(KeySpecifier::Parenthesized))
            }
            _ => Ok(None),
        }
    }

    fn arrow_function(&mut self, function: &ArrowFunctionExpr) -> Result<Option<ArrowFunctionExpr>, E> {
        let specifier = match &function.specifier {
            ArrowSpecifier::Parenthesized(expr) => self
                .edge(expr, SyntaxKind::ArrowFunctionExpr)?
                .map(ArrowSpecifier::Parenthesized),
            _ => None,
        };
        let args = self.arguments(&function.args)?;
        if specifier.is_none() && args.is_none() {
            return Ok(None);
        }
        Ok(Some(ArrowFunctionExpr {
            specifier: keep(specifier, &function.specifier),
            args: keep(args, &function.args),
        }))
    }

    fn postfix(&mut self, suffix: &Postfix) -> Result<Option<Postfix>, E> {
        Ok(match suffix {
            Postfix::Predicate(predicate) => self.predicate(predicate)?.map(Postfix::Predicate),
            Postfix::Arguments(args) => self.arguments(args)?.map(Postfix::Arguments),
            Postfix::Lookup(lookup) => self
                .key(&lookup.key, SyntaxKind::Lookup)?
                .map(|key| Postfix::Lookup(Lookup { key })),
        })
    }

    /// A copy of `node` with rewritten children, or `None` when no child changed.
    fn rebuild(&mut self, node: &Node) -> Result<Option<Node>, E> {
        let kind = node.kind();
        let rebuilt = match node {
            Node::Expr(items) => self.nodes(items, kind)?.map(Node::Expr),
            Node::SquareArray(items) => self.nodes(items, kind)?.map(Node::SquareArray),
            Node::For(expr) => {
                let bindings = self.bindings(&expr.bindings)?;
                let body = self.edge(&expr.body, kind)?;
                (bindings.is_some() || body.is_some()).then(|| {
                    Node::For(ForExpr {
                        bindings: keep(bindings, &expr.bindings),
                        body: keep(body, &expr.body),
                    })
                })
            }
            Node::Let(expr) => {
                let bindings = self.bindings(&expr.bindings)?;
                let body = match self.mode {
                    RewriteMode::Eager => self.edge(&expr.body, kind)?,
                    RewriteMode::Lazy => None,
                };
                (bindings.is_some() || body.is_some()).then(|| {
                    Node::Let(LetExpr {
                        bindings: keep(bindings, &expr.bindings),
                        body: keep(body, &expr.body),
                    })
                })
            }
            Node::Quantified(expr) => {
                let bindings = self.bindings(&expr.bindings)?;
                let body = self.edge(&expr.body, kind)?;
                (bindings.is_some() || body.is_some()).then(|| {
                    Node::Quantified(QuantifiedExpr {
                        quantifier: expr.quantifier,
                        bindings: keep(bindings, &expr.bindings),
                        body: keep(body, &expr.body),
                    })
                })
            }
            Node::If(expr) => {
                let condition = self.edge(&expr.condition, kind)?;
                let then_branch = self.edge(&expr.then_branch, kind)?;
                let else_branch = self.edge(&expr.else_branch, kind)?;
                (condition.is_some() || then_branch.is_some() || else_branch.is_some()).then(|| {
                    Node::If(IfExpr {
                        condition: keep(condition, &expr.condition),
                        then_branch: keep(then_branch, &expr.then_branch),
                        else_branch: keep(else_branch, &expr.else_branch),
                    })
                })
            }
            Node::Or(chain) => self.node_chain(chain, kind)?.map(Node::Or),
            Node::And(chain) => self.node_chain(chain, kind)?.map(Node::And),
            Node::StringConcat(chain) => self.node_chain(chain, kind)?.map(Node::StringConcat),
            Node::Additive(chain) => self.node_chain(chain, kind)?.map(Node::Additive),
            Node::Multiplicative(chain) => self.node_chain(chain, kind)?.map(Node::Multiplicative),
            Node::Union(chain) => self.node_chain(chain, kind)?.map(Node::Union),
            Node::IntersectExcept(chain) => {
                self.node_chain(chain, kind)?.map(Node::IntersectExcept)
            }
            Node::SimpleMap(chain) => self.node_chain(chain, kind)?.map(Node::SimpleMap),
            Node::RelativePath(chain) => self.node_chain(chain, kind)?.map(Node::RelativePath),
            Node::Arrow(chain) => self
                .chain(chain, kind, |this, function| this.arrow_function(function))?
                .map(Node::Arrow),
            Node::Comparison(expr) => {
                let left = self.edge(&expr.left, kind)?;
                let right = self.edge(&expr.right, kind)?;
                (left.is_some() || right.is_some()).then(|| {
                    Node::Comparison(ComparisonExpr {
                        left: keep(left, &expr.left),
                        op: expr.op,
                        right: keep(right, &expr.right),
                    })
                })
            }
            Node::Range(expr) => {
                let start = self.edge(&expr.start, kind)?;
                let end = self.edge(&expr.end, kind)?;
                (start.is_some() || end.is_some()).then(|| {
                    Node::Range(RangeExpr {
                        start: keep(start, &expr.start),
                        end: keep(end, &expr.end),
                    })
                })
            }
            Node::InstanceOf(expr) => self.type_expr(expr, kind)?.map(Node::InstanceOf),
            Node::Treat(expr) => self.type_expr(expr, kind)?.map(Node::Treat),
            Node::Castable(expr) => self.type_expr(expr, kind)?.map(Node::Castable),
            Node::Cast(expr) => self.type_expr(expr, kind)?.map(Node::Cast),
            Node::Unary(expr) => self.edge(&expr.operand, kind)?.map(|operand| {
                Node::Unary(UnaryExpr {
                    ops: expr.ops.clone(),
                    operand,
                })
            }),
            Node::Path(path) => self
                .optional_edge(&path.relative, kind)?
                .map(|relative| Node::Path(PathExpr { leading: path.leading, relative })),
            Node::AxisStep(step) => self.predicates(&step.predicates)?.map(|predicates| {
                Node::AxisStep(AxisStep {
                    predicates,
                    ..step.clone()
                })
            }),
            Node::Postfix(postfix) => {
                let primary = self.edge(&postfix.primary, kind)?;
                let suffixes = self.each(&postfix.suffixes, |this, suffix| this.postfix(suffix))?;
                (primary.is_some() || suffixes.is_some()).then(|| {
                    Node::Postfix(PostfixExpr {
                        primary: keep(primary, &postfix.primary),
                        suffixes: keep(suffixes, &postfix.suffixes),
                    })
                })
            }
            Node::Parenthesized(inner) => self.optional_edge(inner, kind)?.map(Node::Parenthesized),
            Node::FunctionCall(call) => self.arguments(&call.args)?.map(|args| {
                Node::FunctionCall(FunctionCall {
                    name: call.name.clone(),
                    args,
                })
            }),
            Node::InlineFunction(function) => self.enclosed(&function.body)?.map(|body| {
                Node::InlineFunction(InlineFunctionExpr {
                    body,
                    ..function.clone()
                })
            }),
            Node::MapCons(entries) => self
                .each(entries, |this, entry| {
                    let key = this.edge(&entry.key, kind)?;
                    let value = this.edge(&entry.value, kind)?;
                    Ok((key.is_some() || value.is_some()).then(|| MapEntry {
                        key: keep(key, &entry.key),
                        value: keep(value, &entry.value),
                    }))
                })?
                .map(Node::MapCons),
            Node::CurlyArray(body) => self.enclosed(body)?.map(Node::CurlyArray),
            Node::UnaryLookup(key) => self.key(key, kind)?.map(Node::UnaryLookup),
            Node::ParentAxisStep
            | Node::ContextItem
            | Node::VarRef(_)
            | Node::NamedFunctionRef(_)
            | Node::Integer(_)
            | Node::Decimal(_)
            | Node::Double(_)
            | Node::String(_) => None,
        };
        Ok(rebuilt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_all;
    use crate::render::to_source;
    use xpgram_types::Biggie;

    /// Folds `a + b` over integer literals.
    fn fold_additions(node: Arc<Node>, _: Option<SyntaxKind>) -> Arc<Node> {
        if let Node::Additive(chain) = &*node
            && let Node::Integer(first) = &*chain.first
        {
            let mut total = first.clone();
            for (op, operand) in &chain.rest {
                let Node::Integer(value) = &**operand else {
                    return node;
                };
                total = match op {
                    crate::ast::AdditiveOp::Plus => total.add(value),
                    crate::ast::AdditiveOp::Minus => total.sub(value),
                };
            }
            return Arc::new(Node::Integer(total));
        }
        node
    }

    #[test]
    fn test_identity_rewrite_shares_root() {
        let root = parse_all("for $x in (1, 2) return f($x)[1]?key => g()").unwrap();
        let result = rewrite(&root, |node, _| node);
        assert!(Arc::ptr_eq(&root, &result));
    }

    #[test]
    fn test_folding_rebuilds_only_changed_path() {
        let root = parse_all("(1 + 2) * $x, $y").unwrap();
        let result = rewrite(&root, fold_additions);
        assert_eq!(to_source(&result), "(3) * $x, $y");

        let (Node::Expr(before), Node::Expr(after)) = (&*root, &*result) else {
            panic!("expected Expr roots");
        };
        assert!(!Arc::ptr_eq(&before[0], &after[0]));
        assert!(Arc::ptr_eq(&before[1], &after[1]));
    }

    #[test]
    fn test_bottom_up_order_and_parent_kinds() {
        let root = parse_all("1 + 2").unwrap();
        let mut seen = Vec::new();
        rewrite(&root, |node, parent| {
            seen.push((node.kind(), parent));
            node
        });
        assert_eq!(
            seen,
            vec![
                (SyntaxKind::IntegerLiteral, Some(SyntaxKind::AdditiveExpr)),
                (SyntaxKind::IntegerLiteral, Some(SyntaxKind::AdditiveExpr)),
                (SyntaxKind::AdditiveExpr, Some(SyntaxKind::Expr)),
                (SyntaxKind::Expr, None),
            ]
        );
    }

    #[test]
    fn test_typed_struct_edges_report_their_owner() {
        let root = parse_all("f(1)[2]").unwrap();
        let mut seen = Vec::new();
        rewrite(&root, |node, parent| {
            seen.push((node.kind(), parent));
            node
        });
        assert!(seen.contains(&(SyntaxKind::IntegerLiteral, Some(SyntaxKind::ArgumentList))));
        assert!(seen.contains(&(SyntaxKind::Expr, Some(SyntaxKind::Predicate))));
        assert!(seen.contains(&(SyntaxKind::FunctionCall, Some(SyntaxKind::PostfixExpr))));
    }

    #[test]
    fn test_lazy_mode_skips_let_bodies() {
        let root = parse_all("let $a := 1 return 2 + 3").unwrap();
        let count = |mode| {
            let mut integers = 0;
            rewrite_with(
                &root,
                |node, _| {
                    if node.kind() == SyntaxKind::IntegerLiteral {
                        integers += 1;
                    }
                    node
                },
                mode,
            );
            integers
        };
        assert_eq!(count(RewriteMode::Eager), 3);
        assert_eq!(count(RewriteMode::Lazy), 1);

        let folded = rewrite_with(&root, fold_additions, RewriteMode::Lazy);
        assert_eq!(to_source(&folded), "let $a := 1 return 2 + 3");
    }

    #[test]
    fn test_try_rewrite_stops_at_first_error() {
        let root = parse_all("1, 'two', 3").unwrap();
        let mut visited = 0;
        let result = try_rewrite(&root, |node, _| {
            visited += 1;
            match &*node {
                Node::String(value) => Err(value.clone()),
                _ => Ok(node),
            }
        });
        assert_eq!(result.unwrap_err(), "two");
        assert_eq!(visited, 2);
    }

    #[test]
    fn test_replacing_a_leaf() {
        let root = parse_all("$a + 1").unwrap();
        let result = rewrite(&root, |node, _| match &*node {
            Node::Integer(value) if *value == Biggie::from(1) => Node::integer(41),
            _ => node,
        });
        assert_eq!(result.to_string(), "$a + 41");
    }
}
