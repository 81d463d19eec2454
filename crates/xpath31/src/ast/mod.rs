//! Lossless expression tree.
//!
//! [`Node`] covers every expression-level construct; grammar-fixed pieces
//! (names, types, bindings, predicates, argument lists) are typed structs.
//! Expression children are `Arc<Node>` so rewritten trees can share
//! unchanged subtrees with their source.

pub mod names;
pub mod operators;
pub mod types;

use std::sync::Arc;

use serde::Serialize;
use xpgram_types::{Biggie, Decie};

pub use names::{BracedUri, EQName, NCName, NameOrWildcard, NameTest, NsWildcard, QName, UriQualifiedName};
pub use operators::{
    AdditiveOp, AndOp, ArrowOp, Axis, BindingOp, Comma, ComparisonOp, ConcatOp, IntersectExceptOp,
    MultiplicativeOp, Occurrence, Operator, OrOp, PathOp, Quantifier, SimpleMapOp, UnaryOp,
    UnionOp,
};
pub use types::{
    ArrayTest, AttributeTest, DocumentElement, ElementTest, FunctionTest, ItemType, KindTest,
    MapTest, PITarget, SequenceType, SingleType,
};

macro_rules! syntax_kinds {
    ($($kind:ident),+ $(,)?) => {
        /// Discriminator for every grammar construct.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub enum SyntaxKind {
            $($kind),+
        }

        impl SyntaxKind {
            pub const ALL: &'static [SyntaxKind] = &[$(SyntaxKind::$kind),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(SyntaxKind::$kind => stringify!($kind)),+
                }
            }
        }
    };
}

syntax_kinds!(
    Expr,
    ForExpr,
    LetExpr,
    QuantifiedExpr,
    IfExpr,
    SimpleBinding,
    OrExpr,
    AndExpr,
    ComparisonExpr,
    StringConcatExpr,
    RangeExpr,
    AdditiveExpr,
    MultiplicativeExpr,
    UnionExpr,
    IntersectExceptExpr,
    InstanceofExpr,
    TreatExpr,
    CastableExpr,
    CastExpr,
    ArrowExpr,
    ArrowFunctionExpr,
    UnaryExpr,
    SimpleMapExpr,
    PathExpr,
    RelativePathExpr,
    AxisStep,
    ParentAxisStep,
    PostfixExpr,
    Predicate,
    ArgumentList,
    Lookup,
    ParenthesizedExpr,
    ContextItemExpr,
    VarRef,
    FunctionCall,
    ArgumentPlaceholder,
    NamedFunctionRef,
    InlineFunctionExpr,
    ParamList,
    Param,
    EnclosedExpr,
    MapCons,
    SquareArrayCons,
    CurlyArrayCons,
    UnaryLookup,
    IntegerLiteral,
    DecimalLiteral,
    DoubleLiteral,
    StringLiteral,
    SequenceType,
    EmptySequenceType,
    SingleType,
    AnyItemType,
    ParenthesizedItemType,
    FunctionTest,
    MapTest,
    ArrayTest,
    DocumentTest,
    ElementTest,
    AttributeTest,
    SchemaElementTest,
    SchemaAttributeTest,
    PITest,
    CommentTest,
    TextTest,
    NamespaceNodeTest,
    AnyKindTest,
    NCName,
    QName,
    URIQualifiedName,
    BracedURILiteral,
    Wildcard,
    NsWildcard,
);

impl std::fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything that knows which grammar construct it is.
pub trait Syntax {
    fn kind(&self) -> SyntaxKind;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Comma-separated root expression; never collapsed.
    Expr(Vec<Arc<Node>>),
    For(ForExpr),
    Let(LetExpr),
    Quantified(QuantifiedExpr),
    If(IfExpr),
    Or(Chain<OrOp>),
    And(Chain<AndOp>),
    Comparison(ComparisonExpr),
    StringConcat(Chain<ConcatOp>),
    Range(RangeExpr),
    Additive(Chain<AdditiveOp>),
    Multiplicative(Chain<MultiplicativeOp>),
    Union(Chain<UnionOp>),
    IntersectExcept(Chain<IntersectExceptOp>),
    InstanceOf(TypeExpr<SequenceType>),
    Treat(TypeExpr<SequenceType>),
    Castable(TypeExpr<SingleType>),
    Cast(TypeExpr<SingleType>),
    Arrow(Chain<ArrowOp, ArrowFunctionExpr>),
    Unary(UnaryExpr),
    SimpleMap(Chain<SimpleMapOp>),
    Path(PathExpr),
    RelativePath(Chain<PathOp>),
    AxisStep(AxisStep),
    /// `..`
    ParentAxisStep,
    Postfix(PostfixExpr),
    Parenthesized(Option<Arc<Node>>),
    /// `.`
    ContextItem,
    VarRef(EQName),
    FunctionCall(FunctionCall),
    NamedFunctionRef(NamedFunctionRef),
    InlineFunction(InlineFunctionExpr),
    MapCons(Vec<MapEntry>),
    SquareArray(Vec<Arc<Node>>),
    CurlyArray(EnclosedExpr),
    UnaryLookup(KeySpecifier),
    Integer(Biggie),
    Decimal(Decie),
    Double(f64),
    String(String),
}

/// `$name := expr` in `let`, `$name in expr` in `for`, `some` and `every`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleBinding {
    pub name: EQName,
    pub op: BindingOp,
    pub expr: Arc<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForExpr {
    pub bindings: Vec<SimpleBinding>,
    pub body: Arc<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LetExpr {
    pub bindings: Vec<SimpleBinding>,
    pub body: Arc<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuantifiedExpr {
    pub quantifier: Quantifier,
    pub bindings: Vec<SimpleBinding>,
    pub body: Arc<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfExpr {
    pub condition: Arc<Node>,
    pub then_branch: Arc<Node>,
    pub else_branch: Arc<Node>,
}

/// A left operand followed by `(operator, operand)` pairs, kept flat.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain<O, R = Arc<Node>> {
    pub first: Arc<Node>,
    pub rest: Vec<(O, R)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonExpr {
    pub left: Arc<Node>,
    pub op: ComparisonOp,
    pub right: Arc<Node>,
}

/// `start to end`
#[derive(Debug, Clone, PartialEq)]
pub struct RangeExpr {
    pub start: Arc<Node>,
    pub end: Arc<Node>,
}

/// An expression tested against or converted to a type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeExpr<T> {
    pub expr: Arc<Node>,
    pub ty: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrowFunctionExpr {
    pub specifier: ArrowSpecifier,
    pub args: ArgumentList,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrowSpecifier {
    Name(EQName),
    Var(EQName),
    Parenthesized(Arc<Node>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub ops: Vec<UnaryOp>,
    pub operand: Arc<Node>,
}

impl UnaryExpr {
    /// True when the prefix run flips the sign an odd number of times.
    pub fn is_negated(&self) -> bool {
        self.ops.iter().filter(|op| **op == UnaryOp::Minus).count() % 2 == 1
    }
}

/// A path with a leading `/` or `//`.
#[derive(Debug, Clone, PartialEq)]
pub struct PathExpr {
    pub leading: PathOp,
    /// Absent only for a lone `/`.
    pub relative: Option<Arc<Node>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepAxis {
    Named(Axis),
    /// `@`, shorthand for `attribute::`
    At,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AxisStep {
    pub axis: Option<StepAxis>,
    pub test: NodeTest,
    pub predicates: Vec<Predicate>,
}

impl AxisStep {
    /// The axis in effect, `child` when none was written.
    pub fn effective_axis(&self) -> Axis {
        match self.axis {
            Some(StepAxis::Named(axis)) => axis,
            Some(StepAxis::At) => Axis::Attribute,
            None => Axis::Child,
        }
    }

    pub fn is_reverse(&self) -> bool {
        self.effective_axis().is_reverse()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeTest {
    Kind(KindTest),
    Name(NameTest),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostfixExpr {
    pub primary: Arc<Node>,
    pub suffixes: Vec<Postfix>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Postfix {
    Predicate(Predicate),
    Arguments(ArgumentList),
    Lookup(Lookup),
}

/// `[ Expr ]`
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub expr: Arc<Node>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentList {
    pub args: Vec<Argument>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Expr(Arc<Node>),
    /// `?` in a partial function application.
    Placeholder,
}

/// `? KeySpecifier` after a postfix base.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub key: KeySpecifier,
}

#[derive(Debug, Clone, PartialEq)]
pub enum KeySpecifier {
    Name(NCName),
    Integer(Biggie),
    Parenthesized(Arc<Node>),
    Wildcard,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: EQName,
    pub args: ArgumentList,
}

/// `name#arity`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedFunctionRef {
    pub name: EQName,
    pub arity: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InlineFunctionExpr {
    pub params: ParamList,
    pub result: Option<SequenceType>,
    pub body: EnclosedExpr,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamList {
    pub params: Vec<Param>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: EQName,
    pub ty: Option<SequenceType>,
}

/// `{ Expr? }`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnclosedExpr {
    pub expr: Option<Arc<Node>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    pub key: Arc<Node>,
    pub value: Arc<Node>,
}

impl Node {
    pub fn kind(&self) -> SyntaxKind {
        match self {
            Node::Expr(_) => SyntaxKind::Expr,
            Node::For(_) => SyntaxKind::ForExpr,
            Node::Let(_) => SyntaxKind::LetExpr,
            Node::Quantified(_) => SyntaxKind::QuantifiedExpr,
            Node::If(_) => SyntaxKind::IfExpr,
            Node::Or(_) => SyntaxKind::OrExpr,
            Node::And(_) => SyntaxKind::AndExpr,
            Node::Comparison(_) => SyntaxKind::ComparisonExpr,
            Node::StringConcat(_) => SyntaxKind::StringConcatExpr,
            Node::Range(_) => SyntaxKind::RangeExpr,
            Node::Additive(_) => SyntaxKind::AdditiveExpr,
            Node::Multiplicative(_) => SyntaxKind::MultiplicativeExpr,
            Node::Union(_) => SyntaxKind::UnionExpr,
            Node::IntersectExcept(_) => SyntaxKind::IntersectExceptExpr,
            Node::InstanceOf(_) => SyntaxKind::InstanceofExpr,
            Node::Treat(_) => SyntaxKind::TreatExpr,
            Node::Castable(_) => SyntaxKind::CastableExpr,
            Node::Cast(_) => SyntaxKind::CastExpr,
            Node::Arrow(_) => SyntaxKind::ArrowExpr,
            Node::Unary(_) => SyntaxKind::UnaryExpr,
            Node::SimpleMap(_) => SyntaxKind::SimpleMapExpr,
            Node::Path(_) => SyntaxKind::PathExpr,
            Node::RelativePath(_) => SyntaxKind::RelativePathExpr,
            Node::AxisStep(_) => SyntaxKind::AxisStep,
            Node::ParentAxisStep => SyntaxKind::ParentAxisStep,
            Node::Postfix(_) => SyntaxKind::PostfixExpr,
            Node::Parenthesized(_) => SyntaxKind::ParenthesizedExpr,
            Node::ContextItem => SyntaxKind::ContextItemExpr,
            Node::VarRef(_) => SyntaxKind::VarRef,
            Node::FunctionCall(_) => SyntaxKind::FunctionCall,
            Node::NamedFunctionRef(_) => SyntaxKind::NamedFunctionRef,
            Node::InlineFunction(_) => SyntaxKind::InlineFunctionExpr,
            Node::MapCons(_) => SyntaxKind::MapCons,
            Node::SquareArray(_) => SyntaxKind::SquareArrayCons,
            Node::CurlyArray(_) => SyntaxKind::CurlyArrayCons,
            Node::UnaryLookup(_) => SyntaxKind::UnaryLookup,
            Node::Integer(_) => SyntaxKind::IntegerLiteral,
            Node::Decimal(_) => SyntaxKind::DecimalLiteral,
            Node::Double(_) => SyntaxKind::DoubleLiteral,
            Node::String(_) => SyntaxKind::StringLiteral,
        }
    }

    pub fn integer(value: impl Into<Biggie>) -> Arc<Node> {
        Arc::new(Node::Integer(value.into()))
    }

    pub fn string(value: impl Into<String>) -> Arc<Node> {
        Arc::new(Node::String(value.into()))
    }

    /// Direct expression children, in source order.
    pub fn children(&self) -> Vec<&Arc<Node>> {
        fn args<'a>(list: &'a ArgumentList, out: &mut Vec<&'a Arc<Node>>) {
            out.extend(list.args.iter().filter_map(|arg| match arg {
                Argument::Expr(expr) => Some(expr),
                Argument::Placeholder => None,
            }));
        }
        fn chain<'a, O, R>(
            chain: &'a Chain<O, R>,
            out: &mut Vec<&'a Arc<Node>>,
            each: impl Fn(&'a R, &mut Vec<&'a Arc<Node>>),
        ) {
            out.push(&chain.first);
            for (_, operand) in &chain.rest {
                each(operand, out);
            }
        }
        fn operand<'a>(node: &'a Arc<Node>, out: &mut Vec<&'a Arc<Node>>) {
            out.push(node);
        }
        fn key<'a>(key: &'a KeySpecifier, out: &mut Vec<&'a Arc<Node>>) {
            if let KeySpecifier::Parenthesized(expr) = key {
                out.push(expr);
            }
        }

        let mut out = Vec::new();
        match self {
            Node::Expr(items) | Node::SquareArray(items) => out.extend(items),
            Node::For(ForExpr { bindings, body }) | Node::Let(LetExpr { bindings, body }) => {
                out.extend(bindings.iter().map(|b| &b.expr));
                out.push(body);
            }
            Node::Quantified(q) => {
                out.extend(q.bindings.iter().map(|b| &b.expr));
                out.push(&q.body);
            }
            Node::If(i) => out.extend([&i.condition, &i.then_branch, &i.else_branch]),
            Node::Or(c) => chain(c, &mut out, operand),
            Node::And(c) => chain(c, &mut out, operand),
            Node::StringConcat(c) => chain(c, &mut out, operand),
            Node::Additive(c) => chain(c, &mut out, operand),
            Node::Multiplicative(c) => chain(c, &mut out, operand),
            Node::Union(c) => chain(c, &mut out, operand),
            Node::IntersectExcept(c) => chain(c, &mut out, operand),
            Node::SimpleMap(c) => chain(c, &mut out, operand),
            Node::RelativePath(c) => chain(c, &mut out, operand),
            Node::Arrow(c) => chain(c, &mut out, |f, out| {
                if let ArrowSpecifier::Parenthesized(expr) = &f.specifier {
                    out.push(expr);
                }
                args(&f.args, out);
            }),
            Node::Comparison(c) => out.extend([&c.left, &c.right]),
            Node::Range(r) => out.extend([&r.start, &r.end]),
            Node::InstanceOf(t) | Node::Treat(t) => out.push(&t.expr),
            Node::Castable(t) | Node::Cast(t) => out.push(&t.expr),
            Node::Unary(u) => out.push(&u.operand),
            Node::Path(p) => out.extend(p.relative.as_ref()),
            Node::AxisStep(step) => out.extend(step.predicates.iter().map(|p| &p.expr)),
            Node::Postfix(p) => {
                out.push(&p.primary);
                for suffix in &p.suffixes {
                    match suffix {
                        Postfix::Predicate(pred) => out.push(&pred.expr),
                        Postfix::Arguments(list) => args(list, &mut out),
                        Postfix::Lookup(lookup) => key(&lookup.key, &mut out),
                    }
                }
            }
            Node::Parenthesized(inner) => out.extend(inner.as_ref()),
            Node::FunctionCall(call) => args(&call.args, &mut out),
            Node::InlineFunction(f) => out.extend(f.body.expr.as_ref()),
            Node::MapCons(entries) => {
                for entry in entries {
                    out.extend([&entry.key, &entry.value]);
                }
            }
            Node::CurlyArray(enclosed) => out.extend(enclosed.expr.as_ref()),
            Node::UnaryLookup(k) => key(k, &mut out),
            Node::ParentAxisStep
            | Node::ContextItem
            | Node::VarRef(_)
            | Node::NamedFunctionRef(_)
            | Node::Integer(_)
            | Node::Decimal(_)
            | Node::Double(_)
            | Node::String(_) => {}
        }
        out
    }
}

impl Syntax for Node {
    fn kind(&self) -> SyntaxKind {
        Node::kind(self)
    }
}

macro_rules! fixed_kind {
    ($($ty:ty => $kind:ident),+ $(,)?) => {
        $(
            impl Syntax for $ty {
                fn kind(&self) -> SyntaxKind {
                    SyntaxKind::$kind
                }
            }
        )+
    };
}

fixed_kind!(
    SimpleBinding => SimpleBinding,
    ArrowFunctionExpr => ArrowFunctionExpr,
    Predicate => Predicate,
    ArgumentList => ArgumentList,
    Lookup => Lookup,
    ParamList => ParamList,
    Param => Param,
    EnclosedExpr => EnclosedExpr,
);

impl Syntax for NodeTest {
    fn kind(&self) -> SyntaxKind {
        match self {
            NodeTest::Kind(test) => test.kind(),
            NodeTest::Name(test) => test.kind(),
        }
    }
}

impl Syntax for Argument {
    fn kind(&self) -> SyntaxKind {
        match self {
            Argument::Expr(expr) => expr.kind(),
            Argument::Placeholder => SyntaxKind::ArgumentPlaceholder,
        }
    }
}

impl Syntax for KeySpecifier {
    fn kind(&self) -> SyntaxKind {
        match self {
            KeySpecifier::Name(name) => name.kind(),
            KeySpecifier::Integer(_) => SyntaxKind::IntegerLiteral,
            KeySpecifier::Parenthesized(expr) => expr.kind(),
            KeySpecifier::Wildcard => SyntaxKind::Wildcard,
        }
    }
}
