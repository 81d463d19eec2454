//! Closed operator and keyword sets used by the node types.

use std::fmt;

use serde::Serialize;

/// A keyword or symbol with a fixed spelling.
pub trait Operator: Sized + Copy {
    fn from_token(token: &str) -> Option<Self>;
    fn as_str(&self) -> &'static str;
}

macro_rules! operator_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum $name {
            $($variant),+
        }

        impl Operator for $name {
            fn from_token(token: &str) -> Option<Self> {
                match token {
                    $($text => Some(Self::$variant),)+
                    _ => None,
                }
            }

            fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

operator_enum!(
    /// Separator of `Expr` items and inline function parameters.
    Comma { Comma => "," }
);

operator_enum!(OrOp { Or => "or" });

operator_enum!(AndOp { And => "and" });

operator_enum!(
    /// Value, general and node comparisons.
    ComparisonOp {
        Eq => "eq",
        Ne => "ne",
        Lt => "lt",
        Le => "le",
        Gt => "gt",
        Ge => "ge",
        GeneralEq => "=",
        GeneralNe => "!=",
        GeneralLt => "<",
        GeneralLe => "<=",
        GeneralGt => ">",
        GeneralGe => ">=",
        Is => "is",
        Precedes => "<<",
        Follows => ">>",
    }
);

operator_enum!(ConcatOp { Concat => "||" });

operator_enum!(AdditiveOp { Plus => "+", Minus => "-" });

operator_enum!(MultiplicativeOp {
    Mul => "*",
    Div => "div",
    IDiv => "idiv",
    Mod => "mod",
});

operator_enum!(UnionOp { Union => "union", Pipe => "|" });

operator_enum!(IntersectExceptOp {
    Intersect => "intersect",
    Except => "except",
});

operator_enum!(ArrowOp { Arrow => "=>" });

operator_enum!(UnaryOp { Plus => "+", Minus => "-" });

operator_enum!(SimpleMapOp { Bang => "!" });

operator_enum!(
    /// Step separators, also used as the leading slash of a path.
    PathOp { Slash => "/", DoubleSlash => "//" }
);

operator_enum!(Quantifier { Some => "some", Every => "every" });

operator_enum!(
    /// `in` for `for`/`some`/`every` bindings, `:=` for `let`.
    BindingOp { In => "in", Assign => ":=" }
);

operator_enum!(Occurrence {
    ZeroOrOne => "?",
    ZeroOrMore => "*",
    OneOrMore => "+",
});

operator_enum!(Axis {
    Child => "child",
    Descendant => "descendant",
    Attribute => "attribute",
    SelfAxis => "self",
    DescendantOrSelf => "descendant-or-self",
    FollowingSibling => "following-sibling",
    Following => "following",
    Namespace => "namespace",
    Parent => "parent",
    Ancestor => "ancestor",
    PrecedingSibling => "preceding-sibling",
    Preceding => "preceding",
    AncestorOrSelf => "ancestor-or-self",
});

impl Axis {
    pub fn is_reverse(&self) -> bool {
        matches!(
            self,
            Axis::Parent
                | Axis::Ancestor
                | Axis::PrecedingSibling
                | Axis::Preceding
                | Axis::AncestorOrSelf
        )
    }
}
