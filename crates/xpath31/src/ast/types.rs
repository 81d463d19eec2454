//! Sequence types, item types and kind tests.

use super::names::{EQName, NCName, NameOrWildcard};
use super::operators::Occurrence;
use super::{Syntax, SyntaxKind};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SequenceType {
    /// `empty-sequence()`
    Empty,
    Item {
        item: ItemType,
        occurrence: Option<Occurrence>,
    },
}

impl SequenceType {
    pub fn item(item: ItemType) -> Self {
        SequenceType::Item {
            item,
            occurrence: None,
        }
    }

    pub fn with_occurrence(item: ItemType, occurrence: Occurrence) -> Self {
        SequenceType::Item {
            item,
            occurrence: Some(occurrence),
        }
    }
}

/// Target of `cast as` / `castable as`: an atomic type name, optionally `?`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SingleType {
    pub name: EQName,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemType {
    /// `item()`
    Any,
    Kind(KindTest),
    Function(FunctionTest),
    Map(MapTest),
    Array(ArrayTest),
    Atomic(EQName),
    Parenthesized(Box<ItemType>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FunctionTest {
    /// `function(*)`
    Any,
    Typed {
        params: Vec<SequenceType>,
        result: Box<SequenceType>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapTest {
    /// `map(*)`
    Any,
    Typed {
        key: EQName,
        value: Box<SequenceType>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArrayTest {
    /// `array(*)`
    Any,
    Typed(Box<SequenceType>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KindTest {
    Document(Option<DocumentElement>),
    Element(ElementTest),
    Attribute(AttributeTest),
    SchemaElement(EQName),
    SchemaAttribute(EQName),
    ProcessingInstruction(Option<PITarget>),
    Comment,
    Text,
    NamespaceNode,
    /// `node()`
    AnyKind,
}

/// The optional argument of `document-node(...)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocumentElement {
    Element(ElementTest),
    SchemaElement(EQName),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ElementTest {
    pub name: Option<NameOrWildcard>,
    pub type_name: Option<EQName>,
    /// Trailing `?` after the type name.
    pub nillable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AttributeTest {
    pub name: Option<NameOrWildcard>,
    pub type_name: Option<EQName>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PITarget {
    Name(NCName),
    Literal(String),
}

impl Syntax for SequenceType {
    fn kind(&self) -> SyntaxKind {
        match self {
            SequenceType::Empty => SyntaxKind::EmptySequenceType,
            SequenceType::Item { .. } => SyntaxKind::SequenceType,
        }
    }
}

impl Syntax for SingleType {
    fn kind(&self) -> SyntaxKind {
        SyntaxKind::SingleType
    }
}

impl Syntax for ItemType {
    fn kind(&self) -> SyntaxKind {
        match self {
            ItemType::Any => SyntaxKind::AnyItemType,
            ItemType::Kind(test) => test.kind(),
            ItemType::Function(_) => SyntaxKind::FunctionTest,
            ItemType::Map(_) => SyntaxKind::MapTest,
            ItemType::Array(_) => SyntaxKind::ArrayTest,
            ItemType::Atomic(name) => name.kind(),
            ItemType::Parenthesized(_) => SyntaxKind::ParenthesizedItemType,
        }
    }
}

impl Syntax for KindTest {
    fn kind(&self) -> SyntaxKind {
        match self {
            KindTest::Document(_) => SyntaxKind::DocumentTest,
            KindTest::Element(_) => SyntaxKind::ElementTest,
            KindTest::Attribute(_) => SyntaxKind::AttributeTest,
            KindTest::SchemaElement(_) => SyntaxKind::SchemaElementTest,
            KindTest::SchemaAttribute(_) => SyntaxKind::SchemaAttributeTest,
            KindTest::ProcessingInstruction(_) => SyntaxKind::PITest,
            KindTest::Comment => SyntaxKind::CommentTest,
            KindTest::Text => SyntaxKind::TextTest,
            KindTest::NamespaceNode => SyntaxKind::NamespaceNodeTest,
            KindTest::AnyKind => SyntaxKind::AnyKindTest,
        }
    }
}
