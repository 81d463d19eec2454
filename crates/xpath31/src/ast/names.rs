use std::fmt;

use super::{Syntax, SyntaxKind};

/// A name without a prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NCName(pub String);

impl NCName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NCName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    pub prefix: Option<NCName>,
    pub local: NCName,
}

/// `Q{uri}`; the URI text is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BracedUri {
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UriQualifiedName {
    pub uri: BracedUri,
    pub local: NCName,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EQName {
    QName(QName),
    UriQualified(UriQualifiedName),
}

impl EQName {
    pub fn local(name: impl Into<String>) -> Self {
        EQName::QName(QName {
            prefix: None,
            local: NCName::new(name),
        })
    }

    pub fn prefixed(prefix: impl Into<String>, name: impl Into<String>) -> Self {
        EQName::QName(QName {
            prefix: Some(NCName::new(prefix)),
            local: NCName::new(name),
        })
    }

    pub fn local_name(&self) -> &str {
        match self {
            EQName::QName(q) => q.local.as_str(),
            EQName::UriQualified(u) => u.local.as_str(),
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        match self {
            EQName::QName(q) => q.prefix.as_ref().map(NCName::as_str),
            EQName::UriQualified(_) => None,
        }
    }

    pub fn uri(&self) -> Option<&str> {
        match self {
            EQName::QName(_) => None,
            EQName::UriQualified(u) => Some(&u.uri.uri),
        }
    }
}

/// `prefix:*`, `*:local` or `Q{uri}*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NsWildcard {
    Prefix(NCName),
    Local(NCName),
    Uri(BracedUri),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NameTest {
    Name(EQName),
    Wildcard,
    Ns(NsWildcard),
}

/// Name argument of `element(...)` and `attribute(...)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NameOrWildcard {
    Name(EQName),
    Wildcard,
}

impl Syntax for NCName {
    fn kind(&self) -> SyntaxKind {
        SyntaxKind::NCName
    }
}

impl Syntax for QName {
    fn kind(&self) -> SyntaxKind {
        SyntaxKind::QName
    }
}

impl Syntax for BracedUri {
    fn kind(&self) -> SyntaxKind {
        SyntaxKind::BracedURILiteral
    }
}

impl Syntax for UriQualifiedName {
    fn kind(&self) -> SyntaxKind {
        SyntaxKind::URIQualifiedName
    }
}

impl Syntax for EQName {
    fn kind(&self) -> SyntaxKind {
        match self {
            EQName::QName(q) => q.kind(),
            EQName::UriQualified(u) => u.kind(),
        }
    }
}

impl Syntax for NsWildcard {
    fn kind(&self) -> SyntaxKind {
        SyntaxKind::NsWildcard
    }
}

impl Syntax for NameTest {
    fn kind(&self) -> SyntaxKind {
        match self {
            NameTest::Name(name) => name.kind(),
            NameTest::Wildcard => SyntaxKind::Wildcard,
            NameTest::Ns(ns) => ns.kind(),
        }
    }
}

impl Syntax for NameOrWildcard {
    fn kind(&self) -> SyntaxKind {
        match self {
            NameOrWildcard::Name(name) => name.kind(),
            NameOrWildcard::Wildcard => SyntaxKind::Wildcard,
        }
    }
}
