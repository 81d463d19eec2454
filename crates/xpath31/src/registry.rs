//! Keyword table for kind tests.
//!
//! A kind test is recognized by its keyword followed by `(`. Node tests,
//! item types and the primary-expression probe all consult this table, so a
//! keyword listed here is never read as a function call.

use std::sync::LazyLock;

use indexmap::IndexMap;

use crate::ast::KindTest;
use crate::combinator::Parsed;
use crate::input::Input;
use crate::parser::types;

/// Parses a kind test starting at its keyword.
pub type KindTestParser = fn(&Input, usize) -> Parsed<KindTest>;

static KIND_TESTS: LazyLock<IndexMap<&'static str, KindTestParser>> = LazyLock::new(|| {
    let mut tests: IndexMap<&'static str, KindTestParser> = IndexMap::new();
    tests.insert("document-node", types::document_test);
    tests.insert("element", types::element_test);
    tests.insert("attribute", types::attribute_test);
    tests.insert("schema-element", types::schema_element_test);
    tests.insert("schema-attribute", types::schema_attribute_test);
    tests.insert("processing-instruction", types::pi_test);
    tests.insert("comment", types::comment_test);
    tests.insert("text", types::text_test);
    tests.insert("namespace-node", types::namespace_node_test);
    tests.insert("node", types::any_kind_test);
    tests
});

pub fn is_kind_test(keyword: &str) -> bool {
    KIND_TESTS.contains_key(keyword)
}

pub fn kind_test_parser(keyword: &str) -> Option<KindTestParser> {
    KIND_TESTS.get(keyword).copied()
}

/// Registered keywords in registration order.
pub fn kind_test_keywords() -> impl Iterator<Item = &'static str> {
    KIND_TESTS.keys().copied()
}

pub(crate) fn kind_test(input: &Input, pos: usize) -> Parsed<KindTest> {
    let at = input.skip_space(pos);
    match input.get(at).and_then(kind_test_parser) {
        Some(parser) => parser(input, at),
        None => Err(input.unexpected(at, "KindTest")),
    }
}
