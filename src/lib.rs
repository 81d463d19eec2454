//! XPath 3.1 expression grammar.
//!
//! This crate is the facade over the workspace: exact numeric values live in
//! [`types`], the tokenizer, parser, renderer and rewriter in [`xpath31`].
//! [`Grammar`] bundles the configurable knobs (nesting depth, decimal
//! division precision, rewrite mode) behind a builder.
//!
//! ```
//! use xpgram::GrammarBuilder;
//!
//! let grammar = GrammarBuilder::new().with_max_depth(16).build().unwrap();
//! let tree = grammar.parse_all("//book[1]/title").unwrap();
//! assert_eq!(tree.to_string(), "//book[1]/title");
//! ```

pub mod error;
pub mod grammar;

pub use xpgram_types as types;
pub use xpgram_xpath31 as xpath31;

pub use error::XpgramError;
pub use grammar::{Grammar, GrammarBuilder, outline};

pub use xpgram_types::{Biggie, DEFAULT_DIVISION_PRECISION, Decie, ValueError};
pub use xpgram_xpath31::{
    Diagnostic, Node, ParseError, ParseOptions, Render, RewriteMode, SyntaxKind, Token, join,
    parse, parse_all, rewrite, to_source, tokenize,
};
