//! XPath 3.1 expression grammar: tokenizer, parser, renderer and rewriter.
//!
//! Source text is split into [`Token`]s, parsed into an immutable tree of
//! [`Node`]s, and can be rendered back into tokens that re-parse to an
//! equal tree. Numeric literals are exact: integers are [`Biggie`]s and
//! decimals are [`Decie`]s.
//!
//! # Key Types
//!
//! - [`Node`]: expression tree, discriminated by [`SyntaxKind`]
//! - [`ParseError`]: every failure, with a stable `code()`
//! - [`Render`]: rendering back to tokens and source text
//! - [`RewriteMode`]: eager or lazy structural rewriting
//!
//! # Example
//!
//! ```
//! use xpgram_xpath31::{parse_all, rewrite};
//!
//! let tree = parse_all("for $i in 1 to 5 return $i * 2").unwrap();
//! assert_eq!(tree.to_string(), "for $i in 1 to 5 return $i * 2");
//!
//! let same = rewrite(&tree, |node, _| node);
//! assert!(std::sync::Arc::ptr_eq(&tree, &same));
//! ```

pub mod ast;
pub mod chars;
pub mod combinator;
pub mod error;
pub mod input;
pub mod lexer;
pub mod parser;
pub mod registry;
pub mod render;
pub mod token;
pub mod walker;

pub use ast::{Node, Syntax, SyntaxKind};
pub use error::{Diagnostic, ParseError, ParseResult, TokenizeError};
pub use input::{DEFAULT_MAX_DEPTH, Input, ParseOptions};
pub use lexer::tokenize;
pub use parser::{
    Parse, could_be_primary, parse, parse_all, parse_all_tokens, parse_all_tokens_with,
    parse_all_with, parse_as, parse_tokens, parse_tokens_with, parse_with,
};
pub use render::{Render, TokenWriter, join, to_source};
pub use token::Token;
pub use walker::{RewriteMode, rewrite, rewrite_with, try_rewrite, try_rewrite_with};

pub use xpgram_types::{Biggie, Decie, ValueError};
