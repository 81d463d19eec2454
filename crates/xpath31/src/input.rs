//! Token cursor state shared by every grammar rule.

use std::cell::Cell;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{ParseError, ParseResult};
use crate::token::Token;

/// Nesting limit applied when no options are given.
///
/// Every level runs the whole operator cascade, so this stays small enough
/// to finish on a 2 MiB thread stack in debug builds. Raising it through
/// [`ParseOptions::with_max_depth`] needs a correspondingly larger stack.
pub const DEFAULT_MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParseOptions {
    /// Maximum number of nested expression levels before parsing aborts.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParseOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// The token sequence being parsed plus the options in force.
///
/// Positions are plain indices threaded through the grammar functions; the
/// input itself is never advanced. Only the nesting depth is tracked here.
#[derive(Debug)]
pub struct Input {
    tokens: Arc<[Token]>,
    options: ParseOptions,
    depth: Cell<usize>,
}

impl Input {
    pub fn new(tokens: impl Into<Arc<[Token]>>, options: ParseOptions) -> Self {
        Self {
            tokens: tokens.into(),
            options,
            depth: Cell::new(0),
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The raw token at `pos`, space tokens included.
    pub fn get(&self, pos: usize) -> Option<&str> {
        self.tokens.get(pos).map(Token::as_str)
    }

    /// Steps over one space token, if present.
    pub fn skip_space(&self, pos: usize) -> usize {
        match self.tokens.get(pos) {
            Some(token) if token.is_space() => pos + 1,
            _ => pos,
        }
    }

    /// The next significant token at or after `pos`.
    pub fn peek(&self, pos: usize) -> Option<&str> {
        self.get(self.skip_space(pos))
    }

    /// True when the next significant token is `text`.
    pub fn at(&self, pos: usize, text: &str) -> bool {
        self.peek(pos) == Some(text)
    }

    /// Consumes `text` (after an optional space) and returns the following position.
    pub fn expect(&self, pos: usize, text: &str, owner: &str) -> ParseResult<usize> {
        let at = self.skip_space(pos);
        if self.get(at) == Some(text) {
            Ok(at + 1)
        } else {
            Err(self.unexpected(at, format!("'{text}' of {owner}")))
        }
    }

    pub fn unexpected(&self, pos: usize, expected: impl Into<String>) -> ParseError {
        ParseError::unexpected(Arc::clone(&self.tokens), pos, expected)
    }

    pub fn trailing(&self, pos: usize) -> ParseError {
        ParseError::TrailingTokens {
            tokens: Arc::clone(&self.tokens),
            position: pos,
        }
    }

    /// Runs a bracketed body; running out of tokens inside it is reported
    /// at the opening bracket instead of at the end of input.
    pub fn enclosed<T>(&self, open: usize, body: impl FnOnce() -> ParseResult<T>) -> ParseResult<T> {
        body().map_err(|err| match err {
            ParseError::UnexpectedToken {
                tokens,
                position,
                expected,
            } if position >= tokens.len() => ParseError::UnexpectedToken {
                tokens,
                position: open,
                expected,
            },
            other => other,
        })
    }

    /// Enters one nesting level, failing once the configured limit is passed.
    pub fn enter(&self, pos: usize) -> ParseResult<DepthGuard<'_>> {
        let depth = self.depth.get() + 1;
        if depth > self.options.max_depth {
            return Err(ParseError::TooDeep {
                limit: self.options.max_depth,
                position: pos,
            });
        }
        self.depth.set(depth);
        Ok(DepthGuard { depth: &self.depth })
    }
}

/// Leaves the nesting level on drop.
#[derive(Debug)]
pub struct DepthGuard<'a> {
    depth: &'a Cell<usize>,
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::tokens_of;

    fn input(items: &[&str]) -> Input {
        Input::new(tokens_of(items.iter().copied()), ParseOptions::default())
    }

    #[test]
    fn test_peek_skips_one_space() {
        let input = input(&["a", " ", "b"]);
        assert_eq!(input.peek(1), Some("b"));
        assert_eq!(input.skip_space(1), 2);
        assert_eq!(input.skip_space(0), 0);
        assert!(input.at(1, "b"));
        assert_eq!(input.peek(3), None);
    }

    #[test]
    fn test_expect_reports_position() {
        let input = input(&["(", " ", "1"]);
        assert_eq!(input.expect(0, "(", "ParenthesizedExpr"), Ok(1));
        let err = input.expect(1, ")", "ParenthesizedExpr").unwrap_err();
        assert_eq!(err.position(), Some(2));
    }

    #[test]
    fn test_enclosed_moves_eof_errors_to_opener() {
        let input = input(&["x", "["]);
        let err = input
            .enclosed(1, || -> ParseResult<()> { Err(input.unexpected(2, "ExprSingle")) })
            .unwrap_err();
        assert_eq!(err.position(), Some(1));

        let err = input
            .enclosed(1, || -> ParseResult<()> { Err(input.unexpected(0, "x")) })
            .unwrap_err();
        assert_eq!(err.position(), Some(0));
    }

    #[test]
    fn test_depth_guard() {
        let input = Input::new(
            tokens_of(["1"]),
            ParseOptions::default().with_max_depth(2),
        );
        let first = input.enter(0).unwrap();
        {
            let _second = input.enter(0).unwrap();
            assert!(matches!(
                input.enter(0),
                Err(ParseError::TooDeep { limit: 2, .. })
            ));
        }
        assert!(input.enter(0).is_ok());
        drop(first);
    }
}
