// src/grammar.rs
use std::fmt::Write as _;
use std::sync::Arc;

use xpgram_types::{DEFAULT_DIVISION_PRECISION, Decie};
use xpgram_xpath31::{
    DEFAULT_MAX_DEPTH, Node, ParseOptions, RewriteMode, SyntaxKind, Token, parse_all_with,
    parse_with, rewrite_with, tokenize, try_rewrite_with,
};

use crate::error::XpgramError;

/// A builder for a configured [`Grammar`].
#[derive(Debug, Clone)]
pub struct GrammarBuilder {
    max_depth: usize,
    division_precision: u32,
    rewrite_mode: RewriteMode,
}

impl Default for GrammarBuilder {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            division_precision: DEFAULT_DIVISION_PRECISION,
            rewrite_mode: RewriteMode::default(),
        }
    }
}

impl GrammarBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Limits how deeply expressions may nest before parsing fails.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Digits kept after the point by [`Grammar::divide`].
    pub fn with_division_precision(mut self, precision: u32) -> Self {
        self.division_precision = precision;
        self
    }

    pub fn with_rewrite_mode(mut self, mode: RewriteMode) -> Self {
        self.rewrite_mode = mode;
        self
    }

    pub fn build(self) -> Result<Grammar, XpgramError> {
        if self.max_depth == 0 {
            return Err(XpgramError::Config(
                "max depth must allow at least one expression level".to_string(),
            ));
        }
        log::debug!(
            "grammar configured: max_depth={}, division_precision={}, rewrite_mode={:?}",
            self.max_depth,
            self.division_precision,
            self.rewrite_mode
        );
        Ok(Grammar {
            options: ParseOptions::default().with_max_depth(self.max_depth),
            division_precision: self.division_precision,
            rewrite_mode: self.rewrite_mode,
        })
    }
}

/// Parse, rewrite and decimal arithmetic under one configuration.
#[derive(Debug, Clone)]
pub struct Grammar {
    options: ParseOptions,
    division_precision: u32,
    rewrite_mode: RewriteMode,
}

impl Default for Grammar {
    fn default() -> Self {
        Self {
            options: ParseOptions::default(),
            division_precision: DEFAULT_DIVISION_PRECISION,
            rewrite_mode: RewriteMode::default(),
        }
    }
}

impl Grammar {
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn division_precision(&self) -> u32 {
        self.division_precision
    }

    pub fn rewrite_mode(&self) -> RewriteMode {
        self.rewrite_mode
    }

    pub fn tokenize(&self, source: &str) -> Result<Vec<Token>, XpgramError> {
        Ok(tokenize(source)?)
    }

    /// Parses the longest expression prefix and returns where it stopped.
    pub fn parse(&self, source: &str) -> Result<(Arc<Node>, usize), XpgramError> {
        Ok(parse_with(source, self.options)?)
    }

    pub fn parse_all(&self, source: &str) -> Result<Arc<Node>, XpgramError> {
        Ok(parse_all_with(source, self.options)?)
    }

    /// Rewrites `node` in the configured mode.
    pub fn rewrite(
        &self,
        node: &Arc<Node>,
        f: impl FnMut(Arc<Node>, Option<SyntaxKind>) -> Arc<Node>,
    ) -> Arc<Node> {
        rewrite_with(node, f, self.rewrite_mode)
    }

    pub fn try_rewrite<E>(
        &self,
        node: &Arc<Node>,
        f: impl FnMut(Arc<Node>, Option<SyntaxKind>) -> Result<Arc<Node>, E>,
    ) -> Result<Arc<Node>, E> {
        try_rewrite_with(node, f, self.rewrite_mode)
    }

    /// Decimal division truncated to the configured precision.
    pub fn divide(&self, dividend: &Decie, divisor: &Decie) -> Result<Decie, XpgramError> {
        Ok(dividend.div(divisor, Some(self.division_precision))?)
    }
}

/// One line per node, indented by depth; leaves also show their source.
pub fn outline(node: &Node) -> String {
    fn walk(node: &Node, depth: usize, out: &mut String) {
        let children = node.children();
        let _ = write!(out, "{:indent$}{}", "", node.kind(), indent = depth * 2);
        if children.is_empty() {
            let _ = write!(out, " {node}");
        }
        out.push('\n');
        for child in children {
            walk(child, depth + 1, out);
        }
    }

    let mut out = String::new();
    walk(node, 0, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_rejects_zero_depth() {
        let err = GrammarBuilder::new().with_max_depth(0).build().unwrap_err();
        assert_eq!(err.code(), "config");
    }

    #[test]
    fn test_builder_applies_settings() {
        let grammar = GrammarBuilder::new()
            .with_max_depth(3)
            .with_division_precision(4)
            .with_rewrite_mode(RewriteMode::Lazy)
            .build()
            .unwrap();
        assert_eq!(grammar.options().max_depth, 3);
        assert_eq!(grammar.division_precision(), 4);
        assert_eq!(grammar.rewrite_mode(), RewriteMode::Lazy);
        assert_eq!(grammar.parse_all("((((1))))").unwrap_err().code(), "parse-depth");
    }

    #[test]
    fn test_divide_uses_precision() {
        let grammar = GrammarBuilder::new().with_division_precision(3).build().unwrap();
        let one: Decie = "1".parse().unwrap();
        let three: Decie = "3".parse().unwrap();
        assert_eq!(grammar.divide(&one, &three).unwrap().to_string(), "0.333");
        let zero = Decie::zero();
        assert_eq!(grammar.divide(&one, &zero).unwrap_err().code(), "value-division-by-zero");
    }

    #[test]
    fn test_outline() {
        let grammar = Grammar::default();
        let tree = grammar.parse_all("1 + $a").unwrap();
        assert_eq!(
            outline(&tree),
            "Expr\n  AdditiveExpr\n    IntegerLiteral 1\n    VarRef $a\n"
        );
    }
}
