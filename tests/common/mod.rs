use std::sync::Arc;

use xpgram::{Grammar, Node, Render, xpath31};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Parses with default settings, panicking with the diagnostic on failure.
pub fn tree(source: &str) -> Arc<Node> {
    match Grammar::default().parse_all(source) {
        Ok(node) => node,
        Err(e) => panic!("{source:?} failed to parse: {:?}", e.diagnostic()),
    }
}

/// Renders `source`, checks that both the tokens and the text re-parse to
/// the same tree, and returns the text.
pub fn canonical(source: &str) -> String {
    let node = tree(source);
    let tokens = node.render();
    let from_tokens = xpath31::parse_all_tokens(tokens.clone())
        .unwrap_or_else(|e| panic!("rendered tokens {tokens:?} failed: {e}"));
    assert_eq!(from_tokens, node, "tokens {tokens:?} re-parse differently");
    let text = xpath31::join(&tokens);
    assert_eq!(tree(&text), node, "text {text:?} re-parses differently");
    text
}
