use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use xpgram_types::ValueError;

use crate::token::Token;

/// Raised when source text cannot be split into tokens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenizeError {
    #[error("Mismatching number of quote characters `{quote}` (string starts at offset {offset})")]
    UnterminatedString { quote: char, offset: usize },

    #[error("Unexpected character {ch:?} at offset {offset}")]
    UnexpectedCharacter { ch: char, offset: usize },
}

impl TokenizeError {
    pub fn code(&self) -> &'static str {
        match self {
            TokenizeError::UnterminatedString { .. } => "tokenize-strlit",
            TokenizeError::UnexpectedCharacter { .. } => "tokenize-unexpected",
        }
    }

    /// Byte offset into the source text.
    pub fn offset(&self) -> usize {
        match self {
            TokenizeError::UnterminatedString { offset, .. }
            | TokenizeError::UnexpectedCharacter { offset, .. } => *offset,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("{}", describe_unexpected(.tokens, .position, .expected))]
    UnexpectedToken {
        tokens: Arc<[Token]>,
        position: usize,
        expected: String,
    },

    #[error("Unable to parse all tokens, expected EOF but found trailing tokens at token {position}")]
    TrailingTokens { tokens: Arc<[Token]>, position: usize },

    #[error(transparent)]
    Tokenize(#[from] TokenizeError),

    #[error(transparent)]
    Value(#[from] ValueError),

    #[error("Expression nesting exceeds the limit of {limit} at token {position}")]
    TooDeep { limit: usize, position: usize },
}

pub type ParseResult<T> = Result<T, ParseError>;

fn describe_unexpected(tokens: &[Token], position: &usize, expected: &str) -> String {
    let found = match tokens.get(*position) {
        Some(token) => format!("{:?}", token.as_str()),
        None => "[EOL]".to_string(),
    };
    if expected.is_empty() {
        format!("unexpected token {found}")
    } else {
        format!("unexpected token {found} (expected {expected})")
    }
}

impl ParseError {
    pub fn unexpected(tokens: Arc<[Token]>, position: usize, expected: impl Into<String>) -> Self {
        Self::UnexpectedToken {
            tokens,
            position,
            expected: expected.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ParseError::UnexpectedToken { .. } => "parse-token",
            ParseError::TrailingTokens { .. } => "trailing-tokens",
            ParseError::Tokenize(inner) => inner.code(),
            ParseError::Value(inner) => inner.code(),
            ParseError::TooDeep { .. } => "parse-depth",
        }
    }

    /// Legacy numeric error code; only trailing tokens carry one.
    pub fn error_number(&self) -> Option<u32> {
        match self {
            ParseError::TrailingTokens { .. } => Some(51),
            _ => None,
        }
    }

    /// Token index (or byte offset for tokenizer failures) the error points at.
    pub fn position(&self) -> Option<usize> {
        match self {
            ParseError::UnexpectedToken { position, .. }
            | ParseError::TrailingTokens { position, .. }
            | ParseError::TooDeep { position, .. } => Some(*position),
            ParseError::Tokenize(inner) => Some(inner.offset()),
            ParseError::Value(_) => None,
        }
    }

    pub fn diagnostic(&self) -> Diagnostic {
        Diagnostic {
            code: self.code(),
            message: self.to_string(),
            position: self.position(),
        }
    }
}

/// Serializable summary of a failure, used for machine-readable output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: &'static str,
    pub message: String,
    pub position: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(items: &[&str]) -> Arc<[Token]> {
        items.iter().map(|t| Token::from(*t)).collect()
    }

    #[test]
    fn test_unexpected_token_message() {
        let err = ParseError::unexpected(tokens(&["1", "+"]), 1, "'instance' 'of'");
        assert_eq!(
            err.to_string(),
            "unexpected token \"+\" (expected 'instance' 'of')"
        );
        assert_eq!(err.code(), "parse-token");
        assert_eq!(err.error_number(), None);
    }

    #[test]
    fn test_unexpected_end_of_input() {
        let err = ParseError::unexpected(tokens(&["("]), 1, "')'");
        assert_eq!(err.to_string(), "unexpected token [EOL] (expected ')')");
    }

    #[test]
    fn test_trailing_tokens_number() {
        let err = ParseError::TrailingTokens {
            tokens: tokens(&["1", " ", "2"]),
            position: 2,
        };
        assert_eq!(err.code(), "trailing-tokens");
        assert_eq!(err.error_number(), Some(51));
        assert_eq!(err.position(), Some(2));
    }

    #[test]
    fn test_wrapped_errors_keep_their_code() {
        let err = ParseError::from(TokenizeError::UnterminatedString {
            quote: '\'',
            offset: 3,
        });
        assert_eq!(err.code(), "tokenize-strlit");
        assert_eq!(err.position(), Some(3));

        let err = ParseError::from(ValueError::DivisionByZero);
        assert_eq!(err.code(), "value-division-by-zero");
    }

    #[test]
    fn test_diagnostic_serializes() {
        let err = ParseError::TooDeep {
            limit: 4,
            position: 9,
        };
        let json = serde_json::to_value(err.diagnostic()).unwrap();
        assert_eq!(json["code"], "parse-depth");
        assert_eq!(json["position"], 9);
    }
}
