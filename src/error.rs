// src/error.rs
use thiserror::Error;
use xpgram_types::ValueError;
use xpgram_xpath31::{Diagnostic, ParseError, TokenizeError};

/// Every failure the facade and the CLI can report.
#[derive(Error, Debug)]
pub enum XpgramError {
    #[error("Parsing failed: {0}")]
    Parse(#[from] ParseError),

    #[error("Arithmetic failed: {0}")]
    Value(#[from] ValueError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<TokenizeError> for XpgramError {
    fn from(e: TokenizeError) -> Self {
        XpgramError::Parse(ParseError::Tokenize(e))
    }
}

impl XpgramError {
    pub fn code(&self) -> &'static str {
        match self {
            XpgramError::Parse(e) => e.code(),
            XpgramError::Value(e) => e.code(),
            XpgramError::Io(_) => "io",
            XpgramError::Json(_) => "json",
            XpgramError::Config(_) => "config",
        }
    }

    pub fn diagnostic(&self) -> Diagnostic {
        match self {
            XpgramError::Parse(e) => e.diagnostic(),
            other => Diagnostic {
                code: other.code(),
                message: other.to_string(),
                position: None,
            },
        }
    }
}
