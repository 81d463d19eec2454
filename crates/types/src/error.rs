use thiserror::Error;

/// Errors raised while constructing or combining literal values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("Division by zero")]
    DivisionByZero,

    #[error("Negative magnitude {0} cannot be represented as an integer")]
    NegativeMagnitude(i64),

    #[error("Cannot take the logarithm of a negative or zero value")]
    NonPositiveLogarithm,

    #[error("Invalid numeric literal '{0}'")]
    InvalidNumber(String),

    #[error("Value {0} is not finite")]
    NonFinite(String),

    #[error("Scale {scale} is out of range (maximum {max})")]
    ScaleOutOfRange { scale: u64, max: u64 },

    #[error("A braced URI literal may not contain braces: '{0}'")]
    InvalidBracedUri(String),
}

impl ValueError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            ValueError::DivisionByZero => "value-division-by-zero",
            ValueError::NegativeMagnitude(_) => "value-negative-magnitude",
            ValueError::NonPositiveLogarithm => "value-logarithm",
            ValueError::InvalidNumber(_) => "value-invalid-number",
            ValueError::NonFinite(_) => "value-non-finite",
            ValueError::ScaleOutOfRange { .. } => "value-scale",
            ValueError::InvalidBracedUri(_) => "value-invalid-braced-uri",
        }
    }

    pub fn invalid_number(literal: impl Into<String>) -> Self {
        Self::InvalidNumber(literal.into())
    }
}
