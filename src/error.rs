//! Error types for the rule engine

use thiserror::Error;

/// Main error type for the rule engine
#[derive(Error, Debug)]
pub enum RuleEngineError {
    #[error("Malformed expression: {0}")]
    MalformedExpression(String),

    #[error("Invalid literal: {0}")]
    InvalidLiteral(String),

    #[error("Corrupt AST: {0}")]
    CorruptAst(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Type mismatch on field '{field}': expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        actual: String,
    },

    #[error("Invalid AST: {0}")]
    InvalidAst(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

impl From<std::io::Error> for RuleEngineError {
    fn from(err: std::io::Error) -> Self {
        RuleEngineError::Backend(err.to_string())
    }
}

impl From<rusqlite::Error> for RuleEngineError {
    fn from(err: rusqlite::Error) -> Self {
        RuleEngineError::Backend(format!("sqlite: {}", err))
    }
}

#[cfg(feature = "python")]
impl From<RuleEngineError> for pyo3::PyErr {
    fn from(err: RuleEngineError) -> pyo3::PyErr {
        use pyo3::exceptions::{PyKeyError, PyRuntimeError, PyValueError};

        match err {
            RuleEngineError::MissingField(_) => PyKeyError::new_err(err.to_string()),
            RuleEngineError::Backend(_) => PyRuntimeError::new_err(err.to_string()),
            RuleEngineError::MalformedExpression(_)
            | RuleEngineError::InvalidLiteral(_)
            | RuleEngineError::CorruptAst(_)
            | RuleEngineError::TypeMismatch { .. }
            | RuleEngineError::InvalidAst(_) => PyValueError::new_err(err.to_string()),
        }
    }
}

/// Result type alias for the rule engine
pub type Result<T> = std::result::Result<T, RuleEngineError>;
