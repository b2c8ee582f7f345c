//! Syntax errors in condition text.

use thiserror::Error;

/// Malformed condition text, with the char offset where it was detected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} at position {position}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

/// Result type for parsing
pub type ParseResult<T> = Result<T, ParseError>;
