//! Compile-time errors for routing conditions.
//!
//! Evaluation has no error type: anything that cannot produce a typed value
//! at run time becomes [`QueryValue::Undefined`](crate::query::QueryValue).

use crate::condition::ParseError;
use crate::query::value::StaticType;
use thiserror::Error;

/// Errors surfaced to the rule author when a condition is compiled
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Syntax error: {0}")]
    Parse(#[from] ParseError),

    #[error("Unknown function: {name}")]
    UnknownFunction { name: String },

    #[error("Function {function} expects {expected} arguments, got {actual}")]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },

    #[error(
        "No overload of {function} accepts argument {argument} of type {actual} (candidates: {candidates})"
    )]
    NoMatchingOverload {
        function: String,
        /// 1-based position of the first mismatched argument
        argument: usize,
        actual: StaticType,
        candidates: String,
    },

    #[error("Invalid operand types for operator {operator}: left={left}, right={right:?}")]
    InvalidOperandTypes {
        operator: String,
        left: StaticType,
        right: Option<StaticType>,
    },

    #[error("Condition must be boolean, got {actual}")]
    NonBooleanCondition { actual: StaticType },

    #[error("Expression nested deeper than {limit} levels")]
    NestingTooDeep { limit: usize },
}

/// Result type for compile operations
pub type CompileResult<T> = Result<T, CompileError>;
