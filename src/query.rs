//! Routing query evaluation.
//!
//! This module provides:
//! - The dynamically typed value model and message bindings
//! - The builtin function registry with typed overloads
//! - Compilation of condition ASTs into reusable expression trees
//! - Evaluation of compiled conditions against messages

pub mod builtin;
pub mod compiler;
pub mod error;
pub mod eval;
pub mod expr;
pub mod operator;
pub mod value;

pub use builtin::{ArgType, Builtin, BuiltinExecutor, BuiltinFn, BuiltinRegistry, Signature};
pub use compiler::{compile, CompiledExpression, Compiler, Node};
pub use error::{CompileError, CompileResult};
pub use eval::{evaluate, Evaluator, Predicate};
pub use expr::Expression;
pub use operator::{BinaryOperator, UnaryOperator};
pub use value::{Bindings, QueryValue, StaticType, ValueType, UNDEFINED};
