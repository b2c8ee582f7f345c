//! Evaluation of compiled expressions against message bindings.

use crate::query::compiler::{CallNode, CompiledExpression, Node};
use crate::query::operator::BinaryOperator;
use crate::query::value::{Bindings, QueryValue};
use log::trace;
use std::sync::Arc;

/// Evaluator for compiled expression trees.
///
/// Holds nothing but a borrow of the message bindings, so any number of
/// evaluators can run over the same tree at once.
pub struct Evaluator<'a> {
    bindings: &'a Bindings,
}

impl<'a> Evaluator<'a> {
    pub fn new(bindings: &'a Bindings) -> Self {
        Self { bindings }
    }

    /// Evaluate a node; never fails, indeterminate results are Undefined
    pub fn evaluate(&self, node: &Node) -> QueryValue {
        match node {
            Node::Constant(value) => value.clone(),

            Node::Field(path) => self.bindings.get(path).clone(),

            Node::Guard { expected, inner } => {
                let value = self.evaluate(inner);
                if value.value_type() == *expected {
                    value
                } else {
                    QueryValue::Undefined
                }
            }

            Node::Unary { op, operand } => op.apply(&self.evaluate(operand)),

            Node::Binary { op, left, right } => self.evaluate_binary(*op, left, right),

            Node::Call(call) => self.evaluate_call(call),
        }
    }

    fn evaluate_binary(&self, op: BinaryOperator, left: &Node, right: &Node) -> QueryValue {
        let left = self.evaluate(left);

        // Short-circuit: the right side cannot change the result
        match (op, &left) {
            (BinaryOperator::And, QueryValue::Bool(false)) => return QueryValue::Bool(false),
            (BinaryOperator::Or, QueryValue::Bool(true)) => return QueryValue::Bool(true),
            _ => {}
        }

        let right = self.evaluate(right);
        op.apply(&left, &right)
    }

    fn evaluate_call(&self, call: &CallNode) -> QueryValue {
        let args: Vec<QueryValue> = call.args.iter().map(|arg| self.evaluate(arg)).collect();

        if call.propagate_undefined && args.iter().any(|arg| !arg.is_defined()) {
            return QueryValue::Undefined;
        }

        (call.implementation)(&args)
    }
}

/// Evaluate a compiled condition for routing.
///
/// Only a strict `Bool(true)` is a match; Undefined, Null and any other
/// value are treated as "does not match".
pub fn evaluate(compiled: &CompiledExpression, bindings: &Bindings) -> bool {
    match compiled.evaluate_value(bindings) {
        QueryValue::Bool(b) => b,
        other => {
            trace!(
                "Condition '{}' produced non-boolean {}, treating as no match",
                compiled.source(),
                other
            );
            false
        }
    }
}

/// Shareable predicate over message bindings
pub type Predicate = Arc<dyn Fn(&Bindings) -> bool + Send + Sync + 'static>;
