//! Operator definitions for routing conditions.

use crate::query::value::{QueryValue, StaticType};
use std::cmp::Ordering;

/// Binary operators supported in conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Logical
    And,
    Or,
}

impl BinaryOperator {
    /// Get the output type of this operator given operand types.
    ///
    /// `None` means the combination can never produce a defined value.
    /// Dynamic and Null operands are accepted and left to run time.
    pub fn output_type(&self, left: StaticType, right: StaticType) -> Option<StaticType> {
        let deferred = |t: StaticType| t.is_dynamic() || t == StaticType::Null;

        match self {
            BinaryOperator::Add
            | BinaryOperator::Sub
            | BinaryOperator::Mul
            | BinaryOperator::Div
            | BinaryOperator::Mod => {
                let numeric = |t: StaticType| t == StaticType::Number || deferred(t);
                if numeric(left) && numeric(right) {
                    Some(StaticType::Number)
                } else {
                    None
                }
            }

            BinaryOperator::Eq
            | BinaryOperator::Ne
            | BinaryOperator::Lt
            | BinaryOperator::Le
            | BinaryOperator::Gt
            | BinaryOperator::Ge => {
                if left == right || deferred(left) || deferred(right) {
                    Some(StaticType::Bool)
                } else {
                    None
                }
            }

            BinaryOperator::And | BinaryOperator::Or => {
                let logical = |t: StaticType| t == StaticType::Bool || deferred(t);
                if logical(left) && logical(right) {
                    Some(StaticType::Bool)
                } else {
                    None
                }
            }
        }
    }

    /// Apply the operator to two evaluated operands.
    ///
    /// Never fails: anything that cannot produce a typed result is Undefined.
    /// `And`/`Or` short-circuiting lives in the evaluator; here both sides
    /// are already known.
    pub fn apply(&self, left: &QueryValue, right: &QueryValue) -> QueryValue {
        match self {
            BinaryOperator::Add => arithmetic(left, right, |a, b| Some(a + b)),
            BinaryOperator::Sub => arithmetic(left, right, |a, b| Some(a - b)),
            BinaryOperator::Mul => arithmetic(left, right, |a, b| Some(a * b)),
            BinaryOperator::Div => arithmetic(left, right, |a, b| (b != 0.0).then(|| a / b)),
            BinaryOperator::Mod => arithmetic(left, right, |a, b| (b != 0.0).then(|| a % b)),

            BinaryOperator::Eq => compare(left, right, |ord| ord == Ordering::Equal),
            BinaryOperator::Ne => compare(left, right, |ord| ord != Ordering::Equal),
            BinaryOperator::Lt => compare(left, right, |ord| ord == Ordering::Less),
            BinaryOperator::Le => compare(left, right, |ord| ord != Ordering::Greater),
            BinaryOperator::Gt => compare(left, right, |ord| ord == Ordering::Greater),
            BinaryOperator::Ge => compare(left, right, |ord| ord != Ordering::Less),

            BinaryOperator::And => match (left.as_bool(), right.as_bool()) {
                (Some(false), _) | (_, Some(false)) => QueryValue::Bool(false),
                (Some(true), Some(true)) => QueryValue::Bool(true),
                _ => QueryValue::Undefined,
            },
            BinaryOperator::Or => match (left.as_bool(), right.as_bool()) {
                (Some(true), _) | (_, Some(true)) => QueryValue::Bool(true),
                (Some(false), Some(false)) => QueryValue::Bool(false),
                _ => QueryValue::Undefined,
            },
        }
    }

    /// Get the display string for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::Eq => "=",
            BinaryOperator::Ne => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
            BinaryOperator::And => "AND",
            BinaryOperator::Or => "OR",
        }
    }
}

fn arithmetic<F>(left: &QueryValue, right: &QueryValue, op: F) -> QueryValue
where
    F: FnOnce(f64, f64) -> Option<f64>,
{
    match (left.as_number(), right.as_number()) {
        (Some(a), Some(b)) => op(a, b).map_or(QueryValue::Undefined, QueryValue::number),
        _ => QueryValue::Undefined,
    }
}

fn compare<F>(left: &QueryValue, right: &QueryValue, test: F) -> QueryValue
where
    F: FnOnce(Ordering) -> bool,
{
    match left.compare(right) {
        Some(ord) => QueryValue::Bool(test(ord)),
        None => QueryValue::Undefined,
    }
}

/// Unary operators supported in conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Not,
    Plus,
    Minus,
}

impl UnaryOperator {
    /// Get the output type of this operator given the operand type
    pub fn output_type(&self, operand: StaticType) -> Option<StaticType> {
        let deferred = operand.is_dynamic() || operand == StaticType::Null;
        match self {
            UnaryOperator::Not => {
                (operand == StaticType::Bool || deferred).then_some(StaticType::Bool)
            }
            UnaryOperator::Plus | UnaryOperator::Minus => {
                (operand == StaticType::Number || deferred).then_some(StaticType::Number)
            }
        }
    }

    pub fn apply(&self, operand: &QueryValue) -> QueryValue {
        match (self, operand) {
            (UnaryOperator::Not, QueryValue::Bool(b)) => QueryValue::Bool(!b),
            (UnaryOperator::Plus, QueryValue::Number(n)) => QueryValue::Number(*n),
            (UnaryOperator::Minus, QueryValue::Number(n)) => QueryValue::Number(-n),
            _ => QueryValue::Undefined,
        }
    }

    /// Get the display string for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOperator::Not => "NOT",
            UnaryOperator::Plus => "+",
            UnaryOperator::Minus => "-",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_operator_output_types() {
        // Arithmetic operators
        assert_eq!(
            BinaryOperator::Add.output_type(StaticType::Number, StaticType::Number),
            Some(StaticType::Number)
        );
        assert_eq!(
            BinaryOperator::Mod.output_type(StaticType::Dynamic, StaticType::Number),
            Some(StaticType::Number)
        );
        assert_eq!(
            BinaryOperator::Add.output_type(StaticType::Number, StaticType::String),
            None
        );

        // Comparison operators
        assert_eq!(
            BinaryOperator::Eq.output_type(StaticType::String, StaticType::String),
            Some(StaticType::Bool)
        );
        assert_eq!(
            BinaryOperator::Lt.output_type(StaticType::Dynamic, StaticType::Number),
            Some(StaticType::Bool)
        );
        assert_eq!(
            BinaryOperator::Eq.output_type(StaticType::Null, StaticType::String),
            Some(StaticType::Bool)
        );
        assert_eq!(
            BinaryOperator::Eq.output_type(StaticType::Number, StaticType::String),
            None
        );

        // Logical operators
        assert_eq!(
            BinaryOperator::And.output_type(StaticType::Bool, StaticType::Dynamic),
            Some(StaticType::Bool)
        );
        assert_eq!(
            BinaryOperator::Or.output_type(StaticType::Number, StaticType::Bool),
            None
        );
    }

    #[test]
    fn test_arithmetic_undefined_on_mismatch() {
        let two = QueryValue::from(2);
        let zero = QueryValue::from(0);
        let s = QueryValue::from("2");

        assert_eq!(BinaryOperator::Add.apply(&two, &two), QueryValue::Number(4.0));
        assert_eq!(BinaryOperator::Mod.apply(&QueryValue::from(7), &two), QueryValue::Number(1.0));
        assert_eq!(BinaryOperator::Div.apply(&two, &zero), QueryValue::Undefined);
        assert_eq!(BinaryOperator::Mod.apply(&two, &zero), QueryValue::Undefined);
        assert_eq!(BinaryOperator::Add.apply(&two, &s), QueryValue::Undefined);
        assert_eq!(
            BinaryOperator::Mul.apply(&QueryValue::Undefined, &two),
            QueryValue::Undefined
        );
    }

    #[test]
    fn test_comparison() {
        let red = QueryValue::from("red");
        assert_eq!(BinaryOperator::Eq.apply(&red, &red), QueryValue::Bool(true));
        assert_eq!(
            BinaryOperator::Ne.apply(&red, &QueryValue::from("blue")),
            QueryValue::Bool(true)
        );
        assert_eq!(
            BinaryOperator::Ge.apply(&QueryValue::from(3), &QueryValue::from(3)),
            QueryValue::Bool(true)
        );
        assert_eq!(
            BinaryOperator::Eq.apply(&red, &QueryValue::from(1)),
            QueryValue::Undefined
        );
        assert_eq!(
            BinaryOperator::Eq.apply(&QueryValue::Null, &QueryValue::Null),
            QueryValue::Undefined
        );
    }

    #[test]
    fn test_three_valued_logic() {
        let t = QueryValue::Bool(true);
        let f = QueryValue::Bool(false);
        let u = QueryValue::Undefined;

        assert_eq!(BinaryOperator::And.apply(&f, &u), f);
        assert_eq!(BinaryOperator::And.apply(&u, &f), f);
        assert_eq!(BinaryOperator::And.apply(&t, &u), u);
        assert_eq!(BinaryOperator::And.apply(&t, &t), t);

        assert_eq!(BinaryOperator::Or.apply(&t, &u), t);
        assert_eq!(BinaryOperator::Or.apply(&u, &t), t);
        assert_eq!(BinaryOperator::Or.apply(&f, &u), u);
        assert_eq!(BinaryOperator::Or.apply(&f, &f), f);
    }

    #[test]
    fn test_unary_operators() {
        assert_eq!(
            UnaryOperator::Not.apply(&QueryValue::Bool(true)),
            QueryValue::Bool(false)
        );
        assert_eq!(
            UnaryOperator::Not.apply(&QueryValue::Undefined),
            QueryValue::Undefined
        );
        assert_eq!(
            UnaryOperator::Minus.apply(&QueryValue::from(42)),
            QueryValue::Number(-42.0)
        );
        assert_eq!(
            UnaryOperator::Minus.apply(&QueryValue::from("42")),
            QueryValue::Undefined
        );
        assert_eq!(UnaryOperator::Not.output_type(StaticType::Number), None);
        assert_eq!(
            UnaryOperator::Minus.output_type(StaticType::Dynamic),
            Some(StaticType::Number)
        );
    }

    #[test]
    fn test_operator_display() {
        assert_eq!(BinaryOperator::Add.as_str(), "+");
        assert_eq!(BinaryOperator::Ne.as_str(), "!=");
        assert_eq!(BinaryOperator::And.as_str(), "AND");
        assert_eq!(UnaryOperator::Not.as_str(), "NOT");
    }
}
