//! Type-checking and conversion builtins.
//!
//! These take any value, including Undefined, so they never return
//! Undefined themselves (except `as_number` on unconvertible input).

use super::{ArgType, BuiltinRegistry, Signature};
use crate::query::value::{QueryValue, StaticType, ValueType};

pub(crate) fn register(registry: &mut BuiltinRegistry) {
    let predicate = || Signature::new(&[ArgType::Any], StaticType::Bool).query_value_supported();

    registry
        .register(
            "as_number",
            Signature::new(&[ArgType::Any], StaticType::Number).query_value_supported(),
            as_number,
        )
        .register("is_bool", predicate(), is_bool)
        .register("is_defined", predicate(), is_defined)
        .register("is_null", predicate(), is_null)
        .register("is_number", predicate(), is_number)
        .register("is_string", predicate(), is_string);
}

fn has_type(args: &[QueryValue], value_type: ValueType) -> QueryValue {
    match args {
        [value] => QueryValue::Bool(value.value_type() == value_type),
        _ => QueryValue::Undefined,
    }
}

pub fn as_number(args: &[QueryValue]) -> QueryValue {
    match args {
        [QueryValue::Number(n)] => QueryValue::Number(*n),
        [QueryValue::String(s)] => s
            .trim()
            .parse::<f64>()
            .map_or(QueryValue::Undefined, QueryValue::number),
        _ => QueryValue::Undefined,
    }
}

pub fn is_bool(args: &[QueryValue]) -> QueryValue {
    has_type(args, ValueType::Bool)
}

pub fn is_defined(args: &[QueryValue]) -> QueryValue {
    match args {
        [value] => QueryValue::Bool(value.is_defined()),
        _ => QueryValue::Undefined,
    }
}

pub fn is_null(args: &[QueryValue]) -> QueryValue {
    has_type(args, ValueType::Null)
}

pub fn is_number(args: &[QueryValue]) -> QueryValue {
    has_type(args, ValueType::Number)
}

pub fn is_string(args: &[QueryValue]) -> QueryValue {
    has_type(args, ValueType::String)
}
