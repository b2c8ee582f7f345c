//! Math builtins.

use super::{ArgType, BuiltinRegistry, Signature};
use crate::query::value::{QueryValue, StaticType};

pub(crate) fn register(registry: &mut BuiltinRegistry) {
    let unary = || Signature::new(&[ArgType::Number], StaticType::Number);

    registry
        .register("abs", unary(), abs)
        .register("ceiling", unary(), ceiling)
        .register("exp", unary(), exp)
        .register("floor", unary(), floor)
        .register("sign", unary(), sign)
        .register("sqrt", unary(), sqrt)
        .register("square", unary(), square)
        .register(
            "power",
            Signature::new(&[ArgType::Number, ArgType::Number], StaticType::Number),
            power,
        );
}

fn unary_math(args: &[QueryValue], f: impl FnOnce(f64) -> f64) -> QueryValue {
    match args {
        [QueryValue::Number(n)] => QueryValue::number(f(*n)),
        _ => QueryValue::Undefined,
    }
}

pub fn abs(args: &[QueryValue]) -> QueryValue {
    unary_math(args, f64::abs)
}

pub fn ceiling(args: &[QueryValue]) -> QueryValue {
    unary_math(args, f64::ceil)
}

pub fn exp(args: &[QueryValue]) -> QueryValue {
    unary_math(args, f64::exp)
}

pub fn floor(args: &[QueryValue]) -> QueryValue {
    unary_math(args, f64::floor)
}

pub fn sign(args: &[QueryValue]) -> QueryValue {
    unary_math(args, |n| {
        if n > 0.0 {
            1.0
        } else if n < 0.0 {
            -1.0
        } else {
            0.0
        }
    })
}

pub fn sqrt(args: &[QueryValue]) -> QueryValue {
    unary_math(args, f64::sqrt)
}

pub fn square(args: &[QueryValue]) -> QueryValue {
    unary_math(args, |n| n * n)
}

pub fn power(args: &[QueryValue]) -> QueryValue {
    match args {
        [QueryValue::Number(base), QueryValue::Number(exponent)] => {
            QueryValue::number(base.powf(*exponent))
        }
        _ => QueryValue::Undefined,
    }
}
