//! String builtins.
//!
//! Case mapping uses Unicode default rules, which do not depend on the
//! process locale, so routing decisions are identical on every gateway.
//! Positions and lengths count chars, not bytes.

use super::{ArgType, BuiltinRegistry, Signature};
use crate::query::value::{QueryValue, StaticType};

pub(crate) fn register(registry: &mut BuiltinRegistry) {
    use ArgType::{Number, String};

    registry
        .register(
            "concat",
            Signature::new(&[String, String], StaticType::String).variadic(),
            concat,
        )
        .register(
            "length",
            Signature::new(&[String], StaticType::Number),
            length,
        )
        .register(
            "lower",
            Signature::new(&[String], StaticType::String).query_value_supported(),
            lower,
        )
        .register(
            "upper",
            Signature::new(&[String], StaticType::String).query_value_supported(),
            upper,
        )
        .register(
            "substring",
            Signature::new(&[String, Number], StaticType::String),
            substring,
        )
        .register(
            "substring",
            Signature::new(&[String, Number, Number], StaticType::String),
            substring,
        )
        .register(
            "index_of",
            Signature::new(&[String, String], StaticType::Number),
            index_of,
        )
        .register(
            "starts_with",
            Signature::new(&[String, String], StaticType::Bool),
            starts_with,
        )
        .register(
            "ends_with",
            Signature::new(&[String, String], StaticType::Bool),
            ends_with,
        )
        .register(
            "contains",
            Signature::new(&[String, String], StaticType::Bool),
            contains,
        );
}

/// Lower-case a string value; anything that is not a string is Undefined.
///
/// Null payloads never reach here as strings: the binding layer maps them
/// to [`QueryValue::Null`], which fails the type check like any other
/// non-string.
pub fn lower(args: &[QueryValue]) -> QueryValue {
    match args {
        [QueryValue::String(s)] => QueryValue::from(s.to_lowercase()),
        _ => QueryValue::Undefined,
    }
}

pub fn upper(args: &[QueryValue]) -> QueryValue {
    match args {
        [QueryValue::String(s)] => QueryValue::from(s.to_uppercase()),
        _ => QueryValue::Undefined,
    }
}

pub fn length(args: &[QueryValue]) -> QueryValue {
    match args {
        [QueryValue::String(s)] => QueryValue::Number(s.chars().count() as f64),
        _ => QueryValue::Undefined,
    }
}

pub fn concat(args: &[QueryValue]) -> QueryValue {
    let mut result = String::new();
    for arg in args {
        match arg {
            QueryValue::String(s) => result.push_str(s),
            _ => return QueryValue::Undefined,
        }
    }
    QueryValue::from(result)
}

/// `substring(s, start)` or `substring(s, start, length)`.
///
/// Negative, fractional or out-of-range positions are Undefined.
pub fn substring(args: &[QueryValue]) -> QueryValue {
    let (s, start, len) = match args {
        [QueryValue::String(s), QueryValue::Number(start)] => (s, *start, None),
        [QueryValue::String(s), QueryValue::Number(start), QueryValue::Number(len)] => {
            (s, *start, Some(*len))
        }
        _ => return QueryValue::Undefined,
    };

    let char_count = s.chars().count();
    let start = match to_index(start) {
        Some(start) if start <= char_count => start,
        _ => return QueryValue::Undefined,
    };
    let len = match len {
        None => char_count - start,
        Some(len) => match to_index(len) {
            Some(len) if start + len <= char_count => len,
            _ => return QueryValue::Undefined,
        },
    };

    QueryValue::from(s.chars().skip(start).take(len).collect::<String>())
}

/// Char position of the first occurrence, or -1
pub fn index_of(args: &[QueryValue]) -> QueryValue {
    match args {
        [QueryValue::String(haystack), QueryValue::String(needle)] => {
            let position = haystack
                .find(&**needle)
                .map_or(-1.0, |byte| haystack[..byte].chars().count() as f64);
            QueryValue::Number(position)
        }
        _ => QueryValue::Undefined,
    }
}

pub fn starts_with(args: &[QueryValue]) -> QueryValue {
    string_test(args, |s, prefix| s.starts_with(prefix))
}

pub fn ends_with(args: &[QueryValue]) -> QueryValue {
    string_test(args, |s, suffix| s.ends_with(suffix))
}

pub fn contains(args: &[QueryValue]) -> QueryValue {
    string_test(args, |s, part| s.contains(part))
}

fn string_test(args: &[QueryValue], test: impl FnOnce(&str, &str) -> bool) -> QueryValue {
    match args {
        [QueryValue::String(a), QueryValue::String(b)] => QueryValue::Bool(test(&**a, &**b)),
        _ => QueryValue::Undefined,
    }
}

fn to_index(n: f64) -> Option<usize> {
    (n >= 0.0 && n.fract() == 0.0 && n <= u32::MAX as f64).then_some(n as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(value: &str) -> QueryValue {
        QueryValue::from(value)
    }

    fn n(value: f64) -> QueryValue {
        QueryValue::Number(value)
    }

    #[test]
    fn test_lower() {
        assert_eq!(lower(&[s("RED")]), s("red"));
        assert_eq!(lower(&[s("MiXeD 123")]), s("mixed 123"));
        assert_eq!(lower(&[s("")]), s(""));
    }

    #[test]
    fn test_lower_is_locale_independent() {
        assert_eq!(lower(&[s("TITLE")]), s("title"));
        assert_eq!(lower(&[s("ÄÖÜ")]), s("äöü"));
        assert_eq!(lower(&[s("\u{130}")]), s("i\u{307}"));
    }

    #[test]
    fn test_lower_non_string_is_undefined() {
        assert_eq!(lower(&[n(42.0)]), QueryValue::Undefined);
        assert_eq!(lower(&[QueryValue::Bool(true)]), QueryValue::Undefined);
        assert_eq!(lower(&[QueryValue::Null]), QueryValue::Undefined);
        assert_eq!(lower(&[QueryValue::Undefined]), QueryValue::Undefined);
        assert_eq!(lower(&[]), QueryValue::Undefined);
    }

    #[test]
    fn test_upper() {
        assert_eq!(upper(&[s("red")]), s("RED"));
        assert_eq!(upper(&[s("straße")]), s("STRASSE"));
        assert_eq!(upper(&[n(1.0)]), QueryValue::Undefined);
    }

    #[test]
    fn test_length_counts_chars() {
        assert_eq!(length(&[s("héllo")]), n(5.0));
        assert_eq!(length(&[s("")]), n(0.0));
        assert_eq!(length(&[QueryValue::Null]), QueryValue::Undefined);
    }

    #[test]
    fn test_concat() {
        assert_eq!(concat(&[s("a"), s("b"), s("c")]), s("abc"));
        assert_eq!(concat(&[s("a"), n(1.0)]), QueryValue::Undefined);
        assert_eq!(concat(&[s("a"), QueryValue::Undefined]), QueryValue::Undefined);
    }

    #[test]
    fn test_substring() {
        assert_eq!(substring(&[s("temperature"), n(4.0)]), s("erature"));
        assert_eq!(substring(&[s("temperature"), n(0.0), n(4.0)]), s("temp"));
        assert_eq!(substring(&[s("héllo"), n(1.0), n(3.0)]), s("éll"));
        assert_eq!(substring(&[s("abc"), n(3.0)]), s(""));
    }

    #[test]
    fn test_substring_out_of_range_is_undefined() {
        assert_eq!(substring(&[s("abc"), n(4.0)]), QueryValue::Undefined);
        assert_eq!(substring(&[s("abc"), n(-1.0)]), QueryValue::Undefined);
        assert_eq!(substring(&[s("abc"), n(1.5)]), QueryValue::Undefined);
        assert_eq!(substring(&[s("abc"), n(1.0), n(3.0)]), QueryValue::Undefined);
    }

    #[test]
    fn test_index_of() {
        assert_eq!(index_of(&[s("héllo"), s("llo")]), n(2.0));
        assert_eq!(index_of(&[s("abc"), s("z")]), n(-1.0));
        assert_eq!(index_of(&[s("abc"), n(1.0)]), QueryValue::Undefined);
    }

    #[test]
    fn test_string_predicates() {
        assert_eq!(starts_with(&[s("sensor-1"), s("sensor")]), QueryValue::Bool(true));
        assert_eq!(ends_with(&[s("sensor-1"), s("-2")]), QueryValue::Bool(false));
        assert_eq!(contains(&[s("sensor-1"), s("or-")]), QueryValue::Bool(true));
        assert_eq!(contains(&[QueryValue::Null, s("x")]), QueryValue::Undefined);
    }
}
