//! Builtin function registry and overload resolution.
//!
//! Every builtin name maps to one or more executors, each with an explicit
//! [`Signature`] and a plain runtime implementation. The compiler resolves a
//! call to a single executor once; evaluation then calls the implementation
//! through a function pointer.

pub mod math;
pub mod string;
pub mod type_check;

use crate::query::compiler::{CallNode, Node};
use crate::query::error::{CompileError, CompileResult};
use crate::query::value::{QueryValue, StaticType, ValueType};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Runtime implementation of a builtin overload.
///
/// Implementations must check the type tag of every argument and return
/// Undefined for anything they cannot handle.
pub type BuiltinFn = fn(&[QueryValue]) -> QueryValue;

lazy_static! {
    static ref STANDARD_REGISTRY: Arc<BuiltinRegistry> =
        Arc::new(BuiltinRegistry::with_standard_library());
}

/// Parameter type in a builtin signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgType {
    Bool,
    Number,
    String,
    DateTime,
    Any,
}

impl ArgType {
    fn value_type(&self) -> Option<ValueType> {
        match self {
            ArgType::Bool => Some(ValueType::Bool),
            ArgType::Number => Some(ValueType::Number),
            ArgType::String => Some(ValueType::String),
            ArgType::DateTime => Some(ValueType::DateTime),
            ArgType::Any => None,
        }
    }

    /// Cost of passing an argument of static type `actual`, lower is better.
    ///
    /// Dynamic and Null arguments are checked at run time, where a mismatch
    /// yields Undefined.
    fn cost(&self, actual: StaticType, query_value_supported: bool) -> Option<u32> {
        match self.value_type() {
            None => Some(3),
            Some(expected) if actual.value_type() == Some(expected) => Some(0),
            Some(_) if is_runtime_checked(actual) => {
                Some(if query_value_supported { 1 } else { 2 })
            }
            Some(_) => None,
        }
    }
}

fn is_runtime_checked(actual: StaticType) -> bool {
    actual.is_dynamic() || actual == StaticType::Null
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value_type() {
            Some(value_type) => f.write_str(value_type.as_str()),
            None => f.write_str("Any"),
        }
    }
}

/// Accepted arguments and result of one builtin overload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub input_args: Vec<ArgType>,
    /// The last input argument may repeat
    pub variadic: bool,
    pub return_type: StaticType,
    /// The implementation takes raw message values and does its own type
    /// checks; otherwise the compiler guards dynamic arguments.
    pub is_query_value_supported: bool,
}

impl Signature {
    pub fn new(input_args: &[ArgType], return_type: StaticType) -> Self {
        Self {
            input_args: input_args.to_vec(),
            variadic: false,
            return_type,
            is_query_value_supported: false,
        }
    }

    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    pub fn query_value_supported(mut self) -> Self {
        self.is_query_value_supported = true;
        self
    }

    pub fn accepts_arity(&self, arity: usize) -> bool {
        if self.variadic {
            arity >= self.input_args.len()
        } else {
            arity == self.input_args.len()
        }
    }

    /// Expected type of the argument at `index`, following a variadic tail
    pub fn arg_type(&self, index: usize) -> Option<ArgType> {
        match self.input_args.get(index) {
            Some(arg) => Some(*arg),
            None if self.variadic => self.input_args.last().copied(),
            None => None,
        }
    }

    /// Total match cost for the given argument types, `None` if incompatible
    fn match_cost(&self, arg_types: &[StaticType]) -> Option<u32> {
        if !self.accepts_arity(arg_types.len()) {
            return None;
        }
        arg_types.iter().enumerate().try_fold(0, |total, (i, actual)| {
            let cost = self
                .arg_type(i)?
                .cost(*actual, self.is_query_value_supported)?;
            Some(total + cost)
        })
    }

    fn first_mismatch(&self, arg_types: &[StaticType]) -> Option<usize> {
        arg_types.iter().enumerate().position(|(i, actual)| {
            self.arg_type(i)
                .and_then(|expected| expected.cost(*actual, self.is_query_value_supported))
                .is_none()
        })
    }

    fn arity_text(&self) -> String {
        if self.variadic {
            format!("at least {}", self.input_args.len())
        } else {
            self.input_args.len().to_string()
        }
    }

    fn describe(&self, name: &str) -> String {
        let mut args: Vec<String> = self.input_args.iter().map(|a| a.to_string()).collect();
        if self.variadic {
            if let Some(last) = self.input_args.last() {
                args.push(format!("{}...", last));
            }
        }
        format!("{}({})", name, args.join(", "))
    }
}

/// One typed overload of a builtin
#[derive(Clone)]
pub struct BuiltinExecutor {
    pub signature: Signature,
    pub implementation: BuiltinFn,
}

impl BuiltinExecutor {
    /// Build the compiled call node for this overload.
    ///
    /// Dynamic arguments are wrapped in a type guard unless the
    /// implementation accepts raw query values.
    pub fn compile(&self, name: &str, args: Vec<(Node, StaticType)>) -> Node {
        let guarded = !self.signature.is_query_value_supported;
        let args = args
            .into_iter()
            .enumerate()
            .map(|(i, (node, static_type))| {
                let expected = self
                    .signature
                    .arg_type(i)
                    .and_then(|arg_type| arg_type.value_type());
                match expected {
                    Some(expected) if guarded && is_runtime_checked(static_type) => Node::Guard {
                        expected,
                        inner: Box::new(node),
                    },
                    _ => node,
                }
            })
            .collect();

        Node::Call(CallNode {
            name: Arc::from(name),
            implementation: self.implementation,
            args,
            propagate_undefined: guarded,
        })
    }
}

impl fmt::Debug for BuiltinExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinExecutor")
            .field("signature", &self.signature)
            .finish()
    }
}

/// A named builtin with all of its overloads
#[derive(Debug, Clone)]
pub struct Builtin {
    name: String,
    executors: Vec<BuiltinExecutor>,
}

impl Builtin {
    fn new(name: String) -> Self {
        Self {
            name,
            executors: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn executors(&self) -> &[BuiltinExecutor] {
        &self.executors
    }

    /// Pick the overload for a call with the given argument types.
    ///
    /// The cheapest match wins; ties go to the overload registered first.
    pub fn resolve(&self, arg_types: &[StaticType]) -> CompileResult<&BuiltinExecutor> {
        let by_arity: Vec<&BuiltinExecutor> = self
            .executors
            .iter()
            .filter(|e| e.signature.accepts_arity(arg_types.len()))
            .collect();

        if by_arity.is_empty() {
            return Err(CompileError::ArgumentCount {
                function: self.name.clone(),
                expected: self.expected_arities(),
                actual: arg_types.len(),
            });
        }

        let mut best: Option<(u32, &BuiltinExecutor)> = None;
        for executor in by_arity.iter().copied() {
            if let Some(cost) = executor.signature.match_cost(arg_types) {
                if best.map_or(true, |(best_cost, _)| cost < best_cost) {
                    best = Some((cost, executor));
                }
            }
        }

        match best {
            Some((_, executor)) => Ok(executor),
            None => {
                let argument = by_arity[0]
                    .signature
                    .first_mismatch(arg_types)
                    .unwrap_or(0);
                Err(CompileError::NoMatchingOverload {
                    function: self.name.clone(),
                    argument: argument + 1,
                    actual: arg_types.get(argument).copied().unwrap_or(StaticType::Dynamic),
                    candidates: self.candidates(),
                })
            }
        }
    }

    fn expected_arities(&self) -> String {
        let mut arities: Vec<String> = Vec::new();
        for executor in &self.executors {
            let text = executor.signature.arity_text();
            if !arities.contains(&text) {
                arities.push(text);
            }
        }
        arities.join(" or ")
    }

    fn candidates(&self) -> String {
        self.executors
            .iter()
            .map(|e| e.signature.describe(&self.name))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Builtins grouped by name.
///
/// Populated at start-up and shared read-only afterwards, so lookups need no
/// locking.
#[derive(Debug, Clone, Default)]
pub struct BuiltinRegistry {
    builtins: HashMap<String, Builtin>,
}

impl BuiltinRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the standard routing-query library
    pub fn with_standard_library() -> Self {
        let mut registry = Self::new();
        math::register(&mut registry);
        type_check::register(&mut registry);
        string::register(&mut registry);
        registry
    }

    /// Shared process-wide standard registry
    pub fn standard() -> Arc<BuiltinRegistry> {
        Arc::clone(&STANDARD_REGISTRY)
    }

    /// Add an overload for `name`; names are case-insensitive
    pub fn register(
        &mut self,
        name: &str,
        signature: Signature,
        implementation: BuiltinFn,
    ) -> &mut Self {
        let key = name.to_ascii_lowercase();
        self.builtins
            .entry(key.clone())
            .or_insert_with(|| Builtin::new(key))
            .executors
            .push(BuiltinExecutor {
                signature,
                implementation,
            });
        self
    }

    pub fn get(&self, name: &str) -> Option<&Builtin> {
        self.builtins.get(&name.to_ascii_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.builtins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builtins.is_empty()
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.builtins.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolve a call by name and argument types
    pub fn resolve(&self, name: &str, arg_types: &[StaticType]) -> CompileResult<&BuiltinExecutor> {
        self.get(name)
            .ok_or_else(|| CompileError::UnknownFunction {
                name: name.to_string(),
            })?
            .resolve(arg_types)
    }
}
