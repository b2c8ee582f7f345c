//! Compilation of condition ASTs into executable expression trees.

use crate::condition::Parser;
use crate::query::builtin::{BuiltinFn, BuiltinRegistry};
use crate::query::error::{CompileError, CompileResult};
use crate::query::eval::{Evaluator, Predicate};
use crate::query::expr::Expression;
use crate::query::operator::{BinaryOperator, UnaryOperator};
use crate::query::value::{Bindings, QueryValue, StaticType, ValueType};
use log::debug;
use std::fmt;
use std::sync::Arc;

/// Deepest expression tree the compiler accepts; keeps evaluation recursion
/// bounded for trees built without the parser
pub const MAX_EXPRESSION_DEPTH: usize = 256;

/// Node of a compiled expression tree
#[derive(Debug, Clone)]
pub enum Node {
    Constant(QueryValue),

    /// Message field lookup
    Field(Arc<str>),

    /// Passes the inner value through only if it has the expected runtime
    /// type, otherwise yields Undefined
    Guard {
        expected: ValueType,
        inner: Box<Node>,
    },

    Unary {
        op: UnaryOperator,
        operand: Box<Node>,
    },

    Binary {
        op: BinaryOperator,
        left: Box<Node>,
        right: Box<Node>,
    },

    Call(CallNode),
}

/// Call to a resolved builtin overload
#[derive(Clone)]
pub struct CallNode {
    pub name: Arc<str>,
    pub implementation: BuiltinFn,
    pub args: Vec<Node>,
    /// Skip the implementation and yield Undefined if any argument is
    /// Undefined
    pub propagate_undefined: bool,
}

impl fmt::Debug for CallNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallNode")
            .field("name", &self.name)
            .field("args", &self.args)
            .field("propagate_undefined", &self.propagate_undefined)
            .finish()
    }
}

impl Node {
    fn is_constant(&self) -> bool {
        matches!(self, Node::Constant(_))
    }

    /// All direct operands are constants, so the node can be folded
    fn is_foldable(&self) -> bool {
        match self {
            Node::Constant(_) | Node::Field(_) => false,
            Node::Guard { inner, .. } => inner.is_constant(),
            Node::Unary { operand, .. } => operand.is_constant(),
            Node::Binary { left, right, .. } => left.is_constant() && right.is_constant(),
            Node::Call(call) => call.args.iter().all(Node::is_constant),
        }
    }
}

/// A routing condition compiled once and evaluated per message.
///
/// Immutable after compilation; share it across worker threads with `Arc`.
#[derive(Debug, Clone)]
pub struct CompiledExpression {
    source: String,
    root: Node,
    result_type: StaticType,
}

impl CompiledExpression {
    /// Condition text this expression was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Static type of the condition result
    pub fn result_type(&self) -> StaticType {
        self.result_type
    }

    /// Evaluate against one message and return the raw result
    pub fn evaluate_value(&self, bindings: &Bindings) -> QueryValue {
        Evaluator::new(bindings).evaluate(&self.root)
    }

    /// True only if the condition evaluates to `Bool(true)`
    pub fn matches(&self, bindings: &Bindings) -> bool {
        crate::query::eval::evaluate(self, bindings)
    }

    /// Turn the expression into a shareable predicate
    pub fn into_predicate(self) -> Predicate {
        Arc::new(move |bindings: &Bindings| self.matches(bindings))
    }
}

/// Compiles condition ASTs against a builtin registry
#[derive(Debug, Clone)]
pub struct Compiler {
    registry: Arc<BuiltinRegistry>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(BuiltinRegistry::standard())
    }
}

impl Compiler {
    pub fn new(registry: Arc<BuiltinRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &BuiltinRegistry {
        &self.registry
    }

    /// Compile a parsed condition
    pub fn compile(&self, expr: &Expression) -> CompileResult<CompiledExpression> {
        let (root, result_type) = self.compile_node(expr, 0)?;
        self.finish(root, result_type, expr.to_string())
    }

    /// Parse and compile condition text
    pub fn compile_condition(&self, condition: &str) -> CompileResult<CompiledExpression> {
        let expr = Parser::new(condition).parse()?;
        let (root, result_type) = self.compile_node(&expr, 0)?;
        self.finish(root, result_type, condition.trim().to_string())
    }

    fn finish(
        &self,
        root: Node,
        result_type: StaticType,
        source: String,
    ) -> CompileResult<CompiledExpression> {

        match result_type {
            StaticType::Bool | StaticType::Null | StaticType::Dynamic => {}
            actual => return Err(CompileError::NonBooleanCondition { actual }),
        }

        debug!("Compiled condition '{}' ({})", source, result_type);

        Ok(CompiledExpression {
            source,
            root,
            result_type,
        })
    }

    /// Compile a subexpression and infer its static type
    fn compile_node(&self, expr: &Expression, depth: usize) -> CompileResult<(Node, StaticType)> {
        if depth >= MAX_EXPRESSION_DEPTH {
            return Err(CompileError::NestingTooDeep {
                limit: MAX_EXPRESSION_DEPTH,
            });
        }
        let depth = depth + 1;

        match expr {
            Expression::Literal(value) => {
                Ok((Node::Constant(value.clone()), StaticType::of(value)))
            }

            Expression::Field(path) => Ok((Node::Field(Arc::from(path.as_str())), StaticType::Dynamic)),

            Expression::UnaryOp { op, operand } => {
                let (operand, operand_type) = self.compile_node(operand, depth)?;
                let output_type =
                    op.output_type(operand_type)
                        .ok_or_else(|| CompileError::InvalidOperandTypes {
                            operator: op.as_str().to_string(),
                            left: operand_type,
                            right: None,
                        })?;
                let node = Node::Unary {
                    op: *op,
                    operand: Box::new(operand),
                };
                Ok((fold(node), output_type))
            }

            Expression::BinaryOp { op, left, right } => {
                let (left, left_type) = self.compile_node(left, depth)?;
                let (right, right_type) = self.compile_node(right, depth)?;
                let output_type = op.output_type(left_type, right_type).ok_or_else(|| {
                    CompileError::InvalidOperandTypes {
                        operator: op.as_str().to_string(),
                        left: left_type,
                        right: Some(right_type),
                    }
                })?;
                let node = Node::Binary {
                    op: *op,
                    left: Box::new(left),
                    right: Box::new(right),
                };
                Ok((fold(node), output_type))
            }

            Expression::FunctionCall { name, args } => {
                let builtin =
                    self.registry
                        .get(name)
                        .ok_or_else(|| CompileError::UnknownFunction {
                            name: name.clone(),
                        })?;

                let args = args
                    .iter()
                    .map(|arg| self.compile_node(arg, depth))
                    .collect::<CompileResult<Vec<_>>>()?;
                let arg_types: Vec<StaticType> = args.iter().map(|(_, t)| *t).collect();

                let executor = builtin.resolve(&arg_types)?;
                let node = executor.compile(builtin.name(), args);
                Ok((fold(node), executor.signature.return_type))
            }
        }
    }
}

/// Evaluate nodes whose operands are all constants
fn fold(node: Node) -> Node {
    if node.is_foldable() {
        let empty = Bindings::new();
        Node::Constant(Evaluator::new(&empty).evaluate(&node))
    } else {
        node
    }
}

/// Compile a parsed condition with the standard builtin registry
pub fn compile(ast: &Expression) -> CompileResult<CompiledExpression> {
    Compiler::default().compile(ast)
}
