pub mod condition;
pub mod config;
pub mod query;
pub mod routing;

pub use condition::{ParseError, Parser};
pub use config::{RouteConfig, RouterConfig};
pub use query::{
    compile, evaluate, BuiltinRegistry, Bindings, CompileError, CompiledExpression, Compiler,
    Expression, QueryValue, Signature,
};
pub use routing::{Message, Route, RouteError, Router};
