use crate::query::{Bindings, CompiledExpression};
use std::sync::Arc;

/// A named condition that forwards matching messages to an endpoint
#[derive(Debug, Clone)]
pub struct Route {
    pub name: String,
    pub condition: Arc<CompiledExpression>,
    pub endpoint: String,
}

impl Route {
    pub fn new(
        name: impl Into<String>,
        condition: CompiledExpression,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            condition: Arc::new(condition),
            endpoint: endpoint.into(),
        }
    }

    pub fn matches(&self, bindings: &Bindings) -> bool {
        self.condition.matches(bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Compiler;

    #[test]
    fn test_route_matches() {
        let condition = Compiler::default()
            .compile_condition("properties.level = 'critical'")
            .unwrap();
        let route = Route::new("alerts", condition, "alertQueue");

        assert_eq!(route.name, "alerts");
        assert_eq!(route.endpoint, "alertQueue");
        assert!(route.matches(&Bindings::new().with("properties.level", "critical")));
        assert!(!route.matches(&Bindings::new().with("properties.level", "info")));
        assert!(!route.matches(&Bindings::new()));
    }
}
