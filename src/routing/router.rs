use crate::query::{Bindings, CompileError, Compiler};
use crate::routing::route::Route;
use dashmap::DashMap;
use log::{debug, info};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while registering routes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RouteError {
    #[error("Invalid condition for route '{route}': {source}")]
    InvalidCondition {
        route: String,
        #[source]
        source: CompileError,
    },

    #[error("Route name must not be empty")]
    EmptyName,
}

/// Route table shared between pipeline workers.
///
/// Cloning is cheap and every clone sees the same routes, so rules can be
/// reloaded on one handle while other threads keep routing.
#[derive(Debug, Clone)]
pub struct Router {
    inner: Arc<RouterInner>,
}

#[derive(Debug)]
struct RouterInner {
    compiler: Compiler,
    routes: DashMap<String, Route>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new(Compiler::default())
    }
}

impl Router {
    pub fn new(compiler: Compiler) -> Self {
        Self {
            inner: Arc::new(RouterInner {
                compiler,
                routes: DashMap::new(),
            }),
        }
    }

    /// Compile a condition and install it under `name`, replacing any route
    /// with the same name
    pub fn add_route(
        &self,
        name: impl Into<String>,
        condition: &str,
        endpoint: impl Into<String>,
    ) -> Result<(), RouteError> {
        let name = name.into();
        if name.is_empty() {
            return Err(RouteError::EmptyName);
        }

        let compiled = self
            .inner
            .compiler
            .compile_condition(condition)
            .map_err(|source| RouteError::InvalidCondition {
                route: name.clone(),
                source,
            })?;

        let route = Route::new(name.clone(), compiled, endpoint);
        debug!("Installing route '{}' -> {}", route.name, route.endpoint);

        if self.inner.routes.insert(name.clone(), route).is_some() {
            info!("Replaced route '{}'", name);
        }

        Ok(())
    }

    /// Remove a route, returning it if it existed
    pub fn remove_route(&self, name: &str) -> Option<Route> {
        let removed = self.inner.routes.remove(name).map(|(_, route)| route);
        if removed.is_some() {
            debug!("Removed route '{}'", name);
        }
        removed
    }

    pub fn get(&self, name: &str) -> Option<Route> {
        self.inner.routes.get(name).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.inner.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.routes.is_empty()
    }

    /// Names of all installed routes, sorted
    pub fn route_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .routes
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    /// Routes whose condition matches, ordered by route name
    pub fn matching_routes(&self, bindings: &Bindings) -> Vec<Route> {
        let mut matched: Vec<Route> = self
            .inner
            .routes
            .iter()
            .filter(|entry| entry.value().matches(bindings))
            .map(|entry| entry.value().clone())
            .collect();
        matched.sort_by(|a, b| a.name.cmp(&b.name));
        matched
    }

    /// Endpoints a message is delivered to: one entry per endpoint, in the
    /// order of the first matching route name
    pub fn route(&self, bindings: &Bindings) -> Vec<String> {
        let mut endpoints: Vec<String> = Vec::new();
        for route in self.matching_routes(bindings) {
            if !endpoints.contains(&route.endpoint) {
                endpoints.push(route.endpoint);
            }
        }
        endpoints
    }
}
