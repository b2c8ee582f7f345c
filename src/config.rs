//! Route configuration files.

use crate::query::Compiler;
use crate::routing::{RouteError, Router};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    pub name: String,
    pub condition: String,
    pub endpoint: String,
}

/// Routing rules as stored on disk, e.g.
/// `{"routes": [{"name": "alerts", "condition": "...", "endpoint": "..."}]}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

impl RouterConfig {
    /// Load a configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read route config {}", path.display()))?;
        Self::from_json(&text)
            .with_context(|| format!("Failed to parse route config {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Compile every route into a fresh router; stops at the first invalid
    /// condition
    pub fn build_router(&self, compiler: Compiler) -> Result<Router, RouteError> {
        let router = Router::new(compiler);
        for route in &self.routes {
            router.add_route(&route.name, &route.condition, &route.endpoint)?;
        }
        log::info!("Loaded {} routes", router.len());
        Ok(router)
    }
}
