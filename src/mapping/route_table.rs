use super::criteria::RequestCriteria;
use super::registry::HandlerRegistry;
use crate::handler::HandlerMethod;
use anyhow::{anyhow, Context, Result};
use http::Method;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Resolves a handler id from a route table to a live handler.
pub trait HandlerProvider: Send + Sync {
    fn resolve(&self, handler_id: &str) -> Option<Arc<HandlerMethod>>;
}

impl HandlerProvider for HashMap<String, Arc<HandlerMethod>> {
    fn resolve(&self, handler_id: &str) -> Option<Arc<HandlerMethod>> {
        self.get(handler_id).map(Arc::clone)
    }
}

/// One route entry.
///
/// ```yaml
/// - handler: WidgetController#show
///   paths: ["/widgets/{id}"]
///   methods: [GET]
///   params: ["!preview"]
///   headers: []
///   produces: [text/html]
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RouteEntry {
    pub handler: String,
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub produces: Vec<String>,
}

impl RouteEntry {
    /// Build the criteria, nesting paths under `base_path`.
    pub fn criteria(&self, base_path: Option<&str>) -> Result<RequestCriteria> {
        let methods = self
            .methods
            .iter()
            .map(|m| {
                Method::from_bytes(m.trim().to_ascii_uppercase().as_bytes())
                    .map_err(|_| anyhow!("invalid HTTP method '{m}'"))
            })
            .collect::<Result<Vec<_>>>()?;
        let mut builder = RequestCriteria::builder()
            .paths(self.paths.iter().cloned())
            .methods(methods);
        for param in &self.params {
            builder = builder.param(param.clone());
        }
        for header in &self.headers {
            builder = builder.header(header.clone());
        }
        for media_type in &self.produces {
            builder = builder.produces(media_type.clone());
        }
        let criteria = builder
            .build()
            .with_context(|| format!("invalid route for handler '{}'", self.handler))?;
        match base_path.filter(|b| !b.is_empty() && *b != "/") {
            Some(base) => Ok(criteria.with_base_path(base)?),
            None => Ok(criteria),
        }
    }
}

/// A YAML route table: optional base path plus route entries.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct RouteTable {
    #[serde(default)]
    pub base_path: Option<String>,
    #[serde(default)]
    pub default_handler: Option<String>,
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Bind every entry through `provider` and register it.
    ///
    /// Returns the number of registered routes. An unknown handler id or a
    /// registration error aborts the load.
    pub fn register_into(
        &self,
        registry: &mut HandlerRegistry,
        provider: &dyn HandlerProvider,
    ) -> Result<usize> {
        for entry in &self.routes {
            let handler = provider
                .resolve(&entry.handler)
                .ok_or_else(|| anyhow!("no handler registered for id '{}'", entry.handler))?;
            let criteria = entry.criteria(self.base_path.as_deref())?;
            registry
                .register(criteria, handler)
                .with_context(|| format!("failed to register handler '{}'", entry.handler))?;
        }
        if let Some(id) = &self.default_handler {
            let handler = provider
                .resolve(id)
                .ok_or_else(|| anyhow!("no handler registered for default handler id '{id}'"))?;
            registry.set_default_handler(handler);
        }

        // RT5: Route table loaded
        info!(
            routes_count = self.routes.len(),
            base_path = ?self.base_path,
            "Route table registered"
        );
        Ok(self.routes.len())
    }
}

/// Load a YAML route table from disk.
pub fn load_route_table(path: impl AsRef<Path>) -> Result<RouteTable> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read route table {}", path.display()))?;
    RouteTable::from_yaml_str(&content)
        .with_context(|| format!("failed to parse route table {}", path.display()))
}
