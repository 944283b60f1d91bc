use super::store::SessionAttributeStore;
use crate::context::RequestContext;
use crate::handler::HandlerType;
use crate::model::{AttributeValue, ModelMap};
use dashmap::DashSet;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Session attribute bookkeeping for one handler type.
///
/// Declared names and types are fixed at construction. Every name that
/// passes [`is_session_attribute`](Self::is_session_attribute) is added to
/// the known-names set, which only grows. Retrieval and cleanup work off
/// known names, so attributes declared by type are covered once seen.
pub struct SessionAttributesHandler {
    handler_type: Arc<str>,
    attribute_names: HashSet<String>,
    attribute_types: HashSet<String>,
    known_names: DashSet<String>,
    store: Arc<dyn SessionAttributeStore>,
}

impl SessionAttributesHandler {
    #[must_use]
    pub fn new(handler_type: &HandlerType, store: Arc<dyn SessionAttributeStore>) -> Self {
        let attribute_names: HashSet<String> =
            handler_type.session_attribute_names().iter().cloned().collect();
        let known_names = attribute_names.iter().cloned().collect();
        Self {
            handler_type: Arc::from(handler_type.name()),
            attribute_names,
            attribute_types: handler_type.declared_session_attribute_types().iter().cloned().collect(),
            known_names,
            store,
        }
    }

    /// True when the handler type declares any session attribute.
    #[must_use]
    pub fn has_session_attributes(&self) -> bool {
        !self.attribute_names.is_empty() || !self.attribute_types.is_empty()
    }

    /// True when `name` or `type_name` is declared. A match is remembered as
    /// a known name.
    pub fn is_session_attribute(&self, name: &str, type_name: Option<&str>) -> bool {
        let declared = self.attribute_names.contains(name)
            || type_name.is_some_and(|t| self.attribute_types.contains(t));
        if declared && !self.known_names.contains(name) {
            debug!(handler_type = %self.handler_type, attribute = %name, "Session attribute name learned");
            self.known_names.insert(name.to_string());
        }
        declared
    }

    /// Known names, sorted.
    #[must_use]
    pub fn known_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.known_names.iter().map(|n| n.key().clone()).collect();
        names.sort();
        names
    }

    /// Every known attribute present in the store; absent ones are skipped.
    #[must_use]
    pub fn retrieve_attributes(&self, ctx: &RequestContext) -> ModelMap {
        let mut attributes = ModelMap::new();
        for name in self.known_names() {
            if let Some(value) = self.store.retrieve(ctx, &name) {
                attributes.add_attribute(name, value);
            }
        }
        attributes
    }

    /// Write every session attribute in `model` through to the store.
    pub fn store_attributes(&self, ctx: &RequestContext, model: &ModelMap) {
        for (name, value) in model {
            if self.is_session_attribute(name, value.type_name()) {
                self.store.store(ctx, name, value.clone());
            }
        }
    }

    /// Remove every known name from the store.
    pub fn cleanup_attributes(&self, ctx: &RequestContext) {
        for name in self.known_names() {
            self.store.remove(ctx, &name);
        }
        debug!(handler_type = %self.handler_type, "Session attributes cleaned up");
    }

    #[must_use]
    pub fn retrieve_attribute(&self, ctx: &RequestContext, name: &str) -> Option<AttributeValue> {
        self.store.retrieve(ctx, name)
    }
}

impl fmt::Debug for SessionAttributesHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionAttributesHandler")
            .field("handler_type", &self.handler_type)
            .field("attribute_names", &self.attribute_names)
            .field("attribute_types", &self.attribute_types)
            .field("known_names", &self.known_names.len())
            .finish()
    }
}
