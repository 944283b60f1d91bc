use crate::context::{RequestContext, Scope};
use crate::model::AttributeValue;

/// External storage for session attributes.
pub trait SessionAttributeStore: Send + Sync {
    fn store(&self, ctx: &RequestContext, name: &str, value: AttributeValue);

    fn retrieve(&self, ctx: &RequestContext, name: &str) -> Option<AttributeValue>;

    fn remove(&self, ctx: &RequestContext, name: &str);
}

/// Stores attributes in the request's session scope, under
/// `prefix + name`.
///
/// Requests without a session read nothing and drop writes.
#[derive(Debug, Clone, Default)]
pub struct DefaultSessionAttributeStore {
    prefix: String,
}

impl DefaultSessionAttributeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Session key for `name`.
    #[must_use]
    pub fn attribute_key(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }
}

impl SessionAttributeStore for DefaultSessionAttributeStore {
    fn store(&self, ctx: &RequestContext, name: &str, value: AttributeValue) {
        ctx.set_attribute(&self.attribute_key(name), value, Scope::Session);
    }

    fn retrieve(&self, ctx: &RequestContext, name: &str) -> Option<AttributeValue> {
        ctx.get_attribute(&self.attribute_key(name), Scope::Session)
    }

    fn remove(&self, ctx: &RequestContext, name: &str) {
        ctx.remove_attribute(&self.attribute_key(name), Scope::Session);
    }
}
