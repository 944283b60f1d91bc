use crate::model::AttributeValue;
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::collections::HashMap;
use std::fmt;

/// Callback run when a scoped attribute is destroyed.
pub type DestructionCallback = Box<dyn FnOnce() + Send + 'static>;

/// The three attribute scopes a request context exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Request,
    Session,
    /// Shared across the sessions of one user; falls back to the session.
    GlobalSession,
}

/// Name -> value bag with per-attribute destruction callbacks.
#[derive(Default)]
pub(crate) struct AttributeScope {
    attributes: RwLock<HashMap<String, AttributeValue>>,
    callbacks: Mutex<Vec<(String, DestructionCallback)>>,
}

impl AttributeScope {
    pub(crate) fn get(&self, name: &str) -> Option<AttributeValue> {
        self.attributes.read().get(name).cloned()
    }

    pub(crate) fn set(&self, name: &str, value: AttributeValue) {
        self.attributes.write().insert(name.to_string(), value);
    }

    /// Removing an attribute drops its callback without running it.
    pub(crate) fn remove(&self, name: &str) -> Option<AttributeValue> {
        self.callbacks.lock().retain(|(n, _)| n != name);
        self.attributes.write().remove(name)
    }

    pub(crate) fn names(&self) -> Vec<String> {
        self.attributes.read().keys().cloned().collect()
    }

    pub(crate) fn register_callback(&self, name: &str, callback: DestructionCallback) {
        self.callbacks.lock().push((name.to_string(), callback));
    }

    /// Run every registered callback, in registration order.
    pub(crate) fn destroy(&self) {
        let callbacks = std::mem::take(&mut *self.callbacks.lock());
        for (_, callback) in callbacks {
            callback();
        }
    }

    pub(crate) fn clear(&self) {
        self.attributes.write().clear();
    }
}

/// A client session: attributes plus the mutex used to serialize
/// dispatches of the same session.
pub struct Session {
    id: String,
    scope: AttributeScope,
    mutex: Mutex<()>,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::with_id(ulid::Ulid::new().to_string())
    }

    #[must_use]
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            scope: AttributeScope::default(),
            mutex: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn get_attribute(&self, name: &str) -> Option<AttributeValue> {
        self.scope.get(name)
    }

    pub fn set_attribute(&self, name: &str, value: AttributeValue) {
        self.scope.set(name, value);
    }

    pub fn remove_attribute(&self, name: &str) -> Option<AttributeValue> {
        self.scope.remove(name)
    }

    #[must_use]
    pub fn attribute_names(&self) -> Vec<String> {
        self.scope.names()
    }

    pub fn register_destruction_callback(&self, name: &str, callback: DestructionCallback) {
        self.scope.register_callback(name, callback);
    }

    /// Run destruction callbacks and drop every attribute.
    pub fn invalidate(&self) {
        self.scope.destroy();
        self.scope.clear();
    }

    /// Hold this while running a handler to serialize same-session dispatches.
    pub fn lock(&self) -> MutexGuard<'_, ()> {
        self.mutex.lock()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("attributes", &self.scope.names())
            .finish()
    }
}
