use crate::context::RequestContext;
use crate::error::DispatchError;
use crate::handler::{ReturnType, ReturnValue};
use crate::model::ModelContainer;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::trace;

/// Turns a handler's return value into model contributions or response side
/// effects.
///
/// Shared across concurrent requests; implementations keep no per-request
/// state.
pub trait ReturnValueHandler: Send + Sync {
    fn supports(&self, return_type: &ReturnType) -> bool;

    fn handle(
        &self,
        value: ReturnValue,
        return_type: &ReturnType,
        container: &mut ModelContainer,
        ctx: &RequestContext,
    ) -> Result<(), DispatchError>;
}

/// The type a value is processed as.
///
/// Async values always go through the async handler. An absent (void) value
/// keeps the declared type. Attribute values keep an attribute or body
/// declaration; every other concrete value is processed as what it is.
#[must_use]
pub fn effective_return_type(declared: &ReturnType, value: &ReturnValue) -> ReturnType {
    match (declared, value) {
        (_, ReturnValue::Async(_)) => ReturnType::Async,
        (declared, ReturnValue::Void) => declared.clone(),
        (
            ReturnType::ModelAttribute { .. } | ReturnType::ResponseBody,
            ReturnValue::Attribute(_),
        ) => declared.clone(),
        (ReturnType::ModelAttribute { .. }, ReturnValue::Body(_)) => declared.clone(),
        (_, value) => ReturnType::of(value),
    }
}

/// Ordered handler list; the first handler that supports the return type wins.
pub struct ReturnValueHandlerComposite {
    handlers: Vec<Arc<dyn ReturnValueHandler>>,
    cache: DashMap<ReturnType, usize>,
}

impl ReturnValueHandlerComposite {
    #[must_use]
    pub fn new(handlers: Vec<Arc<dyn ReturnValueHandler>>) -> Self {
        Self {
            handlers,
            cache: DashMap::new(),
        }
    }

    /// The default list with `custom` handlers ahead of the catch-all.
    #[must_use]
    pub fn with_defaults(
        custom: Vec<Arc<dyn ReturnValueHandler>>,
        async_handler: super::AsyncReturnHandler,
    ) -> Self {
        Self::new(super::default_return_handlers(custom, async_handler))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    #[must_use]
    pub fn supports(&self, return_type: &ReturnType) -> bool {
        self.find(return_type).is_some()
    }

    /// Process `value` returned by handler `handler_id`.
    ///
    /// Fails with [`DispatchError::UnsupportedReturnType`] when no handler
    /// supports it.
    pub fn handle_return_value(
        &self,
        handler_id: &str,
        value: ReturnValue,
        declared: &ReturnType,
        container: &mut ModelContainer,
        ctx: &RequestContext,
    ) -> Result<(), DispatchError> {
        let return_type = effective_return_type(declared, &value);
        let handler =
            self.find(&return_type)
                .ok_or_else(|| DispatchError::UnsupportedReturnType {
                    handler: handler_id.to_string(),
                    return_type: return_type.to_string(),
                })?;
        handler.handle(value, &return_type, container, ctx)
    }

    fn find(&self, return_type: &ReturnType) -> Option<&Arc<dyn ReturnValueHandler>> {
        if let Some(idx) = self.cache.get(return_type) {
            return self.handlers.get(*idx);
        }
        let idx = self.handlers.iter().position(|h| h.supports(return_type))?;
        trace!(return_type = %return_type, handler_index = idx, "Return value handler selected");
        self.cache.insert(return_type.clone(), idx);
        self.handlers.get(idx)
    }
}

impl std::fmt::Debug for ReturnValueHandlerComposite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReturnValueHandlerComposite")
            .field("handlers", &self.handlers.len())
            .field("cached", &self.cache.len())
            .finish()
    }
}
