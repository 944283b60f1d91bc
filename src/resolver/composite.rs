use crate::context::RequestContext;
use crate::error::DispatchError;
use crate::handler::{ArgumentValue, MethodParameter};
use crate::model::ModelContainer;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::trace;

/// Turns a declared parameter into an invocation value.
///
/// Implementations are shared across concurrent requests and must not keep
/// per-request state between calls.
pub trait ArgumentResolver: Send + Sync {
    fn supports(&self, parameter: &MethodParameter) -> bool;

    fn resolve(
        &self,
        parameter: &MethodParameter,
        container: &mut ModelContainer,
        ctx: &RequestContext,
    ) -> Result<ArgumentValue, DispatchError>;
}

/// Ordered resolver list; the first resolver that supports a parameter wins.
///
/// The choice per parameter is cached, so `supports` runs once per
/// distinct parameter descriptor.
pub struct ArgumentResolverComposite {
    resolvers: Vec<Arc<dyn ArgumentResolver>>,
    cache: DashMap<MethodParameter, usize>,
}

impl ArgumentResolverComposite {
    /// Exactly these resolvers, in this order.
    #[must_use]
    pub fn new(resolvers: Vec<Arc<dyn ArgumentResolver>>) -> Self {
        Self {
            resolvers,
            cache: DashMap::new(),
        }
    }

    /// The default list with `custom` resolvers slotted in before the catch-alls.
    #[must_use]
    pub fn with_defaults(custom: Vec<Arc<dyn ArgumentResolver>>) -> Self {
        Self::new(super::default_resolvers(custom))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    #[must_use]
    pub fn supports(&self, parameter: &MethodParameter) -> bool {
        self.find(parameter).is_some()
    }

    /// Resolve `parameter` of handler `handler_id`.
    ///
    /// Fails with [`DispatchError::UnsupportedArgument`] when no resolver
    /// supports it.
    pub fn resolve_argument(
        &self,
        handler_id: &str,
        parameter: &MethodParameter,
        container: &mut ModelContainer,
        ctx: &RequestContext,
    ) -> Result<ArgumentValue, DispatchError> {
        let resolver = self
            .find(parameter)
            .ok_or_else(|| DispatchError::UnsupportedArgument {
                handler: handler_id.to_string(),
                parameter: parameter.name.clone(),
                index: parameter.index,
            })?;
        resolver.resolve(parameter, container, ctx)
    }

    fn find(&self, parameter: &MethodParameter) -> Option<&Arc<dyn ArgumentResolver>> {
        if let Some(idx) = self.cache.get(parameter) {
            return self.resolvers.get(*idx);
        }
        let idx = self.resolvers.iter().position(|r| r.supports(parameter))?;
        trace!(
            parameter = %parameter.name,
            index = parameter.index,
            resolver_index = idx,
            "Argument resolver selected"
        );
        self.cache.insert(parameter.clone(), idx);
        self.resolvers.get(idx)
    }
}

impl std::fmt::Debug for ArgumentResolverComposite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArgumentResolverComposite")
            .field("resolvers", &self.resolvers.len())
            .field("cached", &self.cache.len())
            .finish()
    }
}
