use super::core::{Interceptor, MappedInterceptor};
use crate::context::RequestContext;
use crate::error::DispatchError;
use crate::handler::HandlerMethod;
use crate::model::ModelAndView;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// A handler plus the interceptors that apply to one request.
///
/// Tracks how far `before` got, so that `complete` runs for exactly the
/// interceptors that accepted the request, and only once.
pub struct HandlerExecutionChain {
    handler: Arc<HandlerMethod>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    interceptor_index: Option<usize>,
    started: Instant,
}

impl HandlerExecutionChain {
    #[must_use]
    pub fn new(handler: Arc<HandlerMethod>, interceptors: Vec<Arc<dyn Interceptor>>) -> Self {
        Self {
            handler,
            interceptors,
            interceptor_index: None,
            started: Instant::now(),
        }
    }

    /// Chain of the mapped interceptors that apply to `lookup_path`, in
    /// registration order.
    #[must_use]
    pub fn for_path(
        handler: Arc<HandlerMethod>,
        mapped: &[MappedInterceptor],
        lookup_path: &str,
    ) -> Self {
        let interceptors = mapped
            .iter()
            .filter(|m| m.matches(lookup_path))
            .map(|m| Arc::clone(m.interceptor()))
            .collect();
        Self::new(handler, interceptors)
    }

    #[must_use]
    pub fn handler(&self) -> &Arc<HandlerMethod> {
        &self.handler
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Run `before` hooks in order.
    ///
    /// Returns `Ok(false)` when one vetoes; completion has then already run
    /// for the interceptors before it. An error also triggers completion
    /// before it is returned.
    pub fn apply_before(&mut self, ctx: &RequestContext) -> Result<bool, DispatchError> {
        for i in 0..self.interceptors.len() {
            match self.interceptors[i].before(ctx, &self.handler) {
                Ok(true) => self.interceptor_index = Some(i),
                Ok(false) => {
                    self.trigger_completion(ctx, None);
                    return Ok(false);
                }
                Err(err) => {
                    self.trigger_completion(ctx, Some(&err));
                    return Err(err);
                }
            }
        }
        Ok(true)
    }

    /// Run `after` hooks in reverse order.
    pub fn apply_after(
        &self,
        ctx: &RequestContext,
        mut model_and_view: Option<&mut ModelAndView>,
    ) -> Result<(), DispatchError> {
        for interceptor in self.interceptors.iter().rev() {
            interceptor.after(ctx, &self.handler, model_and_view.as_deref_mut())?;
        }
        Ok(())
    }

    /// Run `complete` in reverse order for every interceptor whose `before`
    /// succeeded. Later calls do nothing.
    pub fn trigger_completion(&mut self, ctx: &RequestContext, error: Option<&DispatchError>) {
        let Some(last) = self.interceptor_index.take() else {
            return;
        };
        let latency = self.started.elapsed();
        for interceptor in self.interceptors[..=last].iter().rev() {
            interceptor.complete(ctx, &self.handler, error, latency);
        }
    }

    /// Notify interceptors, in reverse order, that the handler went async.
    pub fn apply_concurrent_handling_started(&self, ctx: &RequestContext) {
        for interceptor in self.interceptors.iter().rev() {
            interceptor.concurrent_handling_started(ctx, &self.handler);
        }
    }
}

impl fmt::Debug for HandlerExecutionChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerExecutionChain")
            .field("handler", &self.handler.id())
            .field("interceptors", &self.interceptors.len())
            .field("interceptor_index", &self.interceptor_index)
            .finish()
    }
}
