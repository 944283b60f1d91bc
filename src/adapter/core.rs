use super::invocable::{handle_result, invoke_callable};
use super::model_factory::ModelFactory;
use crate::context::{AsyncInterceptor, BoxFuture, ConcurrentResult, RequestContext};
use crate::error::DispatchError;
use crate::handler::{HandlerMethod, HandlerType, ModelAttributeMethod, ReturnType};
use crate::model::{ModelAndView, ModelContainer};
use crate::resolver::{ArgumentResolver, ArgumentResolverComposite};
use crate::returns::{AsyncReturnHandler, ReturnValueHandler, ReturnValueHandlerComposite};
use crate::runtime_config::DispatchConfig;
use crate::session::{DefaultSessionAttributeStore, SessionAttributeStore, SessionAttributesHandler};
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;
use tracing::{debug, info};

/// What invoking a handler produced.
#[derive(Debug)]
pub enum HandlerOutcome {
    /// A view selection and model for the view collaborator.
    Completed(ModelAndView),
    /// The handler wrote the response itself; nothing to render.
    Handled,
    /// Async processing started; resume with the pending result.
    Suspended(PendingDispatch),
}

/// Handler and model container captured when a dispatch suspended.
pub struct SuspendedDispatch {
    handler: Arc<HandlerMethod>,
    container: ModelContainer,
}

impl SuspendedDispatch {
    #[must_use]
    pub fn handler(&self) -> &Arc<HandlerMethod> {
        &self.handler
    }

    #[must_use]
    pub fn container(&self) -> &ModelContainer {
        &self.container
    }
}

impl fmt::Debug for SuspendedDispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuspendedDispatch")
            .field("handler", &self.handler.id())
            .field("container", &self.container)
            .finish()
    }
}

/// A suspended dispatch plus the future of its concurrent result.
pub struct PendingDispatch {
    suspended: SuspendedDispatch,
    result: BoxFuture<ConcurrentResult>,
}

impl PendingDispatch {
    #[must_use]
    pub fn handler(&self) -> &Arc<HandlerMethod> {
        &self.suspended.handler
    }

    #[must_use]
    pub fn container(&self) -> &ModelContainer {
        &self.suspended.container
    }

    /// Wait for the concurrent result.
    pub async fn join(self) -> (SuspendedDispatch, ConcurrentResult) {
        let result = self.result.await;
        (self.suspended, result)
    }
}

impl fmt::Debug for PendingDispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingDispatch")
            .field("suspended", &self.suspended)
            .finish_non_exhaustive()
    }
}

/// Runs one handler inside the model and session attribute lifecycle.
///
/// Shared across concurrent dispatches; per-request state lives in the
/// [`ModelContainer`] each dispatch creates.
pub struct HandlerAdapter {
    config: DispatchConfig,
    arguments: ArgumentResolverComposite,
    returns: ReturnValueHandlerComposite,
    session_store: Arc<dyn SessionAttributeStore>,
    /// Keyed by handler type identity; the entry keeps its type alive so
    /// the address cannot be reused by another type.
    session_handlers: DashMap<usize, (Arc<HandlerType>, Arc<SessionAttributesHandler>)>,
    global_model_attributes: Vec<ModelAttributeMethod>,
}

impl HandlerAdapter {
    /// Adapter with the default pipelines and session store.
    #[must_use]
    pub fn new(config: DispatchConfig) -> Self {
        Self::builder(config).build()
    }

    #[must_use]
    pub fn builder(config: DispatchConfig) -> HandlerAdapterBuilder {
        HandlerAdapterBuilder {
            config,
            custom_resolvers: Vec::new(),
            custom_return_handlers: Vec::new(),
            session_store: None,
            global_model_attributes: Vec::new(),
            executor: None,
            async_interceptors: Vec::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    #[must_use]
    pub fn argument_resolvers(&self) -> &ArgumentResolverComposite {
        &self.arguments
    }

    #[must_use]
    pub fn return_value_handlers(&self) -> &ReturnValueHandlerComposite {
        &self.returns
    }

    /// The session attribute bookkeeping for `handler_type`, created on first use.
    #[must_use]
    pub fn session_attributes_handler(&self, handler_type: &Arc<HandlerType>) -> Arc<SessionAttributesHandler> {
        let key = Arc::as_ptr(handler_type) as usize;
        if let Some(existing) = self.session_handlers.get(&key) {
            return Arc::clone(&existing.value().1);
        }
        let entry = self.session_handlers.entry(key).or_insert_with(|| {
            let handler = SessionAttributesHandler::new(handler_type, Arc::clone(&self.session_store));
            (Arc::clone(handler_type), Arc::new(handler))
        });
        Arc::clone(&entry.value().1)
    }

    /// Build the model, invoke `handler` and process its result.
    ///
    /// With `synchronize_on_session` the whole invocation runs under the
    /// session's mutex.
    pub fn handle(
        &self,
        ctx: &RequestContext,
        handler: &Arc<HandlerMethod>,
    ) -> Result<HandlerOutcome, DispatchError> {
        if self.config.synchronize_on_session {
            if let Some(session) = ctx.session() {
                let _guard = session.lock();
                return self.invoke_handler_method(ctx, handler);
            }
        }
        self.invoke_handler_method(ctx, handler)
    }

    /// Continue a suspended dispatch with its concurrent result, reusing the
    /// captured model container.
    ///
    /// An error result is returned as is: the handler's own error, a
    /// timeout, or an abandoned computation.
    pub fn resume(
        &self,
        ctx: &RequestContext,
        suspended: SuspendedDispatch,
        result: ConcurrentResult,
    ) -> Result<HandlerOutcome, DispatchError> {
        if self.config.synchronize_on_session {
            if let Some(session) = ctx.session() {
                let _guard = session.lock();
                return self.resume_handler_method(ctx, suspended, result);
            }
        }
        self.resume_handler_method(ctx, suspended, result)
    }

    fn invoke_handler_method(
        &self,
        ctx: &RequestContext,
        handler: &Arc<HandlerMethod>,
    ) -> Result<HandlerOutcome, DispatchError> {
        let start = Instant::now();
        let session = self.session_attributes_handler(handler.handler_type());
        if session.has_session_attributes() {
            ctx.apply_cache_seconds(self.config.cache_seconds_for_session_attribute_handlers);
        }
        let factory = self.model_factory(handler, &session);

        let mut container = ModelContainer::new();
        container.set_ignore_default_model_on_redirect(self.config.ignore_default_model_on_redirect);

        // HA1: Model built
        factory.init_model(ctx, &mut container, handler)?;
        debug!(
            request_id = %ctx.request_id(),
            handler = %handler,
            attributes = container.model().len(),
            "Model initialized"
        );

        // HA2: Arguments resolved and handler invoked
        let value = invoke_callable(
            &self.arguments,
            ctx,
            &mut container,
            handler.id(),
            handler.parameters(),
            handler.callable(),
        )?;
        debug!(
            request_id = %ctx.request_id(),
            handler = %handler,
            returned = ?ReturnType::of(&value),
            duration_us = start.elapsed().as_micros() as u64,
            "Handler invoked"
        );

        // HA3: Return value processed
        handle_result(&self.returns, ctx, &mut container, handler, value, handler.return_type())?;
        self.complete_or_suspend(ctx, handler, container, &factory)
    }

    fn resume_handler_method(
        &self,
        ctx: &RequestContext,
        suspended: SuspendedDispatch,
        result: ConcurrentResult,
    ) -> Result<HandlerOutcome, DispatchError> {
        ctx.async_manager().clear();
        let SuspendedDispatch {
            handler,
            mut container,
        } = suspended;

        // HA5: Resumed with the concurrent result
        let value = match result {
            Ok(value) => value,
            Err(err) => {
                info!(
                    request_id = %ctx.request_id(),
                    handler = %handler,
                    error = %err,
                    "Resuming dispatch with async error"
                );
                return Err(err);
            }
        };
        info!(
            request_id = %ctx.request_id(),
            handler = %handler,
            returned = ?ReturnType::of(&value),
            "Resuming dispatch with async result"
        );

        let declared = match handler.return_type() {
            ReturnType::Async | ReturnType::Object => ReturnType::of(&value),
            other => other.clone(),
        };
        let session = self.session_attributes_handler(handler.handler_type());
        let factory = self.model_factory(&handler, &session);
        handle_result(&self.returns, ctx, &mut container, &handler, value, &declared)?;
        self.complete_or_suspend(ctx, &handler, container, &factory)
    }

    fn complete_or_suspend(
        &self,
        ctx: &RequestContext,
        handler: &Arc<HandlerMethod>,
        mut container: ModelContainer,
        factory: &ModelFactory<'_>,
    ) -> Result<HandlerOutcome, DispatchError> {
        if ctx.async_manager().is_concurrent_handling_started() {
            let result = ctx
                .async_manager()
                .take_pending()
                .ok_or_else(|| DispatchError::async_failure("async processing started without a pending result"))?;
            // HA4: Suspended
            info!(
                request_id = %ctx.request_id(),
                handler = %handler,
                "Dispatch suspended for async processing"
            );
            return Ok(HandlerOutcome::Suspended(PendingDispatch {
                suspended: SuspendedDispatch {
                    handler: Arc::clone(handler),
                    container,
                },
                result,
            }));
        }

        factory.update_model(ctx, &mut container);
        if container.is_request_handled() {
            debug!(request_id = %ctx.request_id(), handler = %handler, "Request handled directly");
            return Ok(HandlerOutcome::Handled);
        }
        let mav = container.to_model_and_view(ctx.response().status);
        debug!(
            request_id = %ctx.request_id(),
            handler = %handler,
            view = ?mav.view_name(),
            attributes = mav.model.len(),
            "Model and view produced"
        );
        Ok(HandlerOutcome::Completed(mav))
    }

    fn model_factory<'a>(
        &'a self,
        handler: &'a HandlerMethod,
        session: &'a SessionAttributesHandler,
    ) -> ModelFactory<'a> {
        ModelFactory::new(
            &self.global_model_attributes,
            handler.handler_type().model_attribute_methods(),
            session,
            &self.arguments,
        )
    }
}

impl Default for HandlerAdapter {
    fn default() -> Self {
        Self::new(DispatchConfig::default())
    }
}

impl fmt::Debug for HandlerAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerAdapter")
            .field("config", &self.config)
            .field("arguments", &self.arguments)
            .field("returns", &self.returns)
            .field("session_handlers", &self.session_handlers.len())
            .field("global_model_attributes", &self.global_model_attributes.len())
            .finish()
    }
}

/// Builder for [`HandlerAdapter`].
pub struct HandlerAdapterBuilder {
    config: DispatchConfig,
    custom_resolvers: Vec<Arc<dyn ArgumentResolver>>,
    custom_return_handlers: Vec<Arc<dyn ReturnValueHandler>>,
    session_store: Option<Arc<dyn SessionAttributeStore>>,
    global_model_attributes: Vec<ModelAttributeMethod>,
    executor: Option<Handle>,
    async_interceptors: Vec<Arc<dyn AsyncInterceptor>>,
}

impl HandlerAdapterBuilder {
    /// Custom resolvers run after the built-ins and before the catch-alls.
    #[must_use]
    pub fn argument_resolver(mut self, resolver: Arc<dyn ArgumentResolver>) -> Self {
        self.custom_resolvers.push(resolver);
        self
    }

    /// Custom handlers run after the built-ins and before the catch-all.
    #[must_use]
    pub fn return_value_handler(mut self, handler: Arc<dyn ReturnValueHandler>) -> Self {
        self.custom_return_handlers.push(handler);
        self
    }

    /// Replaces the default prefixed session-scope store.
    #[must_use]
    pub fn session_store(mut self, store: Arc<dyn SessionAttributeStore>) -> Self {
        self.session_store = Some(store);
        self
    }

    /// Attribute producer applied to every handler, before the handler
    /// type's own producers.
    #[must_use]
    pub fn model_attribute(mut self, method: ModelAttributeMethod) -> Self {
        self.global_model_attributes.push(method);
        self
    }

    /// Executor for async results that do not name one.
    #[must_use]
    pub fn executor(mut self, executor: Handle) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Interceptor around the async processing of every request, in
    /// registration order.
    #[must_use]
    pub fn async_interceptor(mut self, interceptor: Arc<dyn AsyncInterceptor>) -> Self {
        self.async_interceptors.push(interceptor);
        self
    }

    #[must_use]
    pub fn build(self) -> HandlerAdapter {
        let session_store = self.session_store.unwrap_or_else(|| {
            Arc::new(DefaultSessionAttributeStore::with_prefix(
                self.config.session_attribute_prefix.clone(),
            ))
        });
        let async_handler = AsyncReturnHandler::new(self.config.async_timeout, self.executor)
            .with_interceptors(self.async_interceptors);
        HandlerAdapter {
            arguments: ArgumentResolverComposite::with_defaults(self.custom_resolvers),
            returns: ReturnValueHandlerComposite::with_defaults(
                self.custom_return_handlers,
                async_handler,
            ),
            session_store,
            session_handlers: DashMap::new(),
            global_model_attributes: self.global_model_attributes,
            config: self.config,
        }
    }
}
