use crate::adapter::{HandlerAdapter, HandlerOutcome, PendingDispatch, SuspendedDispatch};
use crate::context::{ConcurrentResult, RequestContext};
use crate::error::DispatchError;
use crate::handler::HandlerMethod;
use crate::interceptor::{HandlerExecutionChain, Interceptor, MappedInterceptor};
use crate::mapping::HandlerRegistry;
use crate::model::ModelAndView;
use crate::runtime_config::DispatchConfig;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Result of one dispatch.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// View selection and model for the rendering collaborator.
    Completed(ModelAndView),
    /// The handler wrote the response itself.
    Handled,
    /// Async processing started; pass the pending dispatch to
    /// [`Dispatcher::resume`].
    Suspended(PendingDispatch),
    /// No registration matched and there is no default handler.
    NotFound,
    /// An interceptor vetoed the request.
    Rejected,
}

impl DispatchOutcome {
    /// Short label for log fields.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            DispatchOutcome::Completed(_) => "completed",
            DispatchOutcome::Handled => "handled",
            DispatchOutcome::Suspended(_) => "suspended",
            DispatchOutcome::NotFound => "not_found",
            DispatchOutcome::Rejected => "rejected",
        }
    }
}

/// Front controller: resolves the handler, wraps it in the interceptor
/// chain and hands it to the [`HandlerAdapter`].
///
/// Immutable once built; share it behind an `Arc` across request tasks.
pub struct Dispatcher {
    registry: HandlerRegistry,
    interceptors: Vec<MappedInterceptor>,
    adapter: HandlerAdapter,
}

impl Dispatcher {
    #[must_use]
    pub fn new(registry: HandlerRegistry, adapter: HandlerAdapter) -> Self {
        Self {
            registry,
            interceptors: Vec::new(),
            adapter,
        }
    }

    /// Dispatcher with a default adapter built from `config`.
    #[must_use]
    pub fn with_config(registry: HandlerRegistry, config: DispatchConfig) -> Self {
        Self::new(registry, HandlerAdapter::new(config))
    }

    /// Add an interceptor; interceptors run in the order they are added.
    #[must_use]
    pub fn with_interceptor(mut self, interceptor: MappedInterceptor) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Add an interceptor that applies to every path.
    pub fn add_interceptor(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.interceptors.push(MappedInterceptor::global(interceptor));
    }

    pub fn add_mapped_interceptor(&mut self, interceptor: MappedInterceptor) {
        self.interceptors.push(interceptor);
    }

    #[must_use]
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    #[must_use]
    pub fn adapter(&self) -> &HandlerAdapter {
        &self.adapter
    }

    #[must_use]
    pub fn interceptors(&self) -> &[MappedInterceptor] {
        &self.interceptors
    }

    /// Dispatch one request up to a result, a rejection or an async
    /// suspension.
    ///
    /// Configuration errors (ambiguous mappings, unsupported parameters or
    /// return types) and per-request errors are returned after the
    /// interceptors' `complete` hooks ran.
    pub fn dispatch(&self, ctx: &RequestContext) -> Result<DispatchOutcome, DispatchError> {
        let started = Instant::now();

        // D1: Handler lookup
        let handler = match self.registry.resolve(ctx) {
            Ok(Some(handler)) => handler,
            Ok(None) => {
                // D2: No handler
                warn!(
                    request_id = %ctx.request_id(),
                    method = %ctx.method(),
                    path = %ctx.path(),
                    registered = self.registry.len(),
                    "No handler for request"
                );
                ctx.request_completed();
                return Ok(DispatchOutcome::NotFound);
            }
            Err(err) => {
                error!(
                    request_id = %ctx.request_id(),
                    path = %ctx.path(),
                    error = %err,
                    "Handler resolution failed"
                );
                ctx.request_completed();
                return Err(err);
            }
        };

        let mut chain = self.chain_for(ctx, handler);
        if let Some(outcome) = self.apply_before(ctx, &mut chain)? {
            return Ok(outcome);
        }

        // D3: Handler invoked
        debug!(
            request_id = %ctx.request_id(),
            handler = %chain.handler(),
            interceptors = chain.len(),
            "Dispatching to handler"
        );
        let result = self.adapter.handle(ctx, chain.handler());
        self.finish(ctx, chain, result, started)
    }

    /// Wait for a suspended dispatch's concurrent result and resume it.
    pub async fn resume(
        &self,
        ctx: &RequestContext,
        pending: PendingDispatch,
    ) -> Result<DispatchOutcome, DispatchError> {
        let (suspended, result) = pending.join().await;
        self.resume_with(ctx, suspended, result)
    }

    /// Resume a suspended dispatch with an already available result.
    ///
    /// The interceptor chain runs again from `before`; the handler is not
    /// re-invoked and the captured model container is reused.
    pub fn resume_with(
        &self,
        ctx: &RequestContext,
        suspended: SuspendedDispatch,
        result: ConcurrentResult,
    ) -> Result<DispatchOutcome, DispatchError> {
        let started = Instant::now();
        let mut chain = self.chain_for(ctx, Arc::clone(suspended.handler()));
        if let Some(outcome) = self.apply_before(ctx, &mut chain)? {
            return Ok(outcome);
        }

        // D6: Async dispatch resumed
        info!(
            request_id = %ctx.request_id(),
            handler = %chain.handler(),
            failed = result.is_err(),
            in_flight_ms = ctx.request_id().age().as_millis() as u64,
            "Resuming async dispatch"
        );
        let result = self.adapter.resume(ctx, suspended, result);
        self.finish(ctx, chain, result, started)
    }

    /// Dispatch and keep resuming until the request leaves async processing.
    pub async fn dispatch_to_completion(
        &self,
        ctx: &RequestContext,
    ) -> Result<DispatchOutcome, DispatchError> {
        let mut outcome = self.dispatch(ctx)?;
        while let DispatchOutcome::Suspended(pending) = outcome {
            outcome = self.resume(ctx, pending).await?;
        }
        Ok(outcome)
    }

    fn chain_for(&self, ctx: &RequestContext, handler: Arc<HandlerMethod>) -> HandlerExecutionChain {
        let lookup_path = match ctx.match_info() {
            Some(info) => info.lookup_path,
            None => self.registry.lookup_path(ctx),
        };
        HandlerExecutionChain::for_path(handler, &self.interceptors, &lookup_path)
    }

    /// `Some(Rejected)` when an interceptor vetoed the request.
    fn apply_before(
        &self,
        ctx: &RequestContext,
        chain: &mut HandlerExecutionChain,
    ) -> Result<Option<DispatchOutcome>, DispatchError> {
        match chain.apply_before(ctx) {
            Ok(true) => Ok(None),
            Ok(false) => {
                // D4: Rejected by interceptor
                info!(
                    request_id = %ctx.request_id(),
                    handler = %chain.handler(),
                    "Request rejected by interceptor"
                );
                ctx.request_completed();
                Ok(Some(DispatchOutcome::Rejected))
            }
            Err(err) => {
                warn!(
                    request_id = %ctx.request_id(),
                    handler = %chain.handler(),
                    error = %err,
                    "Interceptor failed before handler"
                );
                ctx.request_completed();
                Err(err)
            }
        }
    }

    fn finish(
        &self,
        ctx: &RequestContext,
        mut chain: HandlerExecutionChain,
        result: Result<HandlerOutcome, DispatchError>,
        started: Instant,
    ) -> Result<DispatchOutcome, DispatchError> {
        let result = match result {
            Ok(HandlerOutcome::Suspended(pending)) => {
                chain.apply_concurrent_handling_started(ctx);
                // D5: Suspended for async processing
                info!(
                    request_id = %ctx.request_id(),
                    handler = %chain.handler(),
                    duration_us = started.elapsed().as_micros() as u64,
                    "Dispatch suspended"
                );
                return Ok(DispatchOutcome::Suspended(pending));
            }
            Ok(HandlerOutcome::Completed(mut mav)) => chain
                .apply_after(ctx, Some(&mut mav))
                .map(|()| DispatchOutcome::Completed(mav)),
            Ok(HandlerOutcome::Handled) => chain
                .apply_after(ctx, None)
                .map(|()| DispatchOutcome::Handled),
            Err(err) => Err(err),
        };

        chain.trigger_completion(ctx, result.as_ref().err());
        ctx.request_completed();

        // D7: Dispatch finished
        let elapsed = started.elapsed();
        match &result {
            Ok(outcome) => info!(
                request_id = %ctx.request_id(),
                handler = %chain.handler(),
                outcome = outcome.label(),
                duration_us = elapsed.as_micros() as u64,
                "Dispatch completed"
            ),
            Err(err) if err.is_configuration() => error!(
                request_id = %ctx.request_id(),
                handler = %chain.handler(),
                error = %err,
                duration_us = elapsed.as_micros() as u64,
                "Dispatch failed on configuration error"
            ),
            Err(err) => warn!(
                request_id = %ctx.request_id(),
                handler = %chain.handler(),
                error = %err,
                duration_us = elapsed.as_micros() as u64,
                "Dispatch failed"
            ),
        }
        result
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry.len())
            .field("interceptors", &self.interceptors.len())
            .field("adapter", &self.adapter)
            .finish()
    }
}
