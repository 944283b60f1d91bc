use std::time::Duration;

use tracing::{debug, info, warn};

use super::Interceptor;
use crate::context::RequestContext;
use crate::error::DispatchError;
use crate::handler::HandlerMethod;

/// Logs handler execution with request correlation fields.
///
/// Completions slower than the threshold (1ms by default) are logged at
/// `warn`, errors at `warn` with the error.
pub struct TracingInterceptor {
    slow_threshold: Duration,
}

impl Default for TracingInterceptor {
    fn default() -> Self {
        Self {
            slow_threshold: Duration::from_millis(1),
        }
    }
}

impl TracingInterceptor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_slow_threshold(slow_threshold: Duration) -> Self {
        Self { slow_threshold }
    }
}

impl Interceptor for TracingInterceptor {
    fn before(&self, ctx: &RequestContext, handler: &HandlerMethod) -> Result<bool, DispatchError> {
        debug!(
            request_id = %ctx.request_id(),
            method = %ctx.method(),
            path = %ctx.path(),
            handler = %handler,
            "Handler execution started"
        );
        Ok(true)
    }

    fn complete(
        &self,
        ctx: &RequestContext,
        handler: &HandlerMethod,
        error: Option<&DispatchError>,
        latency: Duration,
    ) {
        let duration_us = latency.as_micros() as u64;
        let status = ctx.response().status.map(|s| s.as_u16());
        match error {
            Some(err) => warn!(
                request_id = %ctx.request_id(),
                handler = %handler,
                duration_us = duration_us,
                error = %err,
                "Handler execution failed"
            ),
            None if latency > self.slow_threshold => warn!(
                request_id = %ctx.request_id(),
                handler = %handler,
                duration_us = duration_us,
                status = ?status,
                "Slow handler execution"
            ),
            None => info!(
                request_id = %ctx.request_id(),
                handler = %handler,
                duration_us = duration_us,
                status = ?status,
                "Handler execution completed"
            ),
        }
    }

    fn concurrent_handling_started(&self, ctx: &RequestContext, handler: &HandlerMethod) {
        info!(
            request_id = %ctx.request_id(),
            handler = %handler,
            "Handler execution suspended for async processing"
        );
    }
}
