use super::composite::ReturnValueHandler;
use crate::context::{AsyncInterceptor, RequestContext};
use crate::error::DispatchError;
use crate::handler::{ReturnType, ReturnValue};
use crate::model::ModelContainer;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::debug;

/// Pending results: the computation is started and recorded on the
/// request's [`AsyncManager`](crate::context::AsyncManager). The dispatch
/// suspends once this handler returns.
#[derive(Clone, Default)]
pub struct AsyncReturnHandler {
    timeout: Option<Duration>,
    executor: Option<Handle>,
    interceptors: Vec<Arc<dyn AsyncInterceptor>>,
}

impl AsyncReturnHandler {
    /// `timeout` applies to results without their own; `executor` runs
    /// futures that do not name one (the current runtime otherwise).
    #[must_use]
    pub fn new(timeout: Option<Duration>, executor: Option<Handle>) -> Self {
        Self {
            timeout,
            executor,
            interceptors: Vec::new(),
        }
    }

    /// Interceptors notified around every async result this handler starts.
    #[must_use]
    pub fn with_interceptors(mut self, interceptors: Vec<Arc<dyn AsyncInterceptor>>) -> Self {
        self.interceptors = interceptors;
        self
    }
}

impl fmt::Debug for AsyncReturnHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncReturnHandler")
            .field("timeout", &self.timeout)
            .field("executor", &self.executor.is_some())
            .field("interceptors", &self.interceptors.len())
            .finish()
    }
}

impl ReturnValueHandler for AsyncReturnHandler {
    fn supports(&self, return_type: &ReturnType) -> bool {
        *return_type == ReturnType::Async
    }

    fn handle(
        &self,
        value: ReturnValue,
        _return_type: &ReturnType,
        container: &mut ModelContainer,
        ctx: &RequestContext,
    ) -> Result<(), DispatchError> {
        let ReturnValue::Async(result) = value else {
            container.set_request_handled(true);
            return Ok(());
        };
        debug!(
            request_id = %ctx.request_id(),
            deferred = result.is_deferred(),
            "Starting concurrent handling"
        );
        ctx.async_manager().start_concurrent_handling(
            ctx.request_id(),
            result,
            self.timeout,
            self.executor.as_ref(),
            &self.interceptors,
        )
    }
}
