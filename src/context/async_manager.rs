use crate::error::{DispatchError, HandlerError};
use crate::handler::ReturnValue;
use super::request_id::RequestId;
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Result delivered into the resumption path: the concrete return value, or
/// the error raised by the computation, a timeout or an abandoned result.
pub type ConcurrentResult = Result<ReturnValue, DispatchError>;

/// Boxed `Send` future.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

enum Source {
    Future {
        future: BoxFuture<Result<ReturnValue, HandlerError>>,
        executor: Option<Handle>,
    },
    Deferred(oneshot::Receiver<Result<ReturnValue, HandlerError>>),
}

/// A pending return value: either a computation to run on an executor, or a
/// result some other task will supply through a [`DeferredSetter`].
pub struct AsyncResult {
    source: Source,
    timeout: Option<Duration>,
    timeout_result: Option<Box<ReturnValue>>,
}

impl AsyncResult {
    /// Run `future` on the configured executor once the handler returns.
    pub fn from_future<F>(future: F) -> Self
    where
        F: Future<Output = Result<ReturnValue, HandlerError>> + Send + 'static,
    {
        Self {
            source: Source::Future {
                future: Box::pin(future),
                executor: None,
            },
            timeout: None,
            timeout_result: None,
        }
    }

    /// A result supplied later by whoever holds the setter.
    #[must_use]
    pub fn deferred() -> (Self, DeferredSetter) {
        let (tx, rx) = oneshot::channel();
        let result = Self {
            source: Source::Deferred(rx),
            timeout: None,
            timeout_result: None,
        };
        (result, DeferredSetter { tx: Mutex::new(Some(tx)) })
    }

    /// Run the computation on `executor` instead of the configured one.
    #[must_use]
    pub fn on(mut self, executor: Handle) -> Self {
        if let Source::Future { executor: slot, .. } = &mut self.source {
            *slot = Some(executor);
        }
        self
    }

    /// Overrides the configured async timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Value to resume with on timeout instead of a timeout error.
    #[must_use]
    pub fn with_timeout_result(mut self, value: ReturnValue) -> Self {
        self.timeout_result = Some(Box::new(value));
        self
    }

    #[must_use]
    pub fn is_deferred(&self) -> bool {
        matches!(self.source, Source::Deferred(_))
    }

    /// Own timeout, or `default_timeout` when none was set.
    #[must_use]
    pub fn effective_timeout(&self, default_timeout: Option<Duration>) -> Option<Duration> {
        self.timeout.or(default_timeout)
    }

    /// Start the computation and return the future of its result.
    pub(crate) fn start(
        self,
        default_timeout: Option<Duration>,
        default_executor: Option<&Handle>,
    ) -> Result<BoxFuture<ConcurrentResult>, DispatchError> {
        let timeout = self.timeout.or(default_timeout);
        let timeout_result = self.timeout_result;
        match self.source {
            Source::Future { future, executor } => {
                let handle = executor
                    .or_else(|| default_executor.cloned())
                    .or_else(|| Handle::try_current().ok())
                    .ok_or_else(|| DispatchError::async_failure("no async executor available"))?;
                let task = handle.spawn(bounded(
                    async move { future.await.map_err(DispatchError::Handler) },
                    timeout,
                    timeout_result,
                ));
                Ok(Box::pin(async move {
                    match task.await {
                        Ok(result) => result,
                        Err(e) => Err(DispatchError::async_failure(format!(
                            "async computation did not complete: {e}"
                        ))),
                    }
                }))
            }
            Source::Deferred(rx) => Ok(Box::pin(bounded(
                async move {
                    match rx.await {
                        Ok(result) => result.map_err(DispatchError::Handler),
                        Err(_) => Err(DispatchError::async_failure(
                            "deferred result dropped before a value was set",
                        )),
                    }
                },
                timeout,
                timeout_result,
            ))),
        }
    }
}

impl fmt::Debug for AsyncResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncResult")
            .field("deferred", &self.is_deferred())
            .field("timeout", &self.timeout)
            .field("has_timeout_result", &self.timeout_result.is_some())
            .finish()
    }
}

// Dropping the inner future on expiry abandons the computation.
async fn bounded<F>(
    future: F,
    timeout: Option<Duration>,
    timeout_result: Option<Box<ReturnValue>>,
) -> ConcurrentResult
where
    F: Future<Output = ConcurrentResult>,
{
    let Some(limit) = timeout else {
        return future.await;
    };
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => {
            debug!(timeout_ms = limit.as_millis() as u64, "Async result timed out");
            match timeout_result {
                Some(value) => Ok(*value),
                None => Err(DispatchError::AsyncTimeout { timeout: limit }),
            }
        }
    }
}

/// Write side of a deferred [`AsyncResult`]. Only the first value counts.
pub struct DeferredSetter {
    tx: Mutex<Option<oneshot::Sender<Result<ReturnValue, HandlerError>>>>,
}

impl DeferredSetter {
    /// Returns false when a value was already set or the result expired.
    pub fn set_result(&self, value: ReturnValue) -> bool {
        self.send(Ok(value))
    }

    /// Resume the dispatch with `error` as if the handler had raised it.
    pub fn set_error(&self, error: impl Into<HandlerError>) -> bool {
        self.send(Err(error.into()))
    }

    #[must_use]
    pub fn is_set_or_expired(&self) -> bool {
        self.tx.lock().as_ref().map_or(true, oneshot::Sender::is_closed)
    }

    fn send(&self, value: Result<ReturnValue, HandlerError>) -> bool {
        match self.tx.lock().take() {
            Some(tx) => tx.send(value).is_ok(),
            None => false,
        }
    }
}

impl fmt::Debug for DeferredSetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredSetter")
            .field("set_or_expired", &self.is_set_or_expired())
            .finish()
    }
}

/// The concurrent computation of one request, as async interceptors see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsyncTask {
    pub request_id: RequestId,
    pub deferred: bool,
    pub timeout: Option<Duration>,
}

/// Hooks around the asynchronous processing of a request.
///
/// `before_concurrent_handling` runs on the dispatching thread; the other
/// hooks run wherever the pending result is awaited, so they only see the
/// [`AsyncTask`], never the request context.
pub trait AsyncInterceptor: Send + Sync {
    /// Before the computation starts. An error aborts the start and fails
    /// the dispatch.
    fn before_concurrent_handling(&self, _task: &AsyncTask) -> Result<(), DispatchError> {
        Ok(())
    }

    /// The wait expired and the result carried no timeout value of its own.
    /// The first interceptor returning `Some` supplies the result instead of
    /// the timeout error.
    fn handle_timeout(&self, _task: &AsyncTask, _timeout: Duration) -> Option<ReturnValue> {
        None
    }

    /// The result about to flow into the resumed dispatch.
    fn post_process(&self, _task: &AsyncTask, _result: &ConcurrentResult) {}

    /// Async processing ended: a result was delivered, the wait timed out,
    /// or the pending dispatch was dropped unresolved.
    fn after_completion(&self, _task: &AsyncTask) {}
}

// Runs `after_completion` when the pending future goes away for any reason.
struct CompletionGuard {
    task: AsyncTask,
    interceptors: Vec<Arc<dyn AsyncInterceptor>>,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        for interceptor in &self.interceptors {
            interceptor.after_completion(&self.task);
        }
    }
}

/// Per-request record of asynchronous processing.
#[derive(Default)]
pub struct AsyncManager {
    started: AtomicBool,
    pending: Mutex<Option<BoxFuture<ConcurrentResult>>>,
}

impl AsyncManager {
    #[must_use]
    pub fn is_concurrent_handling_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Start `result` and keep its pending future for the resumption.
    ///
    /// `interceptors` see the start, a timeout, the final result and the
    /// end of async processing, in registration order.
    pub(crate) fn start_concurrent_handling(
        &self,
        request_id: RequestId,
        result: AsyncResult,
        default_timeout: Option<Duration>,
        default_executor: Option<&Handle>,
        interceptors: &[Arc<dyn AsyncInterceptor>],
    ) -> Result<(), DispatchError> {
        let task = AsyncTask {
            request_id,
            deferred: result.is_deferred(),
            timeout: result.effective_timeout(default_timeout),
        };
        for interceptor in interceptors {
            interceptor.before_concurrent_handling(&task)?;
        }
        let pending = result.start(default_timeout, default_executor)?;
        let guard = CompletionGuard {
            task,
            interceptors: interceptors.to_vec(),
        };
        *self.pending.lock() = Some(Box::pin(async move {
            let mut result = pending.await;
            if let Err(DispatchError::AsyncTimeout { timeout }) = &result {
                let timeout = *timeout;
                if let Some(value) = guard
                    .interceptors
                    .iter()
                    .find_map(|i| i.handle_timeout(&guard.task, timeout))
                {
                    warn!(
                        request_id = %guard.task.request_id,
                        timeout_ms = timeout.as_millis() as u64,
                        "Async timeout replaced by interceptor result"
                    );
                    result = Ok(value);
                }
            }
            for interceptor in &guard.interceptors {
                interceptor.post_process(&guard.task, &result);
            }
            drop(guard);
            result
        }));
        self.started.store(true, Ordering::Release);
        Ok(())
    }

    pub(crate) fn take_pending(&self) -> Option<BoxFuture<ConcurrentResult>> {
        self.pending.lock().take()
    }

    /// Reset before the resumed dispatch runs.
    pub(crate) fn clear(&self) {
        self.pending.lock().take();
        self.started.store(false, Ordering::Release);
    }
}

impl fmt::Debug for AsyncManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncManager")
            .field("started", &self.is_concurrent_handling_started())
            .finish()
    }
}
