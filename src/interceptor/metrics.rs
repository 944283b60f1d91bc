use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use super::Interceptor;
use crate::context::RequestContext;
use crate::error::DispatchError;
use crate::handler::HandlerMethod;

/// Interceptor for collecting dispatch metrics
///
/// All counters use atomic operations for thread-safe updates without locks.
///
/// Metrics collected:
/// - Requests that reached a handler
/// - Completed executions and their average latency
/// - Failed executions
/// - Executions that went asynchronous
pub struct MetricsInterceptor {
    request_count: AtomicUsize,
    completed_count: AtomicUsize,
    error_count: AtomicUsize,
    async_started: AtomicUsize,
    total_latency_ns: AtomicU64,
}

/// Creates an instance with all atomic counters set to zero.
impl Default for MetricsInterceptor {
    fn default() -> Self {
        Self {
            request_count: AtomicUsize::new(0),
            completed_count: AtomicUsize::new(0),
            error_count: AtomicUsize::new(0),
            async_started: AtomicUsize::new(0),
            total_latency_ns: AtomicU64::new(0),
        }
    }
}

impl MetricsInterceptor {
    /// Create a new metrics interceptor with all counters initialized to zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of requests that reached a handler
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Get the number of executions that ran to completion (successfully or not)
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.completed_count.load(Ordering::Relaxed)
    }

    /// Get the number of executions that completed with an error
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Get the number of executions that started async processing
    #[must_use]
    pub fn async_started_count(&self) -> usize {
        self.async_started.load(Ordering::Relaxed)
    }

    /// Calculate the average execution latency
    ///
    /// Returns the mean time from `before` to completion across all completed
    /// executions, or zero if nothing has completed yet.
    #[must_use]
    pub fn average_latency(&self) -> Duration {
        let count = self.completed_count.load(Ordering::Relaxed) as u64;
        if count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }
}

/// Passive: never vetoes a request, only observes and records.
///
/// Uses `Ordering::Relaxed`; metrics are eventually consistent.
impl Interceptor for MetricsInterceptor {
    fn before(&self, _ctx: &RequestContext, _handler: &HandlerMethod) -> Result<bool, DispatchError> {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }

    fn complete(
        &self,
        _ctx: &RequestContext,
        _handler: &HandlerMethod,
        error: Option<&DispatchError>,
        latency: Duration,
    ) {
        self.completed_count.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ns
            .fetch_add(latency.as_nanos() as u64, Ordering::Relaxed);
        if error.is_some() {
            self.error_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn concurrent_handling_started(&self, _ctx: &RequestContext, _handler: &HandlerMethod) {
        self.async_started.fetch_add(1, Ordering::Relaxed);
    }
}
