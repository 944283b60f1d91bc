//! # Interceptor Module
//!
//! Pre/post/completion hooks around handler execution.
//!
//! ## Lifecycle
//!
//! For one dispatch the [`HandlerExecutionChain`] holds the interceptors
//! whose path mapping applies to the lookup path:
//!
//! 1. `before` in registration order; a veto (`Ok(false)`) or an error stops
//!    the dispatch
//! 2. the handler runs
//! 3. `after` in reverse order, with the outbound
//!    [`ModelAndView`](crate::model::ModelAndView) when there is one
//! 4. `complete` in reverse order, always, but only for interceptors whose
//!    `before` succeeded
//!
//! A handler that starts async processing gets
//! `concurrent_handling_started` instead of steps 3-4; those run when the
//! dispatch resumes.
//!
//! ## Built-ins
//!
//! - [`TracingInterceptor`] - structured log lines with `duration_us`
//! - [`MetricsInterceptor`] - atomic request/latency/error counters
//!
//! ## Example
//!
//! ```rust
//! use brrtmvc::interceptor::{MappedInterceptor, MetricsInterceptor};
//! use std::sync::Arc;
//!
//! let metrics = Arc::new(MetricsInterceptor::new());
//! let mapped = MappedInterceptor::new(["/api/**"], ["/api/health"], metrics).unwrap();
//! assert!(mapped.matches("/api/orders/7"));
//! assert!(!mapped.matches("/api/health"));
//! assert!(!mapped.matches("/static/app.js"));
//! ```

mod chain;
mod core;
mod metrics;
#[cfg(test)]
mod tests;
mod tracing;

pub use crate::context::{AsyncInterceptor, AsyncTask};
pub use chain::HandlerExecutionChain;
pub use core::{Interceptor, MappedInterceptor};
pub use metrics::MetricsInterceptor;
pub use tracing::TracingInterceptor;
