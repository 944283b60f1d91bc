//! # Request Context Module
//!
//! The request as the dispatch core sees it. The transport layer builds a
//! [`RequestContext`] from whatever it received; the core reads path,
//! parameters, headers, locale and principal from it, keeps scoped
//! attributes in it, and records its decisions on it (match metadata,
//! response status/headers/body, not-modified, async state).
//!
//! ## Scopes
//!
//! Attributes live in one of three [`Scope`]s: `Request` (dropped with the
//! context), `Session` and `GlobalSession` (held by shared [`Session`]
//! objects, so two contexts built with the same session see each other's
//! writes). Each attribute may carry a destruction callback.
//!
//! ## Async
//!
//! [`AsyncManager`] tracks whether a handler started asynchronous
//! processing. [`AsyncResult`] is what such a handler returns: a future run on
//! a tokio executor or a deferred value supplied through a [`DeferredSetter`].
//! [`AsyncInterceptor`]s registered on the adapter observe the start, a
//! timeout (and may replace it with a value), the final result and the end
//! of async processing.

mod async_manager;
mod core;
mod request_id;
mod session;

pub use async_manager::{
    AsyncInterceptor, AsyncManager, AsyncResult, AsyncTask, BoxFuture, ConcurrentResult, DeferredSetter,
};
pub use core::{MatchInfo, ParamVec, Principal, RequestContext, ResponseRecord, MAX_INLINE_PARAMS};
pub use request_id::{RequestId, REQUEST_ID_HEADER};
pub use session::{DestructionCallback, Scope, Session};
