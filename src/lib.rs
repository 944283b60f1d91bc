//! # brrtmvc
//!
//! **brrtmvc** is the request-to-handler dispatch core of an MVC web
//! framework: it decides which handler serves a request, builds the model
//! the handler sees, turns request data into handler arguments, turns the
//! handler's return value into a view selection or a direct response, keeps
//! selected model attributes alive across requests of the same session, and
//! suspends and resumes dispatches whose result arrives asynchronously.
//!
//! There is no HTTP server and no view rendering here. Callers hand in a
//! [`context::RequestContext`] and get back a
//! [`dispatcher::DispatchOutcome`].
//!
//! ## Architecture
//!
//! - **[`mapping`]** - Ant-style path patterns, request criteria and the
//!   handler registry (plus YAML route tables)
//! - **[`handler`]** - explicit handler metadata: parameters, return type,
//!   response status, attribute-producing methods, session attribute
//!   declarations
//! - **[`resolver`]** - the argument resolver pipeline
//! - **[`returns`]** - the return value pipeline
//! - **[`model`]** - attribute values, model maps, the per-request model
//!   container and `ModelAndView`
//! - **[`session`]** - session attribute store and lifecycle
//! - **[`adapter`]** - the invocation orchestrator
//! - **[`interceptor`]** - before/after/completion hooks, tracing and
//!   metrics interceptors
//! - **[`dispatcher`]** - the front controller composing all of the above
//! - **[`context`]** - request context, scoped attributes, sessions, async
//!   results
//! - **[`runtime_config`]** / **[`logging`]** - environment and YAML driven
//!   configuration, `tracing` setup
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Caller
//!     participant Dispatcher
//!     participant Registry as HandlerRegistry
//!     participant Chain as HandlerExecutionChain
//!     participant Adapter as HandlerAdapter
//!     participant Handler
//!
//!     Caller->>Dispatcher: dispatch(ctx)
//!     Dispatcher->>Registry: resolve(ctx)
//!     Registry-->>Dispatcher: handler + match metadata on ctx
//!     Dispatcher->>Chain: apply_before
//!     Dispatcher->>Adapter: handle(ctx, handler)
//!     Adapter->>Adapter: init model (flash, session, producers)
//!     Adapter->>Handler: invoke(resolved arguments)
//!     Handler-->>Adapter: ReturnValue
//!     Adapter->>Adapter: return value pipeline, session update
//!     Adapter-->>Dispatcher: ModelAndView / Handled / Suspended
//!     Dispatcher->>Chain: apply_after + trigger_completion
//!     Dispatcher-->>Caller: DispatchOutcome
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use brrtmvc::context::RequestContext;
//! use brrtmvc::dispatcher::{DispatchOutcome, Dispatcher};
//! use brrtmvc::handler::{HandlerMethod, HandlerType, MethodParameter, ReturnType, ReturnValue};
//! use brrtmvc::mapping::{HandlerRegistry, RequestCriteria};
//! use brrtmvc::model::AttributeValue;
//! use brrtmvc::runtime_config::DispatchConfig;
//! use http::Method;
//! use serde_json::json;
//!
//! let cart = HandlerType::new("CartController").session_attributes(["cart"]).build();
//! let view = HandlerMethod::builder(&cart, "view")
//!     .returns(ReturnType::ViewName)
//!     .build(|inv| {
//!         inv.model().add_attribute("cart", AttributeValue::typed("Cart", json!({"items": []})));
//!         Ok(ReturnValue::view_name("cart/view"))
//!     });
//!
//! let mut registry = HandlerRegistry::new();
//! let criteria = RequestCriteria::builder().path("/cart").method(Method::GET).build().unwrap();
//! registry.register(criteria, view).unwrap();
//!
//! let dispatcher = Dispatcher::with_config(registry, DispatchConfig::default());
//! let outcome = dispatcher.dispatch(&RequestContext::get("/cart")).unwrap();
//! assert!(matches!(outcome, DispatchOutcome::Completed(ref mav) if mav.view_name() == Some("cart/view")));
//! ```
//!
//! ## Configuration
//!
//! [`runtime_config::DispatchConfig`] reads `BRRTMVC_*` environment
//! variables or a YAML file; [`logging::LogConfig`] reads `BRRTMVC_LOG_*`.
//!
//! ## Inspecting Route Tables
//!
//! ```bash
//! brrtmvc-routes list --table routes.yaml
//! brrtmvc-routes resolve --table routes.yaml "GET /widgets/42"
//! ```

pub mod adapter;
pub mod cli;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod interceptor;
pub mod logging;
pub mod mapping;
pub mod model;
pub mod resolver;
pub mod returns;
pub mod runtime_config;
pub mod session;

pub use adapter::{HandlerAdapter, HandlerOutcome};
pub use context::RequestContext;
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use error::DispatchError;
pub use handler::{HandlerMethod, HandlerType};
pub use mapping::{HandlerRegistry, RequestCriteria};
pub use model::{ModelAndView, ModelContainer};
