//! # Dispatcher Module
//!
//! The [`Dispatcher`] composes the handler registry, the interceptor chain
//! and the [`HandlerAdapter`](crate::adapter::HandlerAdapter) into one
//! entry point per request.
//!
//! ## Request Flow
//!
//! 1. Registry resolves the handler (or the default handler) and records the
//!    match metadata on the context
//! 2. Interceptors mapped to the lookup path run `before`; a veto ends the
//!    dispatch as [`DispatchOutcome::Rejected`]
//! 3. The adapter builds the model, invokes the handler and processes its
//!    return value
//! 4. `after` and `complete` run in reverse order and request-scope
//!    destruction callbacks fire
//!
//! When the handler starts async processing, step 4 is replaced by
//! `concurrent_handling_started` and the dispatch returns
//! [`DispatchOutcome::Suspended`]. [`Dispatcher::resume`] waits for the
//! result and runs the chain again around the resumed adapter.
//!
//! ## Example
//!
//! ```rust
//! use brrtmvc::context::RequestContext;
//! use brrtmvc::dispatcher::{DispatchOutcome, Dispatcher};
//! use brrtmvc::handler::{HandlerMethod, HandlerType, MethodParameter, ParamType, ReturnType, ReturnValue, ScalarType};
//! use brrtmvc::mapping::{HandlerRegistry, RequestCriteria};
//! use brrtmvc::runtime_config::DispatchConfig;
//!
//! let widgets = HandlerType::new("WidgetController").build();
//! let show = HandlerMethod::builder(&widgets, "show")
//!     .param(MethodParameter::path_variable("id", ParamType::Simple(ScalarType::Integer)))
//!     .returns(ReturnType::ViewName)
//!     .build(|inv| {
//!         let id = inv.i64_arg(0).unwrap_or_default();
//!         inv.model().add_attribute("id", id);
//!         Ok(ReturnValue::view_name("widgets/show"))
//!     });
//!
//! let mut registry = HandlerRegistry::new();
//! registry
//!     .register(RequestCriteria::builder().path("/widgets/{id}").build().unwrap(), show)
//!     .unwrap();
//! let dispatcher = Dispatcher::with_config(registry, DispatchConfig::default());
//!
//! let ctx = RequestContext::get("/widgets/42");
//! let DispatchOutcome::Completed(mav) = dispatcher.dispatch(&ctx).unwrap() else {
//!     panic!("expected a view");
//! };
//! assert_eq!(mav.view_name(), Some("widgets/show"));
//! assert_eq!(mav.model.get("id").unwrap().value(), &serde_json::json!(42));
//! ```

mod core;

pub use core::{DispatchOutcome, Dispatcher};
