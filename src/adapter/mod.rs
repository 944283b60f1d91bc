//! # Adapter Module
//!
//! The invocation orchestrator. [`HandlerAdapter`] runs one handler inside
//! the model and session attribute lifecycle:
//!
//! 1. build the model: input flash attributes, retrieved session
//!    attributes, attribute-producing methods (global ones first), then any
//!    session attribute a model attribute parameter needs
//!    ([`DispatchError::MissingSessionAttribute`](crate::error::DispatchError::MissingSessionAttribute)
//!    when neither the model nor the store has it)
//! 2. resolve arguments and call the handler
//! 3. apply the declared response status and run the return value pipeline
//! 4. if async processing started, suspend and hand back a
//!    [`PendingDispatch`]; the same model container is reused when the
//!    dispatch resumes
//! 5. otherwise persist or clean up session attributes, add binding results
//!    and produce a [`ModelAndView`](crate::model::ModelAndView), unless the
//!    handler wrote the response itself
//!
//! ## Example
//!
//! ```rust
//! use brrtmvc::adapter::{HandlerAdapter, HandlerOutcome};
//! use brrtmvc::context::RequestContext;
//! use brrtmvc::handler::{HandlerMethod, HandlerType, ReturnType, ReturnValue};
//! use brrtmvc::runtime_config::DispatchConfig;
//!
//! let adapter = HandlerAdapter::new(DispatchConfig::default());
//! let home = HandlerType::new("HomeController").build();
//! let index = HandlerMethod::builder(&home, "index")
//!     .returns(ReturnType::ViewName)
//!     .build(|inv| {
//!         inv.model().add_attribute("greeting", "hello");
//!         Ok(ReturnValue::view_name("home"))
//!     });
//!
//! let ctx = RequestContext::get("/");
//! match adapter.handle(&ctx, &index).unwrap() {
//!     HandlerOutcome::Completed(mav) => {
//!         assert_eq!(mav.view_name(), Some("home"));
//!         assert!(mav.model.contains("greeting"));
//!     }
//!     other => panic!("unexpected outcome {other:?}"),
//! }
//! ```

mod core;
mod invocable;
mod model_factory;
#[cfg(test)]
mod tests;

pub use core::{HandlerAdapter, HandlerAdapterBuilder, HandlerOutcome, PendingDispatch, SuspendedDispatch};
pub use crate::model::BINDING_RESULT_PREFIX;
