//! # Session Attribute Module
//!
//! Model attributes that outlive a single request.
//!
//! A handler type declares session attributes by name
//! ([`HandlerType::session_attributes`](crate::handler::HandlerType::session_attributes))
//! or by type. For each handler type the adapter keeps one
//! [`SessionAttributesHandler`]; it reads known attributes into the model
//! before the handler runs and writes them back afterwards, or removes them
//! once the handler marks its session complete.
//!
//! Values live in a pluggable [`SessionAttributeStore`]. The default store
//! keeps them in the request's session scope under a configurable prefix.
//!
//! ```rust
//! use brrtmvc::context::{RequestContext, Session};
//! use brrtmvc::handler::HandlerType;
//! use brrtmvc::model::ModelMap;
//! use brrtmvc::session::{DefaultSessionAttributeStore, SessionAttributesHandler};
//! use std::sync::Arc;
//!
//! let cart = HandlerType::new("CartController").session_attributes(["cart"]).build();
//! let handler = SessionAttributesHandler::new(&cart, Arc::new(DefaultSessionAttributeStore::new()));
//!
//! let session = Arc::new(Session::new());
//! let first = RequestContext::get("/cart").with_session(Arc::clone(&session));
//! let model: ModelMap = [("cart", 3)].into_iter().collect();
//! handler.store_attributes(&first, &model);
//!
//! let second = RequestContext::get("/cart").with_session(session);
//! assert!(handler.retrieve_attributes(&second).contains("cart"));
//! ```

mod attributes;
mod store;

pub use attributes::SessionAttributesHandler;
pub use store::{DefaultSessionAttributeStore, SessionAttributeStore};
