//! # Handler Module
//!
//! Explicit handler metadata, built once at registration time instead of
//! being discovered at dispatch time.
//!
//! - [`HandlerType`] holds what all methods of one handler type share: the
//!   session attribute declarations and the attribute-producing sibling
//!   methods ([`ModelAttributeMethod`]).
//! - [`HandlerMethod`] is one handler: an id, its declared parameters
//!   ([`MethodParameter`]), its declared [`ReturnType`], an optional fixed
//!   response status, and the callable.
//! - [`Invocation`] is what the callable receives: positional
//!   [`ArgumentValue`]s plus the live model container and request.
//!
//! ## Example
//!
//! ```rust
//! use brrtmvc::handler::{HandlerMethod, HandlerType, MethodParameter, ParamType, ReturnType, ReturnValue, ScalarType};
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
//! assert_eq!(show.id(), "WidgetController#show");
//! ```

mod invocation;
mod method;
mod parameter;
#[cfg(test)]
mod tests;
mod value;

pub use invocation::Invocation;
pub use method::{HandlerFn, HandlerMethod, HandlerMethodBuilder, HandlerType, ModelAttributeMethod};
pub use parameter::{Binding, MethodParameter, ParamType, ScalarType};
pub use value::{ArgumentValue, ResponseEntity, ReturnType, ReturnValue};
