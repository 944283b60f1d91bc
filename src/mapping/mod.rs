//! # Mapping Module
//!
//! Request criteria and the handler registry.
//!
//! ## Overview
//!
//! A [`RequestCriteria`] is an immutable predicate composed of orthogonal
//! sub-conditions:
//!
//! - [`PatternsCondition`] - Ant-style path patterns (`?`, `*`, `**`,
//!   `{name}`, `{name:regex}`), OR-combined
//! - [`MethodsCondition`] - HTTP methods, empty means any
//! - [`ParamsCondition`] / [`HeadersCondition`] - `name`, `!name`,
//!   `name=value`, `name!=value`, AND-combined
//! - [`ProducesCondition`] - media types checked against `Accept`
//!
//! The [`HandlerRegistry`] binds criteria to handlers. Resolution:
//!
//! 1. compute the lookup path (context path stripped, `;` content removed,
//!    percent-decoded)
//! 2. try registrations indexed under that exact literal path; if none
//!    match, scan every registration
//! 3. sort matches by specificity; a tie between the two best matches is an
//!    [`AmbiguousMapping`](crate::error::DispatchError::AmbiguousMapping) error
//! 4. record lookup path, best pattern, URI variables and matched criteria on
//!    the request context
//!
//! ## Specificity
//!
//! Criteria compare patterns first, then params, headers, produces and
//! methods. Patterns compare by [`PathPattern::compare_for_path`]: a pattern
//! equal to the path wins, `/**` loses, prefix patterns ending in `/**` lose
//! to patterns without `**`, then fewer variables plus wildcards wins, then
//! the longer pattern, then fewer `*`, then fewer variables. So
//! `/widgets/{id}` beats `/widgets/*` for `/widgets/42`.
//!
//! ## Example
//!
//! ```rust
//! use brrtmvc::context::RequestContext;
//! use brrtmvc::handler::{HandlerMethod, HandlerType, ReturnValue};
//! use brrtmvc::mapping::{HandlerRegistry, RequestCriteria};
//! use http::Method;
//!
//! let ty = HandlerType::new("Widgets").build();
//! let show = HandlerMethod::builder(&ty, "show").build(|_| Ok(ReturnValue::Void));
//!
//! let mut registry = HandlerRegistry::new();
//! let criteria = RequestCriteria::builder()
//!     .path("/widgets/{id}")
//!     .method(Method::GET)
//!     .build()
//!     .unwrap();
//! registry.register(criteria, show).unwrap();
//!
//! let ctx = RequestContext::get("/widgets/42");
//! let handler = registry.resolve(&ctx).unwrap().unwrap();
//! assert_eq!(handler.id(), "Widgets#show");
//! assert_eq!(ctx.path_variable("id").as_deref(), Some("42"));
//! ```

mod conditions;
mod criteria;
mod path;
mod registry;
mod route_table;
#[cfg(test)]
mod tests;

pub use conditions::{
    HeadersCondition, MediaType, MethodsCondition, NameValueExpression, ParamsCondition,
    PatternsCondition, ProducesCondition,
};
pub use criteria::{RequestCriteria, RequestCriteriaBuilder};
pub use path::{is_pattern, join_paths, PathPattern};
pub use registry::{HandlerMatch, HandlerRegistry, LookupPathOptions, Registration};
pub use route_table::{load_route_table, HandlerProvider, RouteEntry, RouteTable};
