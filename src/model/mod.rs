//! # Model Module
//!
//! Request-scoped model state shared by the orchestrator, argument resolvers
//! and return value handlers.
//!
//! ## Types
//!
//! - [`AttributeValue`] - a JSON payload plus an optional declared type name
//! - [`ModelMap`] - ordered, unique-name attribute mapping
//! - [`ModelContainer`] - active model, view selection, redirect scenario,
//!   "request handled" and "session complete" flags
//! - [`ModelAndView`] - what a dispatch hands to the view collaborator
//! - [`FieldError`] - a request value rejected while binding a model attribute
//!
//! ## Redirect scenario
//!
//! A handler that selects a `redirect:` view (or a redirecting [`View`])
//! flips the container into the redirect scenario. From then on
//! [`ModelContainer::model`] returns the dedicated redirect model when one
//! exists, or when `ignore_default_model_on_redirect` forbids falling back to
//! the default model. Everything else keeps using the default model.
//!
//! ## Conventional names
//!
//! Attributes added without a name are named after their type:
//!
//! ```rust
//! use brrtmvc::model::AttributeValue;
//! use serde_json::json;
//!
//! let cart = AttributeValue::typed("ShoppingCart", json!({"items": []}));
//! assert_eq!(cart.conventional_name().as_deref(), Some("shoppingCart"));
//!
//! let items = AttributeValue::typed("Item", json!([{"sku": "a"}]));
//! assert_eq!(items.conventional_name().as_deref(), Some("itemList"));
//! ```

mod binding;
mod container;
mod map;
mod value;

pub use binding::{binding_result, binding_result_key, FieldError, BINDING_RESULT_PREFIX};
pub use container::{
    ModelAndView, ModelContainer, RedirectAttributes, SessionStatus, View, ViewSelector,
    REDIRECT_URL_PREFIX,
};
pub use map::ModelMap;
pub use value::{decapitalize, short_type_name, AttributeKind, AttributeValue};
