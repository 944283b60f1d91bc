use crate::context::{AsyncResult, Principal};
use crate::model::{AttributeValue, ModelAndView, ModelMap, View};
use http::{HeaderMap, StatusCode};
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Declared return type of a handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReturnType {
    Void,
    ViewName,
    View,
    ModelAndView,
    Model,
    Entity,
    Async,
    /// Return value added to the model under `name` (or its conventional name).
    ModelAttribute { name: Option<String> },
    /// Return value written as the response body.
    ResponseBody,
    /// Any other value; added to the model under its conventional name.
    Object,
    Custom(Arc<str>),
}

impl ReturnType {
    /// Type of a concrete value, used when an async result resumes.
    #[must_use]
    pub fn of(value: &ReturnValue) -> Self {
        match value {
            ReturnValue::Void => ReturnType::Void,
            ReturnValue::ViewName(_) => ReturnType::ViewName,
            ReturnValue::View(_) => ReturnType::View,
            ReturnValue::ModelAndView(_) => ReturnType::ModelAndView,
            ReturnValue::Model(_) => ReturnType::Model,
            ReturnValue::Entity(_) => ReturnType::Entity,
            ReturnValue::Async(_) => ReturnType::Async,
            ReturnValue::Body(_) => ReturnType::ResponseBody,
            ReturnValue::Attribute(_) => ReturnType::Object,
            ReturnValue::Custom(name, _) => ReturnType::Custom(Arc::clone(name)),
        }
    }
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnType::ModelAttribute { name: Some(name) } => write!(f, "ModelAttribute({name})"),
            ReturnType::ModelAttribute { name: None } => f.write_str("ModelAttribute"),
            ReturnType::Custom(name) => f.write_str(name),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Status, headers and body returned as one value.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEntity {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl ResponseEntity {
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn ok(body: Value) -> Self {
        Self::new(StatusCode::OK).with_body(body)
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// What a handler returned.
pub enum ReturnValue {
    Void,
    ViewName(String),
    View(Arc<dyn View>),
    ModelAndView(ModelAndView),
    Model(ModelMap),
    Entity(ResponseEntity),
    Async(AsyncResult),
    Body(Value),
    Attribute(AttributeValue),
    /// Value for a custom return value handler, tagged with its type name.
    Custom(Arc<str>, Arc<dyn Any + Send + Sync>),
}

impl ReturnValue {
    #[must_use]
    pub fn is_void(&self) -> bool {
        matches!(self, ReturnValue::Void)
    }

    #[must_use]
    pub fn view_name(name: impl Into<String>) -> Self {
        ReturnValue::ViewName(name.into())
    }
}

impl fmt::Debug for ReturnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnValue::Void => f.write_str("Void"),
            ReturnValue::ViewName(name) => f.debug_tuple("ViewName").field(name).finish(),
            ReturnValue::View(view) => f.debug_tuple("View").field(view).finish(),
            ReturnValue::ModelAndView(mav) => f.debug_tuple("ModelAndView").field(mav).finish(),
            ReturnValue::Model(model) => f.debug_tuple("Model").field(model).finish(),
            ReturnValue::Entity(entity) => f.debug_tuple("Entity").field(entity).finish(),
            ReturnValue::Async(result) => f.debug_tuple("Async").field(result).finish(),
            ReturnValue::Body(body) => f.debug_tuple("Body").field(body).finish(),
            ReturnValue::Attribute(value) => f.debug_tuple("Attribute").field(value).finish(),
            ReturnValue::Custom(name, _) => f.debug_tuple("Custom").field(name).finish(),
        }
    }
}

/// A resolved argument, positionally matching the declared parameters.
///
/// `Model`, `SessionStatus` and `RedirectAttributes` are markers: the
/// handler reaches the live objects through its
/// [`Invocation`](super::Invocation).
#[derive(Clone)]
pub enum ArgumentValue {
    Value(AttributeValue),
    /// Optional parameter with no value and no default.
    Absent,
    Model,
    SessionStatus,
    RedirectAttributes,
    Locale(String),
    Principal(Option<Principal>),
    Custom(Arc<dyn Any + Send + Sync>),
}

impl ArgumentValue {
    #[must_use]
    pub fn as_value(&self) -> Option<&AttributeValue> {
        match self {
            ArgumentValue::Value(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Debug for ArgumentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentValue::Value(value) => f.debug_tuple("Value").field(value).finish(),
            ArgumentValue::Absent => f.write_str("Absent"),
            ArgumentValue::Model => f.write_str("Model"),
            ArgumentValue::SessionStatus => f.write_str("SessionStatus"),
            ArgumentValue::RedirectAttributes => f.write_str("RedirectAttributes"),
            ArgumentValue::Locale(locale) => f.debug_tuple("Locale").field(locale).finish(),
            ArgumentValue::Principal(p) => f.debug_tuple("Principal").field(p).finish(),
            ArgumentValue::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
