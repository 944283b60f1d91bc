use super::invocation::Invocation;
use super::parameter::MethodParameter;
use super::value::{ReturnType, ReturnValue};
use crate::error::HandlerError;
use http::StatusCode;
use std::fmt;
use std::sync::Arc;

/// The callable behind a handler or attribute-producing method.
pub type HandlerFn =
    Arc<dyn Fn(&mut Invocation<'_>) -> Result<ReturnValue, HandlerError> + Send + Sync>;

/// Type-level metadata shared by all handler methods of one handler type:
/// session attribute declarations and attribute-producing sibling methods.
pub struct HandlerType {
    name: Arc<str>,
    session_attribute_names: Vec<String>,
    session_attribute_types: Vec<String>,
    model_attribute_methods: Vec<ModelAttributeMethod>,
}

impl HandlerType {
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            session_attribute_names: Vec::new(),
            session_attribute_types: Vec::new(),
            model_attribute_methods: Vec::new(),
        }
    }

    /// Declare model attribute names kept in the session between requests.
    #[must_use]
    pub fn session_attributes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.session_attribute_names
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Declare model attribute types kept in the session between requests.
    #[must_use]
    pub fn session_attribute_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.session_attribute_types
            .extend(types.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn model_attribute(mut self, method: ModelAttributeMethod) -> Self {
        self.model_attribute_methods.push(method);
        self
    }

    #[must_use]
    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn session_attribute_names(&self) -> &[String] {
        &self.session_attribute_names
    }

    #[must_use]
    pub fn declared_session_attribute_types(&self) -> &[String] {
        &self.session_attribute_types
    }

    #[must_use]
    pub fn has_session_attributes(&self) -> bool {
        !self.session_attribute_names.is_empty() || !self.session_attribute_types.is_empty()
    }

    #[must_use]
    pub fn model_attribute_methods(&self) -> &[ModelAttributeMethod] {
        &self.model_attribute_methods
    }
}

impl fmt::Debug for HandlerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerType")
            .field("name", &self.name)
            .field("session_attribute_names", &self.session_attribute_names)
            .field("session_attribute_types", &self.session_attribute_types)
            .field("model_attribute_methods", &self.model_attribute_methods.len())
            .finish()
    }
}

/// A method that contributes a model attribute before the handler runs.
///
/// With a non-void return type the returned [`ReturnValue::Attribute`] is
/// added under `name`, or under its conventional name. A void method adds to
/// the model itself.
#[derive(Clone)]
pub struct ModelAttributeMethod {
    id: Arc<str>,
    name: Option<String>,
    parameters: Vec<MethodParameter>,
    return_type: ReturnType,
    callable: HandlerFn,
}

impl ModelAttributeMethod {
    pub fn new<F>(id: impl Into<Arc<str>>, name: Option<&str>, callable: F) -> Self
    where
        F: Fn(&mut Invocation<'_>) -> Result<ReturnValue, HandlerError> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            name: name.map(str::to_string),
            parameters: Vec::new(),
            return_type: ReturnType::Object,
            callable: Arc::new(callable),
        }
    }

    #[must_use]
    pub fn param(mut self, mut parameter: MethodParameter) -> Self {
        parameter.index = self.parameters.len();
        self.parameters.push(parameter);
        self
    }

    /// Mark the method as adding to the model itself.
    #[must_use]
    pub fn void(mut self) -> Self {
        self.return_type = ReturnType::Void;
        self
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Declared attribute name; an empty name counts as undeclared.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }

    #[must_use]
    pub fn parameters(&self) -> &[MethodParameter] {
        &self.parameters
    }

    #[must_use]
    pub fn is_void(&self) -> bool {
        self.return_type == ReturnType::Void
    }

    pub(crate) fn callable(&self) -> &HandlerFn {
        &self.callable
    }
}

impl fmt::Debug for ModelAttributeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelAttributeMethod")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("return_type", &self.return_type)
            .finish()
    }
}

/// Handler descriptor: callable plus the metadata the pipelines consume.
/// Built once at registration time and immutable afterwards.
pub struct HandlerMethod {
    id: Arc<str>,
    handler_type: Arc<HandlerType>,
    parameters: Vec<MethodParameter>,
    return_type: ReturnType,
    response_status: Option<StatusCode>,
    response_reason: Option<String>,
    callable: HandlerFn,
}

impl HandlerMethod {
    #[must_use]
    pub fn builder(handler_type: &Arc<HandlerType>, method_name: &str) -> HandlerMethodBuilder {
        HandlerMethodBuilder {
            id: Arc::from(format!("{}#{}", handler_type.name(), method_name)),
            handler_type: Arc::clone(handler_type),
            parameters: Vec::new(),
            return_type: ReturnType::Void,
            response_status: None,
            response_reason: None,
        }
    }

    /// `HandlerType#method`; two descriptors with the same id are the same handler.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn handler_type(&self) -> &Arc<HandlerType> {
        &self.handler_type
    }

    #[must_use]
    pub fn parameters(&self) -> &[MethodParameter] {
        &self.parameters
    }

    #[must_use]
    pub fn return_type(&self) -> &ReturnType {
        &self.return_type
    }

    #[must_use]
    pub fn response_status(&self) -> Option<StatusCode> {
        self.response_status
    }

    #[must_use]
    pub fn response_reason(&self) -> Option<&str> {
        self.response_reason.as_deref()
    }

    pub(crate) fn callable(&self) -> &HandlerFn {
        &self.callable
    }
}

impl fmt::Debug for HandlerMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerMethod")
            .field("id", &self.id)
            .field("parameters", &self.parameters)
            .field("return_type", &self.return_type)
            .field("response_status", &self.response_status)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for HandlerMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

pub struct HandlerMethodBuilder {
    id: Arc<str>,
    handler_type: Arc<HandlerType>,
    parameters: Vec<MethodParameter>,
    return_type: ReturnType,
    response_status: Option<StatusCode>,
    response_reason: Option<String>,
}

impl HandlerMethodBuilder {
    /// Parameters are indexed in the order they are added.
    #[must_use]
    pub fn param(mut self, mut parameter: MethodParameter) -> Self {
        parameter.index = self.parameters.len();
        self.parameters.push(parameter);
        self
    }

    #[must_use]
    pub fn returns(mut self, return_type: ReturnType) -> Self {
        self.return_type = return_type;
        self
    }

    #[must_use]
    pub fn response_status(mut self, status: StatusCode, reason: Option<&str>) -> Self {
        self.response_status = Some(status);
        self.response_reason = reason.map(str::to_string);
        self
    }

    pub fn build<F>(self, callable: F) -> Arc<HandlerMethod>
    where
        F: Fn(&mut Invocation<'_>) -> Result<ReturnValue, HandlerError> + Send + Sync + 'static,
    {
        Arc::new(HandlerMethod {
            id: self.id,
            handler_type: self.handler_type,
            parameters: self.parameters,
            return_type: self.return_type,
            response_status: self.response_status,
            response_reason: self.response_reason,
            callable: Arc::new(callable),
        })
    }
}
