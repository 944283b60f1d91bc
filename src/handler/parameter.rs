use std::fmt;
use std::sync::Arc;

/// Scalar types request strings are converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    String,
    Integer,
    Float,
    Boolean,
}

/// Declared type of a handler parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamType {
    Simple(ScalarType),
    /// Name -> value map (all params, all headers, all path variables).
    Map,
    /// A domain type, bound from the model or the request body.
    Object(Arc<str>),
    Model,
    SessionStatus,
    RedirectAttributes,
    Locale,
    Principal,
    /// Resolved only by a custom resolver registered for this name.
    Custom(Arc<str>),
}

impl ParamType {
    #[must_use]
    pub fn object(type_name: &str) -> Self {
        ParamType::Object(Arc::from(type_name))
    }

    #[must_use]
    pub fn is_simple(&self) -> bool {
        matches!(self, ParamType::Simple(_))
    }

    /// Declared type name used by session attribute declarations.
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        match self {
            ParamType::Object(name) | ParamType::Custom(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Simple(s) => write!(f, "{s:?}"),
            ParamType::Map => f.write_str("Map"),
            ParamType::Object(name) | ParamType::Custom(name) => f.write_str(name),
            ParamType::Model => f.write_str("Model"),
            ParamType::SessionStatus => f.write_str("SessionStatus"),
            ParamType::RedirectAttributes => f.write_str("RedirectAttributes"),
            ParamType::Locale => f.write_str("Locale"),
            ParamType::Principal => f.write_str("Principal"),
        }
    }
}

/// Where a parameter's value comes from, when declared explicitly.
/// A `None` name means "use the parameter name".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Binding {
    None,
    RequestParam { name: Option<String> },
    PathVariable { name: Option<String> },
    RequestHeader { name: Option<String> },
    RequestBody,
    ModelAttribute { name: Option<String> },
}

/// One declared handler parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodParameter {
    pub index: usize,
    pub name: String,
    pub ty: ParamType,
    pub binding: Binding,
    pub required: bool,
    pub default_value: Option<String>,
}

impl MethodParameter {
    /// Unannotated parameter; the index is assigned by the method builder.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            index: 0,
            name: name.into(),
            ty,
            binding: Binding::None,
            required: true,
            default_value: None,
        }
    }

    #[must_use]
    pub fn request_param(name: impl Into<String>, ty: ParamType) -> Self {
        Self::new(name, ty).bound(Binding::RequestParam { name: None })
    }

    #[must_use]
    pub fn path_variable(name: impl Into<String>, ty: ParamType) -> Self {
        Self::new(name, ty).bound(Binding::PathVariable { name: None })
    }

    #[must_use]
    pub fn request_header(name: impl Into<String>, ty: ParamType) -> Self {
        Self::new(name, ty).bound(Binding::RequestHeader { name: None })
    }

    #[must_use]
    pub fn request_body(name: impl Into<String>, type_name: &str) -> Self {
        Self::new(name, ParamType::object(type_name)).bound(Binding::RequestBody)
    }

    #[must_use]
    pub fn model_attribute(name: impl Into<String>, type_name: &str) -> Self {
        Self::new(name, ParamType::object(type_name)).bound(Binding::ModelAttribute { name: None })
    }

    #[must_use]
    pub fn bound(mut self, binding: Binding) -> Self {
        self.binding = binding;
        self
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// A default value also makes the parameter optional.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self.required = false;
        self
    }

    /// Name to look up: the binding's explicit name, else the parameter name.
    #[must_use]
    pub fn binding_name(&self) -> &str {
        let explicit = match &self.binding {
            Binding::RequestParam { name }
            | Binding::PathVariable { name }
            | Binding::RequestHeader { name }
            | Binding::ModelAttribute { name } => name.as_deref(),
            Binding::None | Binding::RequestBody => None,
        };
        explicit.filter(|n| !n.is_empty()).unwrap_or(&self.name)
    }

    /// Model attribute name: explicit name, else the decapitalized type name,
    /// else the parameter name.
    #[must_use]
    pub fn model_attribute_name(&self) -> String {
        if let Binding::ModelAttribute { name: Some(name) } = &self.binding {
            if !name.is_empty() {
                return name.clone();
            }
        }
        match self.ty.type_name() {
            Some(type_name) => crate::model::decapitalize(type_name),
            None => self.name.clone(),
        }
    }
}
