use super::composite::ArgumentResolver;
use super::named::parse_bool;
use crate::context::RequestContext;
use crate::error::DispatchError;
use crate::handler::{ArgumentValue, Binding, MethodParameter, ParamType};
use crate::model::{binding_result, binding_result_key, AttributeValue, FieldError, ModelContainer};
use serde_json::{Map, Value};
use tracing::debug;

/// Model attributes: taken from the model when present, otherwise created,
/// then bound from request parameters and URI variables.
///
/// In default-resolution mode it also claims unannotated non-simple
/// parameters; that instance is the last catch-all. Custom types are left
/// to custom resolvers.
#[derive(Debug, Default)]
pub struct ModelAttributeResolver {
    annotation_not_required: bool,
}

impl ModelAttributeResolver {
    #[must_use]
    pub fn new(annotation_not_required: bool) -> Self {
        Self {
            annotation_not_required,
        }
    }
}

impl ArgumentResolver for ModelAttributeResolver {
    fn supports(&self, parameter: &MethodParameter) -> bool {
        match parameter.binding {
            Binding::ModelAttribute { .. } => true,
            Binding::None => {
                self.annotation_not_required
                    && !parameter.ty.is_simple()
                    && !matches!(parameter.ty, ParamType::Custom(_))
            }
            _ => false,
        }
    }

    fn resolve(
        &self,
        parameter: &MethodParameter,
        container: &mut ModelContainer,
        ctx: &RequestContext,
    ) -> Result<ArgumentValue, DispatchError> {
        let name = parameter.model_attribute_name();
        let type_name = parameter.ty.type_name().map(str::to_string);
        let existing = container.model().get(&name).cloned();
        let attribute = match existing {
            Some(existing) => existing,
            None => create_attribute(&name, type_name.as_deref(), ctx),
        };
        let (bound, errors) = bind(attribute, ctx);

        // Re-add so the bound attribute sits at the end of the model.
        let model = container.model_mut();
        model.remove(&name);
        model.add_attribute(name.clone(), bound.clone());
        let key = binding_result_key(&name);
        model.remove(&key);
        if !errors.is_empty() {
            debug!(attribute = %name, errors = errors.len(), "Model attribute binding rejected values");
            model.add_attribute(key, binding_result(&name, &errors));
        }
        Ok(ArgumentValue::Value(bound))
    }
}

/// A request value named like the attribute seeds it; otherwise an empty object.
fn create_attribute(name: &str, type_name: Option<&str>, ctx: &RequestContext) -> AttributeValue {
    let seed = ctx
        .path_variable(name)
        .or_else(|| ctx.param(name).map(str::to_string));
    let value = match seed {
        Some(seed) => Value::String(seed),
        None => Value::Object(Map::new()),
    };
    match type_name {
        Some(type_name) => AttributeValue::typed(type_name, value),
        None => AttributeValue::new(value),
    }
}

/// Copy request parameters and URI variables onto matching object fields.
/// Existing numeric and boolean fields keep their JSON type; a request
/// string that does not parse as that type leaves the field untouched and
/// is reported as a type mismatch.
fn bind(attribute: AttributeValue, ctx: &RequestContext) -> (AttributeValue, Vec<FieldError>) {
    if !attribute.value().is_object() {
        return (attribute, Vec::new());
    }
    let type_name = attribute.type_name().map(str::to_string);
    let Value::Object(mut fields) = attribute.into_value() else {
        return (AttributeValue::null(), Vec::new());
    };
    let mut errors = Vec::new();

    let path_vars = ctx.path_variables();
    let sources = ctx
        .params()
        .iter()
        .map(|(k, v)| (k.as_ref(), v.as_str()))
        .chain(path_vars.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    for (name, raw) in sources {
        let converted = match fields.get(name) {
            Some(Value::Number(_)) => raw
                .parse::<i64>()
                .map(Value::from)
                .or_else(|_| raw.parse::<f64>().map(Value::from))
                .ok(),
            Some(Value::Bool(_)) => parse_bool(raw).map(Value::Bool),
            _ => Some(Value::String(raw.to_string())),
        };
        match converted {
            Some(value) => {
                fields.insert(name.to_string(), value);
            }
            None => errors.push(FieldError::type_mismatch(name, raw)),
        }
    }

    let bound = match type_name {
        Some(type_name) => AttributeValue::typed(type_name, Value::Object(fields)),
        None => AttributeValue::new(Value::Object(fields)),
    };
    (bound, errors)
}

/// The request body, consumed once.
#[derive(Debug, Default)]
pub struct RequestBodyResolver;

impl ArgumentResolver for RequestBodyResolver {
    fn supports(&self, parameter: &MethodParameter) -> bool {
        parameter.binding == Binding::RequestBody
    }

    fn resolve(
        &self,
        parameter: &MethodParameter,
        _container: &mut ModelContainer,
        ctx: &RequestContext,
    ) -> Result<ArgumentValue, DispatchError> {
        match ctx.take_body()? {
            Some(body) => Ok(ArgumentValue::Value(match parameter.ty.type_name() {
                Some(type_name) => AttributeValue::typed(type_name, body),
                None => AttributeValue::new(body),
            })),
            None if parameter.required => Err(DispatchError::MissingParameter {
                source_kind: "request body",
                name: parameter.name.clone(),
            }),
            None => Ok(ArgumentValue::Absent),
        }
    }
}
