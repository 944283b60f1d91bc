use super::composite::ArgumentResolver;
use crate::context::RequestContext;
use crate::error::DispatchError;
use crate::handler::{ArgumentValue, Binding, MethodParameter, ParamType, ScalarType};
use crate::model::{AttributeValue, ModelContainer};
use serde_json::{Map, Value};

/// Convert a request string to the declared type.
pub(crate) fn convert(name: &str, raw: &str, ty: &ParamType) -> Result<AttributeValue, DispatchError> {
    let mismatch = |target: &str| DispatchError::TypeMismatch {
        name: name.to_string(),
        value: raw.to_string(),
        target: target.to_string(),
    };
    let value = match ty {
        ParamType::Simple(ScalarType::String) => AttributeValue::new(raw),
        ParamType::Simple(ScalarType::Integer) => {
            AttributeValue::new(raw.trim().parse::<i64>().map_err(|_| mismatch("integer"))?)
        }
        ParamType::Simple(ScalarType::Float) => {
            AttributeValue::new(raw.trim().parse::<f64>().map_err(|_| mismatch("float"))?)
        }
        ParamType::Simple(ScalarType::Boolean) => AttributeValue::new(parse_bool(raw).ok_or_else(|| mismatch("boolean"))?),
        ParamType::Object(type_name) | ParamType::Custom(type_name) => {
            AttributeValue::typed(type_name.as_ref(), raw)
        }
        _ => AttributeValue::new(raw),
    };
    Ok(value)
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Shared handling of a looked-up named value: defaults, required check,
/// conversion.
fn resolve_named(
    parameter: &MethodParameter,
    source_kind: &'static str,
    raw: Option<String>,
) -> Result<ArgumentValue, DispatchError> {
    let name = parameter.binding_name();
    let raw = match raw {
        Some(raw) if !raw.is_empty() => Some(raw),
        Some(raw) if parameter.default_value.is_none() => Some(raw),
        _ => parameter.default_value.clone(),
    };
    match raw {
        Some(raw) => Ok(ArgumentValue::Value(convert(name, &raw, &parameter.ty)?)),
        None if parameter.required => Err(DispatchError::MissingParameter {
            source_kind,
            name: name.to_string(),
        }),
        None => Ok(ArgumentValue::Absent),
    }
}

/// `name -> value` pairs as an untyped map attribute.
fn map_value<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> ArgumentValue {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.entry(k.to_string())
            .or_insert_with(|| Value::String(v.to_string()));
    }
    ArgumentValue::Value(AttributeValue::new(Value::Object(map)))
}

/// Request parameters.
///
/// In default-resolution mode it also claims unannotated simple-typed
/// parameters; that instance sits among the catch-alls.
#[derive(Debug, Default)]
pub struct RequestParamResolver {
    use_default_resolution: bool,
}

impl RequestParamResolver {
    #[must_use]
    pub fn new(use_default_resolution: bool) -> Self {
        Self {
            use_default_resolution,
        }
    }
}

impl ArgumentResolver for RequestParamResolver {
    fn supports(&self, parameter: &MethodParameter) -> bool {
        match &parameter.binding {
            Binding::RequestParam { name } => {
                parameter.ty != ParamType::Map || name.as_deref().is_some_and(|n| !n.is_empty())
            }
            Binding::None => self.use_default_resolution && parameter.ty.is_simple(),
            _ => false,
        }
    }

    fn resolve(
        &self,
        parameter: &MethodParameter,
        _container: &mut ModelContainer,
        ctx: &RequestContext,
    ) -> Result<ArgumentValue, DispatchError> {
        let raw = ctx.param(parameter.binding_name()).map(str::to_string);
        resolve_named(parameter, "request parameter", raw)
    }
}

/// All request parameters as a map (first value per name).
#[derive(Debug, Default)]
pub struct RequestParamMapResolver;

impl ArgumentResolver for RequestParamMapResolver {
    fn supports(&self, parameter: &MethodParameter) -> bool {
        matches!(&parameter.binding, Binding::RequestParam { name } if name.as_deref().map_or(true, str::is_empty))
            && parameter.ty == ParamType::Map
    }

    fn resolve(
        &self,
        _parameter: &MethodParameter,
        _container: &mut ModelContainer,
        ctx: &RequestContext,
    ) -> Result<ArgumentValue, DispatchError> {
        Ok(map_value(ctx.params().iter().map(|(k, v)| (k.as_ref(), v.as_str()))))
    }
}

/// URI template variables recorded by the registry.
#[derive(Debug, Default)]
pub struct PathVariableResolver;

impl ArgumentResolver for PathVariableResolver {
    fn supports(&self, parameter: &MethodParameter) -> bool {
        matches!(parameter.binding, Binding::PathVariable { .. }) && parameter.ty != ParamType::Map
    }

    fn resolve(
        &self,
        parameter: &MethodParameter,
        _container: &mut ModelContainer,
        ctx: &RequestContext,
    ) -> Result<ArgumentValue, DispatchError> {
        let raw = ctx.path_variable(parameter.binding_name());
        resolve_named(parameter, "path variable", raw)
    }
}

/// All URI template variables as a map.
#[derive(Debug, Default)]
pub struct PathVariableMapResolver;

impl ArgumentResolver for PathVariableMapResolver {
    fn supports(&self, parameter: &MethodParameter) -> bool {
        matches!(parameter.binding, Binding::PathVariable { .. }) && parameter.ty == ParamType::Map
    }

    fn resolve(
        &self,
        _parameter: &MethodParameter,
        _container: &mut ModelContainer,
        ctx: &RequestContext,
    ) -> Result<ArgumentValue, DispatchError> {
        let vars = ctx.match_info().map(|m| m.uri_variables).unwrap_or_default();
        Ok(map_value(vars.iter().map(|(k, v)| (k.as_ref(), v.as_str()))))
    }
}

/// Request headers; names are case-insensitive.
#[derive(Debug, Default)]
pub struct RequestHeaderResolver;

impl ArgumentResolver for RequestHeaderResolver {
    fn supports(&self, parameter: &MethodParameter) -> bool {
        matches!(parameter.binding, Binding::RequestHeader { .. }) && parameter.ty != ParamType::Map
    }

    fn resolve(
        &self,
        parameter: &MethodParameter,
        _container: &mut ModelContainer,
        ctx: &RequestContext,
    ) -> Result<ArgumentValue, DispatchError> {
        let name = parameter.binding_name().to_ascii_lowercase();
        let raw = ctx.header(&name).map(str::to_string);
        resolve_named(parameter, "request header", raw)
    }
}

/// All request headers as a map (first value per name).
#[derive(Debug, Default)]
pub struct RequestHeaderMapResolver;

impl ArgumentResolver for RequestHeaderMapResolver {
    fn supports(&self, parameter: &MethodParameter) -> bool {
        matches!(parameter.binding, Binding::RequestHeader { .. }) && parameter.ty == ParamType::Map
    }

    fn resolve(
        &self,
        _parameter: &MethodParameter,
        _container: &mut ModelContainer,
        ctx: &RequestContext,
    ) -> Result<ArgumentValue, DispatchError> {
        Ok(map_value(ctx.headers().iter().filter_map(|(k, v)| {
            v.to_str().ok().map(|v| (k.as_str(), v))
        })))
    }
}
