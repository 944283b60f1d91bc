use super::value::AttributeValue;
use serde::Serialize;
use serde_json::{json, Value};

/// Prefix of the per-attribute binding result entries added to the model.
pub const BINDING_RESULT_PREFIX: &str = "brrtmvc.binding_result.";

/// A request value that could not be applied to a model attribute field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub rejected_value: String,
    pub code: &'static str,
}

impl FieldError {
    /// The raw value did not convert to the field's existing JSON type.
    #[must_use]
    pub fn type_mismatch(field: impl Into<String>, rejected_value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            rejected_value: rejected_value.into(),
            code: "typeMismatch",
        }
    }
}

/// Model key of the binding result for attribute `name`.
#[must_use]
pub fn binding_result_key(name: &str) -> String {
    format!("{BINDING_RESULT_PREFIX}{name}")
}

/// `BindingResult` entry for `object_name` carrying `errors`.
#[must_use]
pub fn binding_result(object_name: &str, errors: &[FieldError]) -> AttributeValue {
    let errors: Vec<Value> = errors
        .iter()
        .map(|e| json!({ "field": e.field, "rejected_value": e.rejected_value, "code": e.code }))
        .collect();
    AttributeValue::typed("BindingResult", json!({ "object_name": object_name, "errors": errors }))
}
