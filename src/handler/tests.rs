use super::*;
use crate::context::RequestContext;
use crate::model::{AttributeValue, ModelContainer};
use serde::Deserialize;
use serde_json::json;

#[test]
fn test_builder_indexes_parameters() {
    let ty = HandlerType::new("Orders").build();
    let handler = HandlerMethod::builder(&ty, "create")
        .param(MethodParameter::request_param("sku", ParamType::Simple(ScalarType::String)))
        .param(MethodParameter::new("model", ParamType::Model))
        .returns(ReturnType::ViewName)
        .build(|_| Ok(ReturnValue::Void));
    let indexes: Vec<_> = handler.parameters().iter().map(|p| p.index).collect();
    assert_eq!(indexes, vec![0, 1]);
    assert_eq!(handler.to_string(), "Orders#create");
}

#[test]
fn test_binding_name_prefers_explicit_name() {
    let param = MethodParameter::new("orderId", ParamType::Simple(ScalarType::Integer))
        .bound(Binding::PathVariable { name: Some("id".into()) });
    assert_eq!(param.binding_name(), "id");
    let implicit = MethodParameter::request_param("q", ParamType::Simple(ScalarType::String));
    assert_eq!(implicit.binding_name(), "q");
}

#[test]
fn test_model_attribute_name() {
    let by_type = MethodParameter::model_attribute("c", "ShoppingCart");
    assert_eq!(by_type.model_attribute_name(), "shoppingCart");
    let named = by_type
        .clone()
        .bound(Binding::ModelAttribute { name: Some("cart".into()) });
    assert_eq!(named.model_attribute_name(), "cart");
}

#[test]
fn test_default_value_makes_parameter_optional() {
    let param = MethodParameter::request_param("page", ParamType::Simple(ScalarType::Integer))
        .with_default("1");
    assert!(!param.required);
}

#[test]
fn test_return_type_of_concrete_values() {
    assert_eq!(ReturnType::of(&ReturnValue::Void), ReturnType::Void);
    assert_eq!(ReturnType::of(&ReturnValue::view_name("x")), ReturnType::ViewName);
    assert_eq!(
        ReturnType::of(&ReturnValue::Attribute(AttributeValue::new(1))),
        ReturnType::Object
    );
}

#[test]
fn test_invocation_accessors() {
    #[derive(Deserialize)]
    struct Order {
        sku: String,
    }

    let ctx = RequestContext::get("/");
    let mut container = ModelContainer::new();
    let mut inv = Invocation::new(
        vec![
            ArgumentValue::Value(AttributeValue::new(5)),
            ArgumentValue::Value(AttributeValue::typed("Order", json!({"sku": "a-1"}))),
            ArgumentValue::Absent,
        ],
        &mut container,
        &ctx,
    );
    assert_eq!(inv.i64_arg(0), Some(5));
    let order: Order = inv.deserialize(1).unwrap();
    assert_eq!(order.sku, "a-1");
    assert!(inv.value(2).is_none());
    assert!(inv.deserialize::<Order>(2).is_err());
    inv.model().add_attribute("seen", true);
    assert!(container.model().contains("seen"));
}
