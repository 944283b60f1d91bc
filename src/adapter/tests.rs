use super::*;
use crate::context::{AsyncResult, RequestContext, Session};
use crate::error::DispatchError;
use crate::handler::{
    HandlerMethod, HandlerType, MethodParameter, ModelAttributeMethod, ParamType, ReturnType, ReturnValue,
};
use crate::model::{AttributeValue, ModelMap};
use crate::runtime_config::DispatchConfig;
use http::StatusCode;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn completed(outcome: HandlerOutcome) -> crate::model::ModelAndView {
    match outcome {
        HandlerOutcome::Completed(mav) => mav,
        other => panic!("expected a completed outcome, got {other:?}"),
    }
}

#[test]
fn test_global_producers_run_before_local_ones() {
    let ty = HandlerType::new("Shop")
        .model_attribute(ModelAttributeMethod::new("Shop#title", Some("title"), |_| {
            Ok(ReturnValue::Attribute(AttributeValue::new("local")))
        }))
        .model_attribute(ModelAttributeMethod::new("Shop#menu", None, |_| {
            Ok(ReturnValue::Attribute(AttributeValue::typed("Menu", json!({"items": 3}))))
        }))
        .build();
    let adapter = HandlerAdapter::builder(DispatchConfig::default())
        .model_attribute(ModelAttributeMethod::new("Global#title", Some("title"), |_| {
            Ok(ReturnValue::Attribute(AttributeValue::new("global")))
        }))
        .build();
    let handler = HandlerMethod::builder(&ty, "index")
        .returns(ReturnType::ViewName)
        .build(|_| Ok(ReturnValue::view_name("shop")));

    let mav = completed(adapter.handle(&RequestContext::get("/shop"), &handler).unwrap());
    assert_eq!(mav.model.get("title").unwrap().value(), &json!("global"));
    assert_eq!(mav.model.get("menu").unwrap().value(), &json!({"items": 3}));
}

#[test]
fn test_void_producer_writes_model_directly() {
    let ty = HandlerType::new("Shop")
        .model_attribute(
            ModelAttributeMethod::new("Shop#defaults", None, |inv| {
                inv.model().add_attribute("currency", "EUR");
                Ok(ReturnValue::Void)
            })
            .void(),
        )
        .build();
    let handler = HandlerMethod::builder(&ty, "index").build(|_| Ok(ReturnValue::Void));
    let mav = completed(HandlerAdapter::default().handle(&RequestContext::get("/"), &handler).unwrap());
    assert!(mav.model.contains("currency"));
    assert!(mav.view.is_none());
}

#[test]
fn test_missing_session_attribute_fails_before_invocation() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let ty = HandlerType::new("Checkout").session_attributes(["cart"]).build();
    let handler = HandlerMethod::builder(&ty, "pay")
        .param(MethodParameter::model_attribute("cart", "Cart"))
        .build(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(ReturnValue::Void)
        });
    let ctx = RequestContext::post("/checkout").with_session(Arc::new(Session::new()));

    let err = HandlerAdapter::default().handle(&ctx, &handler).unwrap_err();
    assert!(matches!(err, DispatchError::MissingSessionAttribute { ref name } if name == "cart"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_session_attributes_stored_and_cleaned_up() {
    let ty = HandlerType::new("Checkout").session_attributes(["cart"]).build();
    let add = HandlerMethod::builder(&ty, "add")
        .returns(ReturnType::ViewName)
        .build(|inv| {
            inv.model().add_attribute("cart", AttributeValue::typed("Cart", json!({"items": 1})));
            Ok(ReturnValue::view_name("cart"))
        });
    let finish = HandlerMethod::builder(&ty, "finish")
        .param(MethodParameter::model_attribute("cart", "Cart"))
        .returns(ReturnType::ViewName)
        .build(|inv| {
            inv.session_status().set_complete();
            Ok(ReturnValue::view_name("done"))
        });
    let adapter = HandlerAdapter::default();
    let session = Arc::new(Session::new());

    adapter
        .handle(&RequestContext::get("/cart").with_session(Arc::clone(&session)), &add)
        .unwrap();
    assert!(session.get_attribute("cart").is_some());

    let mav = completed(
        adapter
            .handle(&RequestContext::post("/finish").with_session(Arc::clone(&session)), &finish)
            .unwrap(),
    );
    assert!(mav.model.contains("cart"));
    assert!(session.get_attribute("cart").is_none());
}

#[test]
fn test_binding_results_added_for_object_attributes() {
    let ty = HandlerType::new("Orders").build();
    let handler = HandlerMethod::builder(&ty, "edit")
        .param(MethodParameter::model_attribute("order", "Order"))
        .returns(ReturnType::ViewName)
        .build(|inv| {
            inv.model().add_attribute("count", 2);
            Ok(ReturnValue::view_name("orders/edit"))
        });
    let ctx = RequestContext::get("/orders/edit?qty=4");
    let mav = completed(HandlerAdapter::default().handle(&ctx, &handler).unwrap());

    let key = format!("{BINDING_RESULT_PREFIX}order");
    let binding = mav.model.get(&key).unwrap();
    assert_eq!(binding.type_name(), Some("BindingResult"));
    assert_eq!(binding.value()["object_name"], json!("order"));
    assert!(!mav.model.contains(&format!("{BINDING_RESULT_PREFIX}count")));
}

#[test]
fn test_binding_result_reports_rejected_values() {
    let ty = HandlerType::new("Orders")
        .model_attribute(ModelAttributeMethod::new("Orders#order", Some("order"), |_| {
            Ok(ReturnValue::Attribute(AttributeValue::typed("Order", json!({"qty": 1}))))
        }))
        .build();
    let handler = HandlerMethod::builder(&ty, "edit")
        .param(MethodParameter::model_attribute("order", "Order"))
        .returns(ReturnType::ViewName)
        .build(|_| Ok(ReturnValue::view_name("orders/edit")));
    let ctx = RequestContext::get("/orders/edit?qty=lots");
    let mav = completed(HandlerAdapter::default().handle(&ctx, &handler).unwrap());

    assert_eq!(mav.model.get("order").unwrap().value(), &json!({"qty": 1}));
    let binding = mav.model.get(&format!("{BINDING_RESULT_PREFIX}order")).unwrap();
    assert_eq!(
        binding.value()["errors"],
        json!([{"field": "qty", "rejected_value": "lots", "code": "typeMismatch"}])
    );
}

#[test]
fn test_map_attributes_get_no_binding_result() {
    let ty = HandlerType::new("Prices").build();
    let handler = HandlerMethod::builder(&ty, "list")
        .returns(ReturnType::ViewName)
        .build(|inv| {
            let mut prices = std::collections::HashMap::new();
            prices.insert("apple".to_string(), 3);
            inv.model().add_attribute("prices", AttributeValue::of(&prices).unwrap());
            Ok(ReturnValue::view_name("prices"))
        });
    let ctx = RequestContext::get("/prices");
    let mav = completed(HandlerAdapter::default().handle(&ctx, &handler).unwrap());

    assert!(mav.model.contains("prices"));
    assert!(!mav.model.contains(&format!("{BINDING_RESULT_PREFIX}prices")));
}

#[test]
fn test_declared_status_with_void_return_is_handled() {
    let ty = HandlerType::new("Items").build();
    let handler = HandlerMethod::builder(&ty, "delete")
        .response_status(StatusCode::NO_CONTENT, None)
        .build(|_| Ok(ReturnValue::Void));
    let ctx = RequestContext::post("/items/1");
    let outcome = HandlerAdapter::default().handle(&ctx, &handler).unwrap();
    assert!(matches!(outcome, HandlerOutcome::Handled));
    assert_eq!(ctx.response().status, Some(StatusCode::NO_CONTENT));
}

#[test]
fn test_status_reason_short_circuits_return_value() {
    let ty = HandlerType::new("Items").build();
    let handler = HandlerMethod::builder(&ty, "gone")
        .response_status(StatusCode::GONE, Some("item retired"))
        .returns(ReturnType::ViewName)
        .build(|_| Ok(ReturnValue::view_name("never")));
    let ctx = RequestContext::get("/items/1");
    let outcome = HandlerAdapter::default().handle(&ctx, &handler).unwrap();
    assert!(matches!(outcome, HandlerOutcome::Handled));
    assert_eq!(ctx.response().reason.as_deref(), Some("item retired"));
}

#[test]
fn test_input_flash_and_redirect_output_flash() {
    let ty = HandlerType::new("Orders").build();
    let handler = HandlerMethod::builder(&ty, "create")
        .param(MethodParameter::new("redirect", ParamType::RedirectAttributes))
        .returns(ReturnType::ViewName)
        .build(|inv| {
            if let Some(redirect) = inv.redirect_attributes() {
                redirect.add_flash_attribute("notice", "created");
                redirect.add_attribute("id", 7);
            }
            Ok(ReturnValue::view_name("redirect:/orders/7"))
        });
    let flash: ModelMap = [("previous", "kept")].into_iter().collect();
    let ctx = RequestContext::post("/orders").with_input_flash(flash);
    let mav = completed(HandlerAdapter::default().handle(&ctx, &handler).unwrap());

    assert_eq!(mav.view_name(), Some("redirect:/orders/7"));
    assert!(mav.model.contains("id"));
    assert!(!mav.model.contains("previous"));
    assert!(mav.output_flash.contains("notice"));
}

#[test]
fn test_handler_error_propagates_verbatim() {
    let ty = HandlerType::new("Broken").build();
    let handler = HandlerMethod::builder(&ty, "fail").build(|_| Err("database unavailable".into()));
    let err = HandlerAdapter::default()
        .handle(&RequestContext::get("/"), &handler)
        .unwrap_err();
    assert!(matches!(err, DispatchError::Handler(_)));
    assert_eq!(err.to_string(), "database unavailable");
}

#[test]
fn test_session_attributes_handler_is_cached_per_type() {
    let adapter = HandlerAdapter::default();
    let ty = HandlerType::new("Checkout").session_attributes(["cart"]).build();
    let first = adapter.session_attributes_handler(&ty);
    let second = adapter.session_attributes_handler(&ty);
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_session_attributes_handler_tells_same_named_types_apart() {
    let adapter = HandlerAdapter::default();
    let wizard = HandlerType::new("Flow").session_attributes(["step"]).build();
    let plain = HandlerType::new("Flow").build();

    let first = adapter.session_attributes_handler(&wizard);
    let second = adapter.session_attributes_handler(&plain);
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(first.has_session_attributes());
    assert!(!second.has_session_attributes());
    assert_eq!(first.known_names(), vec!["step".to_string()]);
}

#[tokio::test]
async fn test_async_result_resumes_with_same_container() {
    let ty = HandlerType::new("Reports").build();
    let handler = HandlerMethod::builder(&ty, "build")
        .returns(ReturnType::Async)
        .build(|inv| {
            inv.model().add_attribute("requested", true);
            Ok(ReturnValue::Async(AsyncResult::from_future(async {
                Ok(ReturnValue::view_name("reports/ready"))
            })))
        });
    let adapter = HandlerAdapter::default();
    let ctx = RequestContext::get("/reports");

    let pending = match adapter.handle(&ctx, &handler).unwrap() {
        HandlerOutcome::Suspended(pending) => pending,
        other => panic!("expected suspension, got {other:?}"),
    };
    assert!(pending.container().model().contains("requested"));

    let (suspended, result) = pending.join().await;
    let mav = completed(adapter.resume(&ctx, suspended, result).unwrap());
    assert_eq!(mav.view_name(), Some("reports/ready"));
    assert!(mav.model.contains("requested"));
    assert!(!ctx.async_manager().is_concurrent_handling_started());
}

#[tokio::test]
async fn test_async_error_resumes_as_handler_error() {
    let ty = HandlerType::new("Reports").build();
    let handler = HandlerMethod::builder(&ty, "build")
        .returns(ReturnType::Async)
        .build(|_| {
            let (result, setter) = AsyncResult::deferred();
            setter.set_error("report failed");
            Ok(ReturnValue::Async(result))
        });
    let adapter = HandlerAdapter::default();
    let ctx = RequestContext::get("/reports");
    let HandlerOutcome::Suspended(pending) = adapter.handle(&ctx, &handler).unwrap() else {
        panic!("expected suspension");
    };
    let (suspended, result) = pending.join().await;
    let err = adapter.resume(&ctx, suspended, result).unwrap_err();
    assert!(matches!(err, DispatchError::Handler(_)));
    assert_eq!(err.to_string(), "report failed");
}
