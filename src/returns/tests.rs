use super::*;
use crate::context::{AsyncResult, RequestContext};
use crate::error::DispatchError;
use crate::handler::{ResponseEntity, ReturnType, ReturnValue};
use crate::model::{AttributeValue, ModelAndView, ModelContainer, ModelMap, View, ViewSelector};
use http::header::{ETAG, IF_NONE_MATCH};
use http::{HeaderValue, StatusCode};
use serde_json::json;
use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn pipeline() -> ReturnValueHandlerComposite {
    ReturnValueHandlerComposite::with_defaults(Vec::new(), AsyncReturnHandler::default())
}

fn handle(
    value: ReturnValue,
    declared: ReturnType,
    container: &mut ModelContainer,
    ctx: &RequestContext,
) -> Result<(), DispatchError> {
    pipeline().handle_return_value("T#h", value, &declared, container, ctx)
}

#[derive(Debug)]
struct RedirectView;

impl View for RedirectView {
    fn is_redirect(&self) -> bool {
        true
    }
}

#[test]
fn test_effective_return_type() {
    let (pending, _setter) = AsyncResult::deferred();
    assert_eq!(
        effective_return_type(&ReturnType::Object, &ReturnValue::Async(pending)),
        ReturnType::Async
    );
    assert_eq!(
        effective_return_type(&ReturnType::ViewName, &ReturnValue::Void),
        ReturnType::ViewName
    );
    let named = ReturnType::ModelAttribute { name: Some("cart".into()) };
    assert_eq!(
        effective_return_type(&named, &ReturnValue::Attribute(AttributeValue::new(1))),
        named
    );
    assert_eq!(
        effective_return_type(&ReturnType::Object, &ReturnValue::view_name("home")),
        ReturnType::ViewName
    );
}

#[test]
fn test_view_name_and_redirect_prefix() {
    let ctx = RequestContext::get("/");
    let mut container = ModelContainer::new();
    handle(ReturnValue::view_name("home"), ReturnType::ViewName, &mut container, &ctx).unwrap();
    assert_eq!(container.view_name(), Some("home"));
    assert!(!container.is_redirect_model_scenario());

    let mut container = ModelContainer::new();
    handle(
        ReturnValue::view_name("redirect:/orders"),
        ReturnType::ViewName,
        &mut container,
        &ctx,
    )
    .unwrap();
    assert!(container.is_redirect_model_scenario());
    assert!(is_redirect_view_name("redirect:/orders"));
}

#[test]
fn test_redirecting_view_object() {
    let ctx = RequestContext::get("/");
    let mut container = ModelContainer::new();
    let view: Arc<dyn View> = Arc::new(RedirectView);
    handle(ReturnValue::View(Arc::clone(&view)), ReturnType::View, &mut container, &ctx).unwrap();
    assert!(container.is_redirect_model_scenario());
    assert_eq!(container.view(), Some(&ViewSelector::View(view)));
}

#[test]
fn test_model_and_view_merges_model_and_status() {
    let ctx = RequestContext::get("/");
    let mut container = ModelContainer::new();
    container.add_attribute("kept", 1);
    let mav = ModelAndView::new("orders/list")
        .with_attribute("count", 3)
        .with_status(StatusCode::ACCEPTED);
    handle(ReturnValue::ModelAndView(mav), ReturnType::ModelAndView, &mut container, &ctx).unwrap();
    assert_eq!(container.view_name(), Some("orders/list"));
    assert!(container.contains_attribute("kept"));
    assert_eq!(container.model().get("count").unwrap().value(), &json!(3));
    assert_eq!(ctx.response().status, Some(StatusCode::ACCEPTED));
}

#[test]
fn test_void_model_and_view_marks_handled() {
    let ctx = RequestContext::get("/");
    let mut container = ModelContainer::new();
    handle(ReturnValue::Void, ReturnType::ModelAndView, &mut container, &ctx).unwrap();
    assert!(container.is_request_handled());
}

#[test]
fn test_returned_model_is_added() {
    let ctx = RequestContext::get("/");
    let mut container = ModelContainer::new();
    let model: ModelMap = [("a", 1), ("b", 2)].into_iter().collect();
    handle(ReturnValue::Model(model), ReturnType::Model, &mut container, &ctx).unwrap();
    assert_eq!(container.model().len(), 2);
}

#[test]
fn test_response_body_marks_handled() {
    let ctx = RequestContext::get("/");
    let mut container = ModelContainer::new();
    handle(
        ReturnValue::Body(json!({"ok": true})),
        ReturnType::ResponseBody,
        &mut container,
        &ctx,
    )
    .unwrap();
    assert!(container.is_request_handled());
    assert_eq!(ctx.response().body, Some(json!({"ok": true})));
}

#[test]
fn test_entity_and_not_modified() {
    let ctx = RequestContext::get("/");
    let mut container = ModelContainer::new();
    let entity = ResponseEntity::new(StatusCode::CREATED).with_body(json!({"id": 7}));
    handle(ReturnValue::Entity(entity), ReturnType::Entity, &mut container, &ctx).unwrap();
    assert!(container.is_request_handled());
    let response = ctx.response();
    assert_eq!(response.status, Some(StatusCode::CREATED));
    assert_eq!(response.body, Some(json!({"id": 7})));

    let ctx = RequestContext::get("/").with_header(IF_NONE_MATCH.as_str(), "\"v1\"");
    let mut container = ModelContainer::new();
    let mut entity = ResponseEntity::ok(json!({"id": 7}));
    entity.headers.insert(ETAG, HeaderValue::from_static("\"v1\""));
    handle(ReturnValue::Entity(entity), ReturnType::Entity, &mut container, &ctx).unwrap();
    let response = ctx.response();
    assert_eq!(response.status, Some(StatusCode::NOT_MODIFIED));
    assert!(response.body.is_none());
    assert!(ctx.is_not_modified());
}

#[test]
fn test_attribute_returns_use_declared_or_conventional_name() {
    let ctx = RequestContext::get("/");
    let mut container = ModelContainer::new();
    handle(
        ReturnValue::Attribute(AttributeValue::typed("Order", json!({"id": 1}))),
        ReturnType::ModelAttribute { name: Some("current".into()) },
        &mut container,
        &ctx,
    )
    .unwrap();
    assert!(container.contains_attribute("current"));

    handle(
        ReturnValue::Attribute(AttributeValue::typed("Order", json!({"id": 2}))),
        ReturnType::Object,
        &mut container,
        &ctx,
    )
    .unwrap();
    assert!(container.contains_attribute("order"));

    handle(
        ReturnValue::Attribute(AttributeValue::null()),
        ReturnType::Object,
        &mut container,
        &ctx,
    )
    .unwrap();
    assert_eq!(container.model().len(), 2);
}

struct Counting(AtomicUsize);

impl ReturnValueHandler for Counting {
    fn supports(&self, return_type: &ReturnType) -> bool {
        matches!(return_type, ReturnType::Custom(name) if name.as_ref() == "Report")
    }

    fn handle(
        &self,
        _value: ReturnValue,
        _return_type: &ReturnType,
        container: &mut ModelContainer,
        _ctx: &RequestContext,
    ) -> Result<(), DispatchError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        container.set_request_handled(true);
        Ok(())
    }
}

#[test]
fn test_custom_handler_and_unsupported_type() {
    let ctx = RequestContext::get("/");
    let report = || {
        let payload: Arc<dyn Any + Send + Sync> = Arc::new("pdf");
        ReturnValue::Custom(Arc::from("Report"), payload)
    };

    let mut container = ModelContainer::new();
    let err = handle(report(), ReturnType::Object, &mut container, &ctx).unwrap_err();
    assert!(matches!(err, DispatchError::UnsupportedReturnType { ref return_type, .. } if return_type == "Report"));

    let counting = Arc::new(Counting(AtomicUsize::new(0)));
    let composite = ReturnValueHandlerComposite::with_defaults(
        vec![Arc::clone(&counting) as Arc<dyn ReturnValueHandler>],
        AsyncReturnHandler::default(),
    );
    assert_eq!(composite.len(), pipeline().len() + 1);
    composite
        .handle_return_value("T#h", report(), &ReturnType::Object, &mut container, &ctx)
        .unwrap();
    assert_eq!(counting.0.load(Ordering::SeqCst), 1);
    assert!(container.is_request_handled());
}

#[tokio::test]
async fn test_async_value_starts_concurrent_handling() {
    let ctx = RequestContext::get("/");
    let mut container = ModelContainer::new();
    let (pending, setter) = AsyncResult::deferred();
    handle(ReturnValue::Async(pending), ReturnType::Object, &mut container, &ctx).unwrap();
    assert!(ctx.async_manager().is_concurrent_handling_started());
    assert!(setter.set_result(ReturnValue::view_name("done")));
    let result = ctx.async_manager().take_pending().unwrap().await.unwrap();
    assert_eq!(ReturnType::of(&result), ReturnType::ViewName);
}
