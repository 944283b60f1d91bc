//! Interceptor chains driven by the dispatcher
//!
//! # Test Coverage
//!
//! - Hook ordering: `before` forward, `after` and `complete` reversed
//! - Vetoes and `before` failures complete only accepted interceptors
//! - Include/exclude path mapping on the lookup path
//! - `TracingInterceptor` events and their correlation fields
//! - `MetricsInterceptor` counters over sync, failing and async dispatches

mod common;

use brrtmvc::context::{AsyncResult, RequestContext};
use brrtmvc::dispatcher::{DispatchOutcome, Dispatcher};
use brrtmvc::error::DispatchError;
use brrtmvc::handler::{HandlerMethod, HandlerType, ReturnType, ReturnValue};
use brrtmvc::interceptor::{Interceptor, MappedInterceptor, MetricsInterceptor, TracingInterceptor};
use brrtmvc::model::ModelAndView;
use brrtmvc::runtime_config::DispatchConfig;
use common::fixtures;
use common::log_capture::CapturedLogs;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

type Journal = Arc<Mutex<Vec<String>>>;

/// Records every hook call as `"<name>.<hook>"`.
struct Recorder {
    name: &'static str,
    journal: Journal,
    veto: bool,
    fail: bool,
}

impl Recorder {
    fn with(name: &'static str, journal: &Journal, veto: bool, fail: bool) -> Arc<Self> {
        Arc::new(Self {
            name,
            journal: Arc::clone(journal),
            veto,
            fail,
        })
    }

    fn new(name: &'static str, journal: &Journal) -> Arc<Self> {
        Self::with(name, journal, false, false)
    }

    fn vetoing(name: &'static str, journal: &Journal) -> Arc<Self> {
        Self::with(name, journal, true, false)
    }

    fn failing(name: &'static str, journal: &Journal) -> Arc<Self> {
        Self::with(name, journal, false, true)
    }

    fn record(&self, hook: &str) {
        self.journal.lock().push(format!("{}.{hook}", self.name));
    }
}

impl Interceptor for Recorder {
    fn before(&self, _ctx: &RequestContext, _handler: &HandlerMethod) -> Result<bool, DispatchError> {
        self.record("before");
        if self.fail {
            return Err(DispatchError::MissingParameter {
                source_kind: "request header",
                name: "authorization".to_string(),
            });
        }
        Ok(!self.veto)
    }

    fn after(
        &self,
        _ctx: &RequestContext,
        _handler: &HandlerMethod,
        model_and_view: Option<&mut ModelAndView>,
    ) -> Result<(), DispatchError> {
        self.record(if model_and_view.is_some() { "after" } else { "after(handled)" });
        Ok(())
    }

    fn complete(
        &self,
        _ctx: &RequestContext,
        _handler: &HandlerMethod,
        error: Option<&DispatchError>,
        _latency: Duration,
    ) {
        self.record(if error.is_some() { "complete(error)" } else { "complete" });
    }

    fn concurrent_handling_started(&self, _ctx: &RequestContext, _handler: &HandlerMethod) {
        self.record("async");
    }
}

fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().clone()
}

fn view_handler(name: &str) -> Arc<HandlerMethod> {
    let ty = HandlerType::new("Pages").build();
    HandlerMethod::builder(&ty, name)
        .returns(ReturnType::ViewName)
        .build(|_| Ok(ReturnValue::view_name("pages/view")))
}

fn pages() -> brrtmvc::mapping::HandlerRegistry {
    let ty = HandlerType::new("Pages").build();
    let broken = HandlerMethod::builder(&ty, "broken").build(|_| Err("render failed".into()));
    let ping = HandlerMethod::builder(&ty, "ping")
        .returns(ReturnType::ResponseBody)
        .build(|_| Ok(ReturnValue::Body(serde_json::json!("pong"))));
    fixtures::registry(&[
        ("/pages/{name}", None, view_handler("show")),
        ("/admin/pages", None, view_handler("admin")),
        ("/broken", None, broken),
        ("/ping", None, ping),
    ])
}

#[test]
fn test_hooks_run_in_onion_order() {
    let journal = journal();
    let mut dispatcher = Dispatcher::with_config(pages(), DispatchConfig::default());
    dispatcher.add_interceptor(Recorder::new("a", &journal));
    dispatcher.add_interceptor(Recorder::new("b", &journal));

    dispatcher.dispatch(&RequestContext::get("/pages/home")).unwrap();
    assert_eq!(
        entries(&journal),
        vec!["a.before", "b.before", "b.after", "a.after", "b.complete", "a.complete"]
    );

    journal.lock().clear();
    dispatcher.dispatch(&RequestContext::get("/ping")).unwrap();
    assert_eq!(
        entries(&journal),
        vec!["a.before", "b.before", "b.after(handled)", "a.after(handled)", "b.complete", "a.complete"]
    );
}

#[test]
fn test_handler_error_skips_after_but_completes() {
    let journal = journal();
    let mut dispatcher = Dispatcher::with_config(pages(), DispatchConfig::default());
    dispatcher.add_interceptor(Recorder::new("a", &journal));

    let err = dispatcher.dispatch(&RequestContext::get("/broken")).unwrap_err();
    assert_eq!(err.to_string(), "render failed");
    assert_eq!(entries(&journal), vec!["a.before", "a.complete(error)"]);
}

#[test]
fn test_veto_completes_only_accepted_interceptors() {
    let journal = journal();
    let mut dispatcher = Dispatcher::with_config(pages(), DispatchConfig::default());
    dispatcher.add_interceptor(Recorder::new("a", &journal));
    dispatcher.add_interceptor(Recorder::vetoing("gate", &journal));
    dispatcher.add_interceptor(Recorder::new("c", &journal));

    let outcome = dispatcher.dispatch(&RequestContext::get("/pages/home")).unwrap();
    assert!(matches!(outcome, DispatchOutcome::Rejected));
    assert_eq!(entries(&journal), vec!["a.before", "gate.before", "a.complete"]);
}

#[test]
fn test_before_failure_is_returned_after_completion() {
    let journal = journal();
    let mut dispatcher = Dispatcher::with_config(pages(), DispatchConfig::default());
    dispatcher.add_interceptor(Recorder::new("a", &journal));
    dispatcher.add_interceptor(Recorder::failing("auth", &journal));

    let err = dispatcher.dispatch(&RequestContext::get("/pages/home")).unwrap_err();
    assert!(matches!(err, DispatchError::MissingParameter { ref name, .. } if name == "authorization"));
    assert_eq!(entries(&journal), vec!["a.before", "auth.before", "a.complete(error)"]);
}

#[test]
fn test_mapped_interceptor_uses_lookup_path() {
    let journal = journal();
    let mapped = MappedInterceptor::new(["/pages/**", "/admin/**"], ["/admin/**"], Recorder::new("m", &journal))
        .unwrap();
    let dispatcher = Dispatcher::with_config(pages(), DispatchConfig::default()).with_interceptor(mapped);

    dispatcher
        .dispatch(&RequestContext::get("/app/pages/home").with_context_path("/app"))
        .unwrap();
    assert_eq!(entries(&journal), vec!["m.before", "m.after", "m.complete"]);

    journal.lock().clear();
    dispatcher.dispatch(&RequestContext::get("/admin/pages")).unwrap();
    dispatcher.dispatch(&RequestContext::get("/ping")).unwrap();
    assert!(entries(&journal).is_empty());
}

#[test]
fn test_tracing_interceptor_events_carry_request_fields() {
    let logs = CapturedLogs::init();
    let mut dispatcher = Dispatcher::with_config(pages(), DispatchConfig::default());
    dispatcher.add_interceptor(Arc::new(TracingInterceptor::with_slow_threshold(Duration::from_secs(60))));

    let ctx = RequestContext::get("/pages/home");
    dispatcher.dispatch(&ctx).unwrap();
    let request_id = ctx.request_id().to_string();

    let started = logs.find("Handler execution started").unwrap();
    assert_eq!(started.level, Level::DEBUG);
    assert_eq!(started.field("request_id"), Some(request_id.as_str()));
    assert_eq!(started.field("handler"), Some("Pages#show"));
    assert_eq!(started.field("path"), Some("/pages/home"));

    let completed = logs.find("Handler execution completed").unwrap();
    assert_eq!(completed.level, Level::INFO);
    assert_eq!(completed.field("request_id"), Some(request_id.as_str()));
    assert!(completed.field("duration_us").is_some());

    let ctx = RequestContext::get("/broken");
    dispatcher.dispatch(&ctx).unwrap_err();
    let failed = logs.find("Handler execution failed").unwrap();
    assert_eq!(failed.level, Level::WARN);
    assert_eq!(failed.field("error"), Some("render failed"));
    assert_eq!(failed.field("handler"), Some("Pages#broken"));
}

#[test]
fn test_tracing_interceptor_flags_slow_handlers() {
    let logs = CapturedLogs::init();
    let ty = HandlerType::new("Pages").build();
    let slow = HandlerMethod::builder(&ty, "slow").build(|_| {
        std::thread::sleep(Duration::from_millis(5));
        Ok(ReturnValue::Void)
    });
    let mut dispatcher =
        Dispatcher::with_config(fixtures::registry(&[("/slow", None, slow)]), DispatchConfig::default());
    dispatcher.add_interceptor(Arc::new(TracingInterceptor::with_slow_threshold(Duration::from_millis(1))));

    dispatcher.dispatch(&RequestContext::get("/slow")).unwrap();
    let event = logs.find("Slow handler execution").unwrap();
    assert_eq!(event.level, Level::WARN);
    assert!(logs.find("Handler execution completed").is_none());
}

#[tokio::test]
async fn test_metrics_interceptor_counts_outcomes() {
    let logs = CapturedLogs::init();
    let ty = HandlerType::new("Jobs").build();
    let job = HandlerMethod::builder(&ty, "run")
        .returns(ReturnType::Async)
        .build(|_| {
            Ok(ReturnValue::Async(AsyncResult::from_future(async {
                Ok(ReturnValue::view_name("jobs/done"))
            })))
        });
    let mut registry = pages();
    registry
        .register(
            brrtmvc::mapping::RequestCriteria::builder().path("/jobs").build().unwrap(),
            job,
        )
        .unwrap();
    let metrics = Arc::new(MetricsInterceptor::new());
    let mut dispatcher = Dispatcher::with_config(registry, DispatchConfig::default());
    dispatcher.add_interceptor(Arc::clone(&metrics) as Arc<dyn Interceptor>);
    dispatcher.add_interceptor(Arc::new(TracingInterceptor::new()));

    dispatcher.dispatch(&RequestContext::get("/pages/home")).unwrap();
    dispatcher.dispatch(&RequestContext::get("/broken")).unwrap_err();
    dispatcher.dispatch(&RequestContext::get("/nowhere")).unwrap();
    let outcome = dispatcher
        .dispatch_to_completion(&RequestContext::get("/jobs"))
        .await
        .unwrap();
    assert!(matches!(outcome, DispatchOutcome::Completed(_)));

    // The async dispatch passes `before` twice: once on entry, once on resume.
    assert_eq!(metrics.request_count(), 4);
    assert_eq!(metrics.completed_count(), 3);
    assert_eq!(metrics.error_count(), 1);
    assert_eq!(metrics.async_started_count(), 1);
    assert!(logs.find("Handler execution suspended for async processing").is_some());
}
