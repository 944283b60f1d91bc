use super::*;
use crate::context::RequestContext;
use crate::error::DispatchError;
use crate::handler::{HandlerMethod, HandlerType, ReturnValue};
use crate::model::ModelAndView;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

type Log = Arc<Mutex<Vec<String>>>;

struct Recording {
    name: &'static str,
    veto: bool,
    fail: bool,
    log: Log,
}

impl Recording {
    fn new(name: &'static str, log: &Log) -> Arc<dyn Interceptor> {
        Arc::new(Self {
            name,
            veto: false,
            fail: false,
            log: Arc::clone(log),
        })
    }

    fn vetoing(name: &'static str, log: &Log) -> Arc<dyn Interceptor> {
        Arc::new(Self {
            name,
            veto: true,
            fail: false,
            log: Arc::clone(log),
        })
    }

    fn failing(name: &'static str, log: &Log) -> Arc<dyn Interceptor> {
        Arc::new(Self {
            name,
            veto: false,
            fail: true,
            log: Arc::clone(log),
        })
    }
}

impl Interceptor for Recording {
    fn before(&self, _ctx: &RequestContext, _handler: &HandlerMethod) -> Result<bool, DispatchError> {
        self.log.lock().push(format!("before:{}", self.name));
        if self.fail {
            return Err(DispatchError::async_failure("interceptor failed"));
        }
        Ok(!self.veto)
    }

    fn after(
        &self,
        _ctx: &RequestContext,
        _handler: &HandlerMethod,
        model_and_view: Option<&mut ModelAndView>,
    ) -> Result<(), DispatchError> {
        self.log.lock().push(format!("after:{}", self.name));
        if let Some(mav) = model_and_view {
            mav.model.add_attribute(self.name, true);
        }
        Ok(())
    }

    fn complete(
        &self,
        _ctx: &RequestContext,
        _handler: &HandlerMethod,
        error: Option<&DispatchError>,
        _latency: Duration,
    ) {
        let suffix = if error.is_some() { ":err" } else { "" };
        self.log.lock().push(format!("complete:{}{}", self.name, suffix));
    }
}

fn handler() -> Arc<HandlerMethod> {
    let ty = HandlerType::new("T").build();
    HandlerMethod::builder(&ty, "h").build(|_| Ok(ReturnValue::Void))
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().clone()
}

#[test]
fn test_full_lifecycle_order() {
    let log = Log::default();
    let mut chain = HandlerExecutionChain::new(
        handler(),
        vec![Recording::new("a", &log), Recording::new("b", &log)],
    );
    let ctx = RequestContext::get("/");
    assert!(chain.apply_before(&ctx).unwrap());
    let mut mav = ModelAndView::new("v");
    chain.apply_after(&ctx, Some(&mut mav)).unwrap();
    chain.trigger_completion(&ctx, None);
    chain.trigger_completion(&ctx, None);

    assert_eq!(
        entries(&log),
        vec!["before:a", "before:b", "after:b", "after:a", "complete:b", "complete:a"]
    );
    let names: Vec<_> = mav.model.names().collect();
    assert_eq!(names, vec!["b", "a"]);
}

#[test]
fn test_veto_completes_only_accepted_interceptors() {
    let log = Log::default();
    let mut chain = HandlerExecutionChain::new(
        handler(),
        vec![
            Recording::new("a", &log),
            Recording::vetoing("b", &log),
            Recording::new("c", &log),
        ],
    );
    let ctx = RequestContext::get("/");
    assert!(!chain.apply_before(&ctx).unwrap());
    assert_eq!(entries(&log), vec!["before:a", "before:b", "complete:a"]);
}

#[test]
fn test_before_error_completes_with_error() {
    let log = Log::default();
    let mut chain = HandlerExecutionChain::new(
        handler(),
        vec![Recording::new("a", &log), Recording::failing("b", &log)],
    );
    let ctx = RequestContext::get("/");
    assert!(chain.apply_before(&ctx).is_err());
    assert_eq!(entries(&log), vec!["before:a", "before:b", "complete:a:err"]);
}

#[test]
fn test_mapped_interceptors_filter_by_path() {
    let log = Log::default();
    let mapped = vec![
        MappedInterceptor::global(Recording::new("all", &log)),
        MappedInterceptor::new(["/admin/**"], Vec::<&str>::new(), Recording::new("admin", &log)).unwrap(),
        MappedInterceptor::new(["/**"], ["/static/**"], Recording::new("dynamic", &log)).unwrap(),
    ];
    assert_eq!(HandlerExecutionChain::for_path(handler(), &mapped, "/admin/users").len(), 3);
    assert_eq!(HandlerExecutionChain::for_path(handler(), &mapped, "/static/app.js").len(), 1);
    assert_eq!(HandlerExecutionChain::for_path(handler(), &mapped, "/orders").len(), 2);
    assert!(MappedInterceptor::new(["/a/{x"], Vec::<&str>::new(), Recording::new("bad", &log)).is_err());
}

#[test]
fn test_metrics_interceptor_counts() {
    let metrics = Arc::new(MetricsInterceptor::new());
    let ctx = RequestContext::get("/");
    for fail in [false, true] {
        let mut chain = HandlerExecutionChain::new(
            handler(),
            vec![Arc::clone(&metrics) as Arc<dyn Interceptor>],
        );
        assert!(chain.apply_before(&ctx).unwrap());
        let err = DispatchError::async_failure("boom");
        chain.trigger_completion(&ctx, fail.then_some(&err));
    }
    let chain = HandlerExecutionChain::new(handler(), vec![Arc::clone(&metrics) as Arc<dyn Interceptor>]);
    chain.apply_concurrent_handling_started(&ctx);

    assert_eq!(metrics.request_count(), 2);
    assert_eq!(metrics.completed_count(), 2);
    assert_eq!(metrics.error_count(), 1);
    assert_eq!(metrics.async_started_count(), 1);
}

#[test]
fn test_tracing_interceptor_never_vetoes() {
    let tracing = TracingInterceptor::with_slow_threshold(Duration::from_secs(1));
    let ctx = RequestContext::get("/");
    let handler = handler();
    assert!(tracing.before(&ctx, &handler).unwrap());
    tracing.complete(&ctx, &handler, None, Duration::from_micros(10));
}
