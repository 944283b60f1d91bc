use crate::context::RequestContext;
use crate::error::DispatchError;
use crate::handler::HandlerMethod;
use crate::mapping::PathPattern;
use crate::model::ModelAndView;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Hooks wrapped around handler execution.
///
/// `before` runs in registration order and may veto the dispatch by
/// returning `Ok(false)`. `after` runs in reverse order once the handler
/// produced a result; `model_and_view` is `None` when the request was
/// handled directly. `complete` runs in reverse order for every interceptor
/// whose `before` succeeded, on success, rejection and error alike.
pub trait Interceptor: Send + Sync {
    fn before(&self, _ctx: &RequestContext, _handler: &HandlerMethod) -> Result<bool, DispatchError> {
        Ok(true)
    }

    fn after(
        &self,
        _ctx: &RequestContext,
        _handler: &HandlerMethod,
        _model_and_view: Option<&mut ModelAndView>,
    ) -> Result<(), DispatchError> {
        Ok(())
    }

    fn complete(
        &self,
        _ctx: &RequestContext,
        _handler: &HandlerMethod,
        _error: Option<&DispatchError>,
        _latency: Duration,
    ) {
    }

    /// Called instead of `after`/`complete` when the handler started async
    /// processing; those run when the dispatch resumes.
    fn concurrent_handling_started(&self, _ctx: &RequestContext, _handler: &HandlerMethod) {}
}

/// An interceptor applied only to lookup paths matching its include
/// patterns (all paths when there are none) and none of its excludes.
#[derive(Clone)]
pub struct MappedInterceptor {
    includes: Vec<PathPattern>,
    excludes: Vec<PathPattern>,
    interceptor: Arc<dyn Interceptor>,
}

impl MappedInterceptor {
    pub fn new<I, E>(
        includes: I,
        excludes: E,
        interceptor: Arc<dyn Interceptor>,
    ) -> Result<Self, DispatchError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let parse = |p: &str| PathPattern::parse(p);
        Ok(Self {
            includes: includes
                .into_iter()
                .map(|p| parse(p.as_ref()))
                .collect::<Result<_, _>>()?,
            excludes: excludes
                .into_iter()
                .map(|p| parse(p.as_ref()))
                .collect::<Result<_, _>>()?,
            interceptor,
        })
    }

    /// Applies to every path.
    #[must_use]
    pub fn global(interceptor: Arc<dyn Interceptor>) -> Self {
        Self {
            includes: Vec::new(),
            excludes: Vec::new(),
            interceptor,
        }
    }

    #[must_use]
    pub fn matches(&self, lookup_path: &str) -> bool {
        if self.excludes.iter().any(|p| p.matches(lookup_path)) {
            return false;
        }
        self.includes.is_empty() || self.includes.iter().any(|p| p.matches(lookup_path))
    }

    #[must_use]
    pub fn interceptor(&self) -> &Arc<dyn Interceptor> {
        &self.interceptor
    }
}

impl fmt::Debug for MappedInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |patterns: &[PathPattern]| -> Vec<String> {
            patterns.iter().map(|p| p.as_str().to_string()).collect()
        };
        f.debug_struct("MappedInterceptor")
            .field("includes", &show(&self.includes))
            .field("excludes", &show(&self.excludes))
            .finish()
    }
}
