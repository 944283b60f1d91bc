use super::async_manager::AsyncManager;
use super::request_id::{RequestId, REQUEST_ID_HEADER};
use super::session::{AttributeScope, DestructionCallback, Scope, Session};
use crate::error::DispatchError;
use crate::mapping::RequestCriteria;
use crate::model::{AttributeValue, ModelMap};
use http::header::{
    HeaderName, HeaderValue, ACCEPT_LANGUAGE, CACHE_CONTROL, ETAG, EXPIRES, IF_NONE_MATCH, PRAGMA,
};
use http::{HeaderMap, Method, StatusCode};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Maximum number of URI variables / request params kept inline.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated name/value storage. Names are shared with the registry.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Authenticated caller, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub name: String,
}

impl Principal {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Metadata the registry records on the context after a successful lookup.
#[derive(Debug, Clone)]
pub struct MatchInfo {
    pub lookup_path: String,
    pub best_pattern: Option<String>,
    /// Part of the lookup path matched by wildcards of the best pattern.
    pub path_within_mapping: String,
    pub uri_variables: ParamVec,
    pub criteria: Arc<RequestCriteria>,
}

impl MatchInfo {
    /// Last occurrence wins when a template repeats a variable name.
    #[inline]
    #[must_use]
    pub fn uri_variable(&self, name: &str) -> Option<&str> {
        self.uri_variables
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// What the dispatch decided about the response, short of rendering.
#[derive(Debug, Clone, Default)]
pub struct ResponseRecord {
    pub status: Option<StatusCode>,
    pub reason: Option<String>,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

/// Everything the dispatch core reads from, and records about, one request.
///
/// Shared by reference across the pipeline; the few pieces that change
/// during a dispatch (scoped attributes, response record, match metadata,
/// async state) sit behind interior locks.
pub struct RequestContext {
    request_id: RequestId,
    method: Method,
    path: String,
    context_path: String,
    params: ParamVec,
    headers: HeaderMap,
    locale: Option<String>,
    principal: Option<Principal>,
    request_scope: AttributeScope,
    session: Option<Arc<Session>>,
    global_session: Option<Arc<Session>>,
    body: Mutex<Option<Value>>,
    body_consumed: AtomicBool,
    response: Mutex<ResponseRecord>,
    not_modified: AtomicBool,
    match_info: RwLock<Option<MatchInfo>>,
    input_flash: ModelMap,
    async_manager: AsyncManager,
}

impl RequestContext {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let raw: String = path.into();
        let (path, query) = match raw.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (raw, None),
        };
        let ctx = Self {
            request_id: RequestId::new(),
            method,
            path,
            context_path: String::new(),
            params: ParamVec::new(),
            headers: HeaderMap::new(),
            locale: None,
            principal: None,
            request_scope: AttributeScope::default(),
            session: None,
            global_session: None,
            body: Mutex::new(None),
            body_consumed: AtomicBool::new(false),
            response: Mutex::new(ResponseRecord::default()),
            not_modified: AtomicBool::new(false),
            match_info: RwLock::new(None),
            input_flash: ModelMap::new(),
            async_manager: AsyncManager::default(),
        };
        match query {
            Some(query) => ctx.with_query(&query),
            None => ctx,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Parse `a=1&b=2` and append the pairs as request parameters.
    #[must_use]
    pub fn with_query(mut self, query: &str) -> Self {
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            let name = decode_component(name);
            let value = decode_component(value);
            self.params.push((Arc::from(name.as_str()), value));
        }
        self
    }

    #[must_use]
    pub fn with_param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.params.push((Arc::from(name), value.into()));
        self
    }

    /// Invalid header names or values are skipped.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            if name.as_str() == REQUEST_ID_HEADER {
                if let Some(id) = RequestId::from_header(&value) {
                    self.request_id = id;
                }
            }
            self.headers.append(name, value);
        }
        self
    }

    #[must_use]
    pub fn with_context_path(mut self, context_path: impl Into<String>) -> Self {
        self.context_path = context_path.into();
        self
    }

    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    #[must_use]
    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    #[must_use]
    pub fn with_session(mut self, session: Arc<Session>) -> Self {
        self.session = Some(session);
        self
    }

    #[must_use]
    pub fn with_global_session(mut self, session: Arc<Session>) -> Self {
        self.global_session = Some(session);
        self
    }

    #[must_use]
    pub fn with_body(self, body: Value) -> Self {
        *self.body.lock() = Some(body);
        self
    }

    /// Flash attributes carried over from the previous request.
    #[must_use]
    pub fn with_input_flash(mut self, flash: ModelMap) -> Self {
        self.input_flash = flash;
        self
    }

    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Full request path, context path included, query excluded.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn context_path(&self) -> &str {
        &self.context_path
    }

    /// First value of a request parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn param_values(&self, name: &str) -> Vec<&str> {
        self.params
            .iter()
            .filter(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    #[must_use]
    pub fn has_param(&self, name: &str) -> bool {
        self.params.iter().any(|(k, _)| k.as_ref() == name)
    }

    #[must_use]
    pub fn params(&self) -> &ParamVec {
        &self.params
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of a header, if it is valid text.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Explicit locale, else the first `Accept-Language` tag, else `en`.
    #[must_use]
    pub fn locale(&self) -> String {
        if let Some(locale) = &self.locale {
            return locale.clone();
        }
        self.headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|tag| tag.split(';').next().unwrap_or(tag).trim().to_string())
            .filter(|tag| !tag.is_empty() && tag != "*")
            .unwrap_or_else(|| "en".to_string())
    }

    #[must_use]
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    #[must_use]
    pub fn session(&self) -> Option<&Arc<Session>> {
        self.session.as_ref()
    }

    fn session_for(&self, scope: Scope) -> Option<&Arc<Session>> {
        match scope {
            Scope::Request => None,
            Scope::Session => self.session.as_ref(),
            Scope::GlobalSession => self.global_session.as_ref().or(self.session.as_ref()),
        }
    }

    #[must_use]
    pub fn get_attribute(&self, name: &str, scope: Scope) -> Option<AttributeValue> {
        match scope {
            Scope::Request => self.request_scope.get(name),
            _ => self.session_for(scope).and_then(|s| s.get_attribute(name)),
        }
    }

    /// Without a session, session-scoped writes are dropped.
    pub fn set_attribute(&self, name: &str, value: AttributeValue, scope: Scope) {
        match scope {
            Scope::Request => self.request_scope.set(name, value),
            _ => {
                if let Some(session) = self.session_for(scope) {
                    session.set_attribute(name, value);
                }
            }
        }
    }

    pub fn remove_attribute(&self, name: &str, scope: Scope) -> Option<AttributeValue> {
        match scope {
            Scope::Request => self.request_scope.remove(name),
            _ => self.session_for(scope).and_then(|s| s.remove_attribute(name)),
        }
    }

    #[must_use]
    pub fn attribute_names(&self, scope: Scope) -> Vec<String> {
        match scope {
            Scope::Request => self.request_scope.names(),
            _ => self
                .session_for(scope)
                .map(|s| s.attribute_names())
                .unwrap_or_default(),
        }
    }

    /// Request-scope callbacks run at [`request_completed`](Self::request_completed);
    /// session-scope callbacks when the session is invalidated.
    pub fn register_destruction_callback(&self, name: &str, callback: DestructionCallback, scope: Scope) {
        match scope {
            Scope::Request => self.request_scope.register_callback(name, callback),
            _ => {
                if let Some(session) = self.session_for(scope) {
                    session.register_destruction_callback(name, callback);
                }
            }
        }
    }

    /// Signal the end of the request: run request-scope destruction callbacks.
    pub fn request_completed(&self) {
        self.request_scope.destroy();
    }

    /// Take the request body. A second call fails.
    pub fn take_body(&self) -> Result<Option<Value>, DispatchError> {
        if self.body_consumed.swap(true, Ordering::AcqRel) {
            return Err(DispatchError::BodyAlreadyConsumed);
        }
        Ok(self.body.lock().take())
    }

    pub fn set_response_status(&self, status: StatusCode, reason: Option<String>) {
        let mut response = self.response.lock();
        response.status = Some(status);
        response.reason = reason;
    }

    pub fn set_response_header(&self, name: HeaderName, value: HeaderValue) {
        self.response.lock().headers.insert(name, value);
    }

    pub fn write_body(&self, body: Value) {
        self.response.lock().body = Some(body);
    }

    /// Record a cache policy on the response. `0` prevents caching, a
    /// positive value allows caching for that many seconds with
    /// revalidation, a negative value leaves the headers untouched.
    pub fn apply_cache_seconds(&self, seconds: i64) {
        let mut response = self.response.lock();
        match seconds {
            0 => {
                response.headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
                response
                    .headers
                    .insert(EXPIRES, HeaderValue::from_static("Thu, 01 Jan 1970 00:00:00 GMT"));
                response
                    .headers
                    .insert(CACHE_CONTROL, HeaderValue::from_static("no-cache, no-store"));
            }
            s if s > 0 => {
                response.headers.remove(PRAGMA);
                response.headers.remove(EXPIRES);
                if let Ok(value) = HeaderValue::from_str(&format!("max-age={s}, must-revalidate")) {
                    response.headers.insert(CACHE_CONTROL, value);
                }
            }
            _ => {}
        }
    }

    /// Snapshot of the response record.
    #[must_use]
    pub fn response(&self) -> ResponseRecord {
        self.response.lock().clone()
    }

    /// Compare `etag` with `If-None-Match`; on a hit record 304 and return true.
    pub fn check_not_modified(&self, etag: &str) -> bool {
        if let Ok(value) = HeaderValue::from_str(etag) {
            self.set_response_header(ETAG, value);
        }
        let matched = self
            .headers
            .get_all(IF_NONE_MATCH)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .map(str::trim)
            .any(|candidate| candidate == "*" || candidate == etag || candidate.trim_start_matches("W/") == etag);
        if matched {
            self.not_modified.store(true, Ordering::Release);
            let mut response = self.response.lock();
            response.status = Some(StatusCode::NOT_MODIFIED);
        }
        matched
    }

    #[must_use]
    pub fn is_not_modified(&self) -> bool {
        self.not_modified.load(Ordering::Acquire)
    }

    pub(crate) fn set_match_info(&self, info: MatchInfo) {
        *self.match_info.write() = Some(info);
    }

    /// Lookup metadata recorded by the registry, if a handler was matched.
    #[must_use]
    pub fn match_info(&self) -> Option<MatchInfo> {
        self.match_info.read().clone()
    }

    #[must_use]
    pub fn path_variable(&self, name: &str) -> Option<String> {
        self.match_info
            .read()
            .as_ref()
            .and_then(|m| m.uri_variable(name).map(str::to_string))
    }

    #[must_use]
    pub fn path_variables(&self) -> HashMap<String, String> {
        self.match_info
            .read()
            .as_ref()
            .map(|m| {
                m.uri_variables
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn input_flash(&self) -> &ModelMap {
        &self.input_flash
    }

    #[must_use]
    pub fn async_manager(&self) -> &AsyncManager {
        &self.async_manager
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("params", &self.params)
            .field("session", &self.session.as_ref().map(|s| s.id().to_string()))
            .finish_non_exhaustive()
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .unwrap_or(spaced)
}
