use super::criteria::RequestCriteria;
use crate::context::{MatchInfo, RequestContext};
use crate::error::DispatchError;
use crate::handler::HandlerMethod;
use crate::runtime_config::DispatchConfig;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// One `criteria -> handler` binding.
#[derive(Debug, Clone)]
pub struct Registration {
    pub criteria: Arc<RequestCriteria>,
    pub handler: Arc<HandlerMethod>,
}

/// Successful lookup: the handler and the part of its criteria that matched.
#[derive(Debug, Clone)]
pub struct HandlerMatch {
    pub handler: Arc<HandlerMethod>,
    pub criteria: Arc<RequestCriteria>,
    pub lookup_path: String,
}

/// How the request path is turned into the path matched against patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupPathOptions {
    pub url_decode: bool,
    pub remove_semicolon_content: bool,
    pub use_trailing_slash_match: bool,
}

impl Default for LookupPathOptions {
    fn default() -> Self {
        Self::from(&DispatchConfig::default())
    }
}

impl From<&DispatchConfig> for LookupPathOptions {
    fn from(config: &DispatchConfig) -> Self {
        Self {
            url_decode: config.url_decode,
            remove_semicolon_content: config.remove_semicolon_content,
            use_trailing_slash_match: config.use_trailing_slash_match,
        }
    }
}

impl LookupPathOptions {
    /// Path within the application: context path stripped, `;` content
    /// removed (`;jsessionid` always), percent-decoded.
    #[must_use]
    pub fn lookup_path(&self, ctx: &RequestContext) -> String {
        let path = ctx.path();
        let context_path = ctx.context_path().trim_end_matches('/');
        let within = if !context_path.is_empty() && path.starts_with(context_path) {
            &path[context_path.len()..]
        } else {
            path
        };
        let cleaned = if self.remove_semicolon_content {
            remove_semicolon_content(within, |_| true)
        } else {
            remove_semicolon_content(within, |param| {
                param.to_ascii_lowercase().starts_with("jsessionid=")
            })
        };
        let decoded = if self.url_decode {
            urlencoding::decode(&cleaned)
                .map(|s| s.into_owned())
                .unwrap_or(cleaned)
        } else {
            cleaned
        };
        if decoded.is_empty() {
            "/".to_string()
        } else {
            decoded
        }
    }
}

/// Strip `;name=value` segments accepted by `remove`.
fn remove_semicolon_content(path: &str, remove: impl Fn(&str) -> bool) -> String {
    if !path.contains(';') {
        return path.to_string();
    }
    path.split('/')
        .map(|segment| {
            let mut parts = segment.split(';');
            let mut out = parts.next().unwrap_or_default().to_string();
            for param in parts {
                if !remove(param) {
                    out.push(';');
                    out.push_str(param);
                }
            }
            out
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Criteria -> handler registry with literal-path shortcut and ambiguity
/// detection.
///
/// Populated during a single-threaded initialization phase; lookups take
/// `&self` and are safe to run concurrently afterwards.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    registrations: Vec<Registration>,
    by_criteria: HashMap<Arc<RequestCriteria>, usize>,
    url_index: HashMap<String, SmallVec<[usize; 4]>>,
    default_handler: Option<Arc<HandlerMethod>>,
    options: LookupPathOptions,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: &DispatchConfig) -> Self {
        Self {
            options: LookupPathOptions::from(config),
            ..Self::default()
        }
    }

    /// Bind `criteria` to `handler`.
    ///
    /// Re-registering the same handler is a no-op; an equal criteria bound to
    /// a different handler fails with [`DispatchError::DuplicateMapping`].
    pub fn register(
        &mut self,
        criteria: RequestCriteria,
        handler: Arc<HandlerMethod>,
    ) -> Result<(), DispatchError> {
        if let Some(&idx) = self.by_criteria.get(&criteria) {
            let existing = &self.registrations[idx].handler;
            if existing.id() == handler.id() {
                debug!(criteria = %criteria, handler = %handler, "Mapping already registered");
                return Ok(());
            }
            return Err(DispatchError::DuplicateMapping {
                criteria: criteria.to_string(),
                existing: existing.id().to_string(),
                attempted: handler.id().to_string(),
            });
        }

        let criteria = Arc::new(criteria);
        let idx = self.registrations.len();
        for path in criteria.patterns().literal_paths() {
            self.url_index.entry(path.to_string()).or_default().push(idx);
        }
        self.by_criteria.insert(Arc::clone(&criteria), idx);

        info!(criteria = %criteria, handler = %handler, "Mapped criteria onto handler");
        self.registrations.push(Registration { criteria, handler });
        Ok(())
    }

    /// Register `handler` for the root path `/`.
    pub fn register_root_handler(&mut self, handler: Arc<HandlerMethod>) -> Result<(), DispatchError> {
        let criteria = RequestCriteria::builder().path("/").build()?;
        self.register(criteria, handler)
    }

    /// Handler used when nothing matches.
    pub fn set_default_handler(&mut self, handler: Arc<HandlerMethod>) {
        info!(handler = %handler, "Default handler set");
        self.default_handler = Some(handler);
    }

    #[must_use]
    pub fn default_handler(&self) -> Option<&Arc<HandlerMethod>> {
        self.default_handler.as_ref()
    }

    /// Registrations in insertion order.
    pub fn mappings(&self) -> impl Iterator<Item = &Registration> {
        self.registrations.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Registration indices for an exact literal path.
    #[must_use]
    pub fn direct_matches(&self, path: &str) -> &[usize] {
        self.url_index
            .get(path)
            .map(|v| v.as_slice())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn lookup_path(&self, ctx: &RequestContext) -> String {
        self.options.lookup_path(ctx)
    }

    /// Find the most specific matching handler.
    ///
    /// Returns `Ok(None)` when nothing matches and fails with
    /// [`DispatchError::AmbiguousMapping`] when the two best matches tie.
    /// On success the match metadata is recorded on the context.
    pub fn lookup_handler(&self, ctx: &RequestContext) -> Result<Option<HandlerMatch>, DispatchError> {
        let lookup_path = self.lookup_path(ctx);

        // RT1: Handler lookup attempt
        debug!(
            request_id = %ctx.request_id(),
            method = %ctx.method(),
            lookup_path = %lookup_path,
            "Handler lookup attempt"
        );
        let started = Instant::now();

        let mut matches = self.collect_matches(ctx, &lookup_path, self.direct_matches(&lookup_path).iter().copied());
        let used_index = !matches.is_empty();
        if matches.is_empty() {
            matches = self.collect_matches(ctx, &lookup_path, 0..self.registrations.len());
        }

        if matches.is_empty() {
            // RT4: No handler found
            warn!(
                request_id = %ctx.request_id(),
                method = %ctx.method(),
                lookup_path = %lookup_path,
                duration_us = started.elapsed().as_micros() as u64,
                "No handler matched"
            );
            return Ok(None);
        }

        matches.sort_by(|a, b| a.0.compare_specificity(&b.0, &lookup_path));
        if matches.len() > 1
            && matches[0].0.compare_specificity(&matches[1].0, &lookup_path) == Ordering::Equal
        {
            let first = &self.registrations[matches[0].1].handler;
            let second = &self.registrations[matches[1].1].handler;
            error!(
                request_id = %ctx.request_id(),
                lookup_path = %lookup_path,
                first = %first,
                second = %second,
                "Ambiguous handler methods"
            );
            return Err(DispatchError::AmbiguousMapping {
                path: lookup_path,
                first: first.id().to_string(),
                second: second.id().to_string(),
            });
        }

        let (matched, idx) = matches.swap_remove(0);
        let handler = Arc::clone(&self.registrations[idx].handler);
        let matched = Arc::new(matched);
        self.expose_match(ctx, &lookup_path, &matched);

        // RT3: Handler matched
        let elapsed = started.elapsed();
        if elapsed > Duration::from_millis(1) {
            warn!(
                request_id = %ctx.request_id(),
                lookup_path = %lookup_path,
                handler = %handler,
                criteria = %matched,
                used_index,
                duration_us = elapsed.as_micros() as u64,
                "Slow handler lookup detected"
            );
        } else {
            info!(
                request_id = %ctx.request_id(),
                lookup_path = %lookup_path,
                handler = %handler,
                criteria = %matched,
                used_index,
                duration_us = elapsed.as_micros() as u64,
                "Handler matched"
            );
        }

        Ok(Some(HandlerMatch {
            handler,
            criteria: matched,
            lookup_path,
        }))
    }

    /// Like [`lookup_handler`](Self::lookup_handler), falling back to the
    /// default handler.
    pub fn resolve(&self, ctx: &RequestContext) -> Result<Option<Arc<HandlerMethod>>, DispatchError> {
        match self.lookup_handler(ctx)? {
            Some(found) => Ok(Some(found.handler)),
            None => Ok(self.default_handler.as_ref().map(Arc::clone)),
        }
    }

    fn collect_matches(
        &self,
        ctx: &RequestContext,
        lookup_path: &str,
        candidates: impl Iterator<Item = usize>,
    ) -> Vec<(RequestCriteria, usize)> {
        candidates
            .filter_map(|idx| {
                self.registrations[idx]
                    .criteria
                    .match_against(ctx, lookup_path, self.options.use_trailing_slash_match)
                    .map(|matched| (matched, idx))
            })
            .collect()
    }

    fn expose_match(&self, ctx: &RequestContext, lookup_path: &str, matched: &Arc<RequestCriteria>) {
        let best = matched.patterns().patterns().first();
        let uri_variables = best
            .and_then(|p| p.extract_variables(lookup_path))
            .unwrap_or_default();
        let path_within_mapping = best
            .map(|p| p.extract_path_within_pattern(lookup_path))
            .unwrap_or_else(|| lookup_path.to_string());
        ctx.set_match_info(MatchInfo {
            lookup_path: lookup_path.to_string(),
            best_pattern: best.map(|p| p.as_str().to_string()),
            path_within_mapping,
            uri_variables,
            criteria: Arc::clone(matched),
        });
    }
}
