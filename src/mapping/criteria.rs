use super::conditions::{
    HeadersCondition, MethodsCondition, ParamsCondition, PatternsCondition, ProducesCondition,
};
use crate::context::RequestContext;
use crate::error::DispatchError;
use http::Method;
use std::cmp::Ordering;
use std::fmt;

/// Immutable request predicate: path patterns, methods, parameter and
/// header expressions, producible media types.
///
/// Two criteria built from the same sub-conditions are equal and hash the
/// same regardless of declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RequestCriteria {
    patterns: PatternsCondition,
    methods: MethodsCondition,
    params: ParamsCondition,
    headers: HeadersCondition,
    produces: ProducesCondition,
}

impl RequestCriteria {
    #[must_use]
    pub fn builder() -> RequestCriteriaBuilder {
        RequestCriteriaBuilder::default()
    }

    #[must_use]
    pub fn new(
        patterns: PatternsCondition,
        methods: MethodsCondition,
        params: ParamsCondition,
        headers: HeadersCondition,
        produces: ProducesCondition,
    ) -> Self {
        Self {
            patterns,
            methods,
            params,
            headers,
            produces,
        }
    }

    #[must_use]
    pub fn patterns(&self) -> &PatternsCondition {
        &self.patterns
    }

    #[must_use]
    pub fn methods(&self) -> &MethodsCondition {
        &self.methods
    }

    #[must_use]
    pub fn params(&self) -> &ParamsCondition {
        &self.params
    }

    #[must_use]
    pub fn headers(&self) -> &HeadersCondition {
        &self.headers
    }

    #[must_use]
    pub fn produces(&self) -> &ProducesCondition {
        &self.produces
    }

    /// Set-union of every sub-condition.
    #[must_use]
    pub fn combine(&self, other: &Self) -> Self {
        Self {
            patterns: self.patterns.combine(&other.patterns),
            methods: self.methods.combine(&other.methods),
            params: self.params.combine(&other.params),
            headers: self.headers.combine(&other.headers),
            produces: self.produces.combine(&other.produces),
        }
    }

    /// Nest every pattern under `prefix` (type-level path).
    pub fn with_base_path(&self, prefix: &str) -> Result<Self, DispatchError> {
        Ok(Self {
            patterns: self.patterns.with_prefix(prefix)?,
            ..self.clone()
        })
    }

    /// The part of this criteria that matches the request, or `None`.
    ///
    /// The returned patterns are only those matching `lookup_path`, sorted
    /// most specific first.
    #[must_use]
    pub fn match_against(
        &self,
        ctx: &RequestContext,
        lookup_path: &str,
        trailing_slash: bool,
    ) -> Option<Self> {
        let methods = self.methods.matching(ctx.method())?;
        let params = self.params.matching(ctx)?;
        let headers = self.headers.matching(ctx)?;
        let produces = self.produces.matching(ctx)?;
        let patterns = self.patterns.matching(lookup_path, trailing_slash)?;
        Some(Self {
            patterns,
            methods,
            params,
            headers,
            produces,
        })
    }

    /// Order two matched criteria for one request, most specific first:
    /// patterns, params, headers, produces, methods.
    #[must_use]
    pub fn compare_specificity(&self, other: &Self, lookup_path: &str) -> Ordering {
        self.patterns
            .compare(&other.patterns, lookup_path)
            .then_with(|| self.params.compare(&other.params))
            .then_with(|| self.headers.compare(&other.headers))
            .then_with(|| self.produces.compare(&other.produces))
            .then_with(|| self.methods.compare(&other.methods))
    }
}

impl fmt::Display for RequestCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join<T: fmt::Display>(items: impl Iterator<Item = T>) -> String {
            items.map(|i| i.to_string()).collect::<Vec<_>>().join(" || ")
        }

        write!(f, "{{[{}]", join(self.patterns.patterns().iter()))?;
        if !self.methods.is_empty() {
            write!(f, ",methods=[{}]", join(self.methods.methods().iter()))?;
        }
        if !self.params.is_empty() {
            write!(f, ",params=[{}]", join(self.params.expressions()))?;
        }
        if !self.headers.is_empty() {
            write!(f, ",headers=[{}]", join(self.headers.expressions()))?;
        }
        if !self.produces.is_empty() {
            write!(f, ",produces=[{}]", join(self.produces.media_types()))?;
        }
        f.write_str("}")
    }
}

/// Collects raw declarations; parsing happens in [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct RequestCriteriaBuilder {
    paths: Vec<String>,
    methods: Vec<Method>,
    params: Vec<String>,
    headers: Vec<String>,
    produces: Vec<String>,
}

impl RequestCriteriaBuilder {
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.paths.push(path.into());
        self
    }

    #[must_use]
    pub fn paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paths.extend(paths.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }

    #[must_use]
    pub fn methods<I: IntoIterator<Item = Method>>(mut self, methods: I) -> Self {
        self.methods.extend(methods);
        self
    }

    #[must_use]
    pub fn param(mut self, expression: impl Into<String>) -> Self {
        self.params.push(expression.into());
        self
    }

    #[must_use]
    pub fn header(mut self, expression: impl Into<String>) -> Self {
        self.headers.push(expression.into());
        self
    }

    #[must_use]
    pub fn produces(mut self, media_type: impl Into<String>) -> Self {
        self.produces.push(media_type.into());
        self
    }

    pub fn build(self) -> Result<RequestCriteria, DispatchError> {
        Ok(RequestCriteria {
            patterns: PatternsCondition::new(&self.paths)?,
            methods: MethodsCondition::new(self.methods),
            params: ParamsCondition::new(&self.params)?,
            headers: HeadersCondition::new(&self.headers)?,
            produces: ProducesCondition::new(&self.produces)?,
        })
    }
}
