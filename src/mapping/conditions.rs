use super::path::{join_paths, PathPattern};
use crate::context::RequestContext;
use crate::error::DispatchError;
use http::header::ACCEPT;
use http::Method;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

/// Path patterns, OR-combined: a request matches when any pattern does.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PatternsCondition {
    patterns: Vec<PathPattern>,
}

impl PatternsCondition {
    pub fn new<I, S>(patterns: I) -> Result<Self, DispatchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parsed = patterns
            .into_iter()
            .map(|p| PathPattern::parse(&normalize(p.as_ref())))
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self {
            patterns: parsed.into_iter().collect(),
        })
    }

    #[must_use]
    pub fn patterns(&self) -> &[PathPattern] {
        &self.patterns
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Patterns without wildcards or variables; these are indexed by path.
    pub fn literal_paths(&self) -> impl Iterator<Item = &str> {
        self.patterns
            .iter()
            .filter(|p| !p.is_pattern())
            .map(PathPattern::as_str)
    }

    #[must_use]
    pub fn combine(&self, other: &Self) -> Self {
        let merged: BTreeSet<PathPattern> = self
            .patterns
            .iter()
            .chain(other.patterns.iter())
            .cloned()
            .collect();
        Self {
            patterns: merged.into_iter().collect(),
        }
    }

    pub fn with_prefix(&self, prefix: &str) -> Result<Self, DispatchError> {
        if self.patterns.is_empty() {
            return Self::new([join_paths(prefix, "")]);
        }
        let prefixed = self
            .patterns
            .iter()
            .map(|p| p.with_prefix(prefix))
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self {
            patterns: prefixed.into_iter().collect(),
        })
    }

    /// The matching patterns, most specific first for `lookup_path`.
    #[must_use]
    pub fn matching(&self, lookup_path: &str, trailing_slash: bool) -> Option<Self> {
        if self.patterns.is_empty() {
            return Some(self.clone());
        }
        let mut matches: Vec<PathPattern> = self
            .patterns
            .iter()
            .filter_map(|p| {
                if p.as_str() == lookup_path || p.matches(lookup_path) {
                    return Some(p.clone());
                }
                if trailing_slash && lookup_path.ends_with('/') {
                    if let Some(slashed) = p.with_trailing_slash() {
                        if slashed.matches(lookup_path) {
                            return Some(slashed);
                        }
                    }
                }
                None
            })
            .collect();
        if matches.is_empty() {
            return None;
        }
        matches.sort_by(|a, b| a.compare_for_path(b, lookup_path));
        Some(Self { patterns: matches })
    }

    /// Pairwise comparison; when all pairs tie, more patterns sort first.
    #[must_use]
    pub fn compare(&self, other: &Self, lookup_path: &str) -> Ordering {
        for (a, b) in self.patterns.iter().zip(other.patterns.iter()) {
            let ord = a.compare_for_path(b, lookup_path);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        other.patterns.len().cmp(&self.patterns.len())
    }
}

fn normalize(pattern: &str) -> String {
    if pattern.is_empty() || pattern.starts_with('/') {
        pattern.to_string()
    } else {
        format!("/{pattern}")
    }
}

/// HTTP methods. Empty means any method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MethodsCondition {
    methods: Vec<Method>,
}

impl MethodsCondition {
    pub fn new<I: IntoIterator<Item = Method>>(methods: I) -> Self {
        let mut methods: Vec<Method> = methods.into_iter().collect();
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods.dedup();
        Self { methods }
    }

    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    #[must_use]
    pub fn combine(&self, other: &Self) -> Self {
        Self::new(self.methods.iter().chain(other.methods.iter()).cloned())
    }

    /// HEAD requests also match GET mappings.
    #[must_use]
    pub fn matching(&self, method: &Method) -> Option<Self> {
        if self.methods.is_empty() {
            return Some(self.clone());
        }
        if self.methods.contains(method) {
            return Some(Self::new([method.clone()]));
        }
        if *method == Method::HEAD && self.methods.contains(&Method::GET) {
            return Some(Self::new([Method::GET]));
        }
        None
    }

    /// A matched method beats "any method". Between two matched single
    /// methods, an explicit HEAD mapping beats the GET fallback.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        if let ([mine], [theirs]) = (self.methods.as_slice(), other.methods.as_slice()) {
            if *mine == Method::HEAD && *theirs == Method::GET {
                return Ordering::Less;
            }
            if *mine == Method::GET && *theirs == Method::HEAD {
                return Ordering::Greater;
            }
        }
        other.methods.len().cmp(&self.methods.len())
    }
}

/// `name`, `!name`, `name=value` or `name!=value`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameValueExpression {
    name: String,
    value: Option<String>,
    negated: bool,
}

impl NameValueExpression {
    pub fn parse(expression: &str, case_insensitive_name: bool) -> Result<Self, DispatchError> {
        let invalid = |reason: &str| DispatchError::InvalidExpression {
            expression: expression.to_string(),
            reason: reason.to_string(),
        };
        let fold = |name: &str| {
            let name = name.trim();
            if case_insensitive_name {
                name.to_ascii_lowercase()
            } else {
                name.to_string()
            }
        };
        let (name, value, negated) = if let Some((name, value)) = expression.split_once("!=") {
            (fold(name), Some(value.trim().to_string()), true)
        } else if let Some((name, value)) = expression.split_once('=') {
            (fold(name), Some(value.trim().to_string()), false)
        } else if let Some(name) = expression.trim().strip_prefix('!') {
            (fold(name), None, true)
        } else {
            (fold(expression), None, false)
        };
        if name.is_empty() {
            return Err(invalid("missing name"));
        }
        Ok(Self {
            name,
            value,
            negated,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn matches_value(&self, actual: Option<&str>) -> bool {
        let hit = match &self.value {
            Some(expected) => actual == Some(expected.as_str()),
            None => actual.is_some(),
        };
        hit != self.negated
    }
}

impl fmt::Display for NameValueExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.value, self.negated) {
            (Some(value), true) => write!(f, "{}!={}", self.name, value),
            (Some(value), false) => write!(f, "{}={}", self.name, value),
            (None, true) => write!(f, "!{}", self.name),
            (None, false) => f.write_str(&self.name),
        }
    }
}

/// Request parameter expressions, AND-combined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ParamsCondition {
    expressions: BTreeSet<NameValueExpression>,
}

impl ParamsCondition {
    pub fn new<I, S>(expressions: I) -> Result<Self, DispatchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let expressions = expressions
            .into_iter()
            .map(|e| NameValueExpression::parse(e.as_ref(), false))
            .collect::<Result<_, _>>()?;
        Ok(Self { expressions })
    }

    pub fn expressions(&self) -> impl Iterator<Item = &NameValueExpression> {
        self.expressions.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    #[must_use]
    pub fn combine(&self, other: &Self) -> Self {
        Self {
            expressions: self.expressions.union(&other.expressions).cloned().collect(),
        }
    }

    #[must_use]
    pub fn matching(&self, ctx: &RequestContext) -> Option<Self> {
        self.expressions
            .iter()
            .all(|e| e.matches_value(ctx.param(e.name())))
            .then(|| self.clone())
    }

    /// More expressions sort first.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        other.expressions.len().cmp(&self.expressions.len())
    }
}

/// Header expressions, AND-combined; names are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct HeadersCondition {
    expressions: BTreeSet<NameValueExpression>,
}

impl HeadersCondition {
    pub fn new<I, S>(expressions: I) -> Result<Self, DispatchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let expressions = expressions
            .into_iter()
            .map(|e| NameValueExpression::parse(e.as_ref(), true))
            .collect::<Result<_, _>>()?;
        Ok(Self { expressions })
    }

    pub fn expressions(&self) -> impl Iterator<Item = &NameValueExpression> {
        self.expressions.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    #[must_use]
    pub fn combine(&self, other: &Self) -> Self {
        Self {
            expressions: self.expressions.union(&other.expressions).cloned().collect(),
        }
    }

    #[must_use]
    pub fn matching(&self, ctx: &RequestContext) -> Option<Self> {
        self.expressions
            .iter()
            .all(|e| e.matches_value(ctx.header(e.name())))
            .then(|| self.clone())
    }

    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        other.expressions.len().cmp(&self.expressions.len())
    }
}

/// `type/subtype`, parameters ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MediaType {
    main: String,
    sub: String,
}

impl MediaType {
    pub fn parse(value: &str) -> Result<Self, DispatchError> {
        let essence = value.split(';').next().unwrap_or(value).trim();
        let essence = if essence == "*" { "*/*" } else { essence };
        match essence.split_once('/') {
            Some((main, sub)) if !main.is_empty() && !sub.is_empty() => Ok(Self {
                main: main.to_ascii_lowercase(),
                sub: sub.to_ascii_lowercase(),
            }),
            _ => Err(DispatchError::InvalidExpression {
                expression: value.to_string(),
                reason: "expected 'type/subtype'".to_string(),
            }),
        }
    }

    /// `*/*` = 0, `type/*` = 1, `type/subtype` = 2.
    #[must_use]
    pub fn specificity(&self) -> i32 {
        match (self.main.as_str(), self.sub.as_str()) {
            ("*", _) => 0,
            (_, "*") => 1,
            _ => 2,
        }
    }

    #[must_use]
    pub fn is_compatible_with(&self, other: &MediaType) -> bool {
        let main = self.main == "*" || other.main == "*" || self.main == other.main;
        let sub = self.sub == "*" || other.sub == "*" || self.sub == other.sub;
        main && sub
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main, self.sub)
    }
}

/// Producible media types, matched against `Accept` (default `*/*`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ProducesCondition {
    media_types: BTreeSet<MediaType>,
}

impl ProducesCondition {
    pub fn new<I, S>(media_types: I) -> Result<Self, DispatchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let media_types = media_types
            .into_iter()
            .map(|m| MediaType::parse(m.as_ref()))
            .collect::<Result<_, _>>()?;
        Ok(Self { media_types })
    }

    pub fn media_types(&self) -> impl Iterator<Item = &MediaType> {
        self.media_types.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.media_types.is_empty()
    }

    #[must_use]
    pub fn combine(&self, other: &Self) -> Self {
        Self {
            media_types: self.media_types.union(&other.media_types).cloned().collect(),
        }
    }

    /// Unparseable `Accept` entries are ignored.
    #[must_use]
    pub fn matching(&self, ctx: &RequestContext) -> Option<Self> {
        if self.media_types.is_empty() {
            return Some(self.clone());
        }
        let mut accepted: Vec<MediaType> = ctx
            .headers()
            .get_all(ACCEPT)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .filter_map(|m| MediaType::parse(m).ok())
            .collect();
        if accepted.is_empty() {
            accepted.push(MediaType {
                main: "*".to_string(),
                sub: "*".to_string(),
            });
        }
        let media_types: BTreeSet<MediaType> = self
            .media_types
            .iter()
            .filter(|m| accepted.iter().any(|a| a.is_compatible_with(m)))
            .cloned()
            .collect();
        (!media_types.is_empty()).then_some(Self { media_types })
    }

    fn specificity(&self) -> i32 {
        self.media_types
            .iter()
            .map(MediaType::specificity)
            .max()
            .unwrap_or(-1)
    }

    /// Higher declared specificity sorts first.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        other.specificity().cmp(&self.specificity())
    }
}
