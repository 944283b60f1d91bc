use crate::context::ParamVec;
use crate::error::DispatchError;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A compiled Ant-style path pattern.
///
/// Supports `?` (one character), `*` (zero or more characters within a
/// segment), `**` (zero or more segments), `{name}` and `{name:regex}`
/// URI template variables.
///
/// ```rust
/// use brrtmvc::mapping::PathPattern;
///
/// let pattern = PathPattern::parse("/widgets/{id:\\d+}/**").unwrap();
/// assert!(pattern.matches("/widgets/42/parts/7"));
/// assert!(!pattern.matches("/widgets/abc"));
/// let vars = pattern.extract_variables("/widgets/42").unwrap();
/// assert_eq!(vars[0].1, "42");
/// ```
#[derive(Clone)]
pub struct PathPattern {
    raw: Arc<str>,
    regex: Regex,
    variables: Vec<Arc<str>>,
    single_wildcards: usize,
    double_wildcards: usize,
    /// Length with every `{...}` collapsed to one character.
    length: usize,
}

impl PathPattern {
    /// Compile `pattern`. Regex fragments in `{name:regex}` may not contain
    /// capturing groups.
    pub fn parse(pattern: &str) -> Result<Self, DispatchError> {
        let (regex_src, variables) = pattern_to_regex(pattern)?;
        let regex = Regex::new(&regex_src).map_err(|e| DispatchError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        let (single_wildcards, double_wildcards) = count_wildcards(pattern);
        Ok(Self {
            raw: Arc::from(pattern),
            regex,
            variables,
            single_wildcards,
            double_wildcards,
            length: collapsed_length(pattern),
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn variable_names(&self) -> &[Arc<str>] {
        &self.variables
    }

    /// True when the pattern contains wildcards or template variables.
    #[must_use]
    pub fn is_pattern(&self) -> bool {
        is_pattern(&self.raw)
    }

    #[inline]
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Values of the template variables, in declaration order.
    #[must_use]
    pub fn extract_variables(&self, path: &str) -> Option<ParamVec> {
        let captures = self.regex.captures(path)?;
        let mut vars = ParamVec::new();
        for (idx, name) in self.variables.iter().enumerate() {
            let value = captures.get(idx + 1).map_or("", |m| m.as_str());
            vars.push((Arc::clone(name), value.to_string()));
        }
        Some(vars)
    }

    /// The part of `path` matched by the wildcard segments of this pattern.
    ///
    /// `/docs/*` + `/docs/cvs/commit` -> `cvs/commit`.
    #[must_use]
    pub fn extract_path_within_pattern(&self, path: &str) -> String {
        let pattern_parts: Vec<&str> = self.raw.split('/').filter(|s| !s.is_empty()).collect();
        let path_parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut out = String::new();
        let mut puts = 0;
        for (idx, part) in pattern_parts.iter().enumerate() {
            if (part.contains('*') || part.contains('?')) && path_parts.len() > idx {
                if puts > 0 || (idx == 0 && !self.raw.starts_with('/')) {
                    out.push('/');
                }
                out.push_str(path_parts[idx]);
                puts += 1;
            }
        }
        for part in path_parts.iter().skip(pattern_parts.len()) {
            if puts > 0 || !out.is_empty() {
                out.push('/');
            }
            out.push_str(part);
            puts += 1;
        }
        out
    }

    /// `/api` + `/widgets` -> `/api/widgets`.
    pub fn with_prefix(&self, prefix: &str) -> Result<Self, DispatchError> {
        Self::parse(&join_paths(prefix, &self.raw))
    }

    /// The same pattern with a trailing slash, used for trailing-slash matches.
    pub(crate) fn with_trailing_slash(&self) -> Option<Self> {
        if self.raw.ends_with('/') {
            return None;
        }
        Self::parse(&format!("{}/", self.raw)).ok()
    }

    fn is_least_specific(&self) -> bool {
        &*self.raw == "/**"
    }

    fn is_prefix_pattern(&self) -> bool {
        self.raw.ends_with("/**")
    }

    fn total_count(&self) -> usize {
        self.variables.len() + self.single_wildcards + 2 * self.double_wildcards
    }

    /// Order two patterns matching `path`, most specific first.
    #[must_use]
    pub fn compare_for_path(&self, other: &PathPattern, path: &str) -> Ordering {
        match (self.is_least_specific(), other.is_least_specific()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            _ => {}
        }
        match (&*self.raw == path, &*other.raw == path) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }
        if self.is_prefix_pattern() && other.double_wildcards == 0 {
            return Ordering::Greater;
        }
        if other.is_prefix_pattern() && self.double_wildcards == 0 {
            return Ordering::Less;
        }
        self.total_count()
            .cmp(&other.total_count())
            .then_with(|| other.length.cmp(&self.length))
            .then_with(|| self.single_wildcards.cmp(&other.single_wildcards))
            .then_with(|| self.variables.len().cmp(&other.variables.len()))
    }
}

impl PartialEq for PathPattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for PathPattern {}

impl Hash for PathPattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl PartialOrd for PathPattern {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PathPattern {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PathPattern").field(&self.raw).finish()
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// True when `path` contains `*`, `?` or a `{...}` template variable.
#[must_use]
pub fn is_pattern(path: &str) -> bool {
    path.contains('*') || path.contains('?') || (path.contains('{') && path.contains('}'))
}

/// Join two path fragments with exactly one slash between them.
#[must_use]
pub fn join_paths(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if path.is_empty() {
        return if prefix.is_empty() { "/".to_string() } else { prefix.to_string() };
    }
    if path.starts_with('/') {
        format!("{prefix}{path}")
    } else {
        format!("{prefix}/{path}")
    }
}

fn invalid(pattern: &str, reason: impl Into<String>) -> DispatchError {
    DispatchError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.into(),
    }
}

fn pattern_to_regex(pattern: &str) -> Result<(String, Vec<Arc<str>>), DispatchError> {
    let mut regex = String::with_capacity(pattern.len() + 16);
    regex.push('^');
    let mut variables = Vec::with_capacity(pattern.matches('{').count());

    for (idx, segment) in pattern.split('/').enumerate() {
        if idx == 0 {
            // Relative patterns start without a slash.
            if !segment.is_empty() {
                segment_to_regex(pattern, segment, &mut regex, &mut variables)?;
            }
            continue;
        }
        if segment == "**" {
            regex.push_str("(?:/[^/]*)*");
            continue;
        }
        regex.push('/');
        segment_to_regex(pattern, segment, &mut regex, &mut variables)?;
    }

    regex.push('$');
    Ok((regex, variables))
}

fn segment_to_regex(
    pattern: &str,
    segment: &str,
    regex: &mut String,
    variables: &mut Vec<Arc<str>>,
) -> Result<(), DispatchError> {
    let mut literal = String::new();
    let mut chars = segment.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        match c {
            '{' => {
                flush_literal(&mut literal, regex);
                let mut depth = 1;
                let mut end = None;
                for (pos, inner) in chars.by_ref() {
                    match inner {
                        '{' => depth += 1,
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                end = Some(pos);
                                break;
                            }
                        }
                        _ => {}
                    }
                }
                let end = end.ok_or_else(|| invalid(pattern, "unclosed '{'"))?;
                let body = &segment[start + 1..end];
                let (name, custom) = match body.split_once(':') {
                    Some((name, custom)) => (name.trim(), Some(custom)),
                    None => (body.trim(), None),
                };
                if name.is_empty() {
                    return Err(invalid(pattern, "empty template variable name"));
                }
                match custom {
                    Some(custom) => {
                        let compiled = Regex::new(custom).map_err(|e| invalid(pattern, e.to_string()))?;
                        if compiled.captures_len() > 1 {
                            return Err(invalid(
                                pattern,
                                format!("capturing groups are not allowed in variable '{name}'"),
                            ));
                        }
                        regex.push('(');
                        regex.push_str(custom);
                        regex.push(')');
                    }
                    None => regex.push_str("([^/]+)"),
                }
                variables.push(Arc::from(name));
            }
            '*' => {
                flush_literal(&mut literal, regex);
                while chars.peek().is_some_and(|(_, next)| *next == '*') {
                    chars.next();
                }
                regex.push_str("[^/]*");
            }
            '?' => {
                flush_literal(&mut literal, regex);
                regex.push_str("[^/]");
            }
            '}' => return Err(invalid(pattern, "unmatched '}'")),
            other => literal.push(other),
        }
    }
    flush_literal(&mut literal, regex);
    Ok(())
}

fn flush_literal(literal: &mut String, regex: &mut String) {
    if !literal.is_empty() {
        regex.push_str(&regex::escape(literal));
        literal.clear();
    }
}

fn count_wildcards(pattern: &str) -> (usize, usize) {
    let bytes = pattern.as_bytes();
    let (mut single, mut double) = (0, 0);
    let mut pos = 0;
    while pos < bytes.len() {
        if bytes[pos] == b'*' {
            if bytes.get(pos + 1) == Some(&b'*') {
                double += 1;
                pos += 2;
                continue;
            }
            // A trailing ".*" is a file-extension match, not a wildcard.
            let extension = pos + 1 == bytes.len() && pos > 0 && bytes[pos - 1] == b'.';
            if pos > 0 && !extension {
                single += 1;
            }
        }
        pos += 1;
    }
    (single, double)
}

fn collapsed_length(pattern: &str) -> usize {
    let mut length = 0;
    let mut depth = 0usize;
    for c in pattern.chars() {
        match c {
            '{' => {
                if depth == 0 {
                    length += 1;
                }
                depth += 1;
            }
            '}' if depth > 0 => depth -= 1,
            _ if depth > 0 => {}
            _ => length += 1,
        }
    }
    length
}
