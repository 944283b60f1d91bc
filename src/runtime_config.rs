//! # Runtime Configuration Module
//!
//! Dispatch behaviour that deployments tune without code changes.
//!
//! ## Sources
//!
//! - [`DispatchConfig::default()`] - conservative defaults
//! - [`DispatchConfig::from_env()`] - `BRRTMVC_*` environment variables
//! - [`DispatchConfig::from_yaml_file()`] - a YAML document (e.g. `config/dispatch.yaml`)
//!
//! ## Environment Variables
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `BRRTMVC_SYNCHRONIZE_ON_SESSION` | `false` | serialize dispatches sharing a session |
//! | `BRRTMVC_IGNORE_DEFAULT_MODEL_ON_REDIRECT` | `false` | never fall back to the default model on redirect |
//! | `BRRTMVC_ASYNC_TIMEOUT_MS` | unset | timeout applied to pending async results |
//! | `BRRTMVC_SESSION_ATTRIBUTE_PREFIX` | empty | key prefix used by the default session attribute store |
//! | `BRRTMVC_URL_DECODE` | `true` | percent-decode the lookup path |
//! | `BRRTMVC_REMOVE_SEMICOLON_CONTENT` | `true` | strip `;jsessionid=...` style segments |
//! | `BRRTMVC_TRAILING_SLASH_MATCH` | `true` | `/a` also matches `/a/` |
//! | `BRRTMVC_SESSION_HANDLER_CACHE_SECONDS` | `0` | cache policy for handlers with session attributes: `0` prevents caching, `N > 0` allows `max-age=N`, negative leaves headers alone |
//!
//! Unparseable values fall back to the default rather than failing startup.
//!
//! ## Example
//!
//! ```bash
//! export BRRTMVC_SYNCHRONIZE_ON_SESSION=true
//! export BRRTMVC_ASYNC_TIMEOUT_MS=30000
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;

/// Runtime configuration for the registry, orchestrator and session store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Run all dispatches for one session under that session's mutex.
    pub synchronize_on_session: bool,
    /// In a redirect scenario, never fall back to the default model.
    pub ignore_default_model_on_redirect: bool,
    /// Timeout applied to asynchronous results that do not set their own.
    #[serde(rename = "async_timeout_ms", with = "duration_ms")]
    pub async_timeout: Option<Duration>,
    /// Prefix the default session attribute store puts in front of every key.
    pub session_attribute_prefix: String,
    /// Percent-decode the lookup path before matching.
    pub url_decode: bool,
    /// Strip `;name=value` content from path segments before matching.
    pub remove_semicolon_content: bool,
    /// Let a pattern without a trailing slash match a path that has one.
    pub use_trailing_slash_match: bool,
    /// Cache seconds applied to responses of handler types that declare
    /// session attributes. `0` prevents caching; negative writes nothing.
    pub cache_seconds_for_session_attribute_handlers: i64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            synchronize_on_session: false,
            ignore_default_model_on_redirect: false,
            async_timeout: None,
            session_attribute_prefix: String::new(),
            url_decode: true,
            remove_semicolon_content: true,
            use_trailing_slash_match: true,
            cache_seconds_for_session_attribute_handlers: 0,
        }
    }
}

impl DispatchConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            synchronize_on_session: env_flag(
                "BRRTMVC_SYNCHRONIZE_ON_SESSION",
                defaults.synchronize_on_session,
            ),
            ignore_default_model_on_redirect: env_flag(
                "BRRTMVC_IGNORE_DEFAULT_MODEL_ON_REDIRECT",
                defaults.ignore_default_model_on_redirect,
            ),
            async_timeout: env::var("BRRTMVC_ASYNC_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_millis),
            session_attribute_prefix: env::var("BRRTMVC_SESSION_ATTRIBUTE_PREFIX")
                .unwrap_or(defaults.session_attribute_prefix),
            url_decode: env_flag("BRRTMVC_URL_DECODE", defaults.url_decode),
            remove_semicolon_content: env_flag(
                "BRRTMVC_REMOVE_SEMICOLON_CONTENT",
                defaults.remove_semicolon_content,
            ),
            use_trailing_slash_match: env_flag(
                "BRRTMVC_TRAILING_SLASH_MATCH",
                defaults.use_trailing_slash_match,
            ),
            cache_seconds_for_session_attribute_handlers: env::var(
                "BRRTMVC_SESSION_HANDLER_CACHE_SECONDS",
            )
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(defaults.cache_seconds_for_session_attribute_handlers),
        }
    }

    /// Load configuration from a YAML file. Missing keys take their defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read dispatch config {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("failed to parse dispatch config {}", path.display()))
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(val) => match val.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_overrides_only_given_keys() {
        let cfg = DispatchConfig::from_yaml_str(
            "synchronize_on_session: true\nasync_timeout_ms: 2500\n",
        )
        .unwrap();
        assert!(cfg.synchronize_on_session);
        assert_eq!(cfg.async_timeout, Some(Duration::from_millis(2500)));
        assert!(cfg.url_decode);
        assert_eq!(cfg.session_attribute_prefix, "");
        assert_eq!(cfg.cache_seconds_for_session_attribute_handlers, 0);
    }

    #[test]
    fn session_handler_cache_seconds_from_yaml() {
        let cfg =
            DispatchConfig::from_yaml_str("cache_seconds_for_session_attribute_handlers: -1\n")
                .unwrap();
        assert_eq!(cfg.cache_seconds_for_session_attribute_handlers, -1);
    }

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(
            DispatchConfig::from_yaml_str("  \n").unwrap(),
            DispatchConfig::default()
        );
    }

    #[test]
    fn unknown_types_are_rejected() {
        assert!(DispatchConfig::from_yaml_str("url_decode: [1, 2]").is_err());
    }
}
