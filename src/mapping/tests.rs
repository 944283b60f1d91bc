use super::*;
use crate::context::RequestContext;
use crate::error::DispatchError;
use crate::handler::{HandlerMethod, HandlerType, ReturnValue};
use crate::runtime_config::DispatchConfig;
use http::Method;
use std::cmp::Ordering;
use std::sync::Arc;

fn handler(name: &str) -> Arc<HandlerMethod> {
    let ty = HandlerType::new("Test").build();
    HandlerMethod::builder(&ty, name).build(|_| Ok(ReturnValue::Void))
}

fn path(pattern: &str) -> RequestCriteria {
    RequestCriteria::builder().path(pattern).build().unwrap()
}

fn cmp(a: &str, b: &str, path: &str) -> Ordering {
    PathPattern::parse(a)
        .unwrap()
        .compare_for_path(&PathPattern::parse(b).unwrap(), path)
}

#[test]
fn test_root_path() {
    let p = PathPattern::parse("/").unwrap();
    assert!(p.matches("/"));
    assert!(!p.matches("/a"));
    assert!(p.variable_names().is_empty());
}

#[test]
fn test_wildcards() {
    let p = PathPattern::parse("/files/*.txt").unwrap();
    assert!(p.matches("/files/a.txt"));
    assert!(!p.matches("/files/sub/a.txt"));

    let p = PathPattern::parse("/files/**").unwrap();
    assert!(p.matches("/files"));
    assert!(p.matches("/files/sub/a.txt"));

    let p = PathPattern::parse("/a/**/z").unwrap();
    assert!(p.matches("/a/z"));
    assert!(p.matches("/a/b/c/z"));

    let p = PathPattern::parse("/t?st").unwrap();
    assert!(p.matches("/test"));
    assert!(!p.matches("/tst"));
}

#[test]
fn test_template_variables() {
    let p = PathPattern::parse("/org/{org}/user/{id:\\d+}").unwrap();
    assert!(p.is_pattern());
    let vars = p.extract_variables("/org/acme/user/7").unwrap();
    assert_eq!(vars[0].0.as_ref(), "org");
    assert_eq!(vars[0].1, "acme");
    assert_eq!(vars[1].1, "7");
    assert!(!p.matches("/org/acme/user/x"));
}

#[test]
fn test_invalid_patterns() {
    assert!(matches!(
        PathPattern::parse("/a/{id"),
        Err(DispatchError::InvalidPattern { .. })
    ));
    assert!(PathPattern::parse("/a/{id:(\\d+)}").is_err());
    assert!(PathPattern::parse("/a/}").is_err());
}

#[test]
fn test_path_within_pattern() {
    let p = PathPattern::parse("/docs/*").unwrap();
    assert_eq!(p.extract_path_within_pattern("/docs/cvs/commit"), "cvs/commit");
    let p = PathPattern::parse("/docs/**").unwrap();
    assert_eq!(p.extract_path_within_pattern("/docs/a/b"), "a/b");
}

#[test]
fn test_comparator_rules() {
    // Variable beats wildcard at equal counts.
    assert_eq!(cmp("/widgets/{id}", "/widgets/*", "/widgets/42"), Ordering::Less);
    // Exact match first.
    assert_eq!(cmp("/widgets/42", "/widgets/{id}", "/widgets/42"), Ordering::Less);
    // Catch-all last.
    assert_eq!(cmp("/**", "/widgets/*", "/widgets/42"), Ordering::Greater);
    // Prefix pattern after patterns without `**`.
    assert_eq!(cmp("/widgets/**", "/{a}/{b}", "/widgets/42"), Ordering::Greater);
    // Fewer variables + wildcards first.
    assert_eq!(cmp("/a/{b}/c", "/a/{b}/{c}", "/a/b/c"), Ordering::Less);
    // Longer pattern first.
    assert_eq!(cmp("/hotels/{h}/bookings", "/hotels/{h}/*", "/hotels/1/bookings"), Ordering::Less);
}

#[test]
fn test_criteria_equality_is_order_independent() {
    let a = RequestCriteria::builder()
        .paths(["/a", "/b"])
        .methods([Method::POST, Method::GET])
        .param("x=1")
        .param("!y")
        .build()
        .unwrap();
    let b = RequestCriteria::builder()
        .paths(["/b", "/a"])
        .methods([Method::GET, Method::POST])
        .param("!y")
        .param("x=1")
        .build()
        .unwrap();
    assert_eq!(a, b);

    let left = path("/a").combine(&path("/b").combine(&path("/c")));
    let right = path("/a").combine(&path("/b")).combine(&path("/c"));
    assert_eq!(left, right);
    assert_eq!(path("/a").combine(&path("/b")), path("/b").combine(&path("/a")));
}

#[test]
fn test_criteria_display() {
    let c = RequestCriteria::builder()
        .path("/a/{id}")
        .method(Method::GET)
        .param("x=1")
        .build()
        .unwrap();
    assert_eq!(c.to_string(), "{[/a/{id}],methods=[GET],params=[x=1]}");
}

#[test]
fn test_base_path_nesting() {
    let c = path("/widgets/{id}").with_base_path("/api/").unwrap();
    assert_eq!(c.patterns().patterns()[0].as_str(), "/api/widgets/{id}");
}

#[test]
fn test_match_against_conditions() {
    let c = RequestCriteria::builder()
        .path("/search")
        .method(Method::GET)
        .param("q")
        .param("mode!=raw")
        .header("X-Tenant=acme")
        .produces("application/json")
        .build()
        .unwrap();

    let ok = RequestContext::get("/search?q=x")
        .with_header("x-tenant", "acme")
        .with_header("accept", "application/*");
    assert!(c.match_against(&ok, "/search", true).is_some());

    let raw = RequestContext::get("/search?q=x&mode=raw").with_header("x-tenant", "acme");
    assert!(c.match_against(&raw, "/search", true).is_none());

    let html = RequestContext::get("/search?q=x")
        .with_header("x-tenant", "acme")
        .with_header("accept", "text/html");
    assert!(c.match_against(&html, "/search", true).is_none());

    let post = RequestContext::post("/search?q=x").with_header("x-tenant", "acme");
    assert!(c.match_against(&post, "/search", true).is_none());
}

#[test]
fn test_head_matches_get() {
    let c = RequestCriteria::builder().path("/a").method(Method::GET).build().unwrap();
    let head = RequestContext::new(Method::HEAD, "/a");
    assert!(c.match_against(&head, "/a", true).is_some());
}

#[test]
fn test_explicit_head_mapping_beats_get_fallback() {
    let mut registry = HandlerRegistry::new();
    let get = RequestCriteria::builder().path("/a").method(Method::GET).build().unwrap();
    let head = RequestCriteria::builder().path("/a").method(Method::HEAD).build().unwrap();
    registry.register(get, handler("get")).unwrap();
    registry.register(head, handler("head")).unwrap();

    let found = registry.resolve(&RequestContext::new(Method::HEAD, "/a")).unwrap().unwrap();
    assert_eq!(found.id(), "Test#head");
    let found = registry.resolve(&RequestContext::get("/a")).unwrap().unwrap();
    assert_eq!(found.id(), "Test#get");
}

#[test]
fn test_trailing_slash_match() {
    let c = path("/a");
    let ctx = RequestContext::get("/a/");
    assert!(c.match_against(&ctx, "/a/", true).is_some());
    assert!(c.match_against(&ctx, "/a/", false).is_none());
}

#[test]
fn test_register_same_handler_is_idempotent() {
    let mut registry = HandlerRegistry::new();
    let h = handler("one");
    registry.register(path("/a"), Arc::clone(&h)).unwrap();
    registry.register(path("/a"), h).unwrap();
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_register_different_handler_is_duplicate() {
    let mut registry = HandlerRegistry::new();
    registry.register(path("/a"), handler("one")).unwrap();
    let err = registry.register(path("/a"), handler("two")).unwrap_err();
    assert!(matches!(err, DispatchError::DuplicateMapping { .. }));
    assert!(err.is_configuration());
}

#[test]
fn test_variable_beats_wildcard() {
    let mut registry = HandlerRegistry::new();
    registry.register(path("/widgets/*"), handler("h2")).unwrap();
    registry.register(path("/widgets/{id}"), handler("h1")).unwrap();
    let ctx = RequestContext::get("/widgets/42");
    let found = registry.resolve(&ctx).unwrap().unwrap();
    assert_eq!(found.id(), "Test#h1");
    let info = ctx.match_info().unwrap();
    assert_eq!(info.best_pattern.as_deref(), Some("/widgets/{id}"));
    assert_eq!(info.uri_variable("id"), Some("42"));
}

#[test]
fn test_equal_rank_is_ambiguous() {
    let mut registry = HandlerRegistry::new();
    registry.register(path("/a/{x}"), handler("h1")).unwrap();
    registry.register(path("/a/{y}"), handler("h2")).unwrap();
    let err = registry.resolve(&RequestContext::get("/a/1")).unwrap_err();
    match err {
        DispatchError::AmbiguousMapping { first, second, .. } => {
            let mut names = vec![first, second];
            names.sort();
            assert_eq!(names, vec!["Test#h1", "Test#h2"]);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_params_break_ties() {
    let mut registry = HandlerRegistry::new();
    registry.register(path("/a"), handler("plain")).unwrap();
    let constrained = RequestCriteria::builder().path("/a").param("v=2").build().unwrap();
    registry.register(constrained, handler("v2")).unwrap();
    let found = registry.resolve(&RequestContext::get("/a?v=2")).unwrap().unwrap();
    assert_eq!(found.id(), "Test#v2");
    let found = registry.resolve(&RequestContext::get("/a")).unwrap().unwrap();
    assert_eq!(found.id(), "Test#plain");
}

#[test]
fn test_index_shortcut_agrees_with_scan() {
    let mut registry = HandlerRegistry::new();
    registry.register(path("/users/{id}"), handler("pattern")).unwrap();
    registry.register(path("/users/me"), handler("literal")).unwrap();
    assert_eq!(registry.direct_matches("/users/me"), &[1]);
    let found = registry.resolve(&RequestContext::get("/users/me")).unwrap().unwrap();
    assert_eq!(found.id(), "Test#literal");

    // Full scan ranks the exact pattern first as well.
    let ctx = RequestContext::get("/users/me");
    let scanned: Vec<_> = registry
        .mappings()
        .filter_map(|r| r.criteria.match_against(&ctx, "/users/me", true).map(|m| (m, &r.handler)))
        .collect();
    let best = scanned
        .iter()
        .min_by(|a, b| a.0.compare_specificity(&b.0, "/users/me"))
        .unwrap();
    assert_eq!(best.1.id(), "Test#literal");
}

#[test]
fn test_index_falls_back_to_scan_when_literal_does_not_match() {
    let mut registry = HandlerRegistry::new();
    let post_only = RequestCriteria::builder().path("/items/new").method(Method::POST).build().unwrap();
    registry.register(post_only, handler("create")).unwrap();
    registry.register(path("/items/{id}"), handler("show")).unwrap();
    let found = registry.resolve(&RequestContext::get("/items/new")).unwrap().unwrap();
    assert_eq!(found.id(), "Test#show");
}

#[test]
fn test_not_found_and_default_handler() {
    let mut registry = HandlerRegistry::new();
    registry.register(path("/a"), handler("a")).unwrap();
    assert!(registry.resolve(&RequestContext::get("/zzz")).unwrap().is_none());
    registry.set_default_handler(handler("fallback"));
    let found = registry.resolve(&RequestContext::get("/zzz")).unwrap().unwrap();
    assert_eq!(found.id(), "Test#fallback");
}

#[test]
fn test_root_handler() {
    let mut registry = HandlerRegistry::new();
    registry.register_root_handler(handler("root")).unwrap();
    let found = registry.resolve(&RequestContext::get("/")).unwrap().unwrap();
    assert_eq!(found.id(), "Test#root");
}

#[test]
fn test_lookup_path_computation() {
    let registry = HandlerRegistry::with_config(&DispatchConfig::default());
    let ctx = RequestContext::get("/app/a%20b;jsessionid=123/c;v=1").with_context_path("/app");
    assert_eq!(registry.lookup_path(&ctx), "/a b/c");

    let keep = DispatchConfig {
        remove_semicolon_content: false,
        url_decode: false,
        ..DispatchConfig::default()
    };
    let registry = HandlerRegistry::with_config(&keep);
    assert_eq!(registry.lookup_path(&ctx), "/a%20b/c;v=1");
}

#[test]
fn test_mappings_keep_insertion_order() {
    let mut registry = HandlerRegistry::new();
    for p in ["/c", "/a", "/b"] {
        registry.register(path(p), handler(p)).unwrap();
    }
    let order: Vec<_> = registry
        .mappings()
        .map(|r| r.criteria.patterns().patterns()[0].as_str().to_string())
        .collect();
    assert_eq!(order, vec!["/c", "/a", "/b"]);
}

#[test]
fn test_route_table_yaml() {
    let table = RouteTable::from_yaml_str(
        r#"
base_path: /api
default_handler: "Test#fallback"
routes:
  - handler: "Test#show"
    paths: ["/widgets/{id}"]
    methods: [get]
  - handler: "Test#search"
    paths: ["/widgets"]
    params: ["q"]
"#,
    )
    .unwrap();
    let mut provider = std::collections::HashMap::new();
    for name in ["show", "search", "fallback"] {
        let h = handler(name);
        provider.insert(h.id().to_string(), h);
    }
    let mut registry = HandlerRegistry::new();
    assert_eq!(table.register_into(&mut registry, &provider).unwrap(), 2);
    let found = registry.resolve(&RequestContext::get("/api/widgets/9")).unwrap().unwrap();
    assert_eq!(found.id(), "Test#show");
    assert!(registry.default_handler().is_some());
}

#[test]
fn test_route_table_unknown_handler() {
    let table = RouteTable::from_yaml_str("routes:\n  - handler: nope\n    paths: [/x]\n").unwrap();
    let provider: std::collections::HashMap<String, Arc<HandlerMethod>> = Default::default();
    let mut registry = HandlerRegistry::new();
    let err = table.register_into(&mut registry, &provider).unwrap_err();
    assert!(err.to_string().contains("nope"));
}
