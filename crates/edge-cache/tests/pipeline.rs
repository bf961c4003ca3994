//! End-to-end checks of the cache policy middleware.

use std::sync::Arc;

use edge_cache::{CacheControlConfig, CachePolicyFactory, CachePolicyLayer, CachePolicyResolver, CacheState};
use edge_core::{HandlerError, HandlerResult, Method, RequestContext};
use http::header::{CACHE_CONTROL, LAST_MODIFIED};
use http::{HeaderMap, HeaderValue, Response, StatusCode};

const CONFIG: &str = r#"
extra_directives = ["immutable"]

[state_directives.public]
max-age = 300
s-maxage = 900

[state_directives.private]
max-age = 60
"#;

fn factory() -> Arc<CachePolicyFactory> {
    let config = CacheControlConfig::from_toml_str(CONFIG).unwrap();
    Arc::new(CachePolicyFactory::from_config(config).unwrap())
}

/// Catalog page: public unless a session exists, disabled on errors.
fn catalog(ctx: &RequestContext, cache: &mut CachePolicyResolver) -> HandlerResult<String> {
    cache.public_cache(false);

    if ctx.header("cookie").is_some() {
        cache.private_cache(false);
    }

    match ctx.query_param("id") {
        Some("missing") => {
            cache.disable_cache(true);
            Err(HandlerError::status(StatusCode::NOT_FOUND))
        }
        Some("broken") => Err(anyhow::anyhow!("inventory service down").into()),
        _ => {
            // Late, weaker request from a shared component.
            cache.enable_cache(false);
            Ok(Response::new("catalog".to_string()))
        }
    }
}

#[test]
fn test_anonymous_request_is_public() {
    let layer = CachePolicyLayer::new(factory());
    let ctx = RequestContext::new(Method::Get, "/catalog");

    let response = layer.call(&ctx, &catalog).unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[CACHE_CONTROL],
        "public, must-revalidate, max-age=300, s-maxage=900"
    );
}

#[test]
fn test_session_request_is_private() {
    let layer = CachePolicyLayer::new(factory());
    let ctx = RequestContext::new(Method::Get, "/catalog").with_header("Cookie", "sid=1");

    let response = layer.call(&ctx, &catalog).unwrap();

    assert_eq!(response.headers()[CACHE_CONTROL], "private, must-revalidate, max-age=60");
}

#[test]
fn test_not_found_is_uncacheable_and_conditional_pass_runs() {
    let layer = CachePolicyLayer::new(factory()).with_conditional(|headers: &mut HeaderMap| {
        headers.insert(LAST_MODIFIED, HeaderValue::from_static("Mon, 19 Oct 2026 00:00:00 GMT"));
    });
    let ctx = RequestContext::new(Method::Get, "/catalog").with_query("id", "missing");

    let response = layer.call(&ctx, &catalog).unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()[CACHE_CONTROL], "no-cache, no-store, must-revalidate");
    assert!(response.headers().contains_key(LAST_MODIFIED));
}

#[test]
fn test_fault_returns_error() {
    let layer = CachePolicyLayer::new(factory());
    let ctx = RequestContext::new(Method::Get, "/catalog").with_query("id", "broken");

    let err = layer.call(&ctx, &catalog).unwrap_err();

    assert!(format!("{:#}", err).contains("inventory service down"));
}

#[test]
fn test_requests_do_not_share_policy() {
    let layer = CachePolicyLayer::new(factory());

    let missing = RequestContext::new(Method::Get, "/catalog").with_query("id", "missing");
    layer.call(&missing, &catalog).unwrap();

    let next = RequestContext::new(Method::Get, "/catalog");
    let response = layer.call(&next, &catalog).unwrap();

    assert!(response.headers()[CACHE_CONTROL].to_str().unwrap().starts_with("public"));
}

#[test]
fn test_extra_directive_from_config() {
    let layer = CachePolicyLayer::new(factory());
    let ctx = RequestContext::new(Method::Get, "/assets/app.js");

    let handler = |_: &RequestContext, cache: &mut CachePolicyResolver| -> HandlerResult<String> {
        cache
            .public_cache(true)
            .set_state_directive(CacheState::Public, "immutable", true)
            .map_err(anyhow::Error::from)?;
        Ok(Response::new(String::new()))
    };

    let response = layer.call(&ctx, &handler).unwrap();

    assert_eq!(
        response.headers()[CACHE_CONTROL],
        "public, must-revalidate, max-age=300, s-maxage=900, immutable"
    );
}
