//! Middleware that attaches resolved cache headers to every response.
//!
//! The layer hands each handler a fresh [`CachePolicyResolver`], recovers
//! responses carried by [`HandlerError::Abort`], applies the resolved
//! Cache-Control header, and finally runs the conditional-header pass.

use std::sync::Arc;

use anyhow::{Context, Result};
use edge_core::{HandlerError, HandlerResult, RequestContext};
use http::{HeaderMap, Response};
use tracing::{debug, instrument};

use crate::factory::CachePolicyFactory;
use crate::headers::{should_include_debug_headers, ResponseHeaders};
use crate::policy::CachePolicyResolver;

/// A request handler that can steer the cache policy.
pub trait Handler<B> {
    /// Handle a request.
    fn handle(&self, ctx: &RequestContext, cache: &mut CachePolicyResolver) -> HandlerResult<B>;
}

impl<B, F> Handler<B> for F
where
    F: Fn(&RequestContext, &mut CachePolicyResolver) -> HandlerResult<B>,
{
    fn handle(&self, ctx: &RequestContext, cache: &mut CachePolicyResolver) -> HandlerResult<B> {
        self(ctx, cache)
    }
}

/// Supplementary cache-header pass run after the policy headers.
///
/// Hosts plug in ETag / Last-Modified handling here.
pub trait ConditionalHeaders {
    /// Add conditional caching headers to the response.
    fn add_cache_headers(&self, headers: &mut HeaderMap);
}

/// Conditional-header pass that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConditionalHeaders;

impl ConditionalHeaders for NoConditionalHeaders {
    fn add_cache_headers(&self, _headers: &mut HeaderMap) {}
}

impl<F> ConditionalHeaders for F
where
    F: Fn(&mut HeaderMap),
{
    fn add_cache_headers(&self, headers: &mut HeaderMap) {
        self(headers)
    }
}

/// Cache policy middleware.
#[derive(Debug, Clone)]
pub struct CachePolicyLayer<C = NoConditionalHeaders> {
    factory: Arc<CachePolicyFactory>,
    conditional: C,
}

impl CachePolicyLayer<NoConditionalHeaders> {
    /// Create a layer without a conditional-header pass.
    pub fn new(factory: Arc<CachePolicyFactory>) -> Self {
        Self {
            factory,
            conditional: NoConditionalHeaders,
        }
    }
}

impl<C: ConditionalHeaders> CachePolicyLayer<C> {
    /// Replace the conditional-header pass.
    pub fn with_conditional<D: ConditionalHeaders>(self, conditional: D) -> CachePolicyLayer<D> {
        CachePolicyLayer {
            factory: self.factory,
            conditional,
        }
    }

    /// Factory used for per-request resolvers.
    pub fn factory(&self) -> &CachePolicyFactory {
        &self.factory
    }

    /// Run `handler` and decorate its response with cache headers.
    ///
    /// Aborted requests still get headers. Handler faults are returned as
    /// errors with no response.
    #[instrument(skip_all, fields(request_id = %ctx.request_id, path = %ctx.path))]
    pub fn call<B, H>(&self, ctx: &RequestContext, handler: &H) -> Result<Response<B>>
    where
        H: Handler<B> + ?Sized,
    {
        let mut resolver = self.factory.resolver();

        let mut response = match handler.handle(ctx, &mut resolver) {
            Ok(response) => response,
            Err(HandlerError::Abort(response)) => {
                debug!(status = %response.status(), "recovered aborted response");
                response
            }
            Err(HandlerError::Fault(err)) => {
                return Err(err).context(format!("handler failed for {}", ctx.path));
            }
        };

        resolver
            .apply_to_response(&mut response)
            .context("failed to apply cache policy headers")?;

        if should_include_debug_headers(&ctx.headers) {
            for (name, value) in resolver.explain_headers() {
                response.add_header(&name, &value)?;
            }
        }

        self.conditional.add_cache_headers(response.headers_mut());

        debug!(
            state = %resolver.current_state(),
            forcing_level = resolver.forcing_level(),
            "cache policy applied"
        );

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use edge_core::Method;
    use http::header::{CACHE_CONTROL, ETAG};
    use http::{HeaderValue, StatusCode};

    use super::*;

    fn layer() -> CachePolicyLayer {
        CachePolicyLayer::new(Arc::new(CachePolicyFactory::default()))
    }

    fn ctx() -> RequestContext {
        RequestContext::new(Method::Get, "/products/42")
    }

    #[test]
    fn test_success_gets_policy_header() {
        let handler = |_: &RequestContext, cache: &mut CachePolicyResolver| -> HandlerResult<String> {
            cache.public_cache(false).set_max_age(120).map_err(anyhow::Error::from)?;
            Ok(Response::new("ok".to_string()))
        };

        let response = layer().call(&ctx(), &handler).unwrap();

        assert_eq!(response.headers()[CACHE_CONTROL], "public, must-revalidate, max-age=120");
        assert_eq!(response.body(), "ok");
    }

    #[test]
    fn test_abort_is_recovered_with_headers() {
        let handler = |_: &RequestContext, cache: &mut CachePolicyResolver| -> HandlerResult<String> {
            cache.disable_cache(true);
            Err(HandlerError::status(StatusCode::NOT_FOUND))
        };

        let response = layer().call(&ctx(), &handler).unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[CACHE_CONTROL], "no-cache, no-store, must-revalidate");
    }

    #[test]
    fn test_fault_propagates() {
        let handler = |_: &RequestContext, _: &mut CachePolicyResolver| -> HandlerResult<String> {
            Err(anyhow::anyhow!("upstream timeout").into())
        };

        let err = layer().call(&ctx(), &handler).unwrap_err();

        assert!(err.to_string().contains("handler failed for /products/42"));
        assert!(format!("{:#}", err).contains("upstream timeout"));
    }

    #[test]
    fn test_conditional_pass_runs_after_policy() {
        let handler = |_: &RequestContext, _: &mut CachePolicyResolver| -> HandlerResult<String> {
            Err(HandlerError::status(StatusCode::GONE))
        };
        let layer = layer().with_conditional(|headers: &mut HeaderMap| {
            assert!(headers.contains_key(CACHE_CONTROL));
            headers.insert(ETAG, HeaderValue::from_static("\"abc\""));
        });

        let response = layer.call(&ctx(), &handler).unwrap();

        assert_eq!(response.headers()[ETAG], "\"abc\"");
    }

    #[test]
    fn test_debug_headers_on_request() {
        let handler = |_: &RequestContext, cache: &mut CachePolicyResolver| -> HandlerResult<String> {
            cache.private_cache(false);
            Ok(Response::new(String::new()))
        };
        let ctx = ctx().with_header("X-Debug-Cache", "1");

        let response = layer().call(&ctx, &handler).unwrap();

        assert_eq!(response.headers()["x-cache-state"], "private");
        assert_eq!(response.headers()["x-cache-forcing-level"], "2");
    }

    #[test]
    fn test_no_debug_headers_by_default() {
        let handler =
            |_: &RequestContext, _: &mut CachePolicyResolver| -> HandlerResult<String> { Ok(Response::new(String::new())) };

        let response = layer().call(&ctx(), &handler).unwrap();

        assert!(!response.headers().contains_key("x-cache-state"));
        assert_eq!(response.headers()[CACHE_CONTROL], "must-revalidate");
    }
}
