//! Header generation and response application.

use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Response};

use crate::error::{CachePolicyError, CachePolicyResult};
use crate::policy::CachePolicyResolver;

/// Header names emitted by the resolver.
pub mod header_names {
    /// Standard Cache-Control header.
    pub const CACHE_CONTROL: &str = "Cache-Control";
    /// Resolved cache state (debug).
    pub const X_CACHE_STATE: &str = "X-Cache-State";
    /// Accepted forcing level (debug).
    pub const X_CACHE_FORCING_LEVEL: &str = "X-Cache-Forcing-Level";
    /// Request header that opts into debug headers.
    pub const X_DEBUG_CACHE: &str = "X-Debug-Cache";
}

/// Anything headers can be appended to.
pub trait ResponseHeaders {
    /// Append a header, keeping existing values with the same name.
    fn add_header(&mut self, name: &str, value: &str) -> CachePolicyResult<()>;
}

impl ResponseHeaders for HeaderMap {
    fn add_header(&mut self, name: &str, value: &str) -> CachePolicyResult<()> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| CachePolicyError::InvalidHeader(name.to_string()))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| CachePolicyError::InvalidHeader(format!("{}: {}", name, value)))?;
        self.append(name, value);
        Ok(())
    }
}

impl<B> ResponseHeaders for Response<B> {
    fn add_header(&mut self, name: &str, value: &str) -> CachePolicyResult<()> {
        self.headers_mut().add_header(name, value)
    }
}

impl CachePolicyResolver {
    /// Render the Cache-Control value for the current state.
    pub fn generate_cache_header_value(&self) -> String {
        self.table(self.current_state()).header_value()
    }

    /// Headers to attach to the response.
    pub fn generate_headers(&self) -> Vec<(String, String)> {
        vec![(header_names::CACHE_CONTROL.to_string(), self.generate_cache_header_value())]
    }

    /// Debug headers describing how the policy was resolved.
    pub fn explain_headers(&self) -> Vec<(String, String)> {
        vec![
            (header_names::X_CACHE_STATE.to_string(), self.current_state().to_string()),
            (header_names::X_CACHE_FORCING_LEVEL.to_string(), self.forcing_level().to_string()),
        ]
    }

    /// Append the generated headers to a response.
    pub fn apply_to_response<R: ResponseHeaders + ?Sized>(&self, response: &mut R) -> CachePolicyResult<()> {
        for (name, value) in self.generate_headers() {
            response.add_header(&name, &value)?;
        }
        Ok(())
    }
}

/// Whether the request opted into cache debug headers.
pub fn should_include_debug_headers<'a, I>(request_headers: I) -> bool
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    request_headers
        .into_iter()
        .any(|(name, value)| name.eq_ignore_ascii_case(header_names::X_DEBUG_CACHE) && value == "1")
}
