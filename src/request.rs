//! Incoming HTTP request type.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use http::request::Parts;
use http::{HeaderMap, Method, Uri};

use crate::context::RequestContext;

/// An incoming HTTP request with its body fully read.
///
/// Read-only once built. Cloning shares the head, body and params, so the
/// pipeline can hand one copy to the handler and keep another for
/// post-processing.
#[derive(Clone)]
pub struct Request {
    parts: Arc<Parts>,
    body: Bytes,
    params: Arc<HashMap<String, String>>,
    context: RequestContext,
}

impl Request {
    pub(crate) fn new(parts: Parts, body: Bytes, params: HashMap<String, String>) -> Self {
        Self {
            parts: Arc::new(parts),
            body,
            params: Arc::new(params),
            context: RequestContext::new(),
        }
    }

    pub fn method(&self) -> &Method { &self.parts.method }
    pub fn uri(&self) -> &Uri { &self.parts.uri }
    pub fn path(&self) -> &str { self.parts.uri.path() }
    pub fn headers(&self) -> &HeaderMap { &self.parts.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// The context produced by pre-processing. Empty until the pipeline has
    /// run every pre-processor.
    pub fn context(&self) -> &RequestContext { &self.context }

    /// Header lookup; `None` if absent or not visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.parts.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub(crate) fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }
}

#[cfg(test)]
impl Request {
    /// Builds a bodiless request for unit tests.
    pub(crate) fn test(method: Method, uri: &str) -> Self {
        let (parts, ()) = http::Request::builder()
            .method(method)
            .uri(uri)
            .body(())
            .unwrap()
            .into_parts();
        Self::new(parts, Bytes::new(), HashMap::new())
    }
}
