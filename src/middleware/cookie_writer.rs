//! Writer decorator that adds one `Set-Cookie` header.

use async_trait::async_trait;
use bytes::Bytes;
use http::header::SET_COOKIE;
use http::{HeaderMap, HeaderValue, StatusCode};

use crate::error::WriteError;
use crate::writer::{BoxedWriter, ResponseWriter};

/// Wraps a writer and appends `Set-Cookie: <cookie>` to the header it
/// writes. Status, the other headers, and every other call pass through.
pub struct CookieWriter {
    inner: BoxedWriter,
    cookie: HeaderValue,
}

impl CookieWriter {
    pub fn new(inner: BoxedWriter, cookie: HeaderValue) -> Self {
        Self { inner, cookie }
    }
}

#[async_trait]
impl ResponseWriter for CookieWriter {
    async fn write_header(&mut self, status: StatusCode, mut headers: HeaderMap) -> Result<(), WriteError> {
        // `append`, not `insert`: existing cookies stay.
        headers.append(SET_COOKIE, self.cookie.clone());
        self.inner.write_header(status, headers).await
    }

    async fn write_trailer(&mut self, trailers: HeaderMap) -> Result<(), WriteError> {
        self.inner.write_trailer(trailers).await
    }

    async fn write_body(&mut self, chunk: Bytes) -> Result<(), WriteError> {
        self.inner.write_body(chunk).await
    }

    async fn done(&mut self) -> Result<(), WriteError> {
        self.inner.done().await
    }

    async fn abort(&mut self) -> Result<(), WriteError> {
        self.inner.abort().await
    }
}
