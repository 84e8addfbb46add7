//! Error types.
//!
//! Three families, one per layer:
//!
//! - [`Error`]: infrastructure failures surfaced by [`Server`](crate::Server)
//!   and by middleware construction.
//! - [`FetchError`]: why a token fetch produced nothing. Always recovered
//!   locally; a request never fails because of one.
//! - [`WriteError`]: misuse or failure of a [`ResponseWriter`](crate::ResponseWriter).

use http::StatusCode;
use thiserror::Error;

/// The error type returned by hookline's fallible setup operations.
///
/// Application-level errors (404, 422, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("http: {0}")]
    Http(#[from] hyper::Error),

    #[error("invalid socket address `{0}`")]
    InvalidAddr(String),

    #[error("http client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("response aborted before the header was written")]
    Aborted,
}

/// Failure modes of [`TokenFetcher::fetch`](crate::middleware::TokenFetcher::fetch).
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, TLS, or timeout failure.
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(StatusCode),

    /// The response head arrived but the body could not be read.
    #[error("failed to read body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("body is not valid UTF-8")]
    NotUtf8,

    /// The body decoded fine but holds fewer characters than a token.
    #[error("token too short: got {len} characters, need {need}")]
    TokenTooShort { len: usize, need: usize },
}

/// Failure of a single [`ResponseWriter`](crate::ResponseWriter) operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
    #[error("header already written")]
    HeaderAlreadyWritten,

    #[error("header not written yet")]
    HeaderNotWritten,

    /// `done` or `abort` was already called.
    #[error("response already finished")]
    Finished,

    /// The receiving side (connection) is gone.
    #[error("connection closed")]
    Closed,

    #[error("response aborted")]
    Aborted,
}
