//! Outbound token fetch.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};

use crate::error::{Error, FetchError};

/// Number of characters kept from the fetched body (one hyphenated UUID).
pub const TOKEN_LEN: usize = 36;

/// Fetches a token with a single GET to a fixed URL.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct TokenFetcher {
    client: Client,
    url: Url,
}

impl TokenFetcher {
    /// Every fetch is bounded by `timeout`, connect through last body byte.
    pub fn new(url: Url, timeout: Duration) -> Result<Self, Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the first [`TOKEN_LEN`] characters of the response body.
    ///
    /// Anything but a `200 OK` with a UTF-8 body of at least that many
    /// characters is a [`FetchError`].
    pub async fn fetch(&self) -> Result<String, FetchError> {
        let res = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(FetchError::Transport)?;

        if res.status() != StatusCode::OK {
            return Err(FetchError::Status(res.status()));
        }

        let body = res.bytes().await.map_err(FetchError::Body)?;
        let text = std::str::from_utf8(&body).map_err(|_| FetchError::NotUtf8)?;
        token_prefix(text).map(str::to_owned)
    }
}

/// The first [`TOKEN_LEN`] characters of `text`.
///
/// Counts Unicode scalar values, not bytes and not grapheme clusters: a
/// multi-byte body never splits a code point, but a base letter and its
/// combining mark count as two.
///
/// ```rust
/// use hookline::middleware::token_prefix;
///
/// let token = token_prefix("123e4567-e89b-12d3-a456-426614174000extra").unwrap();
/// assert_eq!(token, "123e4567-e89b-12d3-a456-426614174000");
/// assert!(token_prefix("too short").is_err());
/// ```
pub fn token_prefix(text: &str) -> Result<&str, FetchError> {
    // Char boundaries including the end of the string; boundary N ends char N.
    let end = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .nth(TOKEN_LEN);

    match end {
        Some(end) => Ok(&text[..end]),
        None => Err(FetchError::TokenTooShort { len: text.chars().count(), need: TOKEN_LEN }),
    }
}
