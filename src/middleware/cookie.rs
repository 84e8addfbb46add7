//! UUID cookie middleware.
//!
//! Before the handler runs, fetch a UUID from a configured URL and stash it
//! in the request context. After the handler runs, if the UUID made it into
//! the context, wrap the response writer so the response carries it as a
//! cookie. A failed fetch only means no cookie; the request itself proceeds.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use http::HeaderValue;
use reqwest::Url;
use tracing::{debug, error, trace, warn};

use super::cookie_writer::CookieWriter;
use super::fetch::TokenFetcher;
use super::{Middleware, PostProcessing, PreProcessing};
use crate::context::RequestContext;
use crate::error::Error;
use crate::request::Request;
use crate::writer::BoxedWriter;

/// Context key the fetched UUID is stored under.
pub const UUID_CONTEXT_KEY: &str = "X-OurUUID";

/// `Wed, 21 Oct 2015 07:28:00 GMT`
const EXPIRES_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Settings for [`UuidCookie`].
///
/// Name and URL are required; the rest default to a cookie scoped to
/// `localhost` at `/`, valid for one hour, with a five-second fetch timeout.
#[derive(Debug, Clone)]
pub struct UuidCookieConfig {
    cookie_name: String,
    url: Url,
    path: String,
    domain: String,
    lifetime: Duration,
    timeout: Duration,
}

impl UuidCookieConfig {
    pub fn new(cookie_name: impl Into<String>, url_for_uuid_fetch: Url) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            url: url_for_uuid_fetch,
            path: "/".to_owned(),
            domain: "localhost".to_owned(),
            lifetime: Duration::from_secs(3600),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// How far past "now" the cookie's `expires` attribute lies.
    pub fn lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Upper bound on one UUID fetch.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Sets a cookie holding a UUID fetched over HTTP.
///
/// ```rust,no_run
/// use hookline::{Method, Response, Router, Server, Request};
/// use hookline::middleware::UuidCookie;
///
/// # async fn run() -> Result<(), hookline::Error> {
/// let url = "https://www.uuidgenerator.net/api/version4".parse().unwrap();
/// let app = Router::new()
///     .on(Method::GET, "/", |_req: Request| async { Response::text("hi") })
///     .middleware(UuidCookie::new("session", url)?);
///
/// Server::bind("0.0.0.0:3000").serve(app).await
/// # }
/// ```
pub struct UuidCookie {
    fetcher: TokenFetcher,
    cookie_name: String,
    path: String,
    domain: String,
    lifetime: TimeDelta,
}

impl UuidCookie {
    /// Fails only if the HTTP client cannot be initialised.
    pub fn new(cookie_name: impl Into<String>, url_for_uuid_fetch: Url) -> Result<Self, Error> {
        Self::from_config(UuidCookieConfig::new(cookie_name, url_for_uuid_fetch))
    }

    pub fn from_config(config: UuidCookieConfig) -> Result<Self, Error> {
        let lifetime = TimeDelta::from_std(config.lifetime).unwrap_or(TimeDelta::MAX);
        Ok(Self {
            fetcher: TokenFetcher::new(config.url, config.timeout)?,
            cookie_name: config.cookie_name,
            path: config.path,
            domain: config.domain,
            lifetime,
        })
    }

    /// Renders the `Set-Cookie` value for `token` as of `now`.
    pub fn cookie_string(&self, token: &str, now: DateTime<Utc>) -> String {
        let expires = now
            .checked_add_signed(self.lifetime)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
            .format(EXPIRES_FORMAT);
        format!(
            "{}={}; path={}; domain={}; expires={};",
            self.cookie_name, token, self.path, self.domain, expires,
        )
    }
}

impl Middleware for UuidCookie {
    fn pre_process(&self, _req: &Request, ctx: RequestContext) -> PreProcessing {
        let fetcher = self.fetcher.clone();
        PreProcessing::Deferred(Box::pin(async move {
            match fetcher.fetch().await {
                Ok(token) => {
                    debug!(%token, "fetched UUID");
                    ctx.adding([(UUID_CONTEXT_KEY, token)])
                }
                Err(e) => {
                    error!(url = %fetcher.url(), error = %e, "failed to retrieve UUID");
                    ctx
                }
            }
        }))
    }

    fn post_process(&self, _req: &Request, ctx: &RequestContext, writer: BoxedWriter) -> PostProcessing {
        let Some(token) = ctx.get(UUID_CONTEXT_KEY) else {
            trace!("no {UUID_CONTEXT_KEY} in context, leaving response alone");
            return PostProcessing::NotApplicable(writer);
        };

        match HeaderValue::try_from(self.cookie_string(token, Utc::now())) {
            Ok(cookie) => PostProcessing::Replace(Box::new(CookieWriter::new(writer, cookie))),
            Err(_) => {
                warn!(%token, "UUID is not a valid header value, skipping cookie");
                PostProcessing::NotApplicable(writer)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use http::header::SET_COOKIE;
    use http::{HeaderMap, Method, StatusCode};

    use super::*;
    use crate::testing::{Call, Recorder, capture_logs, closed_port_url, upstream};

    const UUID: &str = "123e4567-e89b-12d3-a456-426614174000";

    fn middleware(url: Url) -> UuidCookie {
        UuidCookie::new("ourCookie", url).unwrap()
    }

    async fn run_pre(mw: &UuidCookie, ctx: RequestContext) -> RequestContext {
        match mw.pre_process(&Request::test(Method::GET, "/"), ctx) {
            PreProcessing::Deferred(fut) => fut.await,
            PreProcessing::Continue(_) => panic!("fetch should be deferred"),
        }
    }

    #[test]
    fn cookie_string_format() {
        let mw = middleware("http://127.0.0.1:1/".parse().unwrap());
        let now = Utc.with_ymd_and_hms(2017, 5, 1, 12, 0, 0).unwrap();

        assert_eq!(
            mw.cookie_string(UUID, now),
            format!("ourCookie={UUID}; path=/; domain=localhost; expires=Mon, 01 May 2017 13:00:00 GMT;"),
        );
    }

    #[test]
    fn cookie_string_honours_config() {
        let config = UuidCookieConfig::new("c", "http://127.0.0.1:1/".parse().unwrap())
            .path("/app")
            .domain("example.com")
            .lifetime(Duration::from_secs(60));
        let mw = UuidCookie::from_config(config).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 30).unwrap();

        assert_eq!(
            mw.cookie_string("v", now),
            "c=v; path=/app; domain=example.com; expires=Fri, 01 Mar 2024 00:00:30 GMT;",
        );
    }

    #[tokio::test]
    async fn successful_fetch_adds_one_entry() {
        let up = upstream(StatusCode::OK, format!("{UUID}extra")).await;
        let before = RequestContext::new().adding([("other", "x")]);

        let after = run_pre(&middleware(up.url()), before.clone()).await;

        assert_eq!(after.len(), before.len() + 1);
        assert_eq!(after.get(UUID_CONTEXT_KEY), Some(UUID));
        assert_eq!(after.get("other"), Some("x"));
    }

    #[tokio::test]
    async fn server_error_leaves_context_unchanged() {
        let (logs, _guard) = capture_logs();
        let up = upstream(StatusCode::INTERNAL_SERVER_ERROR, UUID).await;
        let before = RequestContext::new().adding([("other", "x")]);

        let after = run_pre(&middleware(up.url()), before.clone()).await;
        assert_eq!(after, before);

        let failures = logs.matching("failed to retrieve UUID");
        assert_eq!(failures.len(), 1, "{:?}", logs.lines());
        assert!(failures[0].contains("ERROR"));
        assert!(failures[0].contains("500"));
        assert!(logs.matching("fetched UUID").is_empty());
    }

    #[tokio::test]
    async fn network_error_leaves_context_unchanged() {
        let after = run_pre(&middleware(closed_port_url()), RequestContext::new()).await;
        assert!(after.is_empty());
    }

    #[tokio::test]
    async fn short_body_leaves_context_unchanged() {
        let up = upstream(StatusCode::OK, "not-a-uuid").await;
        let after = run_pre(&middleware(up.url()), RequestContext::new()).await;
        assert!(!after.contains_key(UUID_CONTEXT_KEY));
    }

    #[tokio::test]
    async fn post_process_without_token_is_not_applicable() {
        let mw = middleware("http://127.0.0.1:1/".parse().unwrap());
        let (recorder, calls) = Recorder::new();
        let req = Request::test(Method::GET, "/");

        let (logs, guard) = capture_logs();
        let outcome = mw.post_process(&req, &RequestContext::new(), Box::new(recorder));
        drop(guard);
        assert!(!outcome.is_replace());

        let skipped = logs.matching(UUID_CONTEXT_KEY);
        assert_eq!(skipped.len(), 1, "{:?}", logs.lines());
        assert!(skipped[0].contains("TRACE"));

        // The handed-back writer is the original one: no cookie appears.
        let mut writer = outcome.into_writer();
        writer.write_header(StatusCode::OK, HeaderMap::new()).await.unwrap();
        assert_eq!(calls.take(), vec![Call::Header(StatusCode::OK, HeaderMap::new())]);
    }

    #[tokio::test]
    async fn post_process_with_token_replaces_writer() {
        let mw = middleware("http://127.0.0.1:1/".parse().unwrap());
        let (recorder, calls) = Recorder::new();
        let req = Request::test(Method::GET, "/");
        let ctx = RequestContext::new().adding([(UUID_CONTEXT_KEY, UUID)]);

        let outcome = mw.post_process(&req, &ctx, Box::new(recorder));
        assert!(outcome.is_replace());

        let mut writer = outcome.into_writer();
        writer.write_header(StatusCode::OK, HeaderMap::new()).await.unwrap();
        let recorded = calls.take();
        let Call::Header(_, headers) = &recorded[0] else { panic!("expected header call") };
        let cookie = headers[SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with(&format!("ourCookie={UUID}; path=/; domain=localhost; expires=")));
        assert!(cookie.ends_with(" GMT;"));
    }

    #[tokio::test]
    async fn unprintable_token_is_skipped() {
        let mw = middleware("http://127.0.0.1:1/".parse().unwrap());
        let (recorder, _calls) = Recorder::new();
        let ctx = RequestContext::new().adding([(UUID_CONTEXT_KEY, "bad\nvalue")]);

        let outcome = mw.post_process(&Request::test(Method::GET, "/"), &ctx, Box::new(recorder));
        assert!(!outcome.is_replace());
    }
}
