//! Radix-tree request router.
//!
//! One tree per HTTP method, O(path-length) lookup. The router also owns the
//! middleware [`Pipeline`] every request runs through, matched or not.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use http::Method;
use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHandler, Handler, not_found};
use crate::middleware::Middleware;
use crate::pipeline::Pipeline;

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Every builder method returns `self` so registrations chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    fallback: BoxedHandler,
    pipeline: Pipeline,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            fallback: not_found.into_boxed_handler(),
            pipeline: Pipeline::new(),
        }
    }

    /// Register a handler for a method + path pair.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them:
    ///
    /// ```rust,no_run
    /// # use hookline::{Method, Request, Response, Router};
    /// # async fn get_user(_: Request) -> Response { Response::text("") }
    /// # async fn create_user(_: Request) -> Response { Response::text("") }
    /// Router::new()
    ///     .on(Method::GET,  "/users/{id}", get_user)
    ///     .on(Method::POST, "/users",      create_user);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or conflicts with one already
    /// registered for `method`.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    /// Append a middleware stage. Stages run in the order added.
    pub fn middleware(mut self, m: impl Middleware) -> Self {
        self.pipeline = self.pipeline.with_middleware(m);
        self
    }

    /// Upper bound on each deferred pre-processing step.
    pub fn pre_process_timeout(mut self, timeout: Duration) -> Self {
        self.pipeline = self.pipeline.pre_process_timeout(timeout);
        self
    }

    /// Resolves a handler, falling back to the 404 handler.
    pub(crate) fn lookup(&self, method: &Method, path: &str) -> (BoxedHandler, HashMap<String, String>) {
        let matched = self.routes.get(method).and_then(|tree| tree.at(path).ok());
        match matched {
            Some(matched) => {
                let params = matched.params.iter()
                    .map(|(k, v)| (k.to_owned(), v.to_owned()))
                    .collect();
                (Arc::clone(matched.value), params)
            }
            None => (Arc::clone(&self.fallback), HashMap::new()),
        }
    }

    pub(crate) fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
