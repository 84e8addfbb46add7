//! Middleware layer.
//!
//! A middleware gets two hooks into every request:
//!
//! - [`pre_process`](Middleware::pre_process) runs before the handler and
//!   may extend the [`RequestContext`], either immediately
//!   ([`PreProcessing::Continue`]) or from a future the pipeline awaits
//!   ([`PreProcessing::Deferred`]).
//! - [`post_process`](Middleware::post_process) runs after the handler and
//!   may swap the [`ResponseWriter`](crate::ResponseWriter) for a wrapper
//!   around it ([`PostProcessing::Replace`]).
//!
//! Hooks run in registration order. Because each post-processor wraps the
//! writer it was given, the last registered middleware sees writes first.
//!
//! Built-in middleware:
//! - [`UuidCookie`]: fetches a UUID before the handler, sets it as a cookie after

use std::future::Future;
use std::pin::Pin;

use crate::context::RequestContext;
use crate::request::Request;
use crate::writer::BoxedWriter;

mod cookie;
mod cookie_writer;
mod fetch;

pub use cookie::{UUID_CONTEXT_KEY, UuidCookie, UuidCookieConfig};
pub use cookie_writer::CookieWriter;
pub use fetch::{TOKEN_LEN, TokenFetcher, token_prefix};

/// A boxed future yielding the next context.
pub type ContextFuture = Pin<Box<dyn Future<Output = RequestContext> + Send + 'static>>;

/// Outcome of a pre-processing hook.
pub enum PreProcessing {
    /// Proceed now with this context.
    Continue(RequestContext),
    /// Proceed once the future resolves. The pipeline owns the future: it is
    /// dropped, and whatever it was doing cancelled, if the request goes away
    /// or the pipeline's pre-process timeout fires.
    Deferred(ContextFuture),
}

/// Outcome of a post-processing hook.
///
/// Both variants carry a writer because the hook takes ownership of the one
/// it was given.
pub enum PostProcessing {
    /// Use this writer (typically a wrapper around the given one) from now on.
    Replace(BoxedWriter),
    /// The middleware had nothing to do; the writer is handed back untouched.
    NotApplicable(BoxedWriter),
}

impl PostProcessing {
    pub fn into_writer(self) -> BoxedWriter {
        match self {
            Self::Replace(writer) | Self::NotApplicable(writer) => writer,
        }
    }

    pub fn is_replace(&self) -> bool {
        matches!(self, Self::Replace(_))
    }
}

/// A pipeline stage. Both hooks default to doing nothing.
pub trait Middleware: Send + Sync + 'static {
    fn pre_process(&self, _req: &Request, ctx: RequestContext) -> PreProcessing {
        PreProcessing::Continue(ctx)
    }

    fn post_process(&self, _req: &Request, _ctx: &RequestContext, writer: BoxedWriter) -> PostProcessing {
        PostProcessing::NotApplicable(writer)
    }
}
