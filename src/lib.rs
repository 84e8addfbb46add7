//! # hookline
//!
//! A minimal HTTP framework whose middleware gets two hooks per request:
//! one before the handler, one after.
//!
//! - **Pre-processing** may extend the per-request [`RequestContext`], and
//!   may do so asynchronously: return a future and the pipeline awaits it
//!   (bounded by a timeout) before calling the handler.
//! - **Post-processing** may replace the [`ResponseWriter`] with a wrapper,
//!   changing what reaches the wire without touching the handler.
//!
//! [`middleware::UuidCookie`] uses both: it fetches a UUID over HTTP before
//! the handler runs and sets it as a cookie afterwards.
//!
//! The rest is deliberately small: radix-tree routing via [`matchit`],
//! hyper 1 on tokio, graceful shutdown on SIGTERM / Ctrl-C.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use hookline::{Method, Request, Response, Router, Server, StatusCode};
//! use hookline::middleware::UuidCookie;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), hookline::Error> {
//!     let uuid_source = "http://localhost:4000/uuid".parse().unwrap();
//!
//!     let app = Router::new()
//!         .on(Method::GET,  "/users/{id}", get_user)
//!         .on(Method::POST, "/users",      create_user)
//!         .middleware(UuidCookie::new("visitor", uuid_source)?);
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await
//! }
//!
//! async fn get_user(req: Request) -> Response {
//!     let id = req.param("id").unwrap_or("unknown");
//!     Response::json(format!(r#"{{"id":"{id}"}}"#))
//! }
//!
//! async fn create_user(req: Request) -> Response {
//!     if req.body().is_empty() {
//!         return Response::status(StatusCode::BAD_REQUEST);
//!     }
//!     Response::builder()
//!         .status(StatusCode::CREATED)
//!         .header("location", "/users/99")
//!         .json(r#"{"id":"99"}"#)
//! }
//! ```

mod context;
mod error;
mod handler;
mod pipeline;
mod request;
mod response;
mod router;
mod server;
#[cfg(test)]
mod testing;

pub mod middleware;
pub mod writer;

pub use context::RequestContext;
pub use error::{Error, FetchError, WriteError};
pub use handler::Handler;
pub use http::{HeaderMap, Method, StatusCode};
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use writer::{BoxedWriter, ChannelWriter, ResponseWriter};
