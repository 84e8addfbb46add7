//! UUID cookie demo.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example uuid_cookie [UUID_URL]
//!
//! Try:
//!   curl -i http://localhost:3000/
//!
//! Every response carries `Set-Cookie: visitor=<uuid>; …` as long as
//! UUID_URL answers `200 OK` with a UUID in the body.

use hookline::middleware::{UUID_CONTEXT_KEY, UuidCookie};
use hookline::{Method, Request, Response, Router, Server};

const DEFAULT_UUID_URL: &str = "https://www.uuidgenerator.net/api/version4";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let url = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_UUID_URL.to_owned());

    let app = Router::new()
        .on(Method::GET, "/", hello)
        .middleware(UuidCookie::new("visitor", url.parse()?)?);

    Server::bind("0.0.0.0:3000").serve(app).await?;
    Ok(())
}

// GET /: the handler sees the same UUID the cookie will carry.
async fn hello(req: Request) -> Response {
    match req.context().get(UUID_CONTEXT_KEY) {
        Some(uuid) => Response::text(format!("hello, {uuid}\n")),
        None => Response::text("hello, stranger\n"),
    }
}
