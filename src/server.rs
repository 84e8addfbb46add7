//! HTTP server and graceful shutdown.
//!
//! On SIGTERM or Ctrl-C the server:
//! 1. stops calling `listener.accept()`,
//! 2. lets every in-flight connection task run to completion,
//! 3. returns from [`Server::serve`].
//!
//! Each request runs its whole pipeline inside the connection task. If the
//! client disconnects, hyper drops that task and any pending pre-processing
//! (an outbound fetch, say) is dropped with it.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::BodyExt;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::error::Error;
use crate::request::Request;
use crate::router::Router;
use crate::writer::{self, WriterBody};

enum Listen {
    Addr(String),
    Listener(TcpListener),
}

/// The HTTP server.
pub struct Server {
    listen: Listen,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called. An unparsable address is reported by `serve`.
    ///
    /// ```rust,no_run
    /// use hookline::Server;
    /// let server = Server::bind("0.0.0.0:3000");
    /// ```
    pub fn bind(addr: &str) -> Self {
        Self { listen: Listen::Addr(addr.to_owned()) }
    }

    /// Serves on an already-bound listener, e.g. one bound to port 0.
    pub fn from_listener(listener: TcpListener) -> Self {
        Self { listen: Listen::Listener(listener) }
    }

    /// Accepts connections until SIGTERM or Ctrl-C, then drains in-flight
    /// connections and returns.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        self.serve_with_shutdown(router, shutdown_signal()).await
    }

    /// Like [`serve`](Server::serve), but stops accepting when `signal`
    /// resolves instead of on process signals.
    pub async fn serve_with_shutdown<F>(self, router: Router, signal: F) -> Result<(), Error>
    where
        F: Future<Output = ()> + Send,
    {
        let listener = match self.listen {
            Listen::Listener(listener) => listener,
            Listen::Addr(addr) => {
                let parsed: SocketAddr = addr.parse().map_err(|_| Error::InvalidAddr(addr))?;
                TcpListener::bind(parsed).await?
            }
        };
        let local_addr = listener.local_addr()?;

        let router = Arc::new(router);

        info!(addr = %local_addr, middleware = router.pipeline().len(), "hookline listening");

        let mut tasks = tokio::task::JoinSet::new();

        tokio::pin!(signal);

        loop {
            tokio::select! {
                // Check shutdown first so a signal stops accepting even when
                // more connections are queued.
                biased;

                () = &mut signal => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on the connection.
                        let svc = service_fn(move |req| {
                            let router = Arc::clone(&router);
                            async move { dispatch(router, req, remote_addr).await }
                        });

                        // HTTP/1.1 or HTTP/2, whatever the client negotiates.
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet stays small.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("hookline stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Routes one request, runs the pipeline, and hands hyper the written response.
///
/// An `Err` makes hyper drop the connection; that only happens when the body
/// could not be read or the response was aborted before its header.
async fn dispatch(
    router: Arc<Router>,
    req: hyper::Request<hyper::body::Incoming>,
    remote_addr: SocketAddr,
) -> Result<http::Response<WriterBody>, Error> {
    let (parts, body) = req.into_parts();
    let body = body.collect().await?.to_bytes();

    let (handler, params) = router.lookup(&parts.method, parts.uri.path());
    debug!(peer = %remote_addr, method = %parts.method, path = parts.uri.path(), "dispatching");

    let (writer, pending) = writer::channel();
    let req = Request::new(parts, body, params);
    if let Err(e) = router.pipeline().run(req, &handler, Box::new(writer)).await {
        warn!(peer = %remote_addr, error = %e, "pipeline did not complete the response");
    }

    pending.into_response().await.map_err(|_| Error::Aborted)
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on SIGTERM (Unix) or Ctrl-C. A handler that fails to install
/// is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
