//! Shared fixtures for unit tests.

use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use reqwest::Url;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::subscriber::DefaultGuard;

use crate::error::WriteError;
use crate::writer::ResponseWriter;
use crate::{Request, Response, Router, Server};

/// One call observed by a [`Recorder`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Header(StatusCode, HeaderMap),
    Trailer(HeaderMap),
    Body(Bytes),
    Done,
    Abort,
}

/// Handle to the calls a [`Recorder`] has seen, usable after the recorder
/// itself has been boxed and moved away.
#[derive(Clone, Default)]
pub(crate) struct Calls(Arc<Mutex<Vec<Call>>>);

impl Calls {
    pub(crate) fn take(&self) -> Vec<Call> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

/// Writer that records every call and answers with a fixed result.
pub(crate) struct Recorder {
    calls: Calls,
    fail: Option<WriteError>,
}

impl Recorder {
    pub(crate) fn new() -> (Self, Calls) {
        let calls = Calls::default();
        (Self { calls: calls.clone(), fail: None }, calls)
    }

    pub(crate) fn failing(err: WriteError) -> (Self, Calls) {
        let calls = Calls::default();
        (Self { calls: calls.clone(), fail: Some(err) }, calls)
    }

    fn record(&self, call: Call) -> Result<(), WriteError> {
        self.calls.0.lock().unwrap().push(call);
        match &self.fail {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ResponseWriter for Recorder {
    async fn write_header(&mut self, status: StatusCode, headers: HeaderMap) -> Result<(), WriteError> {
        self.record(Call::Header(status, headers))
    }

    async fn write_trailer(&mut self, trailers: HeaderMap) -> Result<(), WriteError> {
        self.record(Call::Trailer(trailers))
    }

    async fn write_body(&mut self, chunk: Bytes) -> Result<(), WriteError> {
        self.record(Call::Body(chunk))
    }

    async fn done(&mut self) -> Result<(), WriteError> {
        self.record(Call::Done)
    }

    async fn abort(&mut self) -> Result<(), WriteError> {
        self.record(Call::Abort)
    }
}

/// A local server answering `GET /uuid` with a fixed status and body.
/// Shuts down when dropped.
pub(crate) struct Upstream {
    addr: SocketAddr,
    _shutdown: oneshot::Sender<()>,
}

impl Upstream {
    pub(crate) fn url(&self) -> Url {
        format!("http://{}/uuid", self.addr).parse().unwrap()
    }
}

pub(crate) async fn upstream(status: StatusCode, body: impl Into<Bytes>) -> Upstream {
    let body = body.into();
    let router = Router::new().on(Method::GET, "/uuid", move |_req: Request| {
        let body = body.clone();
        async move { Response::builder().status(status).json(body) }
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(Server::from_listener(listener).serve_with_shutdown(router, async {
        let _ = rx.await;
    }));

    Upstream { addr, _shutdown: tx }
}

/// A URL on a port nothing listens on.
pub(crate) fn closed_port_url() -> Url {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}/uuid").parse().unwrap()
}

/// Formatted log output collected by [`capture_logs`].
#[derive(Clone, Default)]
pub(crate) struct Logs(Arc<Mutex<Vec<u8>>>);

impl Logs {
    pub(crate) fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock().unwrap()).lines().map(str::to_owned).collect()
    }

    /// Lines mentioning `needle`.
    pub(crate) fn matching(&self, needle: &str) -> Vec<String> {
        self.lines().into_iter().filter(|line| line.contains(needle)).collect()
    }
}

impl io::Write for Logs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Routes every event on this thread, down to `TRACE`, into a buffer until
/// the guard is dropped. `#[tokio::test]` runs on one thread, so spawned
/// tasks are covered too.
pub(crate) fn capture_logs() -> (Logs, DefaultGuard) {
    let logs = Logs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .finish();
    (logs, tracing::subscriber::set_default(subscriber))
}
