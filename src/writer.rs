//! Response writers.
//!
//! A [`ResponseWriter`] is the sink a response is emitted through: header
//! first, then body chunks, optional trailers, then `done` (or `abort`).
//! Post-processing middleware can wrap the writer the pipeline hands it;
//! see [`CookieWriter`](crate::middleware::CookieWriter).
//!
//! Every operation is an `async fn`. Awaiting the call is the completion
//! signal, so a caller observes exactly one completion per call.
//!
//! The server's own writer is [`ChannelWriter`]: the head travels over a
//! oneshot, frames over an unbounded channel that backs the hyper response
//! body, so the pipeline can finish writing before hyper starts reading.

use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use hyper::body::{Body, Frame};
use tokio::sync::{mpsc, oneshot};

use crate::error::WriteError;

/// The sink through which one HTTP response is emitted.
#[async_trait]
pub trait ResponseWriter: Send {
    async fn write_header(&mut self, status: StatusCode, headers: HeaderMap) -> Result<(), WriteError>;

    async fn write_trailer(&mut self, trailers: HeaderMap) -> Result<(), WriteError>;

    async fn write_body(&mut self, chunk: Bytes) -> Result<(), WriteError>;

    /// Marks the response complete.
    async fn done(&mut self) -> Result<(), WriteError>;

    /// Abandons the response; the peer sees a truncated or reset stream.
    async fn abort(&mut self) -> Result<(), WriteError>;
}

/// A heap-allocated writer, as passed between pipeline stages.
pub type BoxedWriter = Box<dyn ResponseWriter>;

// ── ChannelWriter ─────────────────────────────────────────────────────────────

type FrameResult = Result<Frame<Bytes>, WriteError>;

/// Creates a connected writer / pending-response pair.
pub fn channel() -> (ChannelWriter, PendingResponse) {
    let (head_tx, head_rx) = oneshot::channel();
    let (frame_tx, frame_rx) = mpsc::unbounded_channel();
    let writer = ChannelWriter { head: Some(head_tx), frames: Some(frame_tx) };
    let pending = PendingResponse { head: head_rx, body: WriterBody { frames: frame_rx } };
    (writer, pending)
}

/// Writer that feeds a hyper response through channels.
pub struct ChannelWriter {
    head: Option<oneshot::Sender<(StatusCode, HeaderMap)>>,
    // `None` once done or aborted.
    frames: Option<mpsc::UnboundedSender<FrameResult>>,
}

impl ChannelWriter {
    fn send(&self, frame: FrameResult) -> Result<(), WriteError> {
        if self.head.is_some() {
            return Err(WriteError::HeaderNotWritten);
        }
        let frames = self.frames.as_ref().ok_or(WriteError::Finished)?;
        frames.send(frame).map_err(|_| WriteError::Closed)
    }
}

#[async_trait]
impl ResponseWriter for ChannelWriter {
    async fn write_header(&mut self, status: StatusCode, headers: HeaderMap) -> Result<(), WriteError> {
        if self.frames.is_none() {
            return Err(WriteError::Finished);
        }
        let head = self.head.take().ok_or(WriteError::HeaderAlreadyWritten)?;
        head.send((status, headers)).map_err(|_| WriteError::Closed)
    }

    async fn write_trailer(&mut self, trailers: HeaderMap) -> Result<(), WriteError> {
        self.send(Ok(Frame::trailers(trailers)))
    }

    async fn write_body(&mut self, chunk: Bytes) -> Result<(), WriteError> {
        self.send(Ok(Frame::data(chunk)))
    }

    async fn done(&mut self) -> Result<(), WriteError> {
        if self.head.is_some() {
            return Err(WriteError::HeaderNotWritten);
        }
        // Dropping the sender ends the body stream.
        self.frames.take().map(drop).ok_or(WriteError::Finished)
    }

    async fn abort(&mut self) -> Result<(), WriteError> {
        let frames = self.frames.take().ok_or(WriteError::Finished)?;
        // Before the header: dropping the head sender is enough, the
        // pending response resolves to `Aborted`.
        if self.head.take().is_none() {
            let _ = frames.send(Err(WriteError::Aborted));
        }
        Ok(())
    }
}

/// The reading half of [`channel`].
pub struct PendingResponse {
    head: oneshot::Receiver<(StatusCode, HeaderMap)>,
    body: WriterBody,
}

impl PendingResponse {
    /// Waits for the header and returns a response streaming the body.
    ///
    /// Fails with [`WriteError::Aborted`] if the writer was aborted or
    /// dropped before writing a header.
    pub async fn into_response(self) -> Result<http::Response<WriterBody>, WriteError> {
        let (status, headers) = self.head.await.map_err(|_| WriteError::Aborted)?;
        let mut res = http::Response::new(self.body);
        *res.status_mut() = status;
        *res.headers_mut() = headers;
        Ok(res)
    }
}

/// Response body fed by a [`ChannelWriter`].
#[derive(Debug)]
pub struct WriterBody {
    frames: mpsc::UnboundedReceiver<FrameResult>,
}

impl Body for WriterBody {
    type Data = Bytes;
    type Error = WriteError;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        self.frames.poll_recv(cx)
    }
}
