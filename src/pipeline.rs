//! Request pipeline.
//!
//! `pre_process` (all stages) → handler → `post_process` (all stages) →
//! emit the response through whatever writer post-processing left behind.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::warn;

use crate::context::RequestContext;
use crate::error::WriteError;
use crate::handler::BoxedHandler;
use crate::middleware::{Middleware, PreProcessing};
use crate::request::Request;
use crate::response::Response;
use crate::writer::BoxedWriter;

const DEFAULT_PRE_PROCESS_TIMEOUT: Duration = Duration::from_secs(10);

/// Ordered middleware stages plus the policy for running them.
pub(crate) struct Pipeline {
    middleware: Vec<Arc<dyn Middleware>>,
    pre_process_timeout: Duration,
}

impl Pipeline {
    pub(crate) fn new() -> Self {
        Self { middleware: Vec::new(), pre_process_timeout: DEFAULT_PRE_PROCESS_TIMEOUT }
    }

    pub(crate) fn with_middleware(mut self, m: impl Middleware) -> Self {
        self.middleware.push(Arc::new(m));
        self
    }

    /// A deferred pre-process still pending after `timeout` is dropped and
    /// the request continues with the context it had before that stage.
    pub(crate) fn pre_process_timeout(mut self, timeout: Duration) -> Self {
        self.pre_process_timeout = timeout;
        self
    }

    pub(crate) fn len(&self) -> usize {
        self.middleware.len()
    }

    /// Runs one request to completion, writing the response into `writer`.
    ///
    /// A write failure aborts the writer chain and is returned; the pipeline
    /// itself never fails a request.
    pub(crate) async fn run(&self, req: Request, handler: &BoxedHandler, writer: BoxedWriter) -> Result<(), WriteError> {
        let ctx = self.pre_process(&req).await;
        let req = req.with_context(ctx);

        let response = handler.call(req.clone()).await;

        let mut writer = self.post_process(&req, writer);
        if let Err(e) = emit(&mut writer, response).await {
            warn!(method = %req.method(), path = req.path(), error = %e, "response write failed, aborting");
            let _ = writer.abort().await;
            return Err(e);
        }
        Ok(())
    }

    async fn pre_process(&self, req: &Request) -> RequestContext {
        let mut ctx = req.context().clone();
        for stage in &self.middleware {
            ctx = match stage.pre_process(req, ctx.clone()) {
                PreProcessing::Continue(next) => next,
                PreProcessing::Deferred(fut) => match timeout(self.pre_process_timeout, fut).await {
                    Ok(next) => next,
                    Err(_) => {
                        warn!(
                            path = req.path(),
                            timeout_ms = self.pre_process_timeout.as_millis() as u64,
                            "pre-processing timed out, continuing without it",
                        );
                        ctx
                    }
                },
            };
        }
        ctx
    }

    fn post_process(&self, req: &Request, mut writer: BoxedWriter) -> BoxedWriter {
        for stage in &self.middleware {
            writer = stage.post_process(req, req.context(), writer).into_writer();
        }
        writer
    }
}

async fn emit(writer: &mut BoxedWriter, response: Response) -> Result<(), WriteError> {
    let (status, headers, body) = response.into_parts();
    writer.write_header(status, headers).await?;
    if !body.is_empty() {
        writer.write_body(body).await?;
    }
    writer.done().await
}
