//! Middleware layer.
//!
//! [`RequestLogger`] wraps a [`Handler`] (usually the whole [`Router`]) so that
//! every request produces exactly two structured records:
//!
//! | Message            | When                               | `http_request` adds               |
//! |--------------------|------------------------------------|-----------------------------------|
//! | `Request received` | before the handler runs            | —                                 |
//! | `Request returned` | after it returns, **or panics**    | `elapsed_time_ms`, `status_code`  |
//!
//! Both carry the request's `correlation_id`, which is also echoed back in
//! the `X-Correlation-ID` response header and available to the handler via
//! [`Request::correlation_id`] and [`Request::logger`].
//!
//! ```rust,no_run
//! use reqlog::middleware::{RequestLogger, TracingSink};
//! use reqlog::{Method, Request, Router, Server};
//!
//! # async fn run() -> Result<(), reqlog::Error> {
//! let app = Router::new().on(Method::GET, "/", |_req: Request| async { "hello" });
//!
//! Server::bind("0.0.0.0:3000")?
//!     .serve(RequestLogger::new(TracingSink).wrap(app))
//!     .await
//! # }
//! ```
//!
//! A panicking handler is logged with `status_code: 500` and then the panic
//! resumes unwinding, untouched, into whatever runs the handler.
//!
//! [`Router`]: crate::Router

mod correlation;
mod fields;
mod observer;
mod redact;
mod sink;

use std::panic::{AssertUnwindSafe, resume_unwind};
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tracing::{Instrument, info_span};

use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler, Handler, private};
use crate::request::Request;
use crate::response::{Response, ResponseWriter};

pub use correlation::{
    CORRELATION_ID_HEADER, CorrelationId, CorrelationResolver, FALLBACK_CORRELATION_ID,
    IdGenerator, UuidV4,
};
pub use fields::{
    CORRELATION_ID, Completion, ELAPSED_TIME_MS, HEADER, HTTP_REQUEST, PROTOCOL, REMOTE_IP,
    REQUEST_METHOD, REQUEST_PATH, REQUEST_URL, RequestSummary, SCHEME, SCHEME_HTTP,
    SCHEME_HTTPS, STATUS_CODE,
};
pub use observer::ResponseObserver;
pub use redact::{REDACTED_HEADERS, REDACTION_MASK, redact_headers};
pub use sink::{LogSink, Logger, MemorySink, Record, TracingSink};

pub const RECEIVED_MESSAGE: &str = "Request received";
pub const RETURNED_MESSAGE: &str = "Request returned";

// ── RequestLogger ─────────────────────────────────────────────────────────────

/// Request-logging middleware. Configure once, then [`wrap`](Self::wrap) a
/// handler.
#[derive(Clone)]
pub struct RequestLogger {
    logger: Logger,
    resolver: CorrelationResolver,
}

impl RequestLogger {
    /// Logs to `sink`, generating UUID v4 correlation ids.
    pub fn new(sink: impl LogSink) -> Self {
        Self { logger: Logger::new(sink), resolver: CorrelationResolver::default() }
    }

    /// Replaces the correlation-id generator.
    pub fn id_generator(mut self, generator: impl IdGenerator) -> Self {
        self.resolver = CorrelationResolver::new(generator);
        self
    }

    pub fn wrap(self, handler: impl Handler) -> Logged {
        Logged { inner: handler.into_boxed_handler(), config: Arc::new(self) }
    }
}

// ── Logged ────────────────────────────────────────────────────────────────────

/// A handler wrapped by [`RequestLogger`]. Itself a [`Handler`].
#[derive(Clone)]
pub struct Logged {
    inner: BoxedHandler,
    config: Arc<RequestLogger>,
}

impl Logged {
    /// Runs one request through the logger and the wrapped handler.
    ///
    /// # Panics
    ///
    /// Re-raises, after logging, any panic from the wrapped handler.
    pub fn handle(&self, req: Request) -> impl Future<Output = Response> + Send + use<> {
        let inner = Arc::clone(&self.inner);
        let config = Arc::clone(&self.config);
        log_request(inner, config, req)
    }
}

async fn log_request(inner: BoxedHandler, config: Arc<RequestLogger>, mut req: Request) -> Response {
    let started = Instant::now();

    let id = config.resolver.resolve(req.headers());
    let logger = config.logger.with_field(CORRELATION_ID, id.as_str());

    let mut writer = ResponseObserver::new(Response::default());
    writer.headers_mut().insert(CORRELATION_ID_HEADER, id.header_value().clone());

    let summary = RequestSummary::of(&req);
    let span = info_span!("request", correlation_id = %id);
    req.extensions_mut().insert(id);
    req.extensions_mut().insert(logger.clone());

    logger.info(RECEIVED_MESSAGE, summary.fields(None));

    // `call` itself may panic before any future exists.
    let outcome = AssertUnwindSafe(async move { inner.call(req).await })
        .catch_unwind()
        .instrument(span)
        .await;

    let panic = match outcome {
        Ok(response) => {
            response.write_to(&mut writer);
            None
        }
        Err(payload) => {
            writer.fail();
            Some(payload)
        }
    };

    let done = Completion { elapsed: started.elapsed(), status: writer.status() };
    logger.info(RETURNED_MESSAGE, summary.fields(Some(&done)));

    if let Some(payload) = panic {
        resume_unwind(payload);
    }

    writer.into_inner()
}

impl ErasedHandler for Logged {
    fn call(&self, req: Request) -> BoxFuture {
        Box::pin(self.handle(req))
    }
}

impl private::Sealed for Logged {}

impl Handler for Logged {
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(self)
    }
}
