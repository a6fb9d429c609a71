//! Status-recording response writer.

use http::{HeaderMap, StatusCode};

use crate::response::ResponseWriter;

/// Decorates a [`ResponseWriter`] and remembers the first status written
/// through it.
///
/// Everything is forwarded to the inner writer unchanged, including status
/// writes after the first. The observed status starts at `200 OK`, which is
/// also what a body write before any explicit status commits to.
pub struct ResponseObserver<W> {
    inner: W,
    status: StatusCode,
    committed: bool,
}

impl<W: ResponseWriter> ResponseObserver<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, status: StatusCode::OK, committed: false }
    }

    /// The status the caller will see, as far as logging is concerned.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Records the request as failed: the handler never got to respond.
    pub fn fail(&mut self) {
        self.status = StatusCode::INTERNAL_SERVER_ERROR;
        self.committed = true;
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: ResponseWriter> ResponseWriter for ResponseObserver<W> {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn write_status(&mut self, status: StatusCode) {
        if !self.committed {
            self.status = status;
            self.committed = true;
        }
        self.inner.write_status(status);
    }

    fn write(&mut self, chunk: &[u8]) {
        self.committed = true;
        self.inner.write(chunk);
    }
}
