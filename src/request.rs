//! Incoming HTTP request type.

use std::collections::HashMap;
use std::net::SocketAddr;

use bytes::Bytes;
use http::{Extensions, HeaderMap, Method, Uri, Version};

use crate::middleware::{CorrelationId, Logger};

/// An incoming HTTP request with its body fully buffered.
///
/// Besides the usual head and body, a request knows how it reached this
/// process: the peer address and whether TLS was terminated here. Middleware
/// attaches per-request values to its [`Extensions`]; the correlation id and
/// the request-scoped [`Logger`] have typed accessors of their own.
pub struct Request {
    pub(crate) head: http::request::Parts,
    pub(crate) body: Bytes,
    pub(crate) params: HashMap<String, String>,
    pub(crate) remote_addr: Option<SocketAddr>,
    pub(crate) tls: bool,
}

impl Request {
    /// Wraps an `http` request. No peer address, plain-text transport.
    pub fn new(req: http::Request<Bytes>) -> Self {
        let (head, body) = req.into_parts();
        Self { head, body, params: HashMap::new(), remote_addr: None, tls: false }
    }

    /// Records the peer address the request was accepted from.
    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Marks the request as having arrived over a TLS connection terminated
    /// by this process.
    pub fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    pub fn method(&self) -> &Method { &self.head.method }
    pub fn uri(&self) -> &Uri { &self.head.uri }
    pub fn path(&self) -> &str { self.head.uri.path() }
    pub fn version(&self) -> Version { self.head.version }
    pub fn headers(&self) -> &HeaderMap { &self.head.headers }
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn remote_addr(&self) -> Option<SocketAddr> { self.remote_addr }
    pub fn is_tls(&self) -> bool { self.tls }
    pub fn extensions(&self) -> &Extensions { &self.head.extensions }
    pub fn extensions_mut(&mut self) -> &mut Extensions { &mut self.head.extensions }

    /// Case-insensitive header lookup. Returns the first value if the header
    /// repeats, `None` if it is absent or not valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The host the client addressed: the `Host` header, or the URI authority
    /// for requests that carry one instead (HTTP/2 `:authority`).
    pub fn host(&self) -> &str {
        self.header(http::header::HOST.as_str())
            .or_else(|| self.head.uri.authority().map(|a| a.as_str()))
            .unwrap_or("")
    }

    /// The request target as sent on the wire: path plus query, untouched.
    pub fn request_target(&self) -> &str {
        self.head.uri
            .path_and_query()
            .map_or_else(|| self.head.uri.path(), |pq| pq.as_str())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// The correlation id assigned by [`RequestLogger`](crate::middleware::RequestLogger),
    /// if the request passed through one.
    pub fn correlation_id(&self) -> Option<&str> {
        self.head.extensions.get::<CorrelationId>().map(CorrelationId::as_str)
    }

    /// The request-scoped logger. Every record it emits carries the
    /// `correlation_id` field.
    pub fn logger(&self) -> Option<&Logger> {
        self.head.extensions.get::<Logger>()
    }
}
