//! Correlation-id resolution.
//!
//! A caller may name its own request by sending `X-Correlation-ID`; that value
//! is reused verbatim. Otherwise a fresh UUID v4 is generated.

use std::fmt;
use std::sync::Arc;

use http::header::HeaderName;
use http::{HeaderMap, HeaderValue};
use tracing::warn;
use uuid::Uuid;

/// `X-Correlation-ID`, read on the way in and always written on the way out.
pub const CORRELATION_ID_HEADER: HeaderName = HeaderName::from_static("x-correlation-id");

/// Used when the generator fails. A request is never refused for lack of an id.
pub const FALLBACK_CORRELATION_ID: &str = "00000000-0000-0000-0000-000000000000";

/// The identifier tying together every log record of one request.
///
/// Stored in the request's extensions; read it back with
/// [`Request::correlation_id`](crate::Request::correlation_id). Always a valid
/// header value, so the id that is logged is the id that is echoed.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CorrelationId {
    id: String,
    header: HeaderValue,
}

impl CorrelationId {
    fn parse(id: &str) -> Option<Self> {
        if id.is_empty() {
            return None;
        }
        let header = HeaderValue::from_str(id).ok()?;
        Some(Self { id: id.to_owned(), header })
    }

    fn fallback() -> Self {
        Self {
            id: FALLBACK_CORRELATION_ID.to_owned(),
            header: HeaderValue::from_static(FALLBACK_CORRELATION_ID),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }

    /// The id as written to `X-Correlation-ID`.
    pub fn header_value(&self) -> &HeaderValue {
        &self.header
    }

    pub fn into_string(self) -> String {
        self.id
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Source of fresh correlation ids.
///
/// `None`, an empty string or a string that is not a valid header value means
/// generation failed; the resolver then falls back to
/// [`FALLBACK_CORRELATION_ID`].
pub trait IdGenerator: Send + Sync + 'static {
    fn generate(&self) -> Option<String>;
}

/// Random (v4) UUIDs, hyphenated.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidV4;

impl IdGenerator for UuidV4 {
    fn generate(&self) -> Option<String> {
        Some(Uuid::new_v4().to_string())
    }
}

/// Picks the correlation id for an inbound request.
#[derive(Clone)]
pub struct CorrelationResolver {
    generator: Arc<dyn IdGenerator>,
}

impl CorrelationResolver {
    pub fn new(generator: impl IdGenerator) -> Self {
        Self { generator: Arc::new(generator) }
    }

    /// The inbound `X-Correlation-ID` if it is present, non-empty and valid
    /// UTF-8; a generated id otherwise. Never fails.
    pub fn resolve(&self, headers: &HeaderMap) -> CorrelationId {
        let inbound = headers
            .get(&CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(CorrelationId::parse);

        if let Some(id) = inbound {
            return id;
        }

        match self.generator.generate().as_deref().and_then(CorrelationId::parse) {
            Some(id) => id,
            None => {
                warn!("correlation id generation failed, using fallback");
                CorrelationId::fallback()
            }
        }
    }
}

impl Default for CorrelationResolver {
    fn default() -> Self {
        Self::new(UuidV4)
    }
}
