//! The `http_request` field map.
//!
//! Field names are a contract with whatever reads the logs downstream
//! (dashboards, alerts, queries). Do not rename them.

use std::time::Duration;

use http::{HeaderMap, StatusCode};
use serde_json::{Map, Value};

use super::redact::redact_headers;
use crate::request::Request;

pub const HTTP_REQUEST: &str    = "http_request";
pub const CORRELATION_ID: &str  = "correlation_id";
pub const ELAPSED_TIME_MS: &str = "elapsed_time_ms";
pub const STATUS_CODE: &str     = "status_code";
pub const SCHEME: &str          = "scheme";
pub const HEADER: &str          = "header";
pub const REQUEST_URL: &str     = "request_url";
pub const REQUEST_METHOD: &str  = "request_method";
pub const REQUEST_PATH: &str    = "request_path";
pub const REMOTE_IP: &str       = "remote_ip";
pub const PROTOCOL: &str        = "protocol";

pub const SCHEME_HTTP: &str  = "http";
pub const SCHEME_HTTPS: &str = "https";

/// How a request ended, as far as logging is concerned.
#[derive(Clone, Copy, Debug)]
pub struct Completion {
    pub elapsed: Duration,
    pub status: StatusCode,
}

/// The loggable parts of a request, captured before the request is handed
/// to the handler that consumes it.
#[derive(Clone, Debug)]
pub struct RequestSummary {
    url: String,
    method: String,
    path: String,
    remote_ip: String,
    protocol: String,
    scheme: &'static str,
    headers: HeaderMap,
}

impl RequestSummary {
    /// The scheme is `https` only when TLS was terminated by this process.
    /// A proxy in front that terminated TLS itself still yields `http`;
    /// `X-Forwarded-Proto` is not trusted.
    pub fn of(req: &Request) -> Self {
        let scheme = if req.is_tls() { SCHEME_HTTPS } else { SCHEME_HTTP };
        Self {
            url: format!("{scheme}://{}{}", req.host(), req.request_target()),
            method: req.method().to_string(),
            path: req.path().to_owned(),
            remote_ip: req.remote_addr().map(|a| a.to_string()).unwrap_or_default(),
            protocol: format!("{:?}", req.version()),
            scheme,
            headers: req.headers().clone(),
        }
    }

    /// `{"http_request": {...}}`. The `elapsed_time_ms` and `status_code`
    /// keys exist exactly when `completion` is given; `header` exists
    /// exactly when the request had headers.
    pub fn fields(&self, completion: Option<&Completion>) -> Map<String, Value> {
        let mut request = Map::new();
        request.insert(REQUEST_URL.into(), self.url.clone().into());
        request.insert(REQUEST_METHOD.into(), self.method.clone().into());
        request.insert(REQUEST_PATH.into(), self.path.clone().into());
        request.insert(REMOTE_IP.into(), self.remote_ip.clone().into());
        request.insert(PROTOCOL.into(), self.protocol.clone().into());
        request.insert(SCHEME.into(), self.scheme.into());

        if !self.headers.is_empty() {
            let headers = redact_headers(&self.headers)
                .into_iter()
                .map(|(name, value)| (name, Value::String(value)))
                .collect();
            request.insert(HEADER.into(), Value::Object(headers));
        }

        if let Some(done) = completion {
            let elapsed_ms = u64::try_from(done.elapsed.as_millis()).unwrap_or(u64::MAX);
            request.insert(ELAPSED_TIME_MS.into(), elapsed_ms.into());
            request.insert(STATUS_CODE.into(), done.status.as_u16().into());
        }

        let mut fields = Map::new();
        fields.insert(HTTP_REQUEST.into(), Value::Object(request));
        fields
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use serde_json::json;

    use super::*;

    fn request(builder: http::request::Builder) -> Request {
        Request::new(builder.body(Bytes::new()).unwrap())
    }

    #[test]
    fn received_fields_have_no_completion_keys() {
        let req = request(
            http::Request::post("/orders?id=7&x=%2F")
                .header("host", "shop.test")
                .header("authorization", "Bearer xyz"),
        )
        .with_remote_addr("10.0.0.1:5555".parse().unwrap());

        let fields = RequestSummary::of(&req).fields(None);
        assert_eq!(
            Value::Object(fields),
            json!({
                "http_request": {
                    "request_url": "http://shop.test/orders?id=7&x=%2F",
                    "request_method": "POST",
                    "request_path": "/orders",
                    "remote_ip": "10.0.0.1:5555",
                    "protocol": "HTTP/1.1",
                    "scheme": "http",
                    "header": { "host": "shop.test", "authorization": "***" }
                }
            })
        );
    }

    #[test]
    fn returned_fields_carry_elapsed_and_status() {
        let req = request(http::Request::get("/").header("host", "a.test"));
        let done = Completion { elapsed: Duration::from_millis(1234), status: StatusCode::NOT_FOUND };

        let fields = RequestSummary::of(&req).fields(Some(&done));
        assert_eq!(fields[HTTP_REQUEST][ELAPSED_TIME_MS], 1234);
        assert_eq!(fields[HTTP_REQUEST][STATUS_CODE], 404);
    }

    #[test]
    fn tls_switches_scheme() {
        let req = request(http::Request::get("/x").header("host", "a.test")).with_tls(true);
        let fields = RequestSummary::of(&req).fields(None);

        assert_eq!(fields[HTTP_REQUEST][SCHEME], "https");
        assert_eq!(fields[HTTP_REQUEST][REQUEST_URL], "https://a.test/x");
    }

    #[test]
    fn no_headers_means_no_header_key() {
        let req = request(http::Request::get("/bare").version(http::Version::HTTP_2));
        let fields = RequestSummary::of(&req).fields(None);
        let http_request = fields[HTTP_REQUEST].as_object().unwrap();

        assert!(!http_request.contains_key(HEADER));
        assert_eq!(http_request[REMOTE_IP], "");
        assert_eq!(http_request[PROTOCOL], "HTTP/2.0");
        assert_eq!(http_request[REQUEST_URL], "http:///bare");
    }
}
