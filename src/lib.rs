//! # reqlog
//!
//! Request logging with correlation ids, for a minimal HTTP framework behind
//! a reverse proxy.
//!
//! ## The contract
//!
//! Every request that passes through [`RequestLogger`](middleware::RequestLogger)
//! produces exactly two structured records, `Request received` and
//! `Request returned`, both tagged with the same `correlation_id`:
//!
//! ```text
//! Request received  {"correlation_id":"9b1d…","http_request":{"request_method":"GET",…}}
//! Request returned  {"correlation_id":"9b1d…","http_request":{…,"elapsed_time_ms":3,"status_code":200}}
//! ```
//!
//! - The id comes from the `X-Correlation-ID` request header, or is generated
//!   (UUID v4). It is echoed back on the response under the same header.
//! - `authorization`, `cookie` and `set-cookie` values are logged as `***`.
//! - A handler that panics still gets its `Request returned` record, with
//!   `status_code: 500`; then the panic carries on unwinding.
//!
//! Where the records go is up to the [`LogSink`](middleware::LogSink) you
//! inject: [`TracingSink`](middleware::TracingSink) forwards them to `tracing`.
//!
//! ## What the framework leaves to the proxy
//!
//! TLS termination, body-size limits, rate limiting, slow-client protection.
//! Because TLS ends at the proxy, the logged `scheme` is the one seen here
//! (`http`), not the one the client used.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use reqlog::middleware::{RequestLogger, TracingSink};
//! use reqlog::{Method, Request, Response, Router, Server, StatusCode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), reqlog::Error> {
//!     let app = Router::new()
//!         .on(Method::GET,  "/users/{id}", get_user)
//!         .on(Method::POST, "/users",      create_user);
//!
//!     Server::bind("0.0.0.0:3000")?
//!         .serve(RequestLogger::new(TracingSink).wrap(app))
//!         .await
//! }
//!
//! async fn get_user(req: Request) -> Response {
//!     let id = req.param("id").unwrap_or("unknown");
//!     Response::json(format!(r#"{{"id":"{id}"}}"#).into_bytes())
//! }
//!
//! async fn create_user(req: Request) -> Response {
//!     if req.body().is_empty() {
//!         return Response::status(StatusCode::BAD_REQUEST);
//!     }
//!     Response::builder()
//!         .status(StatusCode::CREATED)
//!         .header("location", "/users/99")
//!         .json(br#"{"id":"99"}"#.to_vec())
//! }
//! ```

mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod middleware;

pub use error::Error;
pub use handler::Handler;
pub use http::{HeaderMap, Method, StatusCode};
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder, ResponseWriter};
pub use router::Router;
pub use server::Server;
