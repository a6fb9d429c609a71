//! Minimal reqlog example — a few JSON endpoints behind the request logger.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!   LOG_FORMAT=json RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl -i http://localhost:3000/users/42
//!   curl -i -H 'X-Correlation-ID: my-id' -H 'Authorization: Bearer s3cret' \
//!        http://localhost:3000/users/42
//!   curl -i -X POST http://localhost:3000/users -d '{"name":"alice"}'
//!   curl -i http://localhost:3000/boom     ← logged as 500, then the panic unwinds

use reqlog::middleware::{RequestLogger, TracingSink};
use reqlog::{Method, Request, Response, Router, Server, StatusCode};
use serde_json::Map;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), reqlog::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f == "json") {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let addr = std::env::var("REQLOG_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_owned());

    let app = Router::new()
        .on(Method::GET,    "/users/{id}", get_user)
        .on(Method::POST,   "/users",      create_user)
        .on(Method::DELETE, "/users/{id}", delete_user)
        .on(Method::GET,    "/boom",       boom);

    Server::bind(&addr)?
        .serve(RequestLogger::new(TracingSink).wrap(app))
        .await
}

// GET /users/{id}
//
// The request-scoped logger tags everything with the request's correlation id.
async fn get_user(req: Request) -> Response {
    let id = req.param("id").unwrap_or("unknown");
    if let Some(logger) = req.logger() {
        logger.info("looking up user", Map::new());
    }
    Response::json(format!(r#"{{"id":"{id}","name":"alice"}}"#).into_bytes())
}

// POST /users
async fn create_user(req: Request) -> Response {
    if req.body().is_empty() {
        return Response::status(StatusCode::BAD_REQUEST);
    }

    Response::builder()
        .status(StatusCode::CREATED)
        .header("location", "/users/99")
        .json(br#"{"id":"99","name":"new_user"}"#.to_vec())
}

// DELETE /users/{id} → 204 No Content
async fn delete_user(_req: Request) -> StatusCode {
    StatusCode::NO_CONTENT
}

// GET /boom
async fn boom(_req: Request) -> Response {
    panic!("boom")
}
