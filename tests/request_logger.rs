use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqlog::middleware::{
    CORRELATION_ID, ELAPSED_TIME_MS, FALLBACK_CORRELATION_ID, HEADER, HTTP_REQUEST, IdGenerator,
    Logged, MemorySink, RECEIVED_MESSAGE, RETURNED_MESSAGE, Record, RequestLogger, STATUS_CODE,
};
use reqlog::{Handler, Method, Request, Response, ResponseWriter, Router, StatusCode};
use serde_json::{Map, Value, json};
use tracing::Level;

fn logged(handler: impl Handler) -> (Logged, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    (RequestLogger::new(Arc::clone(&sink)).wrap(handler), sink)
}

fn get(path: &str) -> http::request::Builder {
    http::Request::get(path).header("host", "api.test")
}

fn request(builder: http::request::Builder) -> Request {
    Request::new(builder.body(Bytes::new()).unwrap())
}

fn http_request(record: &Record) -> &Map<String, Value> {
    record.fields[HTTP_REQUEST].as_object().unwrap()
}

async fn ok(_req: Request) -> &'static str {
    "ok"
}

#[tokio::test]
async fn emits_received_then_returned() {
    let (app, sink) = logged(ok);
    app.handle(request(get("/"))).await;

    let records = sink.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].message, RECEIVED_MESSAGE);
    assert_eq!(records[1].message, RETURNED_MESSAGE);
    assert!(records.iter().all(|r| r.level == Level::INFO));

    assert!(!http_request(&records[0]).contains_key(ELAPSED_TIME_MS));
    assert!(!http_request(&records[0]).contains_key(STATUS_CODE));
    assert!(http_request(&records[1]).contains_key(ELAPSED_TIME_MS));
    assert!(http_request(&records[1]).contains_key(STATUS_CODE));
}

#[tokio::test]
async fn inbound_correlation_id_is_reused_and_echoed() {
    let (app, sink) = logged(ok);
    let res = app
        .handle(request(get("/").header("X-Correlation-ID", "abc-123")))
        .await;

    assert_eq!(res.headers()["x-correlation-id"], "abc-123");
    for record in sink.records() {
        assert_eq!(record.fields[CORRELATION_ID], "abc-123");
    }
}

#[tokio::test]
async fn generated_correlation_ids_differ_per_request() {
    let (app, sink) = logged(ok);
    let first = app.handle(request(get("/"))).await;
    let second = app.handle(request(get("/"))).await;

    let first = first.headers()["x-correlation-id"].to_str().unwrap().to_owned();
    let second = second.headers()["x-correlation-id"].to_str().unwrap().to_owned();
    assert!(!first.is_empty());
    assert_ne!(first, second);

    let records = sink.records();
    assert_eq!(records[0].fields[CORRELATION_ID], first.as_str());
    assert_eq!(records[1].fields[CORRELATION_ID], first.as_str());
    assert_eq!(records[2].fields[CORRELATION_ID], second.as_str());
}

#[tokio::test]
async fn custom_generator_is_used() {
    struct Fixed;
    impl IdGenerator for Fixed {
        fn generate(&self) -> Option<String> {
            Some("fixed-id".to_owned())
        }
    }

    let sink = Arc::new(MemorySink::new());
    let app = RequestLogger::new(Arc::clone(&sink)).id_generator(Fixed).wrap(ok);
    let res = app.handle(request(get("/"))).await;

    assert_eq!(res.headers()["x-correlation-id"], "fixed-id");
    assert_eq!(sink.records()[0].fields[CORRELATION_ID], "fixed-id");
}

#[tokio::test]
async fn unusable_generated_id_is_replaced_by_the_echoed_fallback() {
    struct Multiline;
    impl IdGenerator for Multiline {
        fn generate(&self) -> Option<String> {
            Some("not\r\nallowed".to_owned())
        }
    }

    let sink = Arc::new(MemorySink::new());
    let app = RequestLogger::new(Arc::clone(&sink)).id_generator(Multiline).wrap(ok);
    let res = app.handle(request(get("/"))).await;

    assert_eq!(res.headers()["x-correlation-id"], FALLBACK_CORRELATION_ID);
    for record in sink.records() {
        assert_eq!(record.fields[CORRELATION_ID], FALLBACK_CORRELATION_ID);
    }
}

#[tokio::test]
async fn handler_sees_correlation_id_and_logger() {
    async fn echo(req: Request) -> String {
        if let Some(logger) = req.logger() {
            logger.info("inside", Map::new());
        }
        req.correlation_id().unwrap_or("none").to_owned()
    }

    let (app, sink) = logged(echo);
    let res = app.handle(request(get("/").header("x-correlation-id", "ctx-1"))).await;

    assert_eq!(res.body(), b"ctx-1");
    let records = sink.records();
    assert_eq!(records.len(), 3);
    assert_eq!(records[1].message, "inside");
    assert_eq!(records[1].fields[CORRELATION_ID], "ctx-1");
}

#[tokio::test]
async fn status_defaults_to_ok() {
    let (app, sink) = logged(ok);
    let res = app.handle(request(get("/"))).await;

    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(http_request(&sink.records()[1])[STATUS_CODE], 200);
}

#[tokio::test]
async fn explicit_status_before_body_is_logged() {
    async fn missing(_req: Request) -> Response {
        let mut res = Response::default();
        res.write_status(StatusCode::NOT_FOUND);
        res.write(b"no such thing");
        res
    }

    let (app, sink) = logged(missing);
    let res = app.handle(request(get("/missing"))).await;

    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(res.body(), b"no such thing");
    assert_eq!(http_request(&sink.records()[1])[STATUS_CODE], 404);
}

#[tokio::test]
async fn headers_are_flattened_and_redacted_in_both_records() {
    let (app, sink) = logged(ok);
    let req = http::Request::get("/")
        .header("Authorization", "Bearer xyz")
        .header("X-Foo", "a")
        .header("X-Foo", "b")
        .body(Bytes::new())
        .unwrap();
    app.handle(Request::new(req)).await;

    for record in sink.records() {
        assert_eq!(
            http_request(&record)[HEADER],
            json!({ "authorization": "***", "x-foo": "[a], [b]" })
        );
    }
}

#[tokio::test]
async fn request_without_headers_has_no_header_field() {
    let (app, sink) = logged(ok);
    app.handle(Request::new(http::Request::get("/").body(Bytes::new()).unwrap())).await;

    for record in sink.records() {
        assert!(!http_request(&record).contains_key(HEADER));
    }
}

#[tokio::test]
async fn elapsed_time_reflects_handler_duration() {
    async fn slow(_req: Request) -> &'static str {
        tokio::time::sleep(Duration::from_millis(50)).await;
        "done"
    }

    let (app, sink) = logged(slow);
    app.handle(request(get("/slow"))).await;

    let elapsed = http_request(&sink.records()[1])[ELAPSED_TIME_MS].as_u64().unwrap();
    assert!((50..1_000).contains(&elapsed), "elapsed_time_ms = {elapsed}");
}

#[tokio::test]
async fn panic_is_logged_once_with_500_then_reraised() {
    async fn explode(_req: Request) -> Response {
        panic!("handler exploded");
    }

    let (app, sink) = logged(explode);
    let join = tokio::spawn(app.handle(request(get("/boom")))).await;

    let err = join.expect_err("panic must propagate out of the logger");
    assert!(err.is_panic());
    let payload = err.into_panic();
    assert_eq!(payload.downcast_ref::<&str>(), Some(&"handler exploded"));

    let records = sink.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].message, RECEIVED_MESSAGE);
    assert_eq!(records[1].message, RETURNED_MESSAGE);
    assert_eq!(http_request(&records[1])[STATUS_CODE], 500);
    assert!(http_request(&records[1])[ELAPSED_TIME_MS].as_u64().is_some());
}

/// Panics while building its future, before any `.await`.
fn eager(_req: Request) -> std::future::Ready<&'static str> {
    panic!("panicked before returning a future");
}

async fn assert_logged_as_failure_then_reraised(app: Logged, sink: &MemorySink) {
    let err = tokio::spawn(app.handle(request(get("/eager"))))
        .await
        .expect_err("panic must propagate out of the logger");
    assert_eq!(
        err.into_panic().downcast_ref::<&str>(),
        Some(&"panicked before returning a future")
    );

    let records = sink.records();
    let messages: Vec<_> = records.iter().map(|r| r.message.as_str()).collect();
    assert_eq!(messages, [RECEIVED_MESSAGE, RETURNED_MESSAGE]);
    assert_eq!(http_request(&records[1])[STATUS_CODE], 500);
}

#[tokio::test]
async fn panic_while_creating_the_handler_future_is_logged() {
    let (app, sink) = logged(eager);
    assert_logged_as_failure_then_reraised(app, &sink).await;
}

#[tokio::test]
async fn panic_while_creating_a_routed_handler_future_is_logged() {
    let (app, sink) = logged(Router::new().on(Method::GET, "/eager", eager));
    assert_logged_as_failure_then_reraised(app, &sink).await;
}

#[tokio::test]
async fn handler_headers_survive_alongside_correlation_header() {
    async fn created(_req: Request) -> Response {
        Response::builder()
            .status(StatusCode::CREATED)
            .header("location", "/things/1")
            .text("made")
    }

    let (app, _sink) = logged(created);
    let res = app.handle(request(get("/").header("x-correlation-id", "h-1"))).await;

    assert_eq!(res.status_code(), StatusCode::CREATED);
    assert_eq!(res.headers()["location"], "/things/1");
    assert_eq!(res.headers()["x-correlation-id"], "h-1");
    assert_eq!(res.body(), b"made");
}
