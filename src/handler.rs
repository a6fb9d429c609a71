//! Handler trait and type erasure.
//!
//! # How handlers are stored
//!
//! A router, a logging wrapper and a plain `async fn` are all "something that
//! turns a [`Request`] into a [`Response`]". They are different concrete
//! types, so the server and the middleware hold them behind one trait object
//! (`dyn ErasedHandler`):
//!
//! ```text
//! async fn hello(req: Request) -> Response   FnHandler(hello)        ┐
//! Router::new().on(…)                         Router                  ├─ Arc<dyn ErasedHandler>
//! RequestLogger::new(sink).wrap(router)       Logged { inner, … }     ┘
//! ```
//!
//! [`Router`](crate::Router) and [`Logged`](crate::middleware::Logged) are
//! handlers too, which is what lets `RequestLogger::wrap(router)` sit in
//! front of a whole application.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

// ── Internal types ────────────────────────────────────────────────────────────

/// What every erased handler returns: a boxed, sendable response future.
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Object-safe calling convention shared by all handler kinds.
///
/// Public only because [`Handler::into_boxed_handler`] mentions it.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

/// One handler, shared by every connection task.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid request handler.
///
/// You never implement this yourself. It is satisfied by:
///
/// - any `async fn name(req: Request) -> impl IntoResponse`,
/// - a [`Router`](crate::Router),
/// - a handler wrapped by [`RequestLogger`](crate::middleware::RequestLogger).
///
/// The trait is **sealed** (via the private `Sealed` supertrait).
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

pub(crate) mod private {
    pub trait Sealed {}
}

// ── Any `async fn(Request) -> impl IntoResponse` ──────────────────────────────

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

// ── Function handlers ─────────────────────────────────────────────────────────

/// Bridges a typed handler function to the trait-object world.
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}
