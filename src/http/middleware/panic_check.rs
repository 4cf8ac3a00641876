//! Panic recovery middleware.
//!
//! Puts a [`RecoveryStage`] in front of an inner service. Both a panic raised
//! synchronously from `Service::call` and one raised while the response future
//! is being polled (before or after any `.await`) are intercepted.
//!
//! A panic from `call` is recovered before `call` returns, on the thread that
//! raised it; the panic site is thread-local and must be read there.
//!
//! A recovered panic becomes a 500 with `Connection: close`. The abort
//! sentinel keeps unwinding into the connection task, which drops the
//! connection without a response.

use std::task::{Context, Poll};

use axum::{
    http::{header, HeaderValue, Request},
    response::Response,
};
use futures_util::future::{self, BoxFuture};
use tower::{Layer, Service};

use crate::http::response::BufferedSink;
use crate::recovery::{
    supervise, supervise_future, Outcome, PanicPayload, RecoveryStage, RequestContext,
};

/// Layer that applies [`PanicCheck`].
#[derive(Debug, Clone)]
pub struct PanicCheckLayer {
    stage: RecoveryStage,
}

impl PanicCheckLayer {
    pub fn new(stage: RecoveryStage) -> Self {
        Self { stage }
    }
}

impl<S> Layer<S> for PanicCheckLayer {
    type Service = PanicCheck<S>;

    fn layer(&self, inner: S) -> Self::Service {
        PanicCheck {
            inner,
            stage: self.stage.clone(),
        }
    }
}

/// Middleware that recovers from panics in the wrapped service.
#[derive(Debug, Clone)]
pub struct PanicCheck<S> {
    inner: S,
    stage: RecoveryStage,
}

impl<S, B> Service<Request<B>> for PanicCheck<S>
where
    S: Service<Request<B>, Response = Response>,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        let ctx = RequestContext::from_request(&request);
        let stage = self.stage.clone();

        match supervise(|| self.inner.call(request)) {
            Outcome::Completed(future) => Box::pin(async move {
                match supervise_future(future).await {
                    Outcome::Completed(result) => result,
                    Outcome::Failed(payload) => Ok(recover(&stage, ctx, payload)),
                }
            }),
            Outcome::Failed(payload) => {
                let response = recover(&stage, ctx, payload);
                Box::pin(future::ready(Ok(response)))
            }
        }
    }
}

fn recover(stage: &RecoveryStage, mut ctx: RequestContext, payload: PanicPayload) -> Response {
    let mut sink = BufferedSink::new();
    if let Err(disconnect) = stage.intercept(&mut sink, &mut ctx, payload) {
        disconnect.resume();
    }

    let mut response = sink.into_response();
    if ctx.close_connection {
        response
            .headers_mut()
            .insert(header::CONNECTION, HeaderValue::from_static("close"));
    }
    response
}
