//! The recovery stage: supervise the next stage and handle whatever escapes it.
//!
//! # States
//! ```text
//! Running → Returned     (next stage completed normally, nothing to do)
//! Running → Intercepted  (next stage panicked)
//!     ExpectedDisconnect → payload handed back as PeerDisconnected
//!     UnexpectedError    → log, 500 + fixed body, close connection
//! ```

use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

use axum::http::StatusCode;
use futures_util::future::poll_fn;
use futures_util::FutureExt;

use crate::config::{FatalAction, PanicCheckConfig};
use crate::observability::metrics;
use crate::recovery::classify::{classify, Classification};
use crate::recovery::context::RequestContext;
use crate::recovery::payload::{
    clear_site, coerce, install_site_hook, take_site, PanicError, PanicPayload, PanicSite,
};
use crate::recovery::sink::{ResponseSink, SinkError};

/// Body sent to the client after a recovered panic.
pub const PANIC_RESPONSE_BODY: &str = "500 Internal Server Error: An unknown error caused a panic.\n";

/// Result of running a stage under supervision.
#[derive(Debug)]
pub enum Outcome<T> {
    /// The stage returned normally.
    Completed(T),
    /// The stage panicked with this payload.
    Failed(PanicPayload),
}

impl<T> From<Result<T, PanicPayload>> for Outcome<T> {
    fn from(result: Result<T, PanicPayload>) -> Self {
        match result {
            Ok(value) => Outcome::Completed(value),
            Err(payload) => Outcome::Failed(payload),
        }
    }
}

/// Run `f`, turning a panic into [`Outcome::Failed`] instead of unwinding.
///
/// Any site left on this thread by an earlier panic is discarded first, so a
/// failure is only ever paired with the site of its own panic.
pub fn supervise<T>(f: impl FnOnce() -> T) -> Outcome<T> {
    clear_site();
    panic::catch_unwind(AssertUnwindSafe(f)).into()
}

/// Drive `future` to completion, turning a panic in any poll into
/// [`Outcome::Failed`].
///
/// The site slot is cleared before every poll; each poll may run on a
/// different worker thread.
pub async fn supervise_future<F: Future>(future: F) -> Outcome<F::Output> {
    let mut future = std::pin::pin!(future);
    let guarded = poll_fn(move |cx| {
        clear_site();
        future.as_mut().poll(cx)
    });
    AssertUnwindSafe(guarded).catch_unwind().await.into()
}

/// The peer went away. Carries the original sentinel payload.
pub struct PeerDisconnected(PanicPayload);

impl PeerDisconnected {
    /// Continue unwinding with the identical payload.
    pub fn resume(self) -> ! {
        panic::resume_unwind(self.0)
    }
}

impl fmt::Debug for PeerDisconnected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PeerDisconnected")
    }
}

/// A recovered defect.
#[derive(Debug)]
pub struct CapturedFailure {
    /// The payload, coerced to an error.
    pub error: PanicError,
    /// Where it was raised.
    pub site: PanicSite,
}

/// Recovery boundary between the pipeline and the transport.
///
/// Stateless between requests; clones share nothing mutable.
#[derive(Debug, Clone)]
pub struct RecoveryStage {
    on_write_failure: FatalAction,
}

impl Default for RecoveryStage {
    fn default() -> Self {
        Self::with_fatal_action(FatalAction::default())
    }
}

impl RecoveryStage {
    /// Create a stage from configuration and install the site-recording hook.
    pub fn new(config: &PanicCheckConfig) -> Self {
        Self::with_fatal_action(config.on_write_failure)
    }

    /// Create a stage with an explicit policy for failed 500 writes.
    pub fn with_fatal_action(on_write_failure: FatalAction) -> Self {
        install_site_hook();
        Self { on_write_failure }
    }

    /// Run `next`, recovering from any panic it raises.
    ///
    /// Returns once `next` has returned or its panic has been handled. The
    /// abort sentinel is the one payload that keeps unwinding out of here.
    pub fn handle<W, F>(&self, sink: &mut W, ctx: &mut RequestContext, next: F)
    where
        W: ResponseSink,
        F: FnOnce(&mut W, &mut RequestContext),
    {
        if let Outcome::Failed(payload) = supervise(|| next(sink, ctx)) {
            if let Err(disconnect) = self.intercept(sink, ctx, payload) {
                disconnect.resume();
            }
        }
    }

    /// Handle a payload that escaped the next stage.
    ///
    /// The disconnect sentinel is returned untouched as `Err` without logging
    /// or writing anything. Every other payload is logged, answered with a 500,
    /// and marks the connection for closing.
    pub fn intercept<W: ResponseSink>(
        &self,
        sink: &mut W,
        ctx: &mut RequestContext,
        payload: PanicPayload,
    ) -> Result<CapturedFailure, PeerDisconnected> {
        if classify(&payload) == Classification::ExpectedDisconnect {
            clear_site();
            metrics::record_peer_disconnect();
            return Err(PeerDisconnected(payload));
        }

        let failure = CapturedFailure {
            error: coerce(payload),
            site: take_site(),
        };

        tracing::error!(
            host = %ctx.host,
            request_id = ctx.request_id.as_deref().unwrap_or_default(),
            error.message = %failure.error,
            error.location = failure.site.location.as_deref().unwrap_or("unknown"),
            error.stacktrace = %failure.site.backtrace,
            "panic-check"
        );
        metrics::record_panic_recovered();

        sink.set_status(StatusCode::INTERNAL_SERVER_ERROR);
        if let Err(write_err) = sink.write(PANIC_RESPONSE_BODY.as_bytes()) {
            self.fail_fatally(&write_err);
        }
        ctx.close_connection = true;

        Ok(failure)
    }

    fn fail_fatally(&self, write_err: &SinkError) {
        tracing::error!(
            severity = "fatal",
            error.message = %write_err,
            "failed-response-in-panic-check"
        );
        metrics::record_fatal_write();

        if self.on_write_failure == FatalAction::Exit {
            std::process::exit(1);
        }
    }
}
