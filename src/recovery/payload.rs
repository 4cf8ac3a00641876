//! Panic payloads, the abort sentinel, and failure-site capture.
//!
//! # Responsibilities
//! - Define the `AbortHandler` sentinel raised when a peer disconnects
//! - Coerce an arbitrary payload into a loggable `PanicError`
//! - Record where a panic happened (location + backtrace) via a panic hook
//!
//! # Design Decisions
//! - The hook writes into a thread-local slot; `catch_unwind` returns on the
//!   panicking thread, so the slot is read back before any other task can
//!   run there
//! - The previously installed hook still runs after ours

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::panic;
use std::sync::Once;

/// The value a panic carries.
pub type PanicPayload = Box<dyn Any + Send + 'static>;

/// Message used when a payload is neither an error nor text.
const OPAQUE_PAYLOAD: &str = "panic with a non-string payload";

/// Sentinel payload signalling that a handler was aborted because the peer
/// disconnected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbortHandler;

impl fmt::Display for AbortHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("http: abort handler")
    }
}

impl StdError for AbortHandler {}

/// Abort the current handler.
///
/// Unwinds with the [`AbortHandler`] sentinel. Unlike `panic!`, this does not
/// run the panic hook, so nothing is printed for an expected disconnect.
pub fn abort_handler() -> ! {
    panic::resume_unwind(Box::new(AbortHandler))
}

/// A panic payload coerced into an error.
#[derive(Debug)]
pub enum PanicError {
    /// The payload was already an error value; it is kept as-is.
    Error(Box<dyn StdError + Send + Sync + 'static>),
    /// The payload was text (or opaque) and a message was synthesized.
    Message(String),
}

impl fmt::Display for PanicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanicError::Error(err) => fmt::Display::fmt(err, f),
            PanicError::Message(message) => f.write_str(message),
        }
    }
}

impl StdError for PanicError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            PanicError::Error(err) => err.source(),
            PanicError::Message(_) => None,
        }
    }
}

/// Turn a raw payload into a [`PanicError`].
pub fn coerce(payload: PanicPayload) -> PanicError {
    let payload = match payload.downcast::<Box<dyn StdError + Send + Sync>>() {
        Ok(err) => return PanicError::Error(*err),
        Err(other) => other,
    };
    let payload = match payload.downcast::<io::Error>() {
        Ok(err) => return PanicError::Error(err),
        Err(other) => other,
    };
    let payload = match payload.downcast::<String>() {
        Ok(message) => return PanicError::Message(*message),
        Err(other) => other,
    };

    match payload.downcast_ref::<&'static str>() {
        Some(message) => PanicError::Message((*message).to_string()),
        None => PanicError::Message(OPAQUE_PAYLOAD.to_string()),
    }
}

/// Where a panic was raised.
#[derive(Debug, Clone)]
pub struct PanicSite {
    /// `file:line:column` of the `panic!`, when the hook saw it.
    pub location: Option<String>,
    /// Rendered backtrace.
    pub backtrace: String,
}

impl PanicSite {
    /// Capture the current stack. Used when the hook did not record the panic.
    pub fn here() -> Self {
        Self {
            location: None,
            backtrace: Backtrace::force_capture().to_string(),
        }
    }
}

thread_local! {
    static LAST_SITE: RefCell<Option<PanicSite>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

/// Install the site-recording panic hook. Safe to call more than once.
pub fn install_site_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let site = PanicSite {
                location: info.location().map(|location| location.to_string()),
                backtrace: Backtrace::force_capture().to_string(),
            };
            let _ = LAST_SITE.try_with(|slot| {
                if let Ok(mut slot) = slot.try_borrow_mut() {
                    *slot = Some(site);
                }
            });
            previous(info);
        }));
    });
}

/// Discard any site left on this thread by a panic that was caught elsewhere.
pub fn clear_site() {
    let _ = LAST_SITE.try_with(|slot| {
        if let Ok(mut slot) = slot.try_borrow_mut() {
            slot.take();
        }
    });
}

/// Take the site recorded for the most recent panic on this thread.
///
/// Falls back to capturing the current stack if the hook did not run
/// (for example a payload raised with `resume_unwind`).
pub fn take_site() -> PanicSite {
    LAST_SITE
        .try_with(|slot| slot.try_borrow_mut().ok().and_then(|mut slot| slot.take()))
        .ok()
        .flatten()
        .unwrap_or_else(PanicSite::here)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_payload_is_reused() {
        let err: Box<dyn StdError + Send + Sync> = Box::new(io::Error::other("disk on fire"));
        let coerced = coerce(Box::new(err));

        assert!(matches!(coerced, PanicError::Error(_)));
        assert_eq!(coerced.to_string(), "disk on fire");
    }

    #[test]
    fn io_error_payload_is_reused() {
        let coerced = coerce(Box::new(io::Error::other("we expect this panic")));

        assert!(matches!(coerced, PanicError::Error(_)));
        assert_eq!(coerced.to_string(), "we expect this panic");
    }

    #[test]
    fn text_payloads_become_messages() {
        let from_str = coerce(Box::new("static text"));
        let from_string = coerce(Box::new(format!("formatted {}", 7)));

        assert!(matches!(&from_str, PanicError::Message(m) if m == "static text"));
        assert!(matches!(&from_string, PanicError::Message(m) if m == "formatted 7"));
    }

    #[test]
    fn opaque_payload_gets_fixed_message() {
        let coerced = coerce(Box::new(vec![1_u8, 2, 3]));
        assert_eq!(coerced.to_string(), OPAQUE_PAYLOAD);
    }

    #[test]
    fn hook_records_location_of_panic() {
        install_site_hook();
        let _ = panic::catch_unwind(|| panic!("recorded"));

        let site = take_site();
        let location = site.location.expect("hook should record a location");
        assert!(location.contains("payload.rs"), "unexpected location {location}");
    }

    #[test]
    fn take_site_without_panic_captures_current_stack() {
        // Drain anything a previous test on this thread left behind.
        let _ = take_site();

        let site = take_site();
        assert!(site.location.is_none());
        assert!(!site.backtrace.is_empty());
    }

    #[test]
    fn clear_site_drops_leftover_site() {
        install_site_hook();
        let _ = panic::catch_unwind(|| panic!("caught by someone else"));

        clear_site();
        assert!(take_site().location.is_none());
    }

    #[test]
    fn abort_handler_unwinds_with_sentinel() {
        let payload = panic::catch_unwind(|| abort_handler()).unwrap_err();
        assert!(payload.is::<AbortHandler>());
    }
}
