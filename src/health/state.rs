//! Process health state.
//!
//! # State Transitions
//! ```text
//! Initializing → Healthy   (listener bound, serving)
//! Healthy      → Degraded  (shutdown signal received, draining)
//! ```

use std::sync::atomic::{AtomicU8, Ordering};

use serde::Serialize;

/// Health reported to load balancers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum HealthStatus {
    Initializing = 0,
    Healthy = 1,
    Degraded = 2,
}

impl HealthStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => HealthStatus::Healthy,
            2 => HealthStatus::Degraded,
            _ => HealthStatus::Initializing,
        }
    }
}

/// Shared process health signal.
#[derive(Debug)]
pub struct Health {
    state: AtomicU8,
}

impl Health {
    /// Create a signal in the `Initializing` state.
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(HealthStatus::Initializing as u8),
        }
    }

    /// Current status.
    pub fn status(&self) -> HealthStatus {
        HealthStatus::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Replace the status, logging the transition.
    pub fn set(&self, status: HealthStatus) {
        let previous = HealthStatus::from_u8(self.state.swap(status as u8, Ordering::SeqCst));
        if previous != status {
            tracing::info!(from = ?previous, to = ?status, "Health status changed");
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status() == HealthStatus::Healthy
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_initializing() {
        let health = Health::new();
        assert_eq!(health.status(), HealthStatus::Initializing);
        assert!(!health.is_healthy());
    }

    #[test]
    fn transitions_are_observed() {
        let health = Health::new();
        health.set(HealthStatus::Healthy);
        assert!(health.is_healthy());

        health.set(HealthStatus::Degraded);
        assert_eq!(health.status(), HealthStatus::Degraded);
    }
}
