use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::outcome::PublishOutcome;

/// Relaxed counters shared by all clones of a bus.
#[derive(Debug, Default)]
pub(crate) struct BusMetrics {
    publishes: AtomicU64,
    deliveries: AtomicU64,
    failures: AtomicU64,
}

impl BusMetrics {
    pub(crate) fn record_publish(&self, outcome: &PublishOutcome) {
        self.publishes.fetch_add(1, Ordering::Relaxed);
        self.deliveries
            .fetch_add(outcome.invoked() as u64, Ordering::Relaxed);
        self.failures
            .fetch_add(outcome.failures().len() as u64, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, subscriptions: usize) -> MetricsSnapshot {
        MetricsSnapshot {
            publishes: self.publishes.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            subscriptions,
        }
    }
}

/// Point-in-time view of bus activity, taken by
/// [`EventBus::metrics`](crate::EventBus::metrics).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Publish calls accepted, zero-subscriber publishes included.
    pub publishes: u64,
    /// Subscriber invocations dispatched.
    pub deliveries: u64,
    /// Subscriber invocations that reported an error.
    pub failures: u64,
    /// Subscriber entries currently registered.
    pub subscriptions: usize,
}
