use tracing::warn;

use crate::errors::HandlerError;
use crate::handle::SubscriptionHandle;
use crate::outcome::PublishOutcome;

/// One prepared subscriber invocation, detached from the registry lock.
///
/// The bus snapshots the subscriber list under its lock, packages each entry
/// as a `Delivery`, releases the lock, and hands the batch to a strategy.
pub struct Delivery {
    handle: SubscriptionHandle,
    topic: &'static str,
    job: Box<dyn FnOnce() -> Result<(), HandlerError> + Send>,
}

impl Delivery {
    pub(crate) fn new(
        handle: SubscriptionHandle,
        topic: &'static str,
        job: Box<dyn FnOnce() -> Result<(), HandlerError> + Send>,
    ) -> Self {
        Self { handle, topic, job }
    }

    /// Handle of the subscriber this delivery targets.
    pub fn handle(&self) -> SubscriptionHandle {
        self.handle
    }

    /// Label of the topic being published.
    pub fn topic(&self) -> &'static str {
        self.topic
    }

    /// Run the underlying callback.
    pub fn run(self) -> Result<(), HandlerError> {
        (self.job)()
    }
}

/// How the batch of deliveries from one publish is executed.
///
/// [`Serial`] is the contract the bus documents: in subscription order,
/// synchronously, failures collected per subscriber. Alternative strategies
/// trade parts of that contract for concurrency; they are opt-in through
/// [`EventBus::publish_with`](crate::EventBus::publish_with), never the
/// default.
pub trait DispatchStrategy: Send + Sync {
    fn dispatch(&self, deliveries: Vec<Delivery>) -> PublishOutcome;
}

/// In-order synchronous execution. The default strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct Serial;

impl DispatchStrategy for Serial {
    fn dispatch(&self, deliveries: Vec<Delivery>) -> PublishOutcome {
        let mut outcome = PublishOutcome::default();
        for delivery in deliveries {
            let handle = delivery.handle();
            let topic = delivery.topic();
            match delivery.run() {
                Ok(()) => outcome.record_invoked(),
                Err(error) => {
                    warn!(topic, handle = handle.sequence(), %error, "subscriber failed");
                    outcome.record_failure(handle, error);
                }
            }
        }
        outcome
    }
}

/// Fire-and-forget execution on a tokio blocking pool.
///
/// Each delivery is handed to [`tokio::task::spawn_blocking`] and the call
/// returns immediately. The outcome reports how many deliveries were
/// dispatched and an empty failure list; worker-side failures are logged at
/// `warn` and never reach the publisher. Ordering across subscribers is not
/// guaranteed.
#[derive(Debug, Clone)]
pub struct Spawned {
    runtime: tokio::runtime::Handle,
}

impl Spawned {
    /// Run deliveries on the given runtime.
    pub fn new(runtime: tokio::runtime::Handle) -> Self {
        Self { runtime }
    }

    /// Run deliveries on the ambient runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime context.
    pub fn current() -> Self {
        Self {
            runtime: tokio::runtime::Handle::current(),
        }
    }
}

impl DispatchStrategy for Spawned {
    fn dispatch(&self, deliveries: Vec<Delivery>) -> PublishOutcome {
        let mut outcome = PublishOutcome::default();
        for delivery in deliveries {
            outcome.record_invoked();
            self.runtime.spawn_blocking(move || {
                let handle = delivery.handle();
                let topic = delivery.topic();
                if let Err(error) = delivery.run() {
                    warn!(topic, handle = handle.sequence(), %error, "spawned subscriber failed");
                }
            });
        }
        outcome
    }
}
