use std::any::{Any, TypeId};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::dispatch::{Delivery, DispatchStrategy};
use crate::errors::{BusError, HandlerError};
use crate::handle::SubscriptionHandle;
use crate::metrics::{BusMetrics, MetricsSnapshot};
use crate::outcome::PublishOutcome;
use crate::topic::Topic;

type Callback<P> = Arc<dyn Fn(&P) -> Result<(), HandlerError> + Send + Sync>;

struct Entry {
    handle: SubscriptionHandle,
    // Callback<T::Payload>, erased; the topic key guarantees the downcast.
    callback: Box<dyn Any + Send + Sync>,
}

struct TopicSlot {
    label: &'static str,
    entries: Vec<Entry>,
}

struct RegistryInner {
    topics: FxHashMap<TypeId, TopicSlot>,
    next_seq: u64,
    open: bool,
}

struct Shared {
    name: String,
    registry: Mutex<RegistryInner>,
    metrics: BusMetrics,
}

/// Typed publish/subscribe bus.
///
/// Maps [`Topic`] identifiers to ordered lists of subscriber callbacks and
/// fans each published payload out to them synchronously, in subscription
/// order, with per-subscriber failure isolation. Cloning the bus is cheap
/// and shares the underlying registry, so one instance can serve arbitrary
/// concurrent producers and consumers; whether a process holds one bus or
/// one per subsystem is the integrator's call.
///
/// Mutations and publish lookups are mutually exclusive, but handlers run
/// against a snapshot taken outside the lock: a handler may itself
/// subscribe, unsubscribe, or publish without deadlocking, and changes made
/// during a publish apply only to subsequent publishes.
///
/// ```
/// use crier::{EventBus, Topic};
///
/// struct Scored;
/// impl Topic for Scored {
///     type Payload = u32;
/// }
///
/// let bus = EventBus::new();
/// let handle = bus
///     .subscribe::<Scored>(|points| {
///         println!("scored {points}");
///         Ok(())
///     })
///     .unwrap();
///
/// let outcome = bus.publish::<Scored>(&10).unwrap();
/// assert_eq!(outcome.invoked(), 1);
///
/// bus.unsubscribe(handle);
/// assert_eq!(bus.publish::<Scored>(&10).unwrap().invoked(), 0);
/// ```
#[derive(Clone)]
pub struct EventBus {
    shared: Arc<Shared>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Create a bus with a generated name.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> BusBuilder {
        BusBuilder::default()
    }

    /// Name used in this bus's log output.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Register `handler` for topic `T` and return its handle.
    ///
    /// Entries are independent: subscribing the same closure twice yields
    /// two handles, each invoked once per publish. Fails only with
    /// [`BusError::Closed`] after [`shutdown`](EventBus::shutdown).
    pub fn subscribe<T: Topic>(
        &self,
        handler: impl Fn(&T::Payload) -> Result<(), HandlerError> + Send + Sync + 'static,
    ) -> Result<SubscriptionHandle, BusError> {
        let callback: Callback<T::Payload> = Arc::new(handler);
        let mut registry = self.lock_registry();
        if !registry.open {
            return Err(BusError::Closed);
        }
        let seq = registry.next_seq;
        registry.next_seq += 1;
        let handle = SubscriptionHandle {
            topic: TypeId::of::<T>(),
            seq,
        };
        registry
            .topics
            .entry(TypeId::of::<T>())
            .or_insert_with(|| TopicSlot {
                label: T::label(),
                entries: Vec::new(),
            })
            .entries
            .push(Entry {
                handle,
                callback: Box::new(callback),
            });
        trace!(
            bus = %self.shared.name,
            topic = T::label(),
            handle = seq,
            "subscriber registered"
        );
        Ok(handle)
    }

    /// Remove the entry `handle` was issued for, if it is still registered.
    ///
    /// A no-op when the handle is unknown, already removed, or belongs to a
    /// different topic; idempotent; safe to call after shutdown. Removing
    /// the last subscriber of a topic drops the topic's registry key.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) {
        let mut registry = self.lock_registry();
        let Some(slot) = registry.topics.get_mut(&handle.topic) else {
            return;
        };
        let before = slot.entries.len();
        slot.entries.retain(|entry| entry.handle != handle);
        let removed = slot.entries.len() != before;
        let emptied = slot.entries.is_empty();
        let label = slot.label;
        if emptied {
            registry.topics.remove(&handle.topic);
        }
        if removed {
            trace!(
                bus = %self.shared.name,
                topic = label,
                handle = handle.seq,
                "subscriber removed"
            );
        }
    }

    /// Deliver `payload` to every current subscriber of `T`, in
    /// subscription order, synchronously.
    ///
    /// Zero subscribers is an outcome with `invoked() == 0`, not an error.
    /// A failing handler is recorded in the outcome and does not prevent
    /// later handlers from running. Fails only with [`BusError::Closed`].
    pub fn publish<T: Topic>(&self, payload: &T::Payload) -> Result<PublishOutcome, BusError> {
        let snapshot = self.snapshot::<T>()?;
        debug!(
            bus = %self.shared.name,
            topic = T::label(),
            subscribers = snapshot.len(),
            "publish"
        );
        let mut outcome = PublishOutcome::default();
        for (handle, callback) in snapshot {
            match (*callback)(payload) {
                Ok(()) => outcome.record_invoked(),
                Err(error) => {
                    warn!(
                        bus = %self.shared.name,
                        topic = T::label(),
                        handle = handle.sequence(),
                        %error,
                        "subscriber failed"
                    );
                    outcome.record_failure(handle, error);
                }
            }
        }
        self.shared.metrics.record_publish(&outcome);
        Ok(outcome)
    }

    /// Deliver `payload` through an explicit [`DispatchStrategy`].
    ///
    /// The snapshot and closed-bus semantics match [`publish`]; what
    /// happens to the prepared deliveries is up to the strategy. Requires
    /// `T::Payload: Clone` because each delivery owns its payload.
    ///
    /// [`publish`]: EventBus::publish
    pub fn publish_with<T, S>(
        &self,
        payload: &T::Payload,
        strategy: &S,
    ) -> Result<PublishOutcome, BusError>
    where
        T: Topic,
        T::Payload: Clone,
        S: DispatchStrategy + ?Sized,
    {
        let snapshot = self.snapshot::<T>()?;
        debug!(
            bus = %self.shared.name,
            topic = T::label(),
            subscribers = snapshot.len(),
            "publish"
        );
        let deliveries = snapshot
            .into_iter()
            .map(|(handle, callback)| {
                let payload = payload.clone();
                Delivery::new(
                    handle,
                    T::label(),
                    Box::new(move || (*callback)(&payload)),
                )
            })
            .collect();
        let outcome = strategy.dispatch(deliveries);
        self.shared.metrics.record_publish(&outcome);
        Ok(outcome)
    }

    /// Remove every subscriber entry; the bus stays open.
    ///
    /// Provided for deterministic test isolation.
    pub fn clear(&self) {
        let mut registry = self.lock_registry();
        let removed: usize = registry
            .topics
            .values()
            .map(|slot| slot.entries.len())
            .sum();
        registry.topics.clear();
        debug!(bus = %self.shared.name, removed, "registry cleared");
    }

    /// Remove every subscriber entry and close the bus.
    ///
    /// Terminal: subsequent [`subscribe`](EventBus::subscribe) and
    /// [`publish`](EventBus::publish) calls return [`BusError::Closed`],
    /// while [`unsubscribe`](EventBus::unsubscribe) and
    /// [`clear`](EventBus::clear) stay safe no-ops. Idempotent.
    pub fn shutdown(&self) {
        let mut registry = self.lock_registry();
        registry.topics.clear();
        if registry.open {
            registry.open = false;
            debug!(bus = %self.shared.name, "bus shut down");
        }
    }

    pub fn is_closed(&self) -> bool {
        !self.lock_registry().open
    }

    /// Number of entries currently registered for `T`.
    pub fn subscriber_count<T: Topic>(&self) -> usize {
        self.lock_registry()
            .topics
            .get(&TypeId::of::<T>())
            .map_or(0, |slot| slot.entries.len())
    }

    /// Snapshot of the bus's counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        let subscriptions: usize = self
            .lock_registry()
            .topics
            .values()
            .map(|slot| slot.entries.len())
            .sum();
        self.shared.metrics.snapshot(subscriptions)
    }

    /// Stable copy of `T`'s subscriber list, taken under the lock so that
    /// invocation can happen outside it.
    fn snapshot<T: Topic>(
        &self,
    ) -> Result<Vec<(SubscriptionHandle, Callback<T::Payload>)>, BusError> {
        let registry = self.lock_registry();
        if !registry.open {
            return Err(BusError::Closed);
        }
        let Some(slot) = registry.topics.get(&TypeId::of::<T>()) else {
            return Ok(Vec::new());
        };
        Ok(slot
            .entries
            .iter()
            .map(|entry| {
                let callback = entry
                    .callback
                    .downcast_ref::<Callback<T::Payload>>()
                    .expect("callback type matches topic key");
                (entry.handle, Arc::clone(callback))
            })
            .collect())
    }

    fn lock_registry(&self) -> MutexGuard<'_, RegistryInner> {
        self.shared.registry.lock().expect("registry poisoned")
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("name", &self.shared.name)
            .finish_non_exhaustive()
    }
}

/// Builder for [`EventBus`].
#[derive(Debug, Default)]
pub struct BusBuilder {
    name: Option<String>,
}

impl BusBuilder {
    /// Name used in log output. Defaults to `bus-<uuid prefix>`.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn build(self) -> EventBus {
        let name = self.name.unwrap_or_else(generated_name);
        EventBus {
            shared: Arc::new(Shared {
                name,
                registry: Mutex::new(RegistryInner {
                    topics: FxHashMap::default(),
                    next_seq: 0,
                    open: true,
                }),
                metrics: BusMetrics::default(),
            }),
        }
    }
}

fn generated_name() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("bus-{}", &id[..8])
}
