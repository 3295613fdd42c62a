//! # Crier: Typed In-Process Publish/Subscribe
//!
//! Crier is a small notification bus for a single process: a registry
//! mapping topic types to ordered lists of subscriber callbacks, with
//! synchronous fan-out, deterministic ordering, and per-subscriber failure
//! isolation.
//!
//! ## Core Concepts
//!
//! - **Topics**: Marker types that name an event category and fix its
//!   payload type, so mismatched publish/subscribe types fail to compile
//! - **Handles**: Opaque tokens identifying one subscription for removal
//! - **Outcomes**: Every publish returns an inspectable result: how many
//!   subscribers ran and which of them failed
//! - **Snapshot dispatch**: Handlers run outside the registry lock, so a
//!   handler may itself subscribe, unsubscribe, or publish
//!
//! ## Quick Start
//!
//! ```
//! use crier::{EventBus, Topic};
//!
//! struct Scored;
//! impl Topic for Scored {
//!     type Payload = u32;
//! }
//!
//! let bus = EventBus::new();
//!
//! let handle = bus
//!     .subscribe::<Scored>(|points| {
//!         println!("scored {points} points");
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! let outcome = bus.publish::<Scored>(&10).unwrap();
//! assert_eq!(outcome.invoked(), 1);
//! assert!(outcome.is_clean());
//!
//! bus.unsubscribe(handle);
//! let outcome = bus.publish::<Scored>(&10).unwrap();
//! assert_eq!(outcome.invoked(), 0);
//! ```
//!
//! ## Failure Isolation
//!
//! A failing subscriber never prevents the rest of the fan-out; its error
//! is captured in the publish outcome for the caller to inspect:
//!
//! ```
//! use crier::{EventBus, HandlerError, Topic};
//!
//! struct Deploy;
//! impl Topic for Deploy {
//!     type Payload = String;
//! }
//!
//! let bus = EventBus::new();
//! bus.subscribe::<Deploy>(|_| Err(HandlerError::msg("disk full")))
//!     .unwrap();
//! bus.subscribe::<Deploy>(|_| Ok(())).unwrap();
//!
//! let outcome = bus.publish::<Deploy>(&"v2".to_string()).unwrap();
//! assert_eq!(outcome.invoked(), 2);
//! assert_eq!(outcome.delivered(), 1);
//! assert_eq!(outcome.failures().len(), 1);
//! ```
//!
//! ## Ownership
//!
//! An [`EventBus`] is an explicit value with `Arc`-backed clone semantics,
//! not a hidden singleton. Holding one process-wide instance is a valid
//! deployment; so is one bus per subsystem. [`EventBus::clear`] resets a
//! bus between tests, and [`EventBus::shutdown`] closes it terminally.
//!
//! ## Module Guide
//!
//! - [`bus`] - The bus itself: subscribe, unsubscribe, publish, lifecycle
//! - [`topic`] - The [`Topic`] trait tying identifiers to payload types
//! - [`outcome`] - Per-publish aggregation of invocations and failures
//! - [`dispatch`] - Execution strategies for [`EventBus::publish_with`]
//! - [`bridge`] - Channel subscriptions for async consumers
//! - [`metrics`] - Counters over a bus's lifetime
//! - [`telemetry`] - Opt-in tracing subscriber installation

pub mod bridge;
pub mod bus;
pub mod dispatch;
pub mod errors;
pub mod handle;
pub mod metrics;
pub mod outcome;
pub mod telemetry;
pub mod topic;

pub use bridge::PayloadStream;
pub use bus::{BusBuilder, EventBus};
pub use dispatch::{Delivery, DispatchStrategy, Serial, Spawned};
pub use errors::{BusError, HandlerError};
pub use handle::SubscriptionHandle;
pub use metrics::MetricsSnapshot;
pub use outcome::{Failure, PublishOutcome};
pub use topic::Topic;
