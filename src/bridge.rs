use std::time::Duration;

use futures_util::Stream;
use futures_util::stream;
use tokio::time::timeout;

use crate::bus::EventBus;
use crate::errors::{BusError, HandlerError};
use crate::handle::SubscriptionHandle;
use crate::topic::Topic;

impl EventBus {
    /// Subscribe a channel-backed consumer to `T`.
    ///
    /// Registers a subscriber that clones each published payload into an
    /// unbounded channel and returns the consumer side as a
    /// [`PayloadStream`]. Once the stream (or the receiver obtained from
    /// [`PayloadStream::into_inner`]) is dropped, the forwarding subscriber
    /// starts reporting a [`HandlerError`] in publish outcomes; use the
    /// returned handle to unsubscribe it.
    ///
    /// ```no_run
    /// use crier::{EventBus, Topic};
    ///
    /// struct Tick;
    /// impl Topic for Tick {
    ///     type Payload = u64;
    /// }
    ///
    /// # async fn demo() {
    /// let bus = EventBus::new();
    /// let (handle, mut ticks) = bus.channel::<Tick>().unwrap();
    ///
    /// bus.publish::<Tick>(&1).unwrap();
    /// assert_eq!(ticks.recv().await.ok(), Some(1));
    ///
    /// bus.unsubscribe(handle);
    /// # }
    /// ```
    pub fn channel<T>(&self) -> Result<(SubscriptionHandle, PayloadStream<T::Payload>), BusError>
    where
        T: Topic,
        T::Payload: Clone,
    {
        let (tx, rx) = flume::unbounded();
        let handle = self.subscribe::<T>(move |payload| {
            tx.send(payload.clone())
                .map_err(|_| HandlerError::msg("payload channel receiver dropped"))
        })?;
        Ok((handle, PayloadStream { receiver: rx }))
    }
}

/// Consumer side of [`EventBus::channel`], usable from sync and async code.
#[derive(Debug)]
pub struct PayloadStream<P> {
    receiver: flume::Receiver<P>,
}

impl<P> PayloadStream<P> {
    /// Receive the next payload, awaiting if necessary.
    pub async fn recv(&mut self) -> Result<P, flume::RecvError> {
        self.receiver.recv_async().await
    }

    /// Try to receive a payload without awaiting.
    pub fn try_recv(&mut self) -> Result<P, flume::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Wait up to `duration` for the next payload.
    pub async fn next_timeout(&mut self, duration: Duration) -> Option<P> {
        timeout(duration, self.receiver.recv_async()).await.ok()?.ok()
    }

    /// Number of payloads buffered and not yet consumed.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Consume this wrapper, returning the inner channel receiver.
    pub fn into_inner(self) -> flume::Receiver<P> {
        self.receiver
    }

    /// Convert into an async stream of payloads.
    ///
    /// The stream ends when the forwarding subscriber is unsubscribed (or
    /// the bus clears it) and the channel drains.
    pub fn into_async_stream(self) -> impl Stream<Item = P> {
        stream::unfold(self.receiver, |receiver| async move {
            receiver
                .recv_async()
                .await
                .ok()
                .map(|payload| (payload, receiver))
        })
    }
}
