use std::time::Duration;

use futures_util::{StreamExt, pin_mut};

use crier::{EventBus, Topic};

struct Tick;
impl Topic for Tick {
    type Payload = u64;
}

#[tokio::test]
async fn channel_receives_payload_clones_in_order() {
    let bus = EventBus::new();
    let (_handle, mut ticks) = bus.channel::<Tick>().unwrap();

    for n in 0..5u64 {
        bus.publish::<Tick>(&n).unwrap();
    }
    for n in 0..5u64 {
        assert_eq!(ticks.recv().await.unwrap(), n);
    }
    assert!(ticks.is_empty());
}

#[tokio::test]
async fn dropped_receiver_surfaces_as_a_recorded_failure() {
    let bus = EventBus::new();
    let (handle, ticks) = bus.channel::<Tick>().unwrap();
    drop(ticks);

    let outcome = bus.publish::<Tick>(&1).unwrap();
    assert_eq!(outcome.invoked(), 1);
    assert_eq!(outcome.failures().len(), 1);
    assert_eq!(outcome.failures()[0].handle, handle);

    // the forwarding subscriber can be removed like any other
    bus.unsubscribe(handle);
    assert_eq!(bus.publish::<Tick>(&2).unwrap().invoked(), 0);
}

#[tokio::test]
async fn next_timeout_reports_silence_and_payloads() {
    let bus = EventBus::new();
    let (_handle, mut ticks) = bus.channel::<Tick>().unwrap();

    assert!(ticks.next_timeout(Duration::from_millis(10)).await.is_none());

    bus.publish::<Tick>(&7).unwrap();
    assert_eq!(ticks.next_timeout(Duration::from_secs(1)).await, Some(7));
}

#[tokio::test]
async fn async_stream_adapter_yields_payloads() {
    let bus = EventBus::new();
    let (_handle, ticks) = bus.channel::<Tick>().unwrap();

    bus.publish::<Tick>(&1).unwrap();
    bus.publish::<Tick>(&2).unwrap();

    let stream = ticks.into_async_stream();
    pin_mut!(stream);
    assert_eq!(stream.next().await, Some(1));
    assert_eq!(stream.next().await, Some(2));
}

#[tokio::test]
async fn try_recv_drains_without_awaiting() {
    let bus = EventBus::new();
    let (_handle, mut ticks) = bus.channel::<Tick>().unwrap();

    bus.publish::<Tick>(&9).unwrap();
    assert_eq!(ticks.try_recv().ok(), Some(9));
    assert!(ticks.try_recv().is_err());
}
