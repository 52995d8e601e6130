//! In-process runtime bus and a host-controlled runtime slot.

use std::sync::{Arc, RwLock};

use {tokio::sync::broadcast, tracing::debug};

use crate::{
    EventBus, EventPayload, LOG_TARGET, Result, RuntimeContext, RuntimeContextProvider,
};

/// An event as subscribers see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusEvent {
    pub channel: String,
    pub payload: EventPayload,
}

/// Event bus backed by a `tokio` broadcast channel.
///
/// `publish` never blocks. Subscribers that fall more than `capacity` events
/// behind observe `RecvError::Lagged` and skip ahead. A bus is also the
/// runtime context it belongs to, so it can be attached to a
/// [`SharedRuntime`] directly.
#[derive(Debug, Clone)]
pub struct BroadcastBus {
    tx: broadcast::Sender<BusEvent>,
}

impl BroadcastBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl EventBus for BroadcastBus {
    fn publish(&self, channel: &str, payload: EventPayload) -> Result<()> {
        let event = BusEvent {
            channel: channel.to_string(),
            payload,
        };
        // A send error only means nobody is subscribed yet.
        match self.tx.send(event) {
            Ok(receivers) => debug!(target: LOG_TARGET, channel, receivers, "event published"),
            Err(_) => debug!(target: LOG_TARGET, channel, "event published with no subscribers"),
        }
        Ok(())
    }
}

impl RuntimeContext for BroadcastBus {
    fn event_bus(&self) -> &dyn EventBus {
        self
    }
}

/// Runtime slot the host fills while its scripting runtime is up.
#[derive(Default)]
pub struct SharedRuntime {
    current: RwLock<Option<Arc<dyn RuntimeContext>>>,
}

impl SharedRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, context: Arc<dyn RuntimeContext>) {
        let mut slot = self.current.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(context);
    }

    /// Clear the slot, returning the context that was attached.
    pub fn detach(&self) -> Option<Arc<dyn RuntimeContext>> {
        let mut slot = self.current.write().unwrap_or_else(|e| e.into_inner());
        slot.take()
    }

    pub fn is_attached(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }
}

impl RuntimeContextProvider for SharedRuntime {
    fn current_context(&self) -> Option<Arc<dyn RuntimeContext>> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, tokio::sync::broadcast::error::TryRecvError};

    #[tokio::test]
    async fn subscribers_receive_in_publication_order() {
        let bus = BroadcastBus::new(8);
        let mut rx = bus.subscribe();

        for (sender, message) in [("X", "1"), ("Y", "2"), ("Z", "3")] {
            bus.publish("SMS_RECEIVED", EventPayload::new(sender, message))
                .unwrap();
        }

        for expected in ["1", "2", "3"] {
            let event = rx.recv().await.unwrap();
            assert_eq!(event.channel, "SMS_RECEIVED");
            assert_eq!(event.payload.message, expected);
        }
    }

    #[tokio::test]
    async fn every_subscriber_sees_each_event() {
        let bus = BroadcastBus::new(4);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish("SMS_RECEIVED", EventPayload::new("X", "1"))
            .unwrap();

        assert_eq!(first.recv().await.unwrap().payload.sender, "X");
        assert_eq!(second.recv().await.unwrap().payload.sender, "X");
    }

    #[test]
    fn publishing_without_subscribers_is_ok() {
        let bus = BroadcastBus::new(4);
        assert!(bus.publish("SMS_RECEIVED", EventPayload::new("X", "1")).is_ok());

        // Late subscribers do not see earlier events.
        let mut rx = bus.subscribe();
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let bus = BroadcastBus::new(0);
        let mut rx = bus.subscribe();
        bus.publish("SMS_RECEIVED", EventPayload::new("X", "1"))
            .unwrap();
        assert_eq!(rx.try_recv().unwrap().payload.message, "1");
    }

    #[test]
    fn shared_runtime_attach_and_detach() {
        let runtime = SharedRuntime::new();
        assert!(runtime.current_context().is_none());

        runtime.attach(Arc::new(BroadcastBus::new(4)));
        assert!(runtime.is_attached());
        assert!(runtime.current_context().is_some());

        assert!(runtime.detach().is_some());
        assert!(!runtime.is_attached());
        assert!(runtime.detach().is_none());
    }
}
