//! Capabilities the host hands the intake handler to reach its runtime.
//!
//! All methods are synchronous and must not block: the handler runs on the
//! host's dispatch thread.

use std::sync::Arc;

use crate::{EventPayload, Result};

/// Publisher side of the runtime's event bus.
pub trait EventBus: Send + Sync {
    /// Queue `payload` for subscribers of `channel`. Delivery is asynchronous;
    /// events from one caller keep their publication order.
    fn publish(&self, channel: &str, payload: EventPayload) -> Result<()>;
}

/// A live scripting runtime.
pub trait RuntimeContext: Send + Sync {
    fn event_bus(&self) -> &dyn EventBus;
}

/// Resolves the current runtime, if one is live.
pub trait RuntimeContextProvider: Send + Sync {
    /// `None` while the runtime has not started or has been torn down.
    fn current_context(&self) -> Option<Arc<dyn RuntimeContext>>;
}

impl<F> RuntimeContextProvider for F
where
    F: Fn() -> Option<Arc<dyn RuntimeContext>> + Send + Sync,
{
    fn current_context(&self) -> Option<Arc<dyn RuntimeContext>> {
        self()
    }
}
