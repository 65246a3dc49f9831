//! Fan-out of dashboard events to SSE subscribers.

use tokio::sync::broadcast;

use smartpower_core::sync::{DashboardEvent, DashboardEventSink};

const EVENT_BUS_CAPACITY: usize = 64;

/// Broadcast channel bridging pipeline events to every open stream.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DashboardEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardEventSink for EventBus {
    fn emit(&self, event: DashboardEvent) {
        tracing::debug!("[Api] Event {:?}", event);
        // No open streams is fine.
        let _ = self.sender.send(event);
    }
}
