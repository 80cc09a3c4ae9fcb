//! Broadcast source fed by the host application
//!
//! On device the host's broadcast receivers decode the system intents and
//! publish the resulting events here. Off-device, the outbox transport and
//! tests publish into it directly.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use log::debug;

use super::traits::BroadcastSource;
use crate::events::{EventKind, EventSink, ListenerRegistration, MessagingEvent};

#[derive(Default)]
struct Listeners {
    next_id: u64,
    by_id: HashMap<u64, (EventKind, EventSink)>,
}

/// Broadcast source the host publishes native events into
#[derive(Clone, Default)]
pub struct HostBroadcastSource {
    listeners: Arc<Mutex<Listeners>>,
}

impl HostBroadcastSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an event to every listener registered for its kind
    ///
    /// Returns the number of listeners reached; zero means the event was
    /// dropped because nothing is listening.
    pub fn publish(&self, event: MessagingEvent) -> usize {
        let kind = event.kind();
        let sinks: Vec<EventSink> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .by_id
            .values()
            .filter(|(k, _)| *k == kind)
            .map(|(_, sink)| sink.clone())
            .collect();

        if sinks.is_empty() {
            debug!("No listener for {}, dropping event", kind);
        }
        for sink in &sinks {
            sink.emit(event.clone());
        }
        sinks.len()
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .by_id
            .len()
    }

    pub fn is_listening(&self, kind: EventKind) -> bool {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .by_id
            .values()
            .any(|(k, _)| *k == kind)
    }
}

impl BroadcastSource for HostBroadcastSource {
    fn register(&self, kind: EventKind, sink: EventSink) -> ListenerRegistration {
        let id = {
            let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
            let id = listeners.next_id;
            listeners.next_id += 1;
            listeners.by_id.insert(id, (kind, sink));
            id
        };
        debug!("Registered {} listener {}", kind, id);

        let listeners: Weak<Mutex<Listeners>> = Arc::downgrade(&self.listeners);
        ListenerRegistration::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .by_id
                    .remove(&id);
                debug!("Released {} listener {}", kind, id);
            }
        })
    }
}
