//! Event bridge between native broadcast sources and subscribers
//!
//! The bridge owns one native listener per event source the platform
//! supports. Listeners are acquired when the bridge is attached to a backend
//! and released on [`EventBridge::shutdown`] or drop. Subscribers register
//! per [`EventKind`] and receive every matching event exactly once.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::models::Message;
use crate::platform::PlatformBackend;

/// Kinds of messaging events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    SmsReceived,
    MmsReceived,
    SmsSent,
    MmsSent,
    SmsDelivered,
    MmsDelivered,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::SmsReceived,
        EventKind::MmsReceived,
        EventKind::SmsSent,
        EventKind::MmsSent,
        EventKind::SmsDelivered,
        EventKind::MmsDelivered,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::SmsReceived => "smsReceived",
            EventKind::MmsReceived => "mmsReceived",
            EventKind::SmsSent => "smsSent",
            EventKind::MmsSent => "mmsSent",
            EventKind::SmsDelivered => "smsDelivered",
            EventKind::MmsDelivered => "mmsDelivered",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a send or delivery report for one outgoing message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOutcome {
    /// Correlation id returned by the originating send
    pub message_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SendOutcome {
    pub fn success(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            success: true,
            error: None,
        }
    }

    pub fn failure(message_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            success: false,
            error: Some(error.into()),
        }
    }
}

/// A typed messaging event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum MessagingEvent {
    SmsReceived(Message),
    MmsReceived(Message),
    SmsSent(SendOutcome),
    MmsSent(SendOutcome),
    SmsDelivered(SendOutcome),
    MmsDelivered(SendOutcome),
}

impl MessagingEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            MessagingEvent::SmsReceived(_) => EventKind::SmsReceived,
            MessagingEvent::MmsReceived(_) => EventKind::MmsReceived,
            MessagingEvent::SmsSent(_) => EventKind::SmsSent,
            MessagingEvent::MmsSent(_) => EventKind::MmsSent,
            MessagingEvent::SmsDelivered(_) => EventKind::SmsDelivered,
            MessagingEvent::MmsDelivered(_) => EventKind::MmsDelivered,
        }
    }

    pub fn message(&self) -> Option<&Message> {
        match self {
            MessagingEvent::SmsReceived(m) | MessagingEvent::MmsReceived(m) => Some(m),
            _ => None,
        }
    }

    pub fn outcome(&self) -> Option<&SendOutcome> {
        match self {
            MessagingEvent::SmsSent(o)
            | MessagingEvent::MmsSent(o)
            | MessagingEvent::SmsDelivered(o)
            | MessagingEvent::MmsDelivered(o) => Some(o),
            _ => None,
        }
    }
}

/// Handle a native listener pushes events into
#[derive(Clone)]
pub struct EventSink {
    emit: Arc<dyn Fn(MessagingEvent) + Send + Sync>,
}

impl EventSink {
    pub fn new(emit: impl Fn(MessagingEvent) + Send + Sync + 'static) -> Self {
        Self {
            emit: Arc::new(emit),
        }
    }

    pub fn emit(&self, event: MessagingEvent) {
        (self.emit)(event)
    }
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink").finish_non_exhaustive()
    }
}

/// An acquired native listener; releasing it unregisters the listener
///
/// Released exactly once, either explicitly or on drop.
pub struct ListenerRegistration {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl ListenerRegistration {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    pub fn release(mut self) {
        self.run_release();
    }

    fn run_release(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for ListenerRegistration {
    fn drop(&mut self) {
        self.run_release();
    }
}

type Callback = Arc<dyn Fn(&MessagingEvent) + Send + Sync>;

#[derive(Default)]
struct Subscribers {
    next_id: AtomicU64,
    by_kind: RwLock<HashMap<EventKind, Vec<(u64, Callback)>>>,
}

impl Subscribers {
    fn dispatch(&self, event: &MessagingEvent) {
        // Snapshot so callbacks run without the lock held
        let callbacks: Vec<Callback> = {
            let by_kind = self.by_kind.read().unwrap_or_else(PoisonError::into_inner);
            by_kind
                .get(&event.kind())
                .map(|subs| subs.iter().map(|(_, cb)| Arc::clone(cb)).collect())
                .unwrap_or_default()
        };

        debug!("Dispatching {} to {} subscriber(s)", event.kind(), callbacks.len());
        for callback in callbacks {
            callback(event);
        }
    }

    fn remove(&self, kind: EventKind, id: u64) {
        let mut by_kind = self.by_kind.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(subs) = by_kind.get_mut(&kind) {
            subs.retain(|(sub_id, _)| *sub_id != id);
        }
    }
}

/// Republishes native events to typed subscribers
pub struct EventBridge {
    subscribers: Arc<Subscribers>,
    registrations: Mutex<Vec<(EventKind, ListenerRegistration)>>,
}

impl EventBridge {
    /// A bridge without native listeners
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(Subscribers::default()),
            registrations: Mutex::new(Vec::new()),
        }
    }

    /// A bridge holding one native listener per event source the backend
    /// supports
    pub fn attach(backend: &dyn PlatformBackend) -> Self {
        let bridge = Self::new();
        let mut acquired = Vec::new();
        for kind in EventKind::ALL {
            if let Some(registration) = backend.register_listener(kind, bridge.sink()) {
                acquired.push((kind, registration));
            }
        }
        info!(
            "Event bridge attached to {} backend with {} listener(s)",
            backend.name(),
            acquired.len()
        );
        *bridge
            .registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = acquired;
        bridge
    }

    /// A sink feeding this bridge's subscribers
    ///
    /// The sink does not keep the bridge alive; events emitted after the
    /// bridge is dropped are discarded.
    pub fn sink(&self) -> EventSink {
        let subscribers: Weak<Subscribers> = Arc::downgrade(&self.subscribers);
        EventSink::new(move |event| {
            if let Some(subscribers) = subscribers.upgrade() {
                subscribers.dispatch(&event);
            }
        })
    }

    /// Register a callback for one event kind
    pub fn subscribe(
        &self,
        kind: EventKind,
        callback: impl Fn(&MessagingEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.subscribers.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers
            .by_kind
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(kind)
            .or_default()
            .push((id, Arc::new(callback)));

        Subscription {
            id,
            kind,
            subscribers: Arc::downgrade(&self.subscribers),
        }
    }

    /// Deliver an event to the current subscribers of its kind
    pub fn publish(&self, event: &MessagingEvent) {
        self.subscribers.dispatch(event);
    }

    /// Number of live subscriptions for a kind
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers
            .by_kind
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .map_or(0, Vec::len)
    }

    /// Event kinds with a native listener currently held
    pub fn listening_kinds(&self) -> Vec<EventKind> {
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(kind, _)| *kind)
            .collect()
    }

    /// Release every native listener
    ///
    /// Subscriptions stay registered but no native events arrive afterwards.
    pub fn shutdown(&self) {
        let released: Vec<_> = self
            .registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        if released.is_empty() {
            return;
        }
        info!("Releasing {} native listener(s)", released.len());
        for (_, registration) in released {
            registration.release();
        }
    }
}

impl Default for EventBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EventBridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Handle returned by [`EventBridge::subscribe`]
///
/// Dropping the handle does not unsubscribe; call [`Subscription::unsubscribe`].
#[derive(Debug, Clone)]
pub struct Subscription {
    id: u64,
    kind: EventKind,
    subscribers: Weak<Subscribers>,
}

impl Subscription {
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Stop delivery to this subscription; calling it again is a no-op
    pub fn unsubscribe(&self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            subscribers.remove(self.kind, self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MessageId, MessageKind};
    use std::sync::atomic::AtomicUsize;

    fn received(body: &str) -> MessagingEvent {
        MessagingEvent::SmsReceived(
            Message::builder(MessageId::new("1"), MessageKind::Sms)
                .address("555")
                .body(body)
                .build(),
        )
    }

    #[test]
    fn test_subscribers_receive_matching_events_once() {
        let bridge = EventBridge::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let other = Arc::new(AtomicUsize::new(0));

        let h = Arc::clone(&hits);
        bridge.subscribe(EventKind::SmsReceived, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        let o = Arc::clone(&other);
        bridge.subscribe(EventKind::SmsSent, move |_| {
            o.fetch_add(1, Ordering::SeqCst);
        });

        bridge.sink().emit(received("hi"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(other.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let bridge = EventBridge::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let sub = bridge.subscribe(EventKind::SmsReceived, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        bridge.publish(&received("one"));
        sub.unsubscribe();
        sub.unsubscribe();
        bridge.publish(&received("two"));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(bridge.subscriber_count(EventKind::SmsReceived), 0);
    }

    #[test]
    fn test_callback_may_unsubscribe_itself() {
        let bridge = Arc::new(EventBridge::new());
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let hits = Arc::new(AtomicUsize::new(0));

        let s = Arc::clone(&slot);
        let h = Arc::clone(&hits);
        let sub = bridge.subscribe(EventKind::SmsReceived, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
            if let Some(sub) = s.lock().unwrap().as_ref() {
                sub.unsubscribe();
            }
        });
        *slot.lock().unwrap() = Some(sub);

        bridge.publish(&received("a"));
        bridge.publish(&received("b"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_registration_released_once() {
        let releases = Arc::new(AtomicUsize::new(0));
        let r = Arc::clone(&releases);
        let registration = ListenerRegistration::new(move || {
            r.fetch_add(1, Ordering::SeqCst);
        });
        registration.release();
        assert_eq!(releases.load(Ordering::SeqCst), 1);

        let r = Arc::clone(&releases);
        drop(ListenerRegistration::new(move || {
            r.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(releases.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_sink_outliving_bridge_is_inert() {
        let bridge = EventBridge::new();
        let sink = bridge.sink();
        drop(bridge);
        sink.emit(received("late"));
    }

    #[test]
    fn test_event_serializes_with_kind_tag() {
        let event = MessagingEvent::SmsSent(SendOutcome::success("abc"));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "smsSent");
        assert_eq!(json["payload"]["messageId"], "abc");
    }
}
