//! Messaging facade
//!
//! [`SmsManager`] is the single entry point callers use. Every operation is
//! total: it runs the capability gate first, then the platform work, and
//! folds every outcome into its result type. Denials and platform faults are
//! logged, never returned as errors.

use std::future::Future;
use std::sync::Arc;

use log::{info, warn};
use uuid::Uuid;

use crate::actions::ActionHandler;
use crate::capability::{CapabilityGate, Denial};
use crate::config::ManagerConfig;
use crate::events::{EventBridge, EventKind, MessagingEvent, SendOutcome, Subscription};
use crate::models::{
    ConversationThread, Message, MessageFilter, MessageId, OutgoingAttachment, OutgoingMms,
    OutgoingSms, PermissionState, SendResult, ThreadId,
};
use crate::platform::{OperationKind, PlatformBackend, PlatformError, PlatformResult};
use crate::query;

/// Unified messaging API over one platform backend
pub struct SmsManager {
    backend: Arc<dyn PlatformBackend>,
    gate: CapabilityGate,
    actions: ActionHandler,
    events: EventBridge,
    config: ManagerConfig,
}

impl SmsManager {
    pub fn new(backend: Arc<dyn PlatformBackend>) -> Self {
        Self::with_config(backend, ManagerConfig::default())
    }

    /// Create a manager and acquire the platform's native listeners
    pub fn with_config(backend: Arc<dyn PlatformBackend>, config: ManagerConfig) -> Self {
        let events = EventBridge::attach(backend.as_ref());
        info!(
            "SmsManager ready on {} platform (timeout: {:?})",
            backend.name(),
            config.operation_timeout()
        );
        Self {
            gate: CapabilityGate::new(Arc::clone(&backend)),
            actions: ActionHandler::new(Arc::clone(&backend)),
            backend,
            events,
            config,
        }
    }

    pub fn platform_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn events(&self) -> &EventBridge {
        &self.events
    }

    /// Release the native listeners; subsequent native events are not
    /// delivered
    pub fn shutdown(&self) {
        self.events.shutdown();
    }

    /// Bound reads and mutations by the configured timeout; sends never
    /// pass through here
    async fn run<T>(&self, work: impl Future<Output = PlatformResult<T>>) -> PlatformResult<T> {
        match self.config.operation_timeout() {
            Some(limit) => tokio::time::timeout(limit, work)
                .await
                .map_err(|_| PlatformError::Timeout(limit.as_millis() as u64))?,
            None => work.await,
        }
    }

    fn allowed(&self, kind: OperationKind, operation: &str) -> bool {
        match self.gate.evaluate(kind) {
            Ok(()) => true,
            Err(denial) => {
                warn!("{} denied: {}", operation, denial);
                false
            }
        }
    }

    // =========================================================================
    // Sending
    // =========================================================================

    /// Send a text message
    ///
    /// Success means the platform accepted the message; delivery is reported
    /// later through the sent/delivered events carrying the returned id.
    pub async fn send_sms(&self, address: &str, body: &str, delivery_receipt: bool) -> SendResult {
        if let Err(denial) = self.gate.evaluate(OperationKind::Send) {
            warn!("send_sms denied: {}", denial);
            return SendResult::failed(send_denial_message(denial, "SMS"));
        }

        let correlation_id = Uuid::new_v4().to_string();
        let outgoing = OutgoingSms {
            correlation_id: correlation_id.clone(),
            address: address.to_string(),
            body: body.to_string(),
            delivery_receipt,
        };

        info!("Sending SMS {} via {}", correlation_id, self.backend.name());
        match self.backend.send_sms(outgoing).await {
            Ok(()) => {
                if self.backend.echoes_sent_events() {
                    self.events
                        .publish(&MessagingEvent::SmsSent(SendOutcome::success(&correlation_id)));
                }
                SendResult::sent(correlation_id)
            }
            Err(e) => {
                warn!("SMS {} failed: {}", correlation_id, e);
                SendResult::failed(e.to_string())
            }
        }
    }

    /// Send a multimedia message
    pub async fn send_mms(
        &self,
        address: &str,
        body: Option<&str>,
        attachments: Vec<OutgoingAttachment>,
        delivery_receipt: bool,
    ) -> SendResult {
        if let Err(denial) = self.gate.evaluate(OperationKind::Send) {
            warn!("send_mms denied: {}", denial);
            return SendResult::failed(send_denial_message(denial, "MMS"));
        }
        if !attachments.is_empty() && !self.gate.attachments_supported() {
            warn!("send_mms denied: attachments unsupported");
            return SendResult::failed("Attachments not supported on this device");
        }

        let correlation_id = Uuid::new_v4().to_string();
        let outgoing = OutgoingMms {
            correlation_id: correlation_id.clone(),
            address: address.to_string(),
            body: body.map(str::to_string),
            attachments,
            delivery_receipt,
        };

        info!(
            "Sending MMS {} with {} attachment(s) via {}",
            correlation_id,
            outgoing.attachments.len(),
            self.backend.name()
        );
        match self.backend.send_mms(outgoing).await {
            Ok(()) => {
                if self.backend.echoes_sent_events() {
                    self.events
                        .publish(&MessagingEvent::MmsSent(SendOutcome::success(&correlation_id)));
                }
                SendResult::sent(correlation_id)
            }
            Err(e) => {
                warn!("MMS {} failed: {}", correlation_id, e);
                SendResult::failed(e.to_string())
            }
        }
    }

    // =========================================================================
    // Reading
    // =========================================================================

    async fn read_or_empty<T>(
        &self,
        operation: &str,
        work: impl Future<Output = PlatformResult<Vec<T>>>,
    ) -> Vec<T> {
        if !self.allowed(OperationKind::Read, operation) {
            return Vec::new();
        }
        match self.run(work).await {
            Ok(items) => items,
            Err(e) => {
                warn!("{} failed: {}", operation, e);
                Vec::new()
            }
        }
    }

    pub async fn get_sms_messages(&self, filter: &MessageFilter) -> Vec<Message> {
        self.read_or_empty(
            "get_sms_messages",
            query::get_sms_messages(self.backend.as_ref(), filter),
        )
        .await
    }

    pub async fn get_mms_messages(&self, filter: &MessageFilter) -> Vec<Message> {
        self.read_or_empty(
            "get_mms_messages",
            query::get_mms_messages(self.backend.as_ref(), filter),
        )
        .await
    }

    /// SMS and MMS merged newest first, paged over the merged stream
    pub async fn get_all_messages(&self, filter: &MessageFilter) -> Vec<Message> {
        self.read_or_empty(
            "get_all_messages",
            query::get_all_messages(self.backend.as_ref(), filter),
        )
        .await
    }

    pub async fn get_conversation_threads(&self) -> Vec<ConversationThread> {
        self.read_or_empty(
            "get_conversation_threads",
            query::get_conversation_threads(self.backend.as_ref()),
        )
        .await
    }

    pub async fn get_messages_in_thread(&self, thread_id: &ThreadId) -> Vec<Message> {
        self.read_or_empty(
            "get_messages_in_thread",
            query::get_messages_in_thread(self.backend.as_ref(), thread_id),
        )
        .await
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    async fn write_or_false(
        &self,
        operation: &str,
        work: impl Future<Output = PlatformResult<bool>>,
    ) -> bool {
        if !self.allowed(OperationKind::Write, operation) {
            return false;
        }
        match self.run(work).await {
            Ok(changed) => changed,
            Err(e) => {
                warn!("{} failed: {}", operation, e);
                false
            }
        }
    }

    pub async fn mark_as_read(&self, id: &MessageId) -> bool {
        self.write_or_false("mark_as_read", self.actions.mark_as_read(id))
            .await
    }

    pub async fn mark_thread_as_read(&self, thread_id: &ThreadId) -> bool {
        self.write_or_false(
            "mark_thread_as_read",
            self.actions.mark_thread_as_read(thread_id),
        )
        .await
    }

    pub async fn delete_message(&self, id: &MessageId) -> bool {
        self.write_or_false("delete_message", self.actions.delete_message(id))
            .await
    }

    pub async fn delete_thread(&self, thread_id: &ThreadId) -> bool {
        self.write_or_false("delete_thread", self.actions.delete_thread(thread_id))
            .await
    }

    // =========================================================================
    // Permissions
    // =========================================================================

    /// Current permission state, recomputed on every call
    pub async fn has_permissions(&self) -> PermissionState {
        self.gate.permission_state()
    }

    /// Report the permission state after the host's permission prompt
    ///
    /// Prompting is the host's job; this never shows UI.
    pub async fn request_permissions(&self) -> PermissionState {
        let state = self.gate.permission_state();
        if !state.all_granted() {
            info!("Permissions after request: {:?}", state);
        }
        state
    }

    // =========================================================================
    // Events
    // =========================================================================

    pub fn subscribe(
        &self,
        kind: EventKind,
        callback: impl Fn(&MessagingEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.events.subscribe(kind, callback)
    }

    pub fn on_sms_received(&self, callback: impl Fn(&Message) + Send + Sync + 'static) -> Subscription {
        self.events.subscribe(EventKind::SmsReceived, move |event| {
            if let Some(message) = event.message() {
                callback(message);
            }
        })
    }

    pub fn on_mms_received(&self, callback: impl Fn(&Message) + Send + Sync + 'static) -> Subscription {
        self.events.subscribe(EventKind::MmsReceived, move |event| {
            if let Some(message) = event.message() {
                callback(message);
            }
        })
    }

    pub fn on_sms_sent(&self, callback: impl Fn(&SendOutcome) + Send + Sync + 'static) -> Subscription {
        self.subscribe_outcome(EventKind::SmsSent, callback)
    }

    pub fn on_mms_sent(&self, callback: impl Fn(&SendOutcome) + Send + Sync + 'static) -> Subscription {
        self.subscribe_outcome(EventKind::MmsSent, callback)
    }

    pub fn on_sms_delivered(
        &self,
        callback: impl Fn(&SendOutcome) + Send + Sync + 'static,
    ) -> Subscription {
        self.subscribe_outcome(EventKind::SmsDelivered, callback)
    }

    pub fn on_mms_delivered(
        &self,
        callback: impl Fn(&SendOutcome) + Send + Sync + 'static,
    ) -> Subscription {
        self.subscribe_outcome(EventKind::MmsDelivered, callback)
    }

    fn subscribe_outcome(
        &self,
        kind: EventKind,
        callback: impl Fn(&SendOutcome) + Send + Sync + 'static,
    ) -> Subscription {
        self.events.subscribe(kind, move |event| {
            if let Some(outcome) = event.outcome() {
                callback(outcome);
            }
        })
    }
}

fn send_denial_message(denial: Denial, what: &str) -> String {
    match denial {
        Denial::PermissionDenied(kind) => format!("Missing {} permission", kind.permission()),
        Denial::CapabilityUnavailable(_) => format!("{} not available on this device", what),
    }
}
