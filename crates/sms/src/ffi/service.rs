//! SmsService facade for UniFFI export
//!
//! Wraps [`SmsManager`] in an FFI-friendly object. Host callback interfaces
//! are adapted to the platform ports here, so the rest of the crate never
//! sees a UniFFI type.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use log::{info, warn};

use crate::events::{MessagingEvent, Subscription};
use crate::ffi::types::*;
use crate::manager::SmsManager;
use crate::models::{MessageFilter, MessageId, OutgoingAttachment, OutgoingMms, OutgoingSms, ThreadId};
use crate::platform::{
    ComposeBackend, ComposePresenter, ComposeRequest, HostBroadcastSource, OutboxTransport,
    PermissionChecker, ProviderBackend, SmsTransport,
};
use crate::provider::SqliteMessageStore;

// ============================================================================
// Callback Adapters
// ============================================================================

struct PermissionAdapter(Box<dyn FfiPermissionChecker>);

impl PermissionChecker for PermissionAdapter {
    fn is_granted(&self, permission: &str) -> bool {
        self.0.is_granted(permission.to_string())
    }
}

struct TransportAdapter(Box<dyn FfiTransport>);

impl SmsTransport for TransportAdapter {
    fn send_text(&self, sms: &OutgoingSms) -> anyhow::Result<()> {
        self.0
            .send_text(FfiOutgoingSms::from(sms))
            .map_err(|e| anyhow!(e.to_string()))
    }

    fn send_multimedia(&self, mms: &OutgoingMms) -> anyhow::Result<()> {
        self.0
            .send_multimedia(FfiOutgoingMms::from(mms))
            .map_err(|e| anyhow!(e.to_string()))
    }
}

struct PresenterAdapter(Box<dyn FfiComposePresenter>);

impl ComposePresenter for PresenterAdapter {
    fn can_send_text(&self) -> bool {
        self.0.can_send_text()
    }

    fn can_send_attachments(&self) -> bool {
        self.0.can_send_attachments()
    }

    fn present(&self, request: ComposeRequest) -> anyhow::Result<()> {
        self.0
            .present(
                request.recipients,
                request.body,
                request
                    .attachments
                    .into_iter()
                    .map(FfiOutgoingAttachment::from)
                    .collect(),
            )
            .map_err(|e| anyhow!(e.to_string()))
    }
}

// ============================================================================
// Subscription Handle
// ============================================================================

/// Handle for an event subscription; call `unsubscribe` to stop delivery
#[derive(uniffi::Object)]
pub struct FfiSubscription {
    inner: Subscription,
}

#[uniffi::export]
impl FfiSubscription {
    pub fn unsubscribe(&self) {
        self.inner.unsubscribe();
    }
}

// ============================================================================
// Service
// ============================================================================

/// Main service object for messaging operations
#[derive(uniffi::Object)]
pub struct SmsService {
    manager: SmsManager,
    /// Present on provider platforms, where the host forwards broadcasts
    broadcasts: Option<HostBroadcastSource>,
}

#[uniffi::export(async_runtime = "tokio")]
impl SmsService {
    /// Provider platform service over an `mmssms.db`-shaped database
    ///
    /// Without a transport, sends are recorded in the database as sent
    /// messages and reported back as sent events.
    #[uniffi::constructor]
    pub fn with_provider(
        db_path: String,
        permissions: Box<dyn FfiPermissionChecker>,
        transport: Option<Box<dyn FfiTransport>>,
        operation_timeout_ms: Option<u64>,
    ) -> Result<Arc<Self>, SmsError> {
        if let Some(parent) = PathBuf::from(&db_path).parent() {
            std::fs::create_dir_all(parent).map_err(|e| SmsError::Database {
                message: format!("Failed to create database directory: {}", e),
            })?;
        }

        let store = Arc::new(SqliteMessageStore::new(&db_path).map_err(|e| {
            SmsError::Database {
                message: format!("Failed to open database: {:#}", e),
            }
        })?);

        let broadcasts = HostBroadcastSource::new();
        let transport: Arc<dyn SmsTransport> = match transport {
            Some(transport) => Arc::new(TransportAdapter(transport)),
            None => Arc::new(OutboxTransport::new(Arc::clone(&store), broadcasts.clone())),
        };

        let backend = ProviderBackend::new(
            Arc::new(PermissionAdapter(permissions)),
            store,
            transport,
            Arc::new(broadcasts.clone()),
        );

        info!("SmsService opened provider database at {}", db_path);
        Ok(Arc::new(Self {
            manager: SmsManager::with_config(
                Arc::new(backend),
                crate::config::ManagerConfig {
                    operation_timeout_ms,
                },
            ),
            broadcasts: Some(broadcasts),
        }))
    }

    /// Compose-only platform service
    #[uniffi::constructor]
    pub fn with_compose(presenter: Box<dyn FfiComposePresenter>) -> Arc<Self> {
        let backend = ComposeBackend::new(Arc::new(PresenterAdapter(presenter)));
        Arc::new(Self {
            manager: SmsManager::new(Arc::new(backend)),
            broadcasts: None,
        })
    }

    // ========================================================================
    // Sending
    // ========================================================================

    pub async fn send_sms(
        &self,
        address: String,
        body: String,
        delivery_receipt: bool,
    ) -> FfiSendResult {
        self.manager
            .send_sms(&address, &body, delivery_receipt)
            .await
            .into()
    }

    pub async fn send_mms(
        &self,
        address: String,
        body: Option<String>,
        attachments: Vec<FfiOutgoingAttachment>,
        delivery_receipt: bool,
    ) -> FfiSendResult {
        let attachments = attachments.into_iter().map(OutgoingAttachment::from).collect();
        self.manager
            .send_mms(&address, body.as_deref(), attachments, delivery_receipt)
            .await
            .into()
    }

    // ========================================================================
    // Reading
    // ========================================================================

    pub async fn get_sms_messages(&self, filter: FfiMessageFilter) -> Vec<FfiMessage> {
        let filter = MessageFilter::from(filter);
        to_ffi_messages(self.manager.get_sms_messages(&filter).await)
    }

    pub async fn get_mms_messages(&self, filter: FfiMessageFilter) -> Vec<FfiMessage> {
        let filter = MessageFilter::from(filter);
        to_ffi_messages(self.manager.get_mms_messages(&filter).await)
    }

    pub async fn get_all_messages(&self, filter: FfiMessageFilter) -> Vec<FfiMessage> {
        let filter = MessageFilter::from(filter);
        to_ffi_messages(self.manager.get_all_messages(&filter).await)
    }

    pub async fn get_conversation_threads(&self) -> Vec<FfiConversationThread> {
        self.manager
            .get_conversation_threads()
            .await
            .into_iter()
            .map(FfiConversationThread::from)
            .collect()
    }

    pub async fn get_messages_in_thread(&self, thread_id: String) -> Vec<FfiMessage> {
        to_ffi_messages(
            self.manager
                .get_messages_in_thread(&ThreadId::new(thread_id))
                .await,
        )
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    pub async fn mark_as_read(&self, message_id: String) -> bool {
        self.manager.mark_as_read(&MessageId::new(message_id)).await
    }

    pub async fn mark_thread_as_read(&self, thread_id: String) -> bool {
        self.manager
            .mark_thread_as_read(&ThreadId::new(thread_id))
            .await
    }

    pub async fn delete_message(&self, message_id: String) -> bool {
        self.manager.delete_message(&MessageId::new(message_id)).await
    }

    pub async fn delete_thread(&self, thread_id: String) -> bool {
        self.manager.delete_thread(&ThreadId::new(thread_id)).await
    }

    // ========================================================================
    // Permissions
    // ========================================================================

    pub async fn has_permissions(&self) -> FfiPermissionState {
        self.manager.has_permissions().await.into()
    }

    pub async fn request_permissions(&self) -> FfiPermissionState {
        self.manager.request_permissions().await.into()
    }

    // ========================================================================
    // Events
    // ========================================================================

    pub fn subscribe(
        &self,
        kind: FfiEventKind,
        callback: Box<dyn FfiEventCallback>,
    ) -> Arc<FfiSubscription> {
        let inner = self.manager.subscribe(kind.into(), move |event| {
            callback.on_event(FfiEvent::from(event.clone()));
        });
        Arc::new(FfiSubscription { inner })
    }

    /// Forward a broadcast decoded by the host's native receiver
    ///
    /// Returns the number of native listeners reached. Always zero on
    /// compose-only platforms, which have no native listeners.
    pub fn publish_native_event(&self, event: FfiEvent) -> u32 {
        let event = MessagingEvent::from(event);
        match &self.broadcasts {
            Some(broadcasts) => broadcasts.publish(event) as u32,
            None => {
                warn!("Dropping native {} event: no listener on this platform", event.kind());
                0
            }
        }
    }

    /// Release the native listeners
    pub fn shutdown(&self) {
        self.manager.shutdown();
    }
}

fn to_ffi_messages(messages: Vec<crate::models::Message>) -> Vec<FfiMessage> {
    messages.into_iter().map(FfiMessage::from).collect()
}
