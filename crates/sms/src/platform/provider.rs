//! Provider platform backend
//!
//! Reads and writes the OS message store, sends through the silent system
//! send API and listens to the system broadcasts. Store and transport calls
//! are synchronous and run on the blocking pool.

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use super::traits::{
    BroadcastSource, Capabilities, OperationKind, PermissionChecker, PlatformBackend, PlatformError,
    PlatformResult, SmsTransport, Support,
};
use crate::events::{EventKind, EventSink, ListenerRegistration};
use crate::models::{OutgoingMms, OutgoingSms};
use crate::provider::{
    ContentValues, MessageStore, ProviderQuery, ProviderRow, ProviderTable, Selection,
};

const CAPABILITIES: Capabilities = Capabilities {
    read: Support::Permissioned,
    write: Support::Permissioned,
    receive: Support::Permissioned,
    send: Support::Permissioned,
    attachments: true,
};

/// Backend for platforms with a queryable message store
pub struct ProviderBackend {
    permissions: Arc<dyn PermissionChecker>,
    store: Arc<dyn MessageStore>,
    transport: Arc<dyn SmsTransport>,
    broadcasts: Arc<dyn BroadcastSource>,
}

impl ProviderBackend {
    pub fn new(
        permissions: Arc<dyn PermissionChecker>,
        store: Arc<dyn MessageStore>,
        transport: Arc<dyn SmsTransport>,
        broadcasts: Arc<dyn BroadcastSource>,
    ) -> Self {
        Self {
            permissions,
            store,
            transport,
            broadcasts,
        }
    }
}

#[async_trait]
impl PlatformBackend for ProviderBackend {
    fn name(&self) -> &'static str {
        "provider"
    }

    fn capabilities(&self) -> Capabilities {
        CAPABILITIES
    }

    fn is_permission_granted(&self, kind: OperationKind) -> bool {
        self.permissions.is_granted(kind.permission())
    }

    async fn query(&self, query: ProviderQuery) -> PlatformResult<Vec<ProviderRow>> {
        debug!(
            "Provider query on {}: where={:?} args={:?} sort={}",
            query.table.name(),
            query.where_clause(),
            query.args(),
            query.sort_order()
        );
        let store = Arc::clone(&self.store);
        let rows = tokio::task::spawn_blocking(move || store.query(&query)).await??;
        Ok(rows)
    }

    async fn update(
        &self,
        table: ProviderTable,
        values: ContentValues,
        selection: Selection,
    ) -> PlatformResult<usize> {
        let store = Arc::clone(&self.store);
        let changed =
            tokio::task::spawn_blocking(move || store.update(table, &values, &selection)).await??;
        Ok(changed)
    }

    async fn delete(&self, table: ProviderTable, selection: Selection) -> PlatformResult<usize> {
        let store = Arc::clone(&self.store);
        let changed = tokio::task::spawn_blocking(move || store.delete(table, &selection)).await??;
        Ok(changed)
    }

    async fn send_sms(&self, sms: OutgoingSms) -> PlatformResult<()> {
        let transport = Arc::clone(&self.transport);
        tokio::task::spawn_blocking(move || transport.send_text(&sms))
            .await?
            .map_err(|e| PlatformError::Transport(format!("{:#}", e)))
    }

    async fn send_mms(&self, mms: OutgoingMms) -> PlatformResult<()> {
        let transport = Arc::clone(&self.transport);
        tokio::task::spawn_blocking(move || transport.send_multimedia(&mms))
            .await?
            .map_err(|e| PlatformError::Transport(format!("{:#}", e)))
    }

    fn register_listener(&self, kind: EventKind, sink: EventSink) -> Option<ListenerRegistration> {
        Some(self.broadcasts.register(kind, sink))
    }
}
