//! Action handler for store mutations
//!
//! A message id names its table (see `MessageId::row`), so an id-based
//! action touches exactly one table. Thread actions apply to both tables.
//! An action succeeds when at least one row changed.

use std::sync::Arc;

use log::info;

use crate::models::{MessageId, ThreadId};
use crate::platform::{PlatformBackend, PlatformResult};
use crate::provider::columns::sms;
use crate::provider::{ContentValues, ProviderTable, ProviderValue, Selection};

pub struct ActionHandler {
    backend: Arc<dyn PlatformBackend>,
}

fn read_values() -> ContentValues {
    let mut values = ContentValues::new();
    // Same column name in both tables
    values.insert(sms::READ.to_string(), ProviderValue::Integer(1));
    values
}

impl ActionHandler {
    pub fn new(backend: Arc<dyn PlatformBackend>) -> Self {
        Self { backend }
    }

    /// Mark one message as read
    pub async fn mark_as_read(&self, id: &MessageId) -> PlatformResult<bool> {
        let (table, selection) = Selection::for_message(id);
        let changed = self.backend.update(table, read_values(), selection).await?;
        if changed > 0 {
            info!("Marked {} message {} as read", table.name(), id);
        }
        Ok(changed > 0)
    }

    /// Mark every message of a thread as read
    pub async fn mark_thread_as_read(&self, thread_id: &ThreadId) -> PlatformResult<bool> {
        let (sms, mms) = futures::try_join!(
            self.backend.update(
                ProviderTable::Sms,
                read_values(),
                Selection::by_thread(ProviderTable::Sms, thread_id),
            ),
            self.backend.update(
                ProviderTable::Mms,
                read_values(),
                Selection::by_thread(ProviderTable::Mms, thread_id),
            ),
        )?;

        info!(
            "Marked thread {} as read ({} SMS, {} MMS)",
            thread_id.as_str(),
            sms,
            mms
        );
        Ok(sms + mms > 0)
    }

    /// Delete one message
    pub async fn delete_message(&self, id: &MessageId) -> PlatformResult<bool> {
        let (table, selection) = Selection::for_message(id);
        let deleted = self.backend.delete(table, selection).await?;
        if deleted > 0 {
            info!("Deleted {} message {}", table.name(), id);
        }
        Ok(deleted > 0)
    }

    /// Delete every message of a thread
    pub async fn delete_thread(&self, thread_id: &ThreadId) -> PlatformResult<bool> {
        let (sms, mms) = futures::try_join!(
            self.backend.delete(
                ProviderTable::Sms,
                Selection::by_thread(ProviderTable::Sms, thread_id),
            ),
            self.backend.delete(
                ProviderTable::Mms,
                Selection::by_thread(ProviderTable::Mms, thread_id),
            ),
        )?;

        info!(
            "Deleted thread {} ({} SMS, {} MMS)",
            thread_id.as_str(),
            sms,
            mms
        );
        Ok(sms + mms > 0)
    }
}
