//! Message query functions

use log::debug;

use crate::models::{Message, MessageFilter, ThreadId};
use crate::platform::{PlatformBackend, PlatformResult};
use crate::provider::{ProviderTable, map_row, translate_for};

async fn fetch(
    backend: &dyn PlatformBackend,
    filter: &MessageFilter,
    table: ProviderTable,
) -> PlatformResult<Vec<Message>> {
    let query = translate_for(filter, table);
    let rows = backend.query(query).await?;
    Ok(rows.iter().map(|row| map_row(row, table)).collect())
}

/// SMS messages matching the filter, newest first
pub async fn get_sms_messages(
    backend: &dyn PlatformBackend,
    filter: &MessageFilter,
) -> PlatformResult<Vec<Message>> {
    fetch(backend, filter, ProviderTable::Sms).await
}

/// MMS messages matching the filter, newest first
pub async fn get_mms_messages(
    backend: &dyn PlatformBackend,
    filter: &MessageFilter,
) -> PlatformResult<Vec<Message>> {
    fetch(backend, filter, ProviderTable::Mms).await
}

/// SMS and MMS messages matching the filter, merged newest first
///
/// Both tables are queried concurrently. Paging applies to the merged
/// stream: each table is asked for up to `offset + limit` rows, then the
/// merge is skipped and truncated.
pub async fn get_all_messages(
    backend: &dyn PlatformBackend,
    filter: &MessageFilter,
) -> PlatformResult<Vec<Message>> {
    let widened = filter.widened_for_merge();
    let (sms, mms) = futures::try_join!(
        fetch(backend, &widened, ProviderTable::Sms),
        fetch(backend, &widened, ProviderTable::Mms),
    )?;
    debug!("Merging {} SMS and {} MMS rows", sms.len(), mms.len());

    let merged = merge_by_date(sms, mms);
    let offset = filter.offset.unwrap_or(0) as usize;
    let limit = filter.limit.map_or(usize::MAX, |l| l as usize);
    Ok(merged.into_iter().skip(offset).take(limit).collect())
}

/// Every message of a thread, newest first
pub async fn get_messages_in_thread(
    backend: &dyn PlatformBackend,
    thread_id: &ThreadId,
) -> PlatformResult<Vec<Message>> {
    get_all_messages(backend, &MessageFilter::new().thread(thread_id.clone())).await
}

/// Merge two newest-first lists into one, newest first
///
/// On equal dates the message from `first` comes first.
pub fn merge_by_date(first: Vec<Message>, second: Vec<Message>) -> Vec<Message> {
    let mut merged = Vec::with_capacity(first.len() + second.len());
    let mut a = first.into_iter().peekable();
    let mut b = second.into_iter().peekable();

    loop {
        let take_first = match (a.peek(), b.peek()) {
            (Some(x), Some(y)) => x.date >= y.date,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let next = if take_first { a.next() } else { b.next() };
        merged.extend(next);
    }
    merged
}
