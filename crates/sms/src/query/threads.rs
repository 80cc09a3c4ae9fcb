//! Conversation thread queries

use std::collections::HashMap;

use crate::models::{ConversationThread, Message, MessageFilter};
use crate::platform::{PlatformBackend, PlatformResult};

use super::messages::get_all_messages;

/// Group newest-first messages into threads
///
/// The first message seen for a thread id fixes its address, last message
/// and date. Counts cover every message of the thread. Threads come out in
/// the order they were first seen, so the most recently active thread is
/// first.
pub fn aggregate_threads(messages: &[Message]) -> Vec<ConversationThread> {
    let mut threads: Vec<ConversationThread> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for message in messages {
        let slot = *index.entry(message.thread_id.as_str()).or_insert_with(|| {
            threads.push(ConversationThread {
                thread_id: message.thread_id.clone(),
                address: message.address.clone(),
                message_count: 0,
                last_message: message.body_text().to_string(),
                last_message_date: message.date,
                unread_count: 0,
            });
            threads.len() - 1
        });

        let thread = &mut threads[slot];
        thread.message_count += 1;
        if !message.read {
            thread.unread_count += 1;
        }
    }

    threads
}

/// One entry per conversation, most recently active first
pub async fn get_conversation_threads(
    backend: &dyn PlatformBackend,
) -> PlatformResult<Vec<ConversationThread>> {
    let messages = get_all_messages(backend, &MessageFilter::default()).await?;
    Ok(aggregate_threads(&messages))
}
