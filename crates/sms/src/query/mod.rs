//! Read-side operations
//!
//! These functions assume the caller has already passed the capability gate;
//! they only translate, fetch, map and merge.

mod messages;
mod threads;

pub use messages::{
    get_all_messages, get_messages_in_thread, get_mms_messages, get_sms_messages, merge_by_date,
};
pub use threads::{aggregate_threads, get_conversation_threads};
