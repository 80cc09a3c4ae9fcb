//! Provider access: schema, filter translation, row mapping and storage
//!
//! The provider is the OS-owned message store. This module knows how to
//! talk to it; it never keeps a copy of its data.

pub mod columns;
mod row;
mod selection;
mod sqlite;
mod store;

pub use columns::ProviderTable;
pub use row::{ContentValues, ProviderRow, ProviderValue, map_row};
pub use selection::{ProviderQuery, Selection, translate, translate_for};
pub use sqlite::SqliteMessageStore;
pub use store::MessageStore;
