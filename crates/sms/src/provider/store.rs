//! Message store trait definition

use anyhow::Result;

use super::{ContentValues, ProviderQuery, ProviderRow, ProviderTable, Selection};

/// Trait for provider-backed message storage
///
/// This mirrors the content-resolver contract of the OS store: queries take
/// a selection with positional arguments and a sort order, mutations report
/// how many rows they touched. Implementations own no message semantics;
/// mapping rows to messages happens above this trait.
pub trait MessageStore: Send + Sync {
    /// Run a translated query and return raw rows
    fn query(&self, query: &ProviderQuery) -> Result<Vec<ProviderRow>>;

    /// Insert a row, returning the provider-assigned id
    fn insert(&self, table: ProviderTable, values: &ContentValues) -> Result<String>;

    /// Update rows matching the selection, returning the number of rows changed
    fn update(
        &self,
        table: ProviderTable,
        values: &ContentValues,
        selection: &Selection,
    ) -> Result<usize>;

    /// Delete rows matching the selection, returning the number of rows removed
    fn delete(&self, table: ProviderTable, selection: &Selection) -> Result<usize>;
}
