//! Filter-to-query translation
//!
//! Turns a [`MessageFilter`] into the selection clause, positional argument
//! list and sort order the provider expects. Placeholders and arguments are
//! appended together, so `args[i]` always binds the i-th `?`.

use super::columns::ProviderTable;
use crate::models::{MessageFilter, MessageId, ThreadId};

/// A where clause with positional arguments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// `None` matches every row
    pub where_clause: Option<String>,
    pub args: Vec<String>,
}

impl Selection {
    /// Selection matching a single row by provider row id
    pub fn by_row_id(table: ProviderTable, row_id: &str) -> Self {
        let mut selection = Self::default();
        selection.push(format!("{} = ?", table.id_column()), row_id);
        selection
    }

    /// The table holding a message and a selection matching its row
    pub fn for_message(id: &MessageId) -> (ProviderTable, Self) {
        let (kind, row_id) = id.row();
        let table = ProviderTable::from(kind);
        (table, Self::by_row_id(table, row_id))
    }

    /// Selection matching every row of a thread
    pub fn by_thread(table: ProviderTable, thread_id: &ThreadId) -> Self {
        let mut selection = Self::default();
        selection.push(format!("{} = ?", table.thread_column()), thread_id.as_str());
        selection
    }

    /// AND a condition onto the clause and bind its argument
    fn push(&mut self, condition: String, arg: impl Into<String>) {
        self.where_clause = Some(match self.where_clause.take() {
            None => condition,
            Some(current) => format!("{} AND {}", current, condition),
        });
        self.args.push(arg.into());
    }

    pub fn is_match_all(&self) -> bool {
        self.where_clause.is_none()
    }
}

/// A translated provider query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderQuery {
    pub table: ProviderTable,
    pub selection: Selection,
    pub order_by: String,
    /// Appended verbatim to the sort order, e.g. `" LIMIT 10 OFFSET 20"`
    pub limit_clause: Option<String>,
}

impl ProviderQuery {
    pub fn where_clause(&self) -> Option<&str> {
        self.selection.where_clause.as_deref()
    }

    pub fn args(&self) -> &[String] {
        &self.selection.args
    }

    /// Sort order with the limit clause appended, as the provider takes it
    pub fn sort_order(&self) -> String {
        match &self.limit_clause {
            Some(limit) => format!("{}{}", self.order_by, limit),
            None => self.order_by.clone(),
        }
    }
}

/// Translate a filter against the SMS table
pub fn translate(filter: &MessageFilter) -> ProviderQuery {
    translate_for(filter, ProviderTable::Sms)
}

/// Translate a filter against the given table
///
/// Predicates are assembled in a fixed order: address, start date, end date,
/// read state, type, thread.
pub fn translate_for(filter: &MessageFilter, table: ProviderTable) -> ProviderQuery {
    let mut selection = Selection::default();
    let scale = table.date_scale();

    if let Some(address) = &filter.address {
        selection.push(format!("{} = ?", table.address_column()), address.as_str());
    }

    if let Some(start) = filter.start_date {
        // Round up so a coarser date column never admits rows before `start`
        let bound = start.div_euclid(scale) + i64::from(start.rem_euclid(scale) > 0);
        selection.push(format!("{} >= ?", table.date_column()), bound.to_string());
    }

    if let Some(end) = filter.end_date {
        let bound = end.div_euclid(scale);
        selection.push(format!("{} <= ?", table.date_column()), bound.to_string());
    }

    if let Some(read) = filter.read {
        selection.push(
            format!("{} = ?", table.read_column()),
            if read { "1" } else { "0" },
        );
    }

    if let Some(message_type) = filter.message_type {
        selection.push(
            format!("{} = ?", table.type_column()),
            message_type.code().to_string(),
        );
    }

    if let Some(thread_id) = &filter.thread_id {
        selection.push(format!("{} = ?", table.thread_column()), thread_id.as_str());
    }

    let limit_clause = match (filter.limit, filter.offset) {
        (Some(limit), Some(offset)) => Some(format!(" LIMIT {} OFFSET {}", limit, offset)),
        (Some(limit), None) => Some(format!(" LIMIT {}", limit)),
        (None, Some(offset)) => Some(format!(" LIMIT -1 OFFSET {}", offset)),
        (None, None) => None,
    };

    ProviderQuery {
        table,
        selection,
        order_by: format!("{} DESC", table.date_column()),
        limit_clause,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageType;

    #[test]
    fn test_empty_filter_matches_all() {
        let query = translate(&MessageFilter::default());
        assert!(query.selection.is_match_all());
        assert!(query.args().is_empty());
        assert_eq!(query.sort_order(), "date DESC");
        assert_eq!(query.limit_clause, None);
    }

    #[test]
    fn test_address_and_start_date_args_in_order() {
        let filter = MessageFilter::new().address("555").start_date(1000);
        let query = translate(&filter);
        assert_eq!(query.args(), ["555".to_string(), "1000".to_string()]);
        assert_eq!(query.where_clause(), Some("address = ? AND date >= ?"));
    }

    #[test]
    fn test_predicate_order_is_fixed() {
        // Builder order differs from assembly order on purpose
        let filter = MessageFilter::new()
            .read(false)
            .end_date(9000)
            .address("555")
            .start_date(1000);
        let query = translate(&filter);
        assert_eq!(
            query.where_clause(),
            Some("address = ? AND date >= ? AND date <= ? AND read = ?")
        );
        assert_eq!(query.args(), ["555", "1000", "9000", "0"]);
    }

    #[test]
    fn test_type_and_thread_predicates() {
        let filter = MessageFilter::new()
            .message_type(MessageType::Sent)
            .thread("42");
        let query = translate(&filter);
        assert_eq!(query.where_clause(), Some("type = ? AND thread_id = ?"));
        assert_eq!(query.args(), ["2", "42"]);
    }

    #[test]
    fn test_limit_appended_to_sort() {
        let query = translate(&MessageFilter::new().limit(25));
        assert_eq!(query.sort_order(), "date DESC LIMIT 25");
    }

    #[test]
    fn test_offset_with_and_without_limit() {
        let query = translate(&MessageFilter::new().limit(10).offset(30));
        assert_eq!(query.sort_order(), "date DESC LIMIT 10 OFFSET 30");

        let query = translate(&MessageFilter::new().offset(30));
        assert_eq!(query.sort_order(), "date DESC LIMIT -1 OFFSET 30");
    }

    #[test]
    fn test_mms_dates_in_seconds() {
        let filter = MessageFilter::new()
            .start_date(1_500)
            .end_date(4_999)
            .message_type(MessageType::Inbox);
        let query = translate_for(&filter, ProviderTable::Mms);
        assert_eq!(
            query.where_clause(),
            Some("date >= ? AND date <= ? AND msg_box = ?")
        );
        assert_eq!(query.args(), ["2", "4", "1"]);
    }

    #[test]
    fn test_message_selection_picks_table() {
        let (table, selection) = Selection::for_message(&MessageId::new("9"));
        assert_eq!(table, ProviderTable::Sms);
        assert_eq!(selection.where_clause.as_deref(), Some("_id = ?"));
        assert_eq!(selection.args, ["9"]);

        let (table, selection) = Selection::for_message(&MessageId::new("mms:9"));
        assert_eq!(table, ProviderTable::Mms);
        assert_eq!(selection.args, ["9"]);
    }
}
