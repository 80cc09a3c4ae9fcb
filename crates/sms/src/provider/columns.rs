//! Provider schema definitions
//!
//! Table and column names of the telephony message store. The schema is
//! owned by the OS; these constants are the only place it is spelled out.

use crate::models::MessageKind;

/// SMS table schema
pub mod sms {
    pub const TABLE: &str = "sms";
    pub const ID: &str = "_id";
    pub const THREAD_ID: &str = "thread_id";
    pub const ADDRESS: &str = "address";
    pub const BODY: &str = "body";
    /// Millis since epoch
    pub const DATE: &str = "date";
    pub const TYPE: &str = "type";
    pub const READ: &str = "read";
}

/// MMS (PDU) table schema
pub mod mms {
    pub const TABLE: &str = "pdu";
    pub const ID: &str = "_id";
    pub const THREAD_ID: &str = "thread_id";
    /// Seconds since epoch
    pub const DATE: &str = "date";
    /// Mailbox code, same values as the SMS type column
    pub const MSG_BOX: &str = "msg_box";
    pub const READ: &str = "read";
    /// Resolved by the provider from the address table
    pub const ADDRESS: &str = "address";
}

/// MMS address table schema
pub mod addr {
    pub const TABLE: &str = "addr";
    pub const MESSAGE_ID: &str = "msg_id";
    pub const ADDRESS: &str = "address";
    pub const TYPE: &str = "type";
    /// PDU header code for the sender address
    pub const TYPE_FROM: i64 = 137;
    /// PDU header code for a recipient address
    pub const TYPE_TO: i64 = 151;
}

/// MMS part table schema
pub mod part {
    pub const TABLE: &str = "part";
    pub const ID: &str = "_id";
    pub const MESSAGE_ID: &str = "mid";
    pub const CONTENT_TYPE: &str = "ct";
    pub const NAME: &str = "name";
    pub const CONTENT_LOCATION: &str = "cl";
    pub const TEXT: &str = "text";
    /// Path of the file holding the part bytes
    pub const DATA_PATH: &str = "_data";
    /// Inline part bytes
    pub const DATA: &str = "data";

    pub const CONTENT_TYPE_TEXT: &str = "text/plain";
    pub const CONTENT_TYPE_SMIL: &str = "application/smil";
}

/// Which message table a query targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderTable {
    Sms,
    Mms,
}

impl From<MessageKind> for ProviderTable {
    fn from(kind: MessageKind) -> Self {
        match kind {
            MessageKind::Sms => ProviderTable::Sms,
            MessageKind::Mms => ProviderTable::Mms,
        }
    }
}

impl ProviderTable {
    pub fn name(self) -> &'static str {
        match self {
            ProviderTable::Sms => sms::TABLE,
            ProviderTable::Mms => mms::TABLE,
        }
    }

    pub fn id_column(self) -> &'static str {
        match self {
            ProviderTable::Sms => sms::ID,
            ProviderTable::Mms => mms::ID,
        }
    }

    pub fn thread_column(self) -> &'static str {
        match self {
            ProviderTable::Sms => sms::THREAD_ID,
            ProviderTable::Mms => mms::THREAD_ID,
        }
    }

    pub fn address_column(self) -> &'static str {
        match self {
            ProviderTable::Sms => sms::ADDRESS,
            ProviderTable::Mms => mms::ADDRESS,
        }
    }

    pub fn date_column(self) -> &'static str {
        match self {
            ProviderTable::Sms => sms::DATE,
            ProviderTable::Mms => mms::DATE,
        }
    }

    pub fn read_column(self) -> &'static str {
        match self {
            ProviderTable::Sms => sms::READ,
            ProviderTable::Mms => mms::READ,
        }
    }

    pub fn type_column(self) -> &'static str {
        match self {
            ProviderTable::Sms => sms::TYPE,
            ProviderTable::Mms => mms::MSG_BOX,
        }
    }

    /// Millis per unit of the table's date column
    pub fn date_scale(self) -> i64 {
        match self {
            ProviderTable::Sms => 1,
            ProviderTable::Mms => 1000,
        }
    }
}
