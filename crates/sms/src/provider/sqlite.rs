//! SQLite message store laid out like the telephony provider's `mmssms.db`
//!
//! Lets the provider path run off-device: the CLI and the integration tests
//! point it at a database file with the same `sms`, `pdu`, `addr` and `part`
//! tables the OS provider exposes.

use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow, bail};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use rusqlite_migration::{M, Migrations};

use super::columns::{ProviderTable, addr, mms, part, sms};
use super::row::{ContentValues, ProviderRow, ProviderValue};
use super::selection::{ProviderQuery, Selection};
use super::store::MessageStore;

fn migrations() -> Migrations<'static> {
    Migrations::new(vec![M::up(
        r#"
        CREATE TABLE IF NOT EXISTS sms (
            _id INTEGER PRIMARY KEY AUTOINCREMENT,
            thread_id INTEGER,
            address TEXT,
            body TEXT,
            date INTEGER NOT NULL DEFAULT 0,
            type INTEGER NOT NULL DEFAULT 1,
            read INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_sms_thread ON sms(thread_id);
        CREATE INDEX IF NOT EXISTS idx_sms_date ON sms(date DESC);

        CREATE TABLE IF NOT EXISTS pdu (
            _id INTEGER PRIMARY KEY AUTOINCREMENT,
            thread_id INTEGER,
            date INTEGER NOT NULL DEFAULT 0,
            msg_box INTEGER NOT NULL DEFAULT 1,
            read INTEGER NOT NULL DEFAULT 0,
            sub TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_pdu_thread ON pdu(thread_id);

        CREATE TABLE IF NOT EXISTS addr (
            _id INTEGER PRIMARY KEY AUTOINCREMENT,
            msg_id INTEGER NOT NULL,
            address TEXT,
            type INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_addr_msg ON addr(msg_id);

        CREATE TABLE IF NOT EXISTS part (
            _id INTEGER PRIMARY KEY AUTOINCREMENT,
            mid INTEGER NOT NULL,
            ct TEXT,
            name TEXT,
            cl TEXT,
            text TEXT,
            _data TEXT,
            data BLOB
        );

        CREATE INDEX IF NOT EXISTS idx_part_mid ON part(mid);
        "#,
    )])
}

/// Columns an insert or update may name, per table
fn writable_columns(table: ProviderTable) -> &'static [&'static str] {
    match table {
        ProviderTable::Sms => &[
            sms::THREAD_ID,
            sms::ADDRESS,
            sms::BODY,
            sms::DATE,
            sms::TYPE,
            sms::READ,
        ],
        ProviderTable::Mms => &[mms::THREAD_ID, mms::DATE, mms::MSG_BOX, mms::READ, "sub"],
    }
}

const PART_COLUMNS: &[&str] = &[
    part::CONTENT_TYPE,
    part::NAME,
    part::CONTENT_LOCATION,
    part::TEXT,
    part::DATA_PATH,
    part::DATA,
];

/// MMS rows with the other party's address resolved from `addr`: the sender
/// for inbox messages, the first recipient otherwise
const MMS_VIEW: &str = "SELECT p._id AS _id, p.thread_id AS thread_id, p.date AS date, \
     p.msg_box AS msg_box, p.read AS read, p.sub AS sub, \
     (SELECT a.address FROM addr a WHERE a.msg_id = p._id \
      AND a.type = CASE WHEN p.msg_box = 1 THEN 137 ELSE 151 END \
      ORDER BY a._id LIMIT 1) AS address \
     FROM pdu p";

/// SQLite-backed provider store
pub struct SqliteMessageStore {
    conn: Mutex<Connection>,
}

impl SqliteMessageStore {
    /// Open (or create) a provider database at the given path
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref())
            .with_context(|| format!("Failed to open provider database at {:?}", db_path.as_ref()))?;
        Self::from_connection(conn)
    }

    /// In-memory provider database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            "#,
        )?;

        migrations()
            .to_latest(&mut conn)
            .context("Failed to run provider migrations")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("provider connection mutex poisoned"))
    }

    /// Record an address of an MMS message (`addr::TYPE_FROM` or `addr::TYPE_TO`)
    pub fn insert_mms_address(&self, message_id: &str, address: &str, kind: i64) -> Result<()> {
        let conn = self.lock()?;
        insert_address(&conn, message_id, address, kind)
    }

    /// Attach a part to an MMS message, returning the part id
    pub fn insert_mms_part(&self, message_id: &str, values: &ContentValues) -> Result<String> {
        let conn = self.lock()?;
        insert_part(&conn, message_id, values)
    }

    /// Insert an MMS message with its addresses and parts in one transaction,
    /// returning the message id
    ///
    /// Either every row lands or none does. Without a thread id in `values`
    /// the message joins the thread of its first address.
    pub fn insert_mms(
        &self,
        values: &ContentValues,
        addresses: &[(&str, i64)],
        parts: &[ContentValues],
    ) -> Result<String> {
        check_columns(ProviderTable::Mms, values)?;

        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .context("Failed to start MMS transaction")?;

        let mut values = values.clone();
        if !values.contains_key(mms::THREAD_ID) {
            let first = addresses.first().map(|(address, _)| *address);
            let thread_id = Self::resolve_thread(&tx, first)?;
            values.insert(mms::THREAD_ID.to_string(), ProviderValue::Integer(thread_id));
        }

        let id = insert_row(&tx, ProviderTable::Mms, &values)?;
        for (address, kind) in addresses {
            insert_address(&tx, &id, address, *kind)?;
        }
        for part_values in parts {
            insert_part(&tx, &id, part_values)?;
        }

        tx.commit().context("Failed to commit MMS")?;
        Ok(id)
    }

    /// Thread id a new message to or from `address` belongs to
    pub fn thread_for_address(&self, address: &str) -> Result<i64> {
        let conn = self.lock()?;
        Self::resolve_thread(&conn, Some(address))
    }

    fn load_parts(conn: &Connection, message_id: &str) -> Result<Vec<ProviderRow>> {
        let mut stmt = conn.prepare(
            "SELECT _id, mid, ct, name, cl, text, _data, data, length(data) AS size \
             FROM part WHERE mid = ? ORDER BY _id",
        )?;
        collect_rows(&mut stmt, &[message_id])
    }

    /// Thread for a new message: the thread already holding the address, or a
    /// fresh one
    fn resolve_thread(conn: &Connection, address: Option<&str>) -> Result<i64> {
        if let Some(address) = address {
            let existing: Option<i64> = conn
                .query_row(
                    "SELECT thread_id FROM sms WHERE address = ? AND thread_id IS NOT NULL \
                     UNION ALL \
                     SELECT p.thread_id FROM pdu p JOIN addr a ON a.msg_id = p._id \
                     WHERE a.address = ? AND p.thread_id IS NOT NULL \
                     LIMIT 1",
                    params![address, address],
                    |row| row.get(0),
                )
                .optional()?;
            if let Some(thread_id) = existing {
                return Ok(thread_id);
            }
        }

        let next: i64 = conn.query_row(
            "SELECT COALESCE(MAX(thread_id), 0) + 1 FROM \
             (SELECT thread_id FROM sms UNION ALL SELECT thread_id FROM pdu)",
            [],
            |row| row.get(0),
        )?;
        Ok(next)
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn to_sql_value(value: &ProviderValue) -> Value {
    match value {
        ProviderValue::Null => Value::Null,
        ProviderValue::Integer(i) => Value::Integer(*i),
        ProviderValue::Real(r) => Value::Real(*r),
        ProviderValue::Text(s) => Value::Text(s.clone()),
        ProviderValue::Blob(b) => Value::Blob(b.clone()),
    }
}

fn from_sql_value(value: ValueRef<'_>) -> ProviderValue {
    match value {
        ValueRef::Null => ProviderValue::Null,
        ValueRef::Integer(i) => ProviderValue::Integer(i),
        ValueRef::Real(r) => ProviderValue::Real(r),
        ValueRef::Text(t) => ProviderValue::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => ProviderValue::Blob(b.to_vec()),
    }
}

fn collect_rows<P: AsRef<str>>(
    stmt: &mut rusqlite::Statement<'_>,
    args: &[P],
) -> Result<Vec<ProviderRow>> {
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.query(params_from_iter(args.iter().map(|a| a.as_ref())))?;

    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut provider_row = ProviderRow::new();
        for (i, name) in names.iter().enumerate() {
            provider_row.set(name, from_sql_value(row.get_ref(i)?));
        }
        out.push(provider_row);
    }
    Ok(out)
}

fn insert_row(conn: &Connection, table: ProviderTable, values: &ContentValues) -> Result<String> {
    let columns: Vec<&str> = values.keys().map(String::as_str).collect();
    let sql = if columns.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES", table.name())
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table.name(),
            columns.join(", "),
            placeholders(columns.len())
        )
    };

    conn.execute(&sql, params_from_iter(values.values().map(to_sql_value)))
        .with_context(|| format!("Failed to insert into {}", table.name()))?;
    Ok(conn.last_insert_rowid().to_string())
}

fn insert_address(conn: &Connection, message_id: &str, address: &str, kind: i64) -> Result<()> {
    conn.execute(
        "INSERT INTO addr (msg_id, address, type) VALUES (?, ?, ?)",
        params![message_id, address, kind],
    )
    .context("Failed to insert MMS address")?;
    Ok(())
}

fn insert_part(conn: &Connection, message_id: &str, values: &ContentValues) -> Result<String> {
    for column in values.keys() {
        if !PART_COLUMNS.contains(&column.as_str()) {
            bail!("unknown part column: {}", column);
        }
    }

    let mut columns = vec![part::MESSAGE_ID.to_string()];
    let mut bound = vec![Value::Text(message_id.to_string())];
    for (column, value) in values {
        columns.push(column.clone());
        bound.push(to_sql_value(value));
    }

    conn.execute(
        &format!(
            "INSERT INTO {} ({}) VALUES ({})",
            part::TABLE,
            columns.join(", "),
            placeholders(columns.len())
        ),
        params_from_iter(bound),
    )
    .context("Failed to insert MMS part")?;
    Ok(conn.last_insert_rowid().to_string())
}

fn check_columns(table: ProviderTable, values: &ContentValues) -> Result<()> {
    let allowed = writable_columns(table);
    for column in values.keys() {
        if !allowed.contains(&column.as_str()) {
            bail!("unknown {} column: {}", table.name(), column);
        }
    }
    Ok(())
}

fn where_sql(selection: &Selection) -> String {
    selection
        .where_clause
        .as_deref()
        .map(|clause| format!(" WHERE {}", clause))
        .unwrap_or_default()
}

impl MessageStore for SqliteMessageStore {
    fn query(&self, query: &ProviderQuery) -> Result<Vec<ProviderRow>> {
        let source = match query.table {
            ProviderTable::Sms => "SELECT _id, thread_id, address, body, date, type, read FROM sms"
                .to_string(),
            ProviderTable::Mms => format!("SELECT * FROM ({})", MMS_VIEW),
        };
        let sql = format!(
            "{}{} ORDER BY {}",
            source,
            where_sql(&query.selection),
            query.sort_order()
        );

        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&sql)
            .with_context(|| format!("Failed to prepare provider query: {}", sql))?;
        let mut rows = collect_rows(&mut stmt, query.args())?;

        if query.table == ProviderTable::Mms {
            for row in &mut rows {
                let id = row.text(mms::ID).unwrap_or_default();
                for p in Self::load_parts(&conn, &id)? {
                    row.push_part(p);
                }
            }
        }

        Ok(rows)
    }

    fn insert(&self, table: ProviderTable, values: &ContentValues) -> Result<String> {
        check_columns(table, values)?;

        let conn = self.lock()?;
        let mut values = values.clone();
        if table == ProviderTable::Sms && !values.contains_key(sms::THREAD_ID) {
            let address = match values.get(sms::ADDRESS) {
                Some(ProviderValue::Text(a)) => Some(a.as_str()),
                _ => None,
            };
            let thread_id = Self::resolve_thread(&conn, address)?;
            values.insert(sms::THREAD_ID.to_string(), ProviderValue::Integer(thread_id));
        }

        insert_row(&conn, table, &values)
    }

    fn update(
        &self,
        table: ProviderTable,
        values: &ContentValues,
        selection: &Selection,
    ) -> Result<usize> {
        check_columns(table, values)?;
        if values.is_empty() {
            return Ok(0);
        }

        let assignments: Vec<String> = values.keys().map(|c| format!("{} = ?", c)).collect();
        let sql = format!(
            "UPDATE {} SET {}{}",
            table.name(),
            assignments.join(", "),
            where_sql(selection)
        );

        let bound: Vec<Value> = values
            .values()
            .map(to_sql_value)
            .chain(selection.args.iter().cloned().map(Value::Text))
            .collect();

        let conn = self.lock()?;
        let changed = conn
            .execute(&sql, params_from_iter(bound))
            .with_context(|| format!("Failed to update {}", table.name()))?;
        Ok(changed)
    }

    fn delete(&self, table: ProviderTable, selection: &Selection) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let filter = where_sql(selection);
        let args = params_from_iter(selection.args.iter());

        if table == ProviderTable::Mms {
            // Parts and addresses belong to their PDU row
            tx.execute(
                &format!(
                    "DELETE FROM {} WHERE {} IN (SELECT _id FROM pdu{})",
                    part::TABLE,
                    part::MESSAGE_ID,
                    filter
                ),
                params_from_iter(selection.args.iter()),
            )?;
            tx.execute(
                &format!(
                    "DELETE FROM {} WHERE {} IN (SELECT _id FROM pdu{})",
                    addr::TABLE,
                    addr::MESSAGE_ID,
                    filter
                ),
                params_from_iter(selection.args.iter()),
            )?;
        }

        let changed = tx
            .execute(&format!("DELETE FROM {}{}", table.name(), filter), args)
            .with_context(|| format!("Failed to delete from {}", table.name()))?;
        tx.commit()?;
        Ok(changed)
    }
}
