//! Integration tests for the sms crate
//!
//! These tests drive `SmsManager` end to end over a provider backend backed
//! by an in-memory SQLite store, and over the compose backend.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use sms::provider::columns::{addr, mms, part, sms as sms_col};
use sms::provider::{ContentValues, ProviderQuery, ProviderRow, ProviderTable, Selection};
use sms::{
    ComposeBackend, ComposePresenter, ComposeRequest, EventKind, HostBroadcastSource,
    MessageFilter, MessageId, MessageKind, MessageStore, MessageType, MessagingEvent,
    OutboxTransport, OutgoingMms, OutgoingSms, PermissionChecker, PermissionState, ProviderBackend,
    SmsManager, SmsTransport, SqliteMessageStore, ThreadId, translate,
};
use tempfile::TempDir;

// ============================================================================
// Test doubles
// ============================================================================

/// Permission checker whose grants can be flipped between calls
struct TogglePermissions {
    read: AtomicBool,
    send: AtomicBool,
    receive: AtomicBool,
    write: AtomicBool,
}

impl TogglePermissions {
    fn granted() -> Arc<Self> {
        Arc::new(Self {
            read: AtomicBool::new(true),
            send: AtomicBool::new(true),
            receive: AtomicBool::new(true),
            write: AtomicBool::new(true),
        })
    }

    fn set_all(&self, granted: bool) {
        for flag in [&self.read, &self.send, &self.receive, &self.write] {
            flag.store(granted, Ordering::SeqCst);
        }
    }
}

impl PermissionChecker for TogglePermissions {
    fn is_granted(&self, permission: &str) -> bool {
        let flag = match permission {
            "READ_SMS" => &self.read,
            "SEND_SMS" => &self.send,
            "RECEIVE_SMS" => &self.receive,
            "WRITE_SMS" => &self.write,
            _ => return false,
        };
        flag.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct RecordingTransport {
    texts: Mutex<Vec<OutgoingSms>>,
    multimedia: Mutex<Vec<OutgoingMms>>,
}

impl SmsTransport for RecordingTransport {
    fn send_text(&self, sms: &OutgoingSms) -> anyhow::Result<()> {
        self.texts.lock().unwrap().push(sms.clone());
        Ok(())
    }

    fn send_multimedia(&self, mms: &OutgoingMms) -> anyhow::Result<()> {
        self.multimedia.lock().unwrap().push(mms.clone());
        Ok(())
    }
}

/// Store whose every call fails, as a locked or corrupt database would
struct FailingStore;

impl MessageStore for FailingStore {
    fn query(&self, _query: &ProviderQuery) -> anyhow::Result<Vec<ProviderRow>> {
        anyhow::bail!("database is locked")
    }

    fn insert(&self, _table: ProviderTable, _values: &ContentValues) -> anyhow::Result<String> {
        anyhow::bail!("database is locked")
    }

    fn update(
        &self,
        _table: ProviderTable,
        _values: &ContentValues,
        _selection: &Selection,
    ) -> anyhow::Result<usize> {
        anyhow::bail!("database is locked")
    }

    fn delete(&self, _table: ProviderTable, _selection: &Selection) -> anyhow::Result<usize> {
        anyhow::bail!("database is locked")
    }
}

/// Transport that rejects every message
struct FailingTransport;

impl SmsTransport for FailingTransport {
    fn send_text(&self, _sms: &OutgoingSms) -> anyhow::Result<()> {
        anyhow::bail!("radio off")
    }

    fn send_multimedia(&self, _mms: &OutgoingMms) -> anyhow::Result<()> {
        anyhow::bail!("radio off")
    }
}

fn failing_manager() -> SmsManager {
    let backend = ProviderBackend::new(
        TogglePermissions::granted(),
        Arc::new(FailingStore),
        Arc::new(FailingTransport),
        Arc::new(HostBroadcastSource::new()),
    );
    SmsManager::new(Arc::new(backend))
}

struct Harness {
    manager: SmsManager,
    store: Arc<SqliteMessageStore>,
    permissions: Arc<TogglePermissions>,
    transport: Arc<RecordingTransport>,
    broadcasts: HostBroadcastSource,
}

fn provider_harness() -> Harness {
    let store = Arc::new(SqliteMessageStore::open_in_memory().unwrap());
    let permissions = TogglePermissions::granted();
    let transport = Arc::new(RecordingTransport::default());
    let broadcasts = HostBroadcastSource::new();

    let backend = ProviderBackend::new(
        permissions.clone(),
        store.clone(),
        transport.clone(),
        Arc::new(broadcasts.clone()),
    );

    Harness {
        manager: SmsManager::new(Arc::new(backend)),
        store,
        permissions,
        transport,
        broadcasts,
    }
}

fn insert_sms(store: &SqliteMessageStore, address: &str, body: &str, date: i64, read: bool) -> String {
    let mut values = ContentValues::new();
    values.insert(sms_col::ADDRESS.into(), address.into());
    values.insert(sms_col::BODY.into(), body.into());
    values.insert(sms_col::DATE.into(), date.into());
    values.insert(sms_col::TYPE.into(), MessageType::Inbox.code().into());
    values.insert(sms_col::READ.into(), read.into());
    store.insert(ProviderTable::Sms, &values).unwrap()
}

/// Insert an incoming MMS; `date_secs` is in the provider's seconds
fn insert_mms(store: &SqliteMessageStore, address: &str, text: &str, date_secs: i64) -> String {
    let thread = store.thread_for_address(address).unwrap();

    let mut values = ContentValues::new();
    values.insert(mms::THREAD_ID.into(), thread.into());
    values.insert(mms::DATE.into(), date_secs.into());
    values.insert(mms::MSG_BOX.into(), MessageType::Inbox.code().into());
    values.insert(mms::READ.into(), false.into());
    let id = store.insert(ProviderTable::Mms, &values).unwrap();

    store.insert_mms_address(&id, address, addr::TYPE_FROM).unwrap();
    let mut body = ContentValues::new();
    body.insert(part::CONTENT_TYPE.into(), part::CONTENT_TYPE_TEXT.into());
    body.insert(part::TEXT.into(), text.into());
    store.insert_mms_part(&id, &body).unwrap();
    id
}

fn run<F: std::future::Future>(future: F) -> F::Output {
    tokio_test::block_on(future)
}

// ============================================================================
// Reading
// ============================================================================

#[test]
fn test_filter_arguments_follow_placeholder_order() {
    let filter = MessageFilter::new()
        .address("555")
        .start_date(1_000)
        .end_date(2_000)
        .read(false)
        .message_type(MessageType::Sent)
        .thread("7");
    let query = translate(&filter);

    let placeholders = query.where_clause().unwrap().matches('?').count();
    assert_eq!(placeholders, query.args().len());
    assert_eq!(query.args(), ["555", "1000", "2000", "0", "2", "7"]);
}

#[test]
fn test_get_all_messages_merges_newest_first() {
    let h = provider_harness();
    insert_sms(&h.store, "555", "sms-old", 1_000_000, true);
    insert_mms(&h.store, "555", "mms-mid", 2_000);
    insert_sms(&h.store, "777", "sms-new", 3_000_000, false);
    insert_mms(&h.store, "777", "mms-newest", 4_000);

    let all = run(h.manager.get_all_messages(&MessageFilter::default()));
    let bodies: Vec<&str> = all.iter().map(|m| m.body_text()).collect();
    assert_eq!(bodies, vec!["mms-newest", "sms-new", "mms-mid", "sms-old"]);
    assert!(all.windows(2).all(|w| w[0].date >= w[1].date));
    assert_eq!(all[0].kind, MessageKind::Mms);
}

#[test]
fn test_get_all_messages_pages_over_merged_stream() {
    let h = provider_harness();
    // Interleaved: sms at even seconds, mms at odd seconds
    for i in 0..4i64 {
        insert_sms(&h.store, "555", &format!("s{}", i), (i * 2) * 1000, false);
        insert_mms(&h.store, "555", &format!("m{}", i), i * 2 + 1);
    }

    let page = run(h.manager.get_all_messages(&MessageFilter::new().limit(3).offset(2)));
    let bodies: Vec<&str> = page.iter().map(|m| m.body_text()).collect();
    // Merged order: m3 s3 m2 s2 m1 s1 m0 s0
    assert_eq!(bodies, vec!["m2", "s2", "m1"]);
}

#[test]
fn test_conversation_threads_use_latest_message() {
    let h = provider_harness();
    insert_sms(&h.store, "555", "first", 1_000, true);
    insert_sms(&h.store, "555", "latest", 5_000, false);
    insert_sms(&h.store, "777", "other", 3_000, false);

    let threads = run(h.manager.get_conversation_threads());
    assert_eq!(threads.len(), 2);
    assert_eq!(threads[0].last_message, "latest");
    assert_eq!(threads[0].message_count, 2);
    assert_eq!(threads[0].unread_count, 1);
    assert_eq!(threads[1].last_message, "other");

    let in_thread = run(h.manager.get_messages_in_thread(&threads[0].thread_id));
    assert_eq!(in_thread.len(), 2);
    assert!(in_thread.iter().all(|m| m.address == "555"));
}

#[test]
fn test_denied_read_returns_empty() {
    let h = provider_harness();
    insert_sms(&h.store, "555", "hello", 1_000, false);

    h.permissions.read.store(false, Ordering::SeqCst);
    assert!(run(h.manager.get_sms_messages(&MessageFilter::default())).is_empty());
    assert!(run(h.manager.get_conversation_threads()).is_empty());
}

#[test]
fn test_revoked_permission_is_seen_on_next_call() {
    let h = provider_harness();
    insert_sms(&h.store, "555", "hello", 1_000, false);

    assert_eq!(run(h.manager.get_sms_messages(&MessageFilter::default())).len(), 1);
    h.permissions.set_all(false);
    assert!(run(h.manager.get_sms_messages(&MessageFilter::default())).is_empty());
    assert_eq!(run(h.manager.has_permissions()), PermissionState::default());

    h.permissions.set_all(true);
    assert_eq!(run(h.manager.get_sms_messages(&MessageFilter::default())).len(), 1);
    assert!(run(h.manager.request_permissions()).all_granted());
}

// ============================================================================
// Mutations
// ============================================================================

#[test]
fn test_mark_as_read_and_thread() {
    let h = provider_harness();
    let id = insert_sms(&h.store, "555", "a", 1_000, false);
    insert_sms(&h.store, "555", "b", 2_000, false);

    assert!(run(h.manager.mark_as_read(&MessageId::new(&id))));
    let unread = run(h.manager.get_sms_messages(&MessageFilter::new().read(false)));
    assert_eq!(unread.len(), 1);

    let thread = unread[0].thread_id.clone();
    assert!(run(h.manager.mark_thread_as_read(&thread)));
    assert!(run(h.manager.get_sms_messages(&MessageFilter::new().read(false))).is_empty());

    assert!(!run(h.manager.mark_as_read(&MessageId::new("999"))));
}

#[test]
fn test_denied_write_changes_nothing() {
    let h = provider_harness();
    let id = insert_sms(&h.store, "555", "keep", 1_000, false);

    h.permissions.write.store(false, Ordering::SeqCst);
    assert!(!run(h.manager.mark_as_read(&MessageId::new(&id))));
    assert!(!run(h.manager.delete_message(&MessageId::new(&id))));
    assert!(!run(h.manager.delete_thread(&ThreadId::new("1"))));

    let messages = run(h.manager.get_sms_messages(&MessageFilter::default()));
    assert_eq!(messages.len(), 1);
    assert!(!messages[0].read);
}

#[test]
fn test_mms_id_mutations_target_mms() {
    let h = provider_harness();
    insert_mms(&h.store, "555", "pic", 10);
    let id = run(h.manager.get_mms_messages(&MessageFilter::default()))[0]
        .id
        .clone();

    assert!(run(h.manager.mark_as_read(&id)));
    let mms = run(h.manager.get_mms_messages(&MessageFilter::default()));
    assert!(mms[0].read);

    assert!(run(h.manager.delete_message(&id)));
    assert!(run(h.manager.get_mms_messages(&MessageFilter::default())).is_empty());
}

#[test]
fn test_shared_row_id_only_touches_named_table() {
    let h = provider_harness();
    let sms_row = insert_sms(&h.store, "555", "text", 1_000, false);
    let mms_row = insert_mms(&h.store, "777", "pic", 2);
    assert_eq!(sms_row, mms_row);

    let all = run(h.manager.get_all_messages(&MessageFilter::default()));
    assert_eq!(all.len(), 2);
    assert_ne!(all[0].id, all[1].id);
    let mms = all
        .iter()
        .find(|m| m.kind == MessageKind::Mms)
        .unwrap()
        .id
        .clone();

    assert!(run(h.manager.mark_as_read(&mms)));
    let sms = run(h.manager.get_sms_messages(&MessageFilter::default()));
    assert!(!sms[0].read);

    assert!(run(h.manager.delete_message(&mms)));
    let sms = run(h.manager.get_sms_messages(&MessageFilter::default()));
    assert_eq!(sms.len(), 1);
    assert_eq!(sms[0].body.as_deref(), Some("text"));
    assert!(run(h.manager.get_mms_messages(&MessageFilter::default())).is_empty());

    assert!(run(h.manager.delete_message(&sms[0].id)));
    assert!(run(h.manager.get_all_messages(&MessageFilter::default())).is_empty());
}

#[test]
fn test_delete_thread_spans_sms_and_mms() {
    let h = provider_harness();
    insert_sms(&h.store, "555", "text", 1_000, false);
    insert_mms(&h.store, "555", "pic", 2);
    insert_sms(&h.store, "777", "elsewhere", 3_000, false);

    let thread = run(h.manager.get_all_messages(&MessageFilter::new().address("555")))[0]
        .thread_id
        .clone();
    assert!(run(h.manager.delete_thread(&thread)));

    let remaining = run(h.manager.get_all_messages(&MessageFilter::default()));
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].address, "777");
    assert!(!run(h.manager.delete_thread(&thread)));
}

// ============================================================================
// Sending
// ============================================================================

#[test]
fn test_send_sms_reaches_transport() {
    let h = provider_harness();
    let result = run(h.manager.send_sms("555", "hello", true));
    assert!(result.success);

    let texts = h.transport.texts.lock().unwrap();
    assert_eq!(texts.len(), 1);
    assert_eq!(texts[0].address, "555");
    assert!(texts[0].delivery_receipt);
    assert_eq!(Some(&texts[0].correlation_id), result.message_id.as_ref());
}

#[test]
fn test_denied_send_never_reaches_transport() {
    let h = provider_harness();
    h.permissions.send.store(false, Ordering::SeqCst);

    let result = run(h.manager.send_sms("555", "hello", false));
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Missing SEND_SMS permission"));

    let result = run(h.manager.send_mms("555", Some("hi"), Vec::new(), false));
    assert!(!result.success);

    assert!(h.transport.texts.lock().unwrap().is_empty());
    assert!(h.transport.multimedia.lock().unwrap().is_empty());
}

#[test]
fn test_outbox_send_emits_sent_and_delivered() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(SqliteMessageStore::new(dir.path().join("mmssms.db")).unwrap());
    let broadcasts = HostBroadcastSource::new();
    let transport = Arc::new(OutboxTransport::new(store.clone(), broadcasts.clone()));
    let backend = ProviderBackend::new(
        TogglePermissions::granted(),
        store,
        transport,
        Arc::new(broadcasts),
    );
    let manager = SmsManager::new(Arc::new(backend));

    let events = Arc::new(Mutex::new(Vec::new()));
    for kind in [EventKind::SmsSent, EventKind::SmsDelivered, EventKind::MmsSent] {
        let e = Arc::clone(&events);
        manager.subscribe(kind, move |event| e.lock().unwrap().push(event.clone()));
    }

    let result = run(manager.send_sms("555", "via outbox", true));
    assert!(result.success);
    let id = result.message_id.unwrap();

    {
        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind(), EventKind::SmsSent);
        assert_eq!(events[1].kind(), EventKind::SmsDelivered);
        assert!(events.iter().all(|e| e.outcome().unwrap().message_id == id));
    }

    let sent = run(manager.get_sms_messages(&MessageFilter::new().message_type(MessageType::Sent)));
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].body.as_deref(), Some("via outbox"));

    let result = run(manager.send_mms("555", Some("caption"), Vec::new(), false));
    assert!(result.success);
    assert_eq!(events.lock().unwrap().len(), 3);

    // The MMS lands in the same conversation as the SMS
    let threads = run(manager.get_conversation_threads());
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].message_count, 2);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_store_failure_reads_as_empty() {
    let manager = failing_manager();
    assert!(run(manager.get_sms_messages(&MessageFilter::default())).is_empty());
    assert!(run(manager.get_all_messages(&MessageFilter::default())).is_empty());
    assert!(run(manager.get_conversation_threads()).is_empty());
    assert!(run(manager.get_messages_in_thread(&ThreadId::new("1"))).is_empty());
}

#[test]
fn test_store_failure_mutations_report_false() {
    let manager = failing_manager();
    assert!(!run(manager.mark_as_read(&MessageId::new("1"))));
    assert!(!run(manager.mark_thread_as_read(&ThreadId::new("1"))));
    assert!(!run(manager.delete_message(&MessageId::new("mms:1"))));
    assert!(!run(manager.delete_thread(&ThreadId::new("1"))));
}

#[test]
fn test_transport_failure_is_reported() {
    let manager = failing_manager();

    let result = run(manager.send_sms("555", "hello", false));
    assert!(!result.success);
    assert!(result.message_id.is_none());
    assert_eq!(result.error.as_deref(), Some("Transport error: radio off"));

    let result = run(manager.send_mms("555", Some("hello"), Vec::new(), false));
    assert!(!result.success);
    assert!(result.error.unwrap().contains("radio off"));
}

// ============================================================================
// Events
// ============================================================================

#[test]
fn test_native_broadcast_reaches_subscribers() {
    let h = provider_harness();
    let received = Arc::new(Mutex::new(Vec::new()));
    let r = Arc::clone(&received);
    h.manager
        .on_sms_received(move |message| r.lock().unwrap().push(message.body_text().to_string()));

    let message = sms::Message::builder(MessageId::new("1"), MessageKind::Sms)
        .address("555")
        .body("incoming")
        .build();
    assert_eq!(h.broadcasts.publish(MessagingEvent::SmsReceived(message)), 1);
    assert_eq!(*received.lock().unwrap(), vec!["incoming"]);
}

#[test]
fn test_unsubscribe_stops_delivery() {
    let h = provider_harness();
    let hits = Arc::new(Mutex::new(0));
    let c = Arc::clone(&hits);
    let subscription = h.manager.on_sms_sent(move |_| *c.lock().unwrap() += 1);

    h.broadcasts
        .publish(MessagingEvent::SmsSent(sms::SendOutcome::success("a")));
    subscription.unsubscribe();
    subscription.unsubscribe();
    h.broadcasts
        .publish(MessagingEvent::SmsSent(sms::SendOutcome::success("b")));

    assert_eq!(*hits.lock().unwrap(), 1);
}

#[test]
fn test_shutdown_releases_native_listeners() {
    let h = provider_harness();
    assert_eq!(h.broadcasts.listener_count(), EventKind::ALL.len());

    h.manager.shutdown();
    assert_eq!(h.broadcasts.listener_count(), 0);
    assert_eq!(
        h.broadcasts
            .publish(MessagingEvent::SmsSent(sms::SendOutcome::success("late"))),
        0
    );
}

#[test]
fn test_dropping_manager_releases_native_listeners() {
    let h = provider_harness();
    let broadcasts = h.broadcasts.clone();
    drop(h);
    assert_eq!(broadcasts.listener_count(), 0);
}

// ============================================================================
// Compose platform
// ============================================================================

#[derive(Default)]
struct RecordingPresenter {
    presented: Mutex<Vec<ComposeRequest>>,
}

impl ComposePresenter for RecordingPresenter {
    fn can_send_text(&self) -> bool {
        true
    }

    fn can_send_attachments(&self) -> bool {
        true
    }

    fn present(&self, request: ComposeRequest) -> anyhow::Result<()> {
        self.presented.lock().unwrap().push(request);
        Ok(())
    }
}

#[test]
fn test_compose_platform_sends_but_never_reads() {
    let presenter = Arc::new(RecordingPresenter::default());
    let manager = SmsManager::new(Arc::new(ComposeBackend::new(presenter.clone())));

    let state = run(manager.has_permissions());
    assert!(state.send);
    assert!(!state.read);
    assert!(!state.receive);

    let attachment = sms::OutgoingAttachment {
        uri: "file:///tmp/cat.png".into(),
        content_type: "image/png".into(),
        name: Some("cat.png".into()),
    };
    let result = run(manager.send_mms("555", Some("look"), vec![attachment], false));
    assert!(result.success);

    let presented = presenter.presented.lock().unwrap();
    assert_eq!(presented.len(), 1);
    assert_eq!(presented[0].body.as_deref(), Some("look"));
    assert_eq!(presented[0].attachments.len(), 1);

    assert!(run(manager.get_all_messages(&MessageFilter::default())).is_empty());
    assert!(!run(manager.mark_thread_as_read(&ThreadId::new("1"))));
}
