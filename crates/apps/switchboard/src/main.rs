//! Switchboard - desktop front-end for the messaging facade
//!
//! Drives `SmsManager` on the provider platform against an
//! `mmssms.db`-shaped SQLite file and prints results as JSON.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use log::{error, info};
use serde_json::json;
use sms::{
    HostBroadcastSource, MessageFilter, MessageId, MessageType, OutboxTransport,
    OutgoingAttachment, PermissionChecker, ProviderBackend, SmsManager, SqliteMessageStore,
    SwitchboardConfig, ThreadId,
};

#[derive(Parser)]
#[command(name = "switchboard", version, about = "Read, send and manage SMS/MMS")]
struct Cli {
    /// Config file (defaults to ~/.config/switchboard/switchboard.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Provider database, overriding the config file
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List SMS messages
    List(FilterArgs),
    /// List MMS messages
    Mms(FilterArgs),
    /// List SMS and MMS merged by date
    All(FilterArgs),
    /// List conversation threads
    Threads,
    /// List the messages of one thread
    Thread { thread_id: String },
    /// Mark a message as read (MMS ids look like `mms:12`)
    MarkRead { message_id: String },
    /// Mark every message of a thread as read
    MarkThreadRead { thread_id: String },
    /// Delete a message (MMS ids look like `mms:12`)
    Delete { message_id: String },
    /// Delete every message of a thread
    DeleteThread { thread_id: String },
    /// Send a text message
    Send {
        address: String,
        body: String,
        /// Request a delivery report
        #[arg(long)]
        delivery_receipt: bool,
    },
    /// Send a multimedia message
    SendMms {
        address: String,
        #[arg(long)]
        body: Option<String>,
        /// Attachment as `<uri>=<content-type>`, repeatable
        #[arg(long = "attach", value_parser = parse_attachment)]
        attachments: Vec<OutgoingAttachment>,
        #[arg(long)]
        delivery_receipt: bool,
    },
    /// Show the current permission state
    Permissions,
}

#[derive(Args)]
struct FilterArgs {
    #[arg(long)]
    address: Option<String>,
    /// Earliest date, `YYYY-MM-DD` or RFC 3339
    #[arg(long, value_parser = parse_date)]
    since: Option<i64>,
    /// Latest date, `YYYY-MM-DD` (through the end of that day) or RFC 3339
    #[arg(long, value_parser = parse_end_date)]
    until: Option<i64>,
    /// inbox, sent, draft, outbox, failed or queued
    #[arg(long = "type", value_parser = parse_type)]
    message_type: Option<MessageType>,
    #[arg(long, conflicts_with = "read")]
    unread: bool,
    #[arg(long)]
    read: bool,
    #[arg(long)]
    limit: Option<u32>,
    #[arg(long)]
    offset: Option<u32>,
}

impl FilterArgs {
    fn into_filter(self) -> MessageFilter {
        MessageFilter {
            address: self.address,
            start_date: self.since,
            end_date: self.until,
            message_type: self.message_type,
            read: match (self.read, self.unread) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            },
            thread_id: None,
            limit: self.limit,
            offset: self.offset,
        }
    }
}

const LAST_MILLI_OF_DAY: i64 = 86_400_000 - 1;

fn parse_date(raw: &str) -> Result<i64, String> {
    parse_bound(raw, 0)
}

/// Like `parse_date`, but a bare date covers the whole day
fn parse_end_date(raw: &str) -> Result<i64, String> {
    parse_bound(raw, LAST_MILLI_OF_DAY)
}

fn parse_bound(raw: &str, day_offset_ms: i64) -> Result<i64, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.timestamp_millis());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|d| d.and_time(NaiveTime::MIN).and_utc().timestamp_millis() + day_offset_ms)
        .map_err(|_| format!("invalid date '{}': expected YYYY-MM-DD or RFC 3339", raw))
}

fn parse_type(raw: &str) -> Result<MessageType, String> {
    MessageType::parse(raw).ok_or_else(|| format!("unknown message type '{}'", raw))
}

fn parse_attachment(raw: &str) -> Result<OutgoingAttachment, String> {
    let (uri, content_type) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected <uri>=<content-type>, got '{}'", raw))?;
    let name = uri.rsplit('/').next().filter(|n| !n.is_empty()).map(str::to_string);
    Ok(OutgoingAttachment {
        uri: uri.to_string(),
        content_type: content_type.to_string(),
        name,
    })
}

/// Permissions granted by the config file
struct ConfiguredPermissions(HashSet<String>);

impl PermissionChecker for ConfiguredPermissions {
    fn is_granted(&self, permission: &str) -> bool {
        self.0.contains(permission)
    }
}

fn load_config(cli: &Cli) -> Result<SwitchboardConfig> {
    let mut config = match &cli.config {
        Some(path) => SwitchboardConfig::from_file(path)?,
        None => SwitchboardConfig::load()?,
    };
    if let Some(db) = &cli.db {
        config.provider.database_path = db.clone();
    }
    Ok(config)
}

fn build_manager(config: &SwitchboardConfig) -> Result<SmsManager> {
    let db_path = config.provider.resolved_database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let store = Arc::new(SqliteMessageStore::new(&db_path)?);
    let broadcasts = HostBroadcastSource::new();
    let transport = Arc::new(OutboxTransport::new(Arc::clone(&store), broadcasts.clone()));
    let permissions = ConfiguredPermissions(
        config
            .provider
            .granted_permissions
            .iter()
            .cloned()
            .collect(),
    );

    info!("Using provider database {}", db_path.display());
    let backend = ProviderBackend::new(
        Arc::new(permissions),
        store,
        transport,
        Arc::new(broadcasts),
    );
    Ok(SmsManager::with_config(Arc::new(backend), config.manager.clone()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let manager = build_manager(&config)?;

    let sent = manager.on_sms_sent(|outcome| info!("SMS sent: {}", outcome.message_id));
    let delivered =
        manager.on_sms_delivered(|outcome| info!("SMS delivered: {}", outcome.message_id));
    let mms_sent = manager.on_mms_sent(|outcome| info!("MMS sent: {}", outcome.message_id));

    let result = match cli.command {
        Command::List(args) => print_json(&manager.get_sms_messages(&args.into_filter()).await),
        Command::Mms(args) => print_json(&manager.get_mms_messages(&args.into_filter()).await),
        Command::All(args) => print_json(&manager.get_all_messages(&args.into_filter()).await),
        Command::Threads => print_json(&manager.get_conversation_threads().await),
        Command::Thread { thread_id } => print_json(
            &manager
                .get_messages_in_thread(&ThreadId::new(thread_id))
                .await,
        ),
        Command::MarkRead { message_id } => print_json(
            &json!({ "success": manager.mark_as_read(&MessageId::new(message_id)).await }),
        ),
        Command::MarkThreadRead { thread_id } => print_json(
            &json!({ "success": manager.mark_thread_as_read(&ThreadId::new(thread_id)).await }),
        ),
        Command::Delete { message_id } => print_json(
            &json!({ "success": manager.delete_message(&MessageId::new(message_id)).await }),
        ),
        Command::DeleteThread { thread_id } => print_json(
            &json!({ "success": manager.delete_thread(&ThreadId::new(thread_id)).await }),
        ),
        Command::Send {
            address,
            body,
            delivery_receipt,
        } => {
            let result = manager.send_sms(&address, &body, delivery_receipt).await;
            if !result.success {
                print_json(&result)?;
                bail!("send failed");
            }
            print_json(&result)
        }
        Command::SendMms {
            address,
            body,
            attachments,
            delivery_receipt,
        } => {
            let result = manager
                .send_mms(&address, body.as_deref(), attachments, delivery_receipt)
                .await;
            if !result.success {
                print_json(&result)?;
                bail!("send failed");
            }
            print_json(&result)
        }
        Command::Permissions => print_json(&manager.has_permissions().await),
    };

    for subscription in [sent, delivered, mms_sent] {
        subscription.unsubscribe();
    }
    manager.shutdown();
    result
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    if let Err(e) = config::init() {
        error!("Failed to initialize config directory: {}", e);
    }

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
