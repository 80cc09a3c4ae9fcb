//! Transport that records outgoing messages in a local provider database
//!
//! Stands in for the system send API off-device. Each send is written to the
//! store as a sent message and reported through the broadcast source the
//! same way the OS reports it: a sent report, then a delivery report when one
//! was requested.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use log::info;

use super::broadcast::HostBroadcastSource;
use super::traits::SmsTransport;
use crate::events::{MessagingEvent, SendOutcome};
use crate::models::{MessageType, OutgoingMms, OutgoingSms};
use crate::provider::columns::{addr, mms, part, sms};
use crate::provider::{ContentValues, MessageStore, ProviderTable, SqliteMessageStore};

pub struct OutboxTransport {
    store: Arc<SqliteMessageStore>,
    broadcasts: HostBroadcastSource,
}

impl OutboxTransport {
    pub fn new(store: Arc<SqliteMessageStore>, broadcasts: HostBroadcastSource) -> Self {
        Self { store, broadcasts }
    }

    fn report(&self, sent: MessagingEvent, delivered: Option<MessagingEvent>) {
        self.broadcasts.publish(sent);
        if let Some(delivered) = delivered {
            self.broadcasts.publish(delivered);
        }
    }
}

impl SmsTransport for OutboxTransport {
    fn send_text(&self, outgoing: &OutgoingSms) -> Result<()> {
        let mut values = ContentValues::new();
        values.insert(sms::ADDRESS.into(), outgoing.address.as_str().into());
        values.insert(sms::BODY.into(), outgoing.body.as_str().into());
        values.insert(sms::DATE.into(), Utc::now().timestamp_millis().into());
        values.insert(sms::TYPE.into(), MessageType::Sent.code().into());
        values.insert(sms::READ.into(), true.into());

        let id = self.store.insert(ProviderTable::Sms, &values)?;
        info!("Recorded outgoing SMS {} as row {}", outgoing.correlation_id, id);

        let outcome = SendOutcome::success(outgoing.correlation_id.as_str());
        self.report(
            MessagingEvent::SmsSent(outcome.clone()),
            outgoing
                .delivery_receipt
                .then(|| MessagingEvent::SmsDelivered(outcome)),
        );
        Ok(())
    }

    fn send_multimedia(&self, outgoing: &OutgoingMms) -> Result<()> {
        let mut values = ContentValues::new();
        values.insert(mms::DATE.into(), Utc::now().timestamp().into());
        values.insert(mms::MSG_BOX.into(), MessageType::Sent.code().into());
        values.insert(mms::READ.into(), true.into());

        let mut parts = Vec::with_capacity(outgoing.attachments.len() + 1);
        if let Some(body) = &outgoing.body {
            let mut text = ContentValues::new();
            text.insert(part::CONTENT_TYPE.into(), part::CONTENT_TYPE_TEXT.into());
            text.insert(part::TEXT.into(), body.as_str().into());
            parts.push(text);
        }
        for attachment in &outgoing.attachments {
            let mut values = ContentValues::new();
            values.insert(part::CONTENT_TYPE.into(), attachment.content_type.as_str().into());
            values.insert(part::NAME.into(), attachment.name.clone().into());
            values.insert(part::CONTENT_LOCATION.into(), attachment.uri.as_str().into());
            values.insert(part::DATA_PATH.into(), attachment.uri.as_str().into());
            parts.push(values);
        }

        let id = self
            .store
            .insert_mms(&values, &[(outgoing.address.as_str(), addr::TYPE_TO)], &parts)?;

        info!(
            "Recorded outgoing MMS {} as row {} with {} attachment(s)",
            outgoing.correlation_id,
            id,
            outgoing.attachments.len()
        );

        let outcome = SendOutcome::success(outgoing.correlation_id.as_str());
        self.report(
            MessagingEvent::MmsSent(outcome.clone()),
            outgoing
                .delivery_receipt
                .then(|| MessagingEvent::MmsDelivered(outcome)),
        );
        Ok(())
    }
}
