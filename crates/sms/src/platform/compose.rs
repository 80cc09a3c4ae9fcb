//! Compose-only platform backend
//!
//! Sending hands the message to the system compose UI. There is no message
//! store, no interception of incoming messages and no native sent report,
//! so the facade echoes sent events itself.

use std::sync::Arc;

use async_trait::async_trait;

use super::traits::{
    Capabilities, ComposePresenter, ComposeRequest, PlatformBackend, PlatformError,
    PlatformResult, Support,
};
use crate::models::{OutgoingMms, OutgoingSms};

pub struct ComposeBackend {
    presenter: Arc<dyn ComposePresenter>,
}

impl ComposeBackend {
    pub fn new(presenter: Arc<dyn ComposePresenter>) -> Self {
        Self { presenter }
    }

    async fn present(&self, request: ComposeRequest) -> PlatformResult<()> {
        let presenter = Arc::clone(&self.presenter);
        tokio::task::spawn_blocking(move || presenter.present(request))
            .await?
            .map_err(|e| PlatformError::Compose(format!("{:#}", e)))
    }
}

#[async_trait]
impl PlatformBackend for ComposeBackend {
    fn name(&self) -> &'static str {
        "compose"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            read: Support::Unavailable,
            write: Support::Unavailable,
            receive: Support::Unavailable,
            send: if self.presenter.can_send_text() {
                Support::Always
            } else {
                Support::Unavailable
            },
            attachments: self.presenter.can_send_attachments(),
        }
    }

    fn echoes_sent_events(&self) -> bool {
        true
    }

    async fn send_sms(&self, sms: OutgoingSms) -> PlatformResult<()> {
        self.present(ComposeRequest {
            recipients: vec![sms.address],
            body: Some(sms.body),
            attachments: Vec::new(),
        })
        .await
    }

    async fn send_mms(&self, mms: OutgoingMms) -> PlatformResult<()> {
        self.present(ComposeRequest {
            recipients: vec![mms.address],
            body: mms.body,
            attachments: mms.attachments,
        })
        .await
    }
}
