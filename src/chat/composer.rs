use crate::api_client::TransferClient;
use crate::config::effective_sender;
use crate::models::NewMessage;
use crate::notify::{Notification, Notifier};

use super::sync_loop::SyncLoop;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Draft was blank; nothing was sent.
    Empty,
    Sent,
    /// The server or the network refused it; the draft is kept.
    Failed(String),
}

/// Holds the message being typed until it has been sent.
#[derive(Debug, Clone, Default)]
pub struct MessageComposer {
    draft: String,
}

impl MessageComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Post the draft as the sync loop's current display name.
    ///
    /// On success the draft is cleared and messages are re-synced right
    /// away instead of waiting for the next poll.
    pub async fn send(
        &mut self,
        client: &TransferClient,
        sync: &SyncLoop,
        notifier: &dyn Notifier,
    ) -> SendOutcome {
        let content = self.draft.trim();
        if content.is_empty() {
            return SendOutcome::Empty;
        }

        let message = NewMessage {
            content: content.to_string(),
            sender: effective_sender(&sync.display_name()),
        };

        match client.post_message(&message).await {
            Ok(()) => {
                log::info!("Message sent as {}", message.sender);
                self.draft.clear();
                if let Err(e) = sync.sync_once().await {
                    log::warn!("Failed to refresh messages after send (non-critical): {}", e);
                }
                SendOutcome::Sent
            }
            Err(e) => {
                let reason = e.user_message("Send failed");
                log::warn!("Send failed: {}", e);
                notifier.notify(Notification::error(reason.clone()));
                SendOutcome::Failed(reason)
            }
        }
    }
}
