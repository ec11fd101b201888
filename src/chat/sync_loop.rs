use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, MissedTickBehavior};

use crate::api_client::TransferClient;
use crate::errors::AppResult;
use crate::models::Message;
use crate::notify::ChatView;

use super::cursor::SyncCursor;
use super::reconcile::{ChatState, ViewUpdate};
use super::render::RenderedMessage;

struct SyncState {
    chat: ChatState,
    display_name: String,
    /// Ticket handed to the most recently issued fetch.
    issued: u64,
    /// Ticket of the newest fetch whose response has been applied.
    applied: u64,
}

/// Polls the server for messages and reconciles them into a [`ChatView`].
///
/// Fetches may overlap (the periodic task, a refresh right after sending).
/// Each fetch takes a ticket when it is issued and its response is dropped
/// if a newer fetch has already been applied.
pub struct SyncLoop {
    client: TransferClient,
    view: Arc<dyn ChatView>,
    state: Mutex<SyncState>,
}

impl SyncLoop {
    pub fn new(client: TransferClient, view: Arc<dyn ChatView>, display_name: &str) -> Self {
        Self {
            client,
            view,
            state: Mutex::new(SyncState {
                chat: ChatState::new(),
                display_name: display_name.to_string(),
                issued: 0,
                applied: 0,
            }),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            log::error!("Sync state lock was poisoned (non-critical), recovering");
            poisoned.into_inner()
        })
    }

    pub fn display_name(&self) -> String {
        self.lock_state().display_name.clone()
    }

    /// Takes effect for messages rendered from now on; messages already on
    /// screen keep their classification.
    pub fn set_display_name(&self, name: &str) {
        self.lock_state().display_name = name.to_string();
    }

    pub fn cursor(&self) -> SyncCursor {
        self.lock_state().chat.cursor()
    }

    pub fn rendered_messages(&self) -> Vec<RenderedMessage> {
        self.lock_state().chat.rendered().to_vec()
    }

    /// Reserve a ticket for a fetch that is about to be sent.
    pub fn issue_ticket(&self) -> u64 {
        let mut state = self.lock_state();
        state.issued += 1;
        state.issued
    }

    /// Apply the response of the fetch holding `ticket`.
    ///
    /// Returns `None` without touching the view when a newer fetch has
    /// already been applied.
    pub fn apply(&self, ticket: u64, messages: &[Message]) -> Option<ViewUpdate> {
        let mut state = self.lock_state();
        if ticket <= state.applied {
            log::debug!(
                "Dropping stale message response (ticket {}, applied {})",
                ticket,
                state.applied
            );
            return None;
        }
        state.applied = ticket;

        let display_name = state.display_name.clone();
        let update = state.chat.reconcile(messages, &display_name);
        if update != ViewUpdate::Unchanged {
            log::debug!(
                "Reconciled {} messages, cursor now {}",
                messages.len(),
                state.chat.cursor().last_seen_id()
            );
            self.view.apply(&update);
        }
        Some(update)
    }

    /// Fetch the current message list and reconcile it.
    ///
    /// `Ok(None)` means the response arrived after a newer one and was
    /// discarded.
    pub async fn sync_once(&self) -> AppResult<Option<ViewUpdate>> {
        let ticket = self.issue_ticket();
        let messages = self.client.get_messages().await?;
        Ok(self.apply(ticket, &messages))
    }

    /// Start polling: once immediately, then every `period`, until the
    /// returned handle is shut down. Fetch errors are logged and the loop
    /// keeps going.
    pub fn spawn(self: &Arc<Self>, period: Duration) -> SyncHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let this = Arc::clone(self);

        let task = tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            log::info!("Message polling started (every {:?})", period);

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {
                        tokio::select! {
                            _ = shutdown_rx.changed() => break,
                            result = this.sync_once() => {
                                if let Err(e) = result {
                                    log::warn!("Failed to load messages (non-critical): {}", e);
                                }
                            }
                        }
                    }
                }
            }

            log::info!("Message polling stopped");
        });

        SyncHandle { shutdown_tx, task }
    }
}

/// Handle to a running poll task.
pub struct SyncHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SyncHandle {
    /// Stop polling and wait for the task to exit. An in-flight fetch is
    /// abandoned.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            log::warn!("Message polling task ended abnormally: {}", e);
        }
    }
}
