use crate::models::Message;

use super::cursor::SyncCursor;
use super::render::{render_messages, RenderedMessage};

/// What a front end has to do after a reconciliation.
///
/// `ReplaceAll` and `Append` both end with the view scrolled to the newest
/// message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewUpdate {
    Unchanged,
    /// Replace everything with the empty-state placeholder.
    ShowEmpty,
    ReplaceAll(Vec<RenderedMessage>),
    Append(Vec<RenderedMessage>),
}

impl ViewUpdate {
    pub fn scrolls_to_newest(&self) -> bool {
        matches!(self, ViewUpdate::ReplaceAll(_) | ViewUpdate::Append(_))
    }
}

/// Cursor plus the messages currently on screen.
#[derive(Debug, Clone, Default)]
pub struct ChatState {
    cursor: SyncCursor,
    rendered: Vec<RenderedMessage>,
    showing_placeholder: bool,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> SyncCursor {
        self.cursor
    }

    pub fn rendered(&self) -> &[RenderedMessage] {
        &self.rendered
    }

    pub fn is_showing_placeholder(&self) -> bool {
        self.showing_placeholder
    }

    /// Merge a freshly fetched batch (ascending by id) into the view.
    ///
    /// Only messages newer than the cursor are ever rendered after the
    /// first batch; a batch whose newest id is not past the cursor leaves
    /// the view alone, so server-side deletions show up only after a
    /// restart.
    pub fn reconcile(&mut self, server_messages: &[Message], display_name: &str) -> ViewUpdate {
        let new_last_id = server_messages.last().map(|m| m.id).unwrap_or(0);

        if server_messages.is_empty() {
            if self.rendered.is_empty() {
                return ViewUpdate::Unchanged;
            }
            self.rendered.clear();
            self.showing_placeholder = true;
            return ViewUpdate::ShowEmpty;
        }

        if !self.cursor.is_initialized() {
            let rendered = render_messages(server_messages, display_name);
            self.rendered = rendered.clone();
            self.showing_placeholder = false;
            self.cursor.advance(new_last_id);
            return ViewUpdate::ReplaceAll(rendered);
        }

        let last_seen = self.cursor.last_seen_id();
        if new_last_id > last_seen {
            let unseen: Vec<Message> = server_messages
                .iter()
                .filter(|m| m.id > last_seen)
                .cloned()
                .collect();
            let appended = render_messages(&unseen, display_name);
            self.rendered.extend(appended.iter().cloned());
            self.showing_placeholder = false;
            self.cursor.advance(new_last_id);
            return ViewUpdate::Append(appended);
        }

        ViewUpdate::Unchanged
    }
}
