use crate::config::effective_sender;
use crate::format::format_message_time;
use crate::models::Message;
use crate::security::escape_html;

/// A message as it was rendered. `own` is decided once, at render time,
/// against the display name in effect then.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub id: u64,
    pub sender: String,
    pub content: String,
    pub time_label: String,
    pub own: bool,
}

pub fn render_message(message: &Message, display_name: &str) -> RenderedMessage {
    RenderedMessage {
        id: message.id,
        sender: message.sender.clone(),
        content: message.content.clone(),
        time_label: format_message_time(&message.timestamp),
        own: message.sender == effective_sender(display_name),
    }
}

pub fn render_messages(messages: &[Message], display_name: &str) -> Vec<RenderedMessage> {
    messages
        .iter()
        .map(|m| render_message(m, display_name))
        .collect()
}

/// HTML fragment for one message. Sender and content are always escaped.
pub fn message_html(message: &RenderedMessage) -> String {
    format!(
        concat!(
            "<div class=\"message {}\" data-id=\"{}\">\n",
            "  <div class=\"message-sender\">{}</div>\n",
            "  <div class=\"message-content\">{}</div>\n",
            "  <div class=\"message-time\">{}</div>\n",
            "</div>\n"
        ),
        if message.own { "own" } else { "other" },
        message.id,
        escape_html(&message.sender),
        escape_html(&message.content),
        escape_html(&message.time_label),
    )
}

/// Standalone HTML transcript of a rendered chat view.
pub fn transcript_html(messages: &[RenderedMessage]) -> String {
    let body = if messages.is_empty() {
        "<div class=\"empty-state\"><p>No messages yet</p></div>\n".to_string()
    } else {
        messages.iter().map(message_html).collect::<String>()
    };

    format!(
        concat!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n",
            "<title>Chat transcript</title>\n</head>\n<body>\n",
            "<div id=\"chat-messages\">\n{}</div>\n</body>\n</html>\n"
        ),
        body
    )
}
