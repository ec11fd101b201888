use chrono::Local;
use std::io::Write;

use crate::chat::{RenderedMessage, ViewUpdate};
use crate::format::format_relative_time;
use crate::models::{Category, FileEntry, StorageStats};
use crate::notify::{ChatView, ListingView, Notification, Notifier, Severity};
use crate::security::sanitize_for_terminal;

/// Plain stdout front end. Every server-supplied string is passed through
/// [`sanitize_for_terminal`] before printing.
#[derive(Debug, Default)]
pub struct TerminalUi;

impl TerminalUi {
    pub fn new() -> Self {
        Self
    }

    fn print(&self, text: &str) {
        let mut out = std::io::stdout().lock();
        if let Err(e) = writeln!(out, "{}", text).and_then(|_| out.flush()) {
            log::debug!("Failed to write to stdout: {}", e);
        }
    }
}

pub fn format_message_line(message: &RenderedMessage) -> String {
    let marker = if message.own { ">" } else { " " };
    format!(
        "{} [{}] {}: {}",
        marker,
        sanitize_for_terminal(&message.time_label),
        sanitize_for_terminal(&message.sender),
        sanitize_for_terminal(&message.content)
    )
}

pub fn format_file_line(file: &FileEntry, now: chrono::NaiveDateTime) -> String {
    format!(
        "  {:<40} {:>10}  {:<16} [{}]",
        sanitize_for_terminal(&file.name),
        sanitize_for_terminal(&file.size),
        format_relative_time(&file.timestamp, now),
        file.category
    )
}

/// Notification text may carry server error strings, so it is sanitized too.
pub fn format_notification(notification: &Notification) -> String {
    let message = sanitize_for_terminal(&notification.message);
    match notification.severity {
        Severity::Error => format!("! {}", message),
        Severity::Success | Severity::Default => message,
    }
}

impl Notifier for TerminalUi {
    fn notify(&self, notification: Notification) {
        if notification.severity == Severity::Error {
            log::debug!("error notification: {}", notification.message);
        }
        self.print(&format_notification(&notification));
    }
}

impl ListingView for TerminalUi {
    fn show_files(&self, category: Category, files: &[FileEntry]) {
        self.print(&format!("── {} ({} files) ──", category, files.len()));
        if files.is_empty() {
            self.print("  No files");
            return;
        }
        let now = Local::now().naive_local();
        for file in files {
            self.print(&format_file_line(file, now));
        }
    }

    fn show_stats(&self, stats: &StorageStats) {
        self.print(&format!(
            "Files: {}  Total size: {}",
            stats.total_files,
            sanitize_for_terminal(&stats.total_size)
        ));
    }
}

impl ChatView for TerminalUi {
    fn apply(&self, update: &ViewUpdate) {
        match update {
            ViewUpdate::Unchanged => {}
            ViewUpdate::ShowEmpty => self.print("  No messages yet"),
            ViewUpdate::ReplaceAll(messages) => {
                self.print("── messages ──");
                for message in messages {
                    self.print(&format_message_line(message));
                }
            }
            ViewUpdate::Append(messages) => {
                for message in messages {
                    self.print(&format_message_line(message));
                }
            }
        }
    }
}
