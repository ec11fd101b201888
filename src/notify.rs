// User-facing notifications and the display seams the front end implements.

use std::time::Duration;

use crate::chat::ViewUpdate;
use crate::models::{Category, FileEntry, StorageStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Default,
    Success,
    Error,
}

/// A transient status line, the terminal equivalent of a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    pub duration: Duration,
}

impl Notification {
    pub fn new(message: impl Into<String>, severity: Severity, duration: Duration) -> Self {
        Self {
            message: message.into(),
            severity,
            duration,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Default, Duration::from_secs(3))
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Success, Duration::from_secs(3))
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Error, Duration::from_secs(3))
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Receives rendered file listings and storage statistics.
pub trait ListingView: Send + Sync {
    fn show_files(&self, category: Category, files: &[FileEntry]);
    fn show_stats(&self, stats: &StorageStats);
}

/// Receives incremental chat view updates.
pub trait ChatView: Send + Sync {
    fn apply(&self, update: &ViewUpdate);
}
