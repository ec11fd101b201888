use crate::notify::{Notification, Severity};

/// Tally for one upload batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadBatchResult {
    pub total_count: usize,
    pub success_count: usize,
    pub failure_count: usize,
}

impl UploadBatchResult {
    pub fn new(total_count: usize) -> Self {
        Self {
            total_count,
            ..Self::default()
        }
    }

    pub fn completed(&self) -> usize {
        self.success_count + self.failure_count
    }

    pub fn is_complete(&self) -> bool {
        self.completed() >= self.total_count
    }

    /// Mark a file upload as successful
    pub fn record_success(&mut self, name: &str) {
        self.success_count += 1;
        log::info!(
            "Progress: Successfully uploaded {} ({}/{})",
            name,
            self.completed(),
            self.total_count
        );
    }

    /// Mark a file upload as failed
    pub fn record_failure(&mut self, name: &str, error: &str) {
        self.failure_count += 1;
        log::warn!(
            "Progress: Failed to upload {} - {} ({}/{})",
            name,
            error,
            self.completed(),
            self.total_count
        );
    }

    /// Ties are styled as success.
    pub fn summary_severity(&self) -> Severity {
        if self.success_count >= self.failure_count {
            Severity::Success
        } else {
            Severity::Error
        }
    }

    pub fn summary_message(&self) -> String {
        format!(
            "Done: {} succeeded, {} failed",
            self.success_count, self.failure_count
        )
    }

    /// Aggregate notification, only emitted for batches of more than one file.
    pub fn summary_notification(&self) -> Option<Notification> {
        if self.total_count <= 1 {
            return None;
        }

        let notification = match self.summary_severity() {
            Severity::Error => Notification::error(self.summary_message()),
            _ => Notification::success(self.summary_message()),
        };
        Some(notification)
    }
}
