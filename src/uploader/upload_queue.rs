use std::path::{Path, PathBuf};
use tokio::time::Duration;

use crate::api_client::TransferClient;
use crate::errors::AppResult;
use crate::format::format_file_size;
use crate::listing::ListingController;
use crate::notify::{Notification, Notifier, Severity};
use crate::security::InputValidator;

use super::progress_tracker::UploadBatchResult;

/// One selected file. Lives until its outcome has been reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
}

impl UploadTask {
    pub fn from_path(path: &Path) -> AppResult<Self> {
        let size = InputValidator::validate_upload_file(path)?;
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        Ok(Self {
            path: path.to_path_buf(),
            name,
            size,
        })
    }
}

/// Display name for a path that may not have passed validation.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Upload `paths` one at a time, in order.
///
/// Every file gets a start notification and exactly one outcome
/// notification. A failure never stops the rest of the batch. Once the last
/// file is done, stats and the listing are refreshed and, for batches of
/// more than one file, a summary is shown.
pub async fn process_upload_batch(
    client: &TransferClient,
    paths: &[PathBuf],
    notifier: &dyn Notifier,
    listing: &ListingController,
) -> UploadBatchResult {
    let mut result = UploadBatchResult::new(paths.len());
    if paths.is_empty() {
        log::warn!("Upload batch is empty, nothing to do");
        return result;
    }

    log::info!("Processing upload batch of {} files", paths.len());

    for (index, path) in paths.iter().enumerate() {
        log::debug!("Upload {} of {}: {}", index + 1, paths.len(), path.display());

        let task = match UploadTask::from_path(path) {
            Ok(task) => task,
            Err(e) => {
                let name = display_name(path);
                log::error!("File validation failed for {}: {}", path.display(), e);
                notifier.notify(failure_notification(&name, &e.user_message("Upload failed")));
                result.record_failure(&name, &e.to_string());
                continue;
            }
        };

        upload_one(client, &task, notifier, &mut result).await;
    }

    debug_assert!(result.is_complete());

    listing.refresh().await;

    if let Some(summary) = result.summary_notification() {
        notifier.notify(summary);
    }

    log::info!(
        "Upload batch finished: {}/{} successful, {} failed",
        result.success_count,
        result.total_count,
        result.failure_count
    );

    result
}

async fn upload_one(
    client: &TransferClient,
    task: &UploadTask,
    notifier: &dyn Notifier,
    result: &mut UploadBatchResult,
) {
    notifier.notify(Notification::new(
        format!("Uploading: {} ({})", task.name, format_file_size(task.size)),
        Severity::Default,
        Duration::from_secs(10),
    ));

    match client.upload_file(&task.path, &task.name).await {
        Ok(()) => {
            result.record_success(&task.name);
            notifier.notify(
                Notification::success(format!("✓ {}", task.name))
                    .with_duration(Duration::from_secs(2)),
            );
        }
        Err(e) => {
            let reason = e.user_message("Upload failed");
            result.record_failure(&task.name, &e.to_string());
            notifier.notify(failure_notification(&task.name, &reason));
        }
    }
}

fn failure_notification(name: &str, reason: &str) -> Notification {
    Notification::error(format!("✗ {}: {}", name, reason)).with_duration(Duration::from_secs(3))
}
