use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::api_client::TransferClient;
use crate::errors::AppResult;
use crate::format::parse_timestamp;
use crate::models::{Category, FileEntry, StorageStats};
use crate::notify::{ListingView, Notification, Notifier};

#[derive(Debug, Default)]
struct ListingState {
    category: Category,
    /// Bumped by every selection or refresh; only the newest one renders.
    generation: u64,
}

/// Owns the current category selection and renders file listings into a
/// [`ListingView`].
pub struct ListingController {
    client: TransferClient,
    view: Arc<dyn ListingView>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<ListingState>,
}

impl ListingController {
    pub fn new(
        client: TransferClient,
        view: Arc<dyn ListingView>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            client,
            view,
            notifier,
            state: Mutex::new(ListingState::default()),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ListingState> {
        self.state.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            log::error!("Listing state lock was poisoned (non-critical), recovering");
            poisoned.into_inner()
        })
    }

    pub fn current_category(&self) -> Category {
        self.lock_state().category
    }

    /// Switch category and render its listing. Returns `false` when a newer
    /// selection superseded this one before the response arrived.
    pub async fn select_category(&self, category: Category) -> AppResult<bool> {
        let ticket = {
            let mut state = self.lock_state();
            state.category = category;
            state.generation += 1;
            state.generation
        };
        log::debug!("Selected category {} (render #{})", category, ticket);
        self.render_files(category, ticket).await
    }

    /// Re-fetch and render the current category.
    pub async fn refresh_files(&self) -> AppResult<bool> {
        let (category, ticket) = {
            let mut state = self.lock_state();
            state.generation += 1;
            (state.category, state.generation)
        };
        self.render_files(category, ticket).await
    }

    async fn render_files(&self, category: Category, ticket: u64) -> AppResult<bool> {
        let files = self.fetch_files(category).await?;

        let state = self.lock_state();
        if state.generation != ticket {
            log::debug!(
                "Discarding stale {} listing (render #{}, current #{})",
                category,
                ticket,
                state.generation
            );
            return Ok(false);
        }
        self.view.show_files(category, &files);
        Ok(true)
    }

    /// Files in `category`; `All` merges every category, newest first.
    pub async fn fetch_files(&self, category: Category) -> AppResult<Vec<FileEntry>> {
        if !category.is_all() {
            return Ok(self.client.list_files(category).await?.files);
        }

        let mut all_files = Vec::new();
        for concrete in Category::CONCRETE {
            match self.client.list_files(concrete).await {
                Ok(listing) => all_files.extend(listing.files.into_iter().map(|mut f| {
                    f.category = concrete;
                    f
                })),
                Err(e) => log::warn!("Failed to load {} (non-critical): {}", concrete, e),
            }
        }

        sort_newest_first(&mut all_files);
        Ok(all_files)
    }

    pub async fn load_stats(&self) -> AppResult<StorageStats> {
        let stats = self.client.stats().await?;
        self.view.show_stats(&stats);
        Ok(stats)
    }

    /// Refresh stats and the current listing. Failures are only logged.
    pub async fn refresh(&self) {
        if let Err(e) = self.load_stats().await {
            log::warn!("Failed to load stats (non-critical): {}", e);
        }
        if let Err(e) = self.refresh_files().await {
            log::warn!("Failed to load files (non-critical): {}", e);
        }
    }

    /// Delete a stored file and report the outcome as a notification.
    pub async fn delete_file(&self, category: Category, filename: &str) -> bool {
        match self.client.delete_file(category, filename).await {
            Ok(()) => {
                log::info!("Deleted {}/{}", category, filename);
                self.notifier.notify(Notification::success("Deleted"));
                self.refresh().await;
                true
            }
            Err(e) => {
                log::warn!("Delete of {}/{} failed: {}", category, filename, e);
                self.notifier
                    .notify(Notification::error(e.user_message("Delete failed")));
                false
            }
        }
    }

    pub async fn download_file(
        &self,
        category: Category,
        filename: &str,
        dest_dir: &Path,
    ) -> AppResult<PathBuf> {
        self.client.download_file(category, filename, dest_dir).await
    }
}

/// Newest first; entries with unparsable timestamps sink to the end.
pub fn sort_newest_first(files: &mut [FileEntry]) {
    files.sort_by(|a, b| {
        parse_timestamp(&b.timestamp).cmp(&parse_timestamp(&a.timestamp))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, timestamp: &str) -> FileEntry {
        FileEntry {
            name: name.to_string(),
            size: "1.0 KB".to_string(),
            timestamp: timestamp.to_string(),
            category: Category::Others,
        }
    }

    #[test]
    fn sorts_newest_first_with_unparsable_last() {
        let mut files = vec![
            entry("old", "2024-01-01T00:00:00"),
            entry("broken", "not a date"),
            entry("new", "2024-03-01T00:00:00.5"),
            entry("mid", "2024-02-01T00:00:00"),
        ];
        sort_newest_first(&mut files);
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["new", "mid", "old", "broken"]);
    }
}
