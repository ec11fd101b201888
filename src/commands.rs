use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::api_client::TransferClient;
use crate::chat::{transcript_html, MessageComposer, SendOutcome, SyncLoop};
use crate::config::{self, effective_sender, Config};
use crate::errors::{AppError, AppResult};
use crate::listing::ListingController;
use crate::models::Category;
use crate::notify::{Notification, Notifier};
use crate::security::InputValidator;
use crate::terminal::TerminalUi;
use crate::uploader::{process_upload_batch, UploadBatchResult};

/// Everything a server-facing command needs: the effective configuration,
/// an HTTP client and the terminal front end.
pub struct Session {
    pub config: Config,
    /// Where renames made during a chat session are persisted.
    pub config_path: Option<PathBuf>,
    pub client: TransferClient,
    pub ui: Arc<TerminalUi>,
    pub listing: ListingController,
}

impl Session {
    pub fn new(config: Config, config_path: Option<PathBuf>) -> AppResult<Self> {
        let client = TransferClient::new(&config.server_url, config.request_timeout())?;
        let ui = Arc::new(TerminalUi::new());
        let listing = ListingController::new(client.clone(), ui.clone(), ui.clone());

        log::debug!("Session ready for {}", client.base_url());

        Ok(Self {
            config,
            config_path,
            client,
            ui,
            listing,
        })
    }

    fn sync_loop(&self) -> SyncLoop {
        SyncLoop::new(self.client.clone(), self.ui.clone(), &self.config.display_name)
    }
}

pub async fn list_files(session: &Session, category: Category) -> AppResult<()> {
    session.listing.select_category(category).await?;
    Ok(())
}

pub async fn show_stats(session: &Session) -> AppResult<()> {
    session.listing.load_stats().await?;
    Ok(())
}

/// Upload a batch of files. Per-file outcomes are reported as they happen;
/// the returned result carries the counts.
pub async fn upload_files(session: &Session, paths: &[PathBuf]) -> AppResult<UploadBatchResult> {
    if paths.is_empty() {
        return Err(AppError::validation("paths", "No files given"));
    }

    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if Category::is_extension_allowed(&name) {
            log::debug!("{} will be stored under {}", name, Category::for_filename(&name));
        } else {
            log::warn!("{} has an extension the server may reject", name);
        }
    }

    Ok(process_upload_batch(&session.client, paths, session.ui.as_ref(), &session.listing).await)
}

pub async fn download_file(
    session: &Session,
    category: Category,
    filename: &str,
    dest_dir: Option<PathBuf>,
) -> AppResult<PathBuf> {
    if category.is_all() {
        return Err(AppError::validation(
            "category",
            "Downloads need a concrete category",
        ));
    }

    let dest_dir = dest_dir.unwrap_or_else(|| session.config.effective_download_dir());
    let saved = session
        .listing
        .download_file(category, filename, &dest_dir)
        .await?;

    session
        .ui
        .notify(Notification::success(format!("✓ Saved {}", saved.display())));
    Ok(saved)
}

/// Delete a stored file. Returns `false` when the user declined or the
/// server refused; both cases have already been reported.
pub async fn delete_file(
    session: &Session,
    category: Category,
    filename: &str,
    assume_yes: bool,
) -> AppResult<bool> {
    if category.is_all() {
        return Err(AppError::validation("category", "Deletes need a concrete category"));
    }

    if !assume_yes && !confirm(format!("Delete {}/{}? [y/N] ", category, filename)).await? {
        session.ui.notify(Notification::info("Cancelled"));
        return Ok(false);
    }

    Ok(session.listing.delete_file(category, filename).await)
}

async fn confirm(prompt: String) -> AppResult<bool> {
    let answer = tokio::task::spawn_blocking(move || -> std::io::Result<String> {
        let mut stdout = std::io::stdout();
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;
        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer)?;
        Ok(answer)
    })
    .await
    .map_err(|e| AppError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))??;

    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Print the conversation once, optionally exporting it as HTML.
pub async fn show_messages(session: &Session, html_out: Option<&Path>) -> AppResult<()> {
    let sync = session.sync_loop();
    sync.sync_once().await?;

    if let Some(path) = html_out {
        let page = transcript_html(&sync.rendered_messages());
        tokio::fs::write(path, page).await?;
        session.ui.notify(Notification::success(format!(
            "Transcript written to {}",
            path.display()
        )));
    }
    Ok(())
}

/// Send a single message. `Ok(false)` means the server or network refused
/// it and the failure was already shown.
pub async fn send_message(session: &Session, text: &str) -> AppResult<bool> {
    let sync = session.sync_loop();
    let mut composer = MessageComposer::new();
    composer.set_draft(text);

    match composer
        .send(&session.client, &sync, session.ui.as_ref())
        .await
    {
        SendOutcome::Sent => Ok(true),
        SendOutcome::Empty => Err(AppError::validation("message", "Message cannot be empty")),
        SendOutcome::Failed(_) => Ok(false),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    Quit,
    /// Resend the draft kept after a failed send.
    Retry,
    Rename(String),
    Message(String),
}

pub fn parse_chat_input(line: &str) -> ChatInput {
    let trimmed = line.trim();
    match trimmed {
        "/quit" | "/exit" => return ChatInput::Quit,
        "/retry" => return ChatInput::Retry,
        _ => {}
    }

    if let Some(rest) = trimmed.strip_prefix("/name") {
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            return ChatInput::Rename(rest.trim().to_string());
        }
    }

    ChatInput::Message(line.to_string())
}

/// Interactive chat: poll in the background and send each line typed.
/// Ends on `/quit`, end of input or Ctrl+C.
pub async fn run_chat(session: &Session) -> AppResult<()> {
    let sync = Arc::new(session.sync_loop());
    let handle = sync.spawn(session.config.poll_interval());

    session.ui.notify(Notification::info(format!(
        "Chatting as {} on {}. /name <new name> to rename, /quit to leave.",
        effective_sender(&sync.display_name()),
        session.client.base_url()
    )));

    let mut composer = MessageComposer::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => match parse_chat_input(&line) {
                    ChatInput::Quit => break,
                    ChatInput::Rename(name) => rename(session, &sync, &name),
                    ChatInput::Retry => {
                        if composer.draft().trim().is_empty() {
                            session.ui.notify(Notification::info("Nothing to resend"));
                        } else {
                            composer.send(&session.client, &sync, session.ui.as_ref()).await;
                        }
                    }
                    ChatInput::Message(text) => {
                        composer.set_draft(text);
                        composer.send(&session.client, &sync, session.ui.as_ref()).await;
                    }
                },
                Ok(None) => break,
                Err(e) => {
                    log::error!("Failed to read input: {}", e);
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                log::info!("Interrupted, leaving chat");
                break;
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}

fn rename(session: &Session, sync: &SyncLoop, name: &str) {
    if let Err(e) = InputValidator::validate_display_name(name) {
        session.ui.notify(Notification::error(e.to_string()));
        return;
    }

    sync.set_display_name(name);
    session.ui.notify(Notification::success(format!(
        "Now chatting as {}",
        effective_sender(name)
    )));

    // Only the name is written back; session overrides such as --server stay one-off.
    if let Some(path) = &session.config_path {
        if let Err(e) = set_display_name(path, name) {
            log::warn!("Failed to persist display name (non-critical): {}", e);
        }
    }
}

pub fn show_config(path: &Path, config: &Config) -> AppResult<()> {
    println!("# {}", path.display());
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

/// Store a new server address. Accepts the same shorthand as `--server`.
pub fn set_server(path: &Path, address: &str) -> AppResult<Config> {
    let mut config = config::read_config_unvalidated(path)?;
    config.server_url = InputValidator::normalize_server_address(address)?;
    config::save_config_to(path, &config)?;
    Ok(config)
}

pub fn set_display_name(path: &Path, name: &str) -> AppResult<Config> {
    InputValidator::validate_display_name(name)?;
    let mut config = config::read_config_unvalidated(path)?;
    config.display_name = name.trim().to_string();
    config::save_config_to(path, &config)?;
    Ok(config)
}

pub fn reset_config(path: &Path) -> AppResult<Config> {
    config::reset_config_at(path)
}
