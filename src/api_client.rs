use reqwest::{multipart, Client, Response, Url};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::time::Duration;

use crate::errors::{AppError, AppResult};
use crate::models::{
    ApiOutcome, Category, FileListing, Message, MessagesResponse, NewMessage, StorageStats,
};
use crate::security::InputValidator;

/// HTTP client for the transfer server's JSON API.
///
/// Every method returns [`AppError::Network`] when the request could not
/// complete and [`AppError::Application`] when the server answered but
/// refused it.
#[derive(Debug, Clone)]
pub struct TransferClient {
    client: Client,
    base_url: Url,
}

impl TransferClient {
    pub fn new(base_url: &str, timeout: Duration) -> AppResult<Self> {
        InputValidator::validate_server_url(base_url)?;
        let base_url =
            Url::parse(base_url).map_err(|_| AppError::invalid_server_address(base_url))?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build `base/api/<segments...>`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::invalid_server_address(self.base_url.as_str()))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    pub async fn upload_file(&self, path: &Path, display_name: &str) -> AppResult<()> {
        let url = self.endpoint(&["upload"])?;
        let data = tokio::fs::read(path).await?;

        log::debug!("POST {} ({} bytes as {})", url, data.len(), display_name);

        let part = multipart::Part::bytes(data)
            .file_name(display_name.to_string())
            .mime_str("application/octet-stream")?;
        let form = multipart::Form::new().part("file", part);

        let response = self.client.post(url).multipart(form).send().await?;
        read_outcome(response).await
    }

    /// List one concrete category. `Category::All` is resolved by the
    /// listing controller, never sent to the server.
    pub async fn list_files(&self, category: Category) -> AppResult<FileListing> {
        if category.is_all() {
            return Err(AppError::validation(
                "category",
                "The server lists one concrete category at a time",
            ));
        }

        let url = self.endpoint(&["files", category.as_str()])?;
        log::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        read_json(response).await
    }

    /// Stream a stored file into `dest_dir`, returning the written path.
    pub async fn download_file(
        &self,
        category: Category,
        filename: &str,
        dest_dir: &Path,
    ) -> AppResult<PathBuf> {
        let url = self.endpoint(&["download", category.as_str(), filename])?;
        log::debug!("GET {}", url);

        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(error_from_status(response).await);
        }

        tokio::fs::create_dir_all(dest_dir).await?;
        let target = dest_dir.join(InputValidator::sanitize_filename(filename));
        let partial = target.with_extension(match target.extension() {
            Some(ext) => format!("{}.part", ext.to_string_lossy()),
            None => "part".to_string(),
        });

        let mut file = tokio::fs::File::create(&partial).await?;
        let mut written: u64 = 0;
        let result: AppResult<()> = async {
            while let Some(chunk) = response.chunk().await? {
                file.write_all(&chunk).await?;
                written += chunk.len() as u64;
            }
            file.flush().await?;
            Ok(())
        }
        .await;

        if let Err(e) = result {
            drop(file);
            if let Err(remove_err) = tokio::fs::remove_file(&partial).await {
                log::warn!(
                    "Failed to remove partial download {}: {}",
                    partial.display(),
                    remove_err
                );
            }
            return Err(e);
        }

        drop(file);
        tokio::fs::rename(&partial, &target).await?;
        log::info!("Downloaded {} ({} bytes)", target.display(), written);
        Ok(target)
    }

    pub async fn delete_file(&self, category: Category, filename: &str) -> AppResult<()> {
        let url = self.endpoint(&["delete", category.as_str(), filename])?;
        log::debug!("DELETE {}", url);
        let response = self.client.delete(url).send().await?;
        read_outcome(response).await
    }

    pub async fn stats(&self) -> AppResult<StorageStats> {
        let url = self.endpoint(&["stats"])?;
        let response = self.client.get(url).send().await?;
        read_json(response).await
    }

    /// Recent messages, ascending by id.
    pub async fn get_messages(&self) -> AppResult<Vec<Message>> {
        let url = self.endpoint(&["messages"])?;
        let response = self.client.get(url).send().await?;
        let body: MessagesResponse = read_json(response).await?;
        Ok(body.messages)
    }

    pub async fn post_message(&self, message: &NewMessage) -> AppResult<()> {
        let url = self.endpoint(&["messages"])?;
        log::debug!("POST {} as {}", url, message.sender);
        let response = self.client.post(url).json(message).send().await?;
        read_outcome(response).await
    }
}

/// Interpret a `{success, error?}` body. Error statuses usually carry the
/// same body, so it is parsed regardless of status.
async fn read_outcome(response: Response) -> AppResult<()> {
    let status = response.status();
    match response.json::<ApiOutcome>().await {
        Ok(outcome) => outcome.into_result(),
        Err(e) if status.is_success() => Err(e.into()),
        Err(_) => Err(AppError::application(Some(format!(
            "HTTP Error: {}",
            status.as_u16()
        )))),
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> AppResult<T> {
    if response.status().is_success() {
        return Ok(response.json::<T>().await?);
    }
    Err(error_from_status(response).await)
}

async fn error_from_status(response: Response) -> AppError {
    let status = response.status();
    let message = response
        .json::<ApiOutcome>()
        .await
        .ok()
        .and_then(|outcome| outcome.error)
        .unwrap_or_else(|| format!("HTTP Error: {}", status.as_u16()));
    log::warn!("Server returned {}: {}", status, message);
    AppError::application(Some(message))
}
