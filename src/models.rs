use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::AppError;

/// Storage category. `All` is client-side only; the server never sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    All,
    Images,
    Documents,
    Videos,
    Audios,
    Archives,
    Others,
}

impl Category {
    /// Every category the server stores files under, in display order.
    pub const CONCRETE: [Category; 6] = [
        Category::Images,
        Category::Documents,
        Category::Videos,
        Category::Audios,
        Category::Archives,
        Category::Others,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::All => "all",
            Category::Images => "images",
            Category::Documents => "documents",
            Category::Videos => "videos",
            Category::Audios => "audios",
            Category::Archives => "archives",
            Category::Others => "others",
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Category::All)
    }

    fn extensions(&self) -> &'static [&'static str] {
        match self {
            Category::Images => &["png", "jpg", "jpeg", "gif", "bmp", "webp", "ico"],
            Category::Documents => &[
                "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt", "md", "csv",
            ],
            Category::Videos => &["mp4", "avi", "mkv", "mov", "wmv", "flv", "webm"],
            Category::Audios => &["mp3", "wav", "flac", "aac", "ogg", "wma", "m4a"],
            Category::Archives => &["zip", "rar", "7z", "tar", "gz", "bz2"],
            Category::All | Category::Others => &[],
        }
    }

    /// Category the server will file `filename` under.
    pub fn for_filename(filename: &str) -> Category {
        let ext = match filename.rsplit_once('.') {
            Some((_, ext)) => ext.to_lowercase(),
            None => return Category::Others,
        };
        Category::CONCRETE
            .into_iter()
            .find(|c| c.extensions().contains(&ext.as_str()))
            .unwrap_or(Category::Others)
    }

    /// Whether the server accepts uploads with this file's extension.
    pub fn is_extension_allowed(filename: &str) -> bool {
        Category::for_filename(filename) != Category::Others
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Category::All),
            "images" => Ok(Category::Images),
            "documents" => Ok(Category::Documents),
            "videos" => Ok(Category::Videos),
            "audios" => Ok(Category::Audios),
            "archives" => Ok(Category::Archives),
            "others" => Ok(Category::Others),
            other => Err(AppError::invalid_category(other)),
        }
    }
}

/// One stored file as listed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    /// Already human formatted by the server, e.g. "1.2 KB".
    pub size: String,
    pub timestamp: String,
    pub category: Category,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileListing {
    #[serde(default)]
    pub files: Vec<FileEntry>,
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageStats {
    pub total_files: u64,
    pub total_size: String,
    #[serde(default)]
    pub stats: HashMap<String, u64>,
}

/// A chat message. Ids are assigned by the server and increase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub sender: String,
    pub content: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewMessage {
    pub content: String,
    pub sender: String,
}

/// Generic `{success, error?}` body returned by mutating endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiOutcome {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiOutcome {
    pub fn into_result(self) -> Result<(), AppError> {
        if self.success {
            Ok(())
        } else {
            Err(AppError::application(self.error))
        }
    }
}
