use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// The server answered, but reported `success: false`.
    #[error("Server rejected request: {}", message.as_deref().unwrap_or("no reason given"))]
    Application { message: Option<String> },

    #[error("Invalid server address: {address}")]
    InvalidServerAddress { address: String },

    #[error("Unknown category: {name}")]
    InvalidCategory { name: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("File too large: {path}. Maximum size is 500MB.")]
    FileTooLarge { path: String },

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Custom result type
pub type AppResult<T> = Result<T, AppError>;

/// Generic text shown when a request could not complete at all.
pub const NETWORK_ERROR_TEXT: &str = "Network error";

impl AppError {
    pub fn validation(field: &str, message: &str) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    pub fn application(message: Option<String>) -> Self {
        Self::Application {
            message: message.filter(|m| !m.trim().is_empty()),
        }
    }

    pub fn file_not_found(path: &str) -> Self {
        Self::FileNotFound {
            path: path.to_string(),
        }
    }

    pub fn file_too_large(path: &str) -> Self {
        Self::FileTooLarge {
            path: path.to_string(),
        }
    }

    pub fn invalid_category(name: &str) -> Self {
        Self::InvalidCategory {
            name: name.to_string(),
        }
    }

    pub fn invalid_server_address(address: &str) -> Self {
        Self::InvalidServerAddress {
            address: address.to_string(),
        }
    }

    /// True when the request never produced a readable response.
    pub fn is_transport(&self) -> bool {
        matches!(self, AppError::Network(_))
    }

    /// Text for a user-facing notification.
    ///
    /// Transport failures always collapse to [`NETWORK_ERROR_TEXT`]; server
    /// rejections show the server's message verbatim, or `fallback` when it
    /// sent none. Local errors use their own description.
    pub fn user_message(&self, fallback: &str) -> String {
        if self.is_transport() {
            return NETWORK_ERROR_TEXT.to_string();
        }
        match self {
            AppError::Application { message } => message
                .clone()
                .unwrap_or_else(|| fallback.to_string()),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn application_error_prefers_server_message() {
        let err = AppError::application(Some("File type not allowed".to_string()));
        assert_eq!(err.user_message("Upload failed"), "File type not allowed");
        assert!(!err.is_transport());
    }

    #[test]
    fn blank_server_message_falls_back() {
        let err = AppError::application(Some("   ".to_string()));
        assert_eq!(err.user_message("Upload failed"), "Upload failed");

        let err = AppError::application(None);
        assert_eq!(err.user_message("Send failed"), "Send failed");
    }

    #[test]
    fn local_errors_describe_themselves() {
        let err = AppError::file_not_found("missing.txt");
        assert_eq!(err.user_message("Upload failed"), "File not found: missing.txt");
    }
}
