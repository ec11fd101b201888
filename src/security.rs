use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

use crate::errors::{AppError, AppResult};

/// The server refuses request bodies above 500MB.
pub const MAX_UPLOAD_BYTES: u64 = 500 * 1024 * 1024;

/// The server truncates sender names to this many characters.
pub const MAX_DISPLAY_NAME_CHARS: usize = 20;

pub const DEFAULT_SERVER_PORT: u16 = 5000;

fn ipv4_address_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)(?::(\d{1,5}))?$",
        )
        .expect("ipv4 pattern is valid")
    })
}

fn unsafe_filename_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"[<>:"/\\|?*\x00-\x1f]"#).expect("filename pattern is valid")
    })
}

pub struct InputValidator;

impl InputValidator {
    /// Turn user input into a base URL.
    ///
    /// Accepts `IP`, `IP:port` (default port 5000), `localhost[:port]`, or a
    /// full `http(s)://` URL. Trailing slashes are dropped.
    pub fn normalize_server_address(input: &str) -> AppResult<String> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(AppError::validation("server", "Server address cannot be empty"));
        }

        if trimmed.contains("://") {
            Self::validate_server_url(trimmed)?;
            return Ok(trimmed.trim_end_matches('/').to_string());
        }

        let (host, port) = if let Some(caps) = ipv4_address_pattern().captures(trimmed) {
            let host = trimmed.split(':').next().unwrap_or(trimmed);
            (host, caps.get(1).map(|m| m.as_str()))
        } else if let Some(rest) = trimmed.strip_prefix("localhost") {
            match rest {
                "" => ("localhost", None),
                _ => match rest.strip_prefix(':') {
                    Some(port) if !port.is_empty() => ("localhost", Some(port)),
                    _ => return Err(AppError::invalid_server_address(trimmed)),
                },
            }
        } else {
            return Err(AppError::invalid_server_address(trimmed));
        };

        let port = match port {
            Some(raw) => raw
                .parse::<u16>()
                .ok()
                .filter(|p| *p != 0)
                .ok_or_else(|| AppError::invalid_server_address(trimmed))?,
            None => DEFAULT_SERVER_PORT,
        };

        Ok(format!("http://{}:{}", host, port))
    }

    pub fn validate_server_url(url: &str) -> AppResult<()> {
        let parsed =
            reqwest::Url::parse(url.trim()).map_err(|_| AppError::invalid_server_address(url))?;

        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(AppError::invalid_server_address(url));
        }

        Ok(())
    }

    pub fn validate_display_name(name: &str) -> AppResult<()> {
        if name.trim().chars().count() > MAX_DISPLAY_NAME_CHARS {
            return Err(AppError::validation(
                "display_name",
                "Display name too long (max 20 characters)",
            ));
        }

        if name.chars().any(char::is_control) {
            return Err(AppError::validation(
                "display_name",
                "Display name contains control characters",
            ));
        }

        Ok(())
    }

    /// Check a local file before it joins an upload batch. Returns its size.
    pub fn validate_upload_file(path: &Path) -> AppResult<u64> {
        let display = path.display().to_string();

        let has_name = path
            .file_name()
            .map(|n| !n.to_string_lossy().trim().is_empty())
            .unwrap_or(false);
        if !has_name {
            return Err(AppError::validation("file_path", "File must have a name"));
        }

        if !path.exists() {
            return Err(AppError::file_not_found(&display));
        }

        if !path.is_file() {
            return Err(AppError::validation("file_path", "Path is not a file"));
        }

        let size = std::fs::metadata(path)?.len();
        if size > MAX_UPLOAD_BYTES {
            return Err(AppError::file_too_large(&display));
        }

        Ok(size)
    }

    /// Make a server-supplied file name safe to create locally.
    pub fn sanitize_filename(filename: &str) -> String {
        let base = filename
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(filename)
            .trim();
        let sanitized = unsafe_filename_chars().replace_all(base, "_");
        let sanitized = sanitized.trim_matches('.');

        let sanitized = if sanitized.is_empty() {
            "download".to_string()
        } else {
            sanitized.to_string()
        };

        if sanitized.chars().count() > 255 {
            let truncated: String = sanitized.chars().take(252).collect();
            format!("{}...", truncated)
        } else {
            sanitized
        }
    }
}

/// Escape text for inclusion in HTML so it always renders as inert text.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Strip control characters (ANSI escapes included) before printing
/// server-supplied text to a terminal.
pub fn sanitize_for_terminal(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() && c != '\n' { ' ' } else { c })
        .collect()
}
