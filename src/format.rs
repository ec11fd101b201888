use chrono::{DateTime, Local, NaiveDateTime};

/// Human readable size, e.g. `512 B`, `1.5 KB`, `2.25 GB`.
pub fn format_file_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let size = bytes as f64;
    if size < KB {
        format!("{} B", bytes)
    } else if size < MB {
        format!("{:.1} KB", size / KB)
    } else if size < GB {
        format!("{:.1} MB", size / MB)
    } else {
        format!("{:.2} GB", size / GB)
    }
}

/// Parse a server timestamp into local wall-clock time.
///
/// The server emits naive ISO datetimes (`2024-05-01T10:00:00.123456`);
/// RFC 3339 values with an offset are converted to local time.
pub fn parse_timestamp(timestamp: &str) -> Option<NaiveDateTime> {
    let trimmed = timestamp.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.with_timezone(&Local).naive_local())
}

/// `HH:MM` label for a chat message; the raw value if it cannot be parsed.
pub fn format_message_time(timestamp: &str) -> String {
    match parse_timestamp(timestamp) {
        Some(time) => time.format("%H:%M").to_string(),
        None => timestamp.to_string(),
    }
}

/// Relative age of a file, measured against `now`.
pub fn format_relative_time(timestamp: &str, now: NaiveDateTime) -> String {
    let Some(time) = parse_timestamp(timestamp) else {
        return timestamp.to_string();
    };

    let elapsed = now.signed_duration_since(time);
    let seconds = elapsed.num_seconds();
    if seconds < 60 {
        "just now".to_string()
    } else if seconds < 3600 {
        let minutes = elapsed.num_minutes();
        format!("{} minute{} ago", minutes, if minutes == 1 { "" } else { "s" })
    } else if seconds < 86_400 {
        let hours = elapsed.num_hours();
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else {
        time.format("%Y-%m-%d").to_string()
    }
}
