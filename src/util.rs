use chrono::DateTime;
use chrono_tz::Tz;

const ELLIPSIS: &str = "...";

/// Keeps at most `max_chars` characters of `text`, marking the cut with an ellipsis.
pub fn truncate_title(text: &str, max_chars: usize) -> String {
  if text.chars().count() <= max_chars {
    return text.to_string();
  }

  let truncated: String = text.chars().take(max_chars).collect();
  format!("{truncated}{ELLIPSIS}")
}

/// Renders an epoch-millisecond timestamp in `tz`, e.g. `Nov 15, 2023, 04:13 AM`.
pub fn format_local_time(timestamp_ms: i64, tz: Tz) -> Option<String> {
  let utc = DateTime::from_timestamp_millis(timestamp_ms)?;
  Some(utc.with_timezone(&tz).format("%b %-d, %Y, %I:%M %p").to_string())
}
