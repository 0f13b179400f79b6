//! Timestamp parsing and formatting.
//!
//! Handles the `HH:MM:SS,mmm` form used by SRT files as well as the looser
//! `HH:MM:SS.mmm`, `MM:SS` and `SS` forms.

use thiserror::Error;

/// Timestamp parsing error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimestampError {
    #[error("Timestamp cannot be empty")]
    Empty,

    #[error("Timestamp cannot be negative")]
    Negative,

    #[error("Invalid {0} value: {1}")]
    InvalidValue(&'static str, String),

    #[error("Invalid timestamp format '{0}'. Use HH:MM:SS,mmm, HH:MM:SS.mmm, MM:SS or SS")]
    InvalidFormat(String),
}

/// Parse a timestamp string to total seconds.
///
/// # Examples
/// ```
/// use ytbot_models::timestamp::parse_timestamp;
/// assert_eq!(parse_timestamp("00:01:02,500").unwrap(), 62.5);
/// assert_eq!(parse_timestamp("05:30").unwrap(), 330.0);
/// assert_eq!(parse_timestamp("90").unwrap(), 90.0);
/// ```
pub fn parse_timestamp(ts: &str) -> Result<f64, TimestampError> {
    let ts = ts.trim();
    if ts.is_empty() {
        return Err(TimestampError::Empty);
    }

    // SRT uses a comma as the decimal separator
    let normalized = ts.replace(',', ".");
    let parts: Vec<&str> = normalized.split(':').collect();

    let (hours, minutes, seconds) = match parts.as_slice() {
        [s] => ("0", "0", *s),
        [m, s] => ("0", *m, *s),
        [h, m, s] => (*h, *m, *s),
        _ => return Err(TimestampError::InvalidFormat(ts.to_string())),
    };

    let hours: f64 = hours
        .parse()
        .map_err(|_| TimestampError::InvalidValue("hours", hours.to_string()))?;
    let minutes: f64 = minutes
        .parse()
        .map_err(|_| TimestampError::InvalidValue("minutes", minutes.to_string()))?;
    let seconds: f64 = seconds
        .parse()
        .map_err(|_| TimestampError::InvalidValue("seconds", seconds.to_string()))?;

    if hours < 0.0 || minutes < 0.0 || seconds < 0.0 {
        return Err(TimestampError::Negative);
    }

    Ok(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Format seconds as an SRT timestamp (`HH:MM:SS,mmm`).
pub fn format_srt_timestamp(total_secs: f64) -> String {
    let total_ms = (total_secs.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let mins = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let ms = total_ms % 1000;
    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, ms)
}
