//! Requested-time normalization.
//!
//! The reservation site renders slots as "H:MM AM/PM"; user input arrives in
//! looser shapes ("2pm", "2:30 PM"). Everything is canonicalized up front so
//! slot comparison is a plain string match.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::BookingError;

static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d{1,2})(?::(\d{2}))?\s*(am|pm)\s*$").expect("valid time regex")
});

/// Canonicalize a requested time to "H:MM AM/PM".
pub fn normalize_time(input: &str) -> Result<String, BookingError> {
    let invalid = || BookingError::InvalidTime {
        input: input.to_string(),
    };

    let caps = TIME_RE.captures(input).ok_or_else(invalid)?;

    let hour: u32 = caps[1].parse().map_err(|_| invalid())?;
    let minute: u32 = caps
        .get(2)
        .map(|m| m.as_str().parse())
        .transpose()
        .map_err(|_| invalid())?
        .unwrap_or(0);

    if !(1..=12).contains(&hour) || minute > 59 {
        return Err(invalid());
    }

    let meridiem = caps[3].to_ascii_uppercase();
    Ok(format!("{hour}:{minute:02} {meridiem}"))
}
