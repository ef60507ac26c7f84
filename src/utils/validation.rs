use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::error::{AppError, AppResult};

// Column widths from the migrations.
pub const MAX_NAME_LEN: usize = 250;
pub const MAX_EMAIL_LEN: usize = 100;
pub const MAX_PHONE_LEN: usize = 20;
pub const MAX_REGISTRATION_LEN: usize = 20;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Returns the trimmed value of a required field, failing with the field's name.
pub fn require(field: &str, value: Option<String>) -> AppResult<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::InvalidInput(format!("{}: is required", field))),
    }
}

/// Like `require` but for optional fields: absent is fine, blank is not.
pub fn non_blank(field: &str, value: Option<String>) -> AppResult<Option<String>> {
    match value {
        None => Ok(None),
        Some(v) => require(field, Some(v)).map(Some),
    }
}

/// Rejects values longer than the column that stores them, counted in characters.
pub fn max_len(field: &str, value: &str, max: usize) -> AppResult<()> {
    if value.chars().count() > max {
        return Err(AppError::InvalidInput(format!(
            "{}: must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

/// Validates the address and folds it to lowercase, which is how emails are stored.
pub fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim();
    if !EMAIL_RE.is_match(email) {
        return Err(AppError::InvalidInput("email: invalid email format".to_string()));
    }
    max_len("email", email, MAX_EMAIL_LEN)?;
    Ok(email.to_lowercase())
}

/// Parses a date or timestamp and drops the time of day.
pub fn parse_calendar_day(field: &str, raw: &str) -> AppResult<NaiveDate> {
    let raw = raw.trim();
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(day);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.date_naive());
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(ts.date());
    }
    Err(AppError::InvalidInput(format!(
        "{}: expected a date like 2024-01-31",
        field
    )))
}
