use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use crate::error::AppError;

/// Collects the names of absent or blank fields so one error can list them all.
#[derive(Debug, Default)]
pub struct MissingFields(Vec<&'static str>);

impl MissingFields {
    /// Returns the trimmed value, or records `name` as missing and returns "".
    pub fn take(&mut self, name: &'static str, value: Option<String>) -> String {
        match value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            Some(v) => v,
            None => {
                self.0.push(name);
                String::new()
            }
        }
    }

    pub fn check(self) -> Result<(), AppError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "Missing required fields: {}",
                self.0.join(", ")
            )))
        }
    }
}

/// Trims an optional update field; blank strings count as "not provided".
pub fn provided(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_date(raw: &str) -> Result<DateTime<Utc>, AppError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| AppError::Validation(format!("Invalid date: {}", raw)))
}

/// Schedule dates may fall anywhere from the start of the current UTC day on.
/// Creation and update share this rule.
pub fn ensure_not_past(date: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), AppError> {
    let start_of_today = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or(now);

    if date < start_of_today {
        Err(AppError::Validation("Invalid date: must not be in the past".to_string()))
    } else {
        Ok(())
    }
}
