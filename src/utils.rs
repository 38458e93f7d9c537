use regex::Regex;
use std::sync::OnceLock;
use time::OffsetDateTime;

use crate::constants::*;
use crate::error::AppError;

pub fn now_utc() -> OffsetDateTime {
    // storage keeps whole seconds
    let now = OffsetDateTime::now_utc();
    now.replace_nanosecond(0).unwrap_or(now)
}

pub fn datetime_from_timestamp(timestamp: i64) -> Result<OffsetDateTime, AppError> {
    OffsetDateTime::from_unix_timestamp(timestamp)
        .map_err(|e| AppError::internal(format!("invalid stored timestamp {}: {}", timestamp, e)))
}

pub fn validate_string_length(
    value: &str,
    field_name: &str,
    max_length: usize,
) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::bad_request(format!(
            "{} cannot be empty",
            field_name
        )));
    }
    if value.chars().count() > max_length {
        return Err(AppError::bad_request(format!(
            "{} must be at most {} characters",
            field_name, max_length
        )));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), AppError> {
    if email.is_empty() {
        return Err(AppError::bad_request("Email is required"));
    }
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(AppError::bad_request(format!(
            "Email must be at most {} characters long",
            MAX_EMAIL_LENGTH
        )));
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err(AppError::bad_request("Invalid email format"));
    }
    Ok(())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_limit(limit: Option<u32>, default: u32) -> Result<u32, AppError> {
    match limit {
        Some(0) => Err(AppError::bad_request("Limit must be greater than 0")),
        Some(l) if l > MAX_LIMIT => Err(AppError::bad_request(format!(
            "Limit cannot exceed {}",
            MAX_LIMIT
        ))),
        Some(l) => Ok(l),
        None => Ok(default),
    }
}

pub fn validate_transactions_limit(limit: Option<u32>) -> Result<u32, AppError> {
    validate_limit(limit, DEFAULT_TRANSACTIONS_LIMIT)
}

pub fn validate_offset(offset: Option<u32>) -> Result<u32, AppError> {
    match offset {
        Some(o) if o > MAX_OFFSET => Err(AppError::bad_request(format!(
            "Offset cannot exceed {}",
            MAX_OFFSET
        ))),
        Some(o) => Ok(o),
        None => Ok(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_length_rejects_blank_and_long_values() {
        assert!(validate_string_length("Food", "Category", 10).is_ok());
        assert!(validate_string_length("   ", "Category", 10).is_err());
        assert!(validate_string_length("abcdefghijk", "Category", 10).is_err());
        // counted in characters, not bytes
        assert!(validate_string_length("₹₹₹", "Currency", 3).is_ok());
    }

    #[test]
    fn email_format() {
        assert!(validate_email("someone@example.com").is_ok());
        assert!(validate_email("first.last+tag@sub.example.org").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("missing@tld").is_err());
    }

    #[test]
    fn email_normalization() {
        assert_eq!(normalize_email("  Someone@Example.COM "), "someone@example.com");
    }

    #[test]
    fn limit_and_offset_bounds() {
        assert_eq!(validate_transactions_limit(None).unwrap(), DEFAULT_TRANSACTIONS_LIMIT);
        assert_eq!(validate_transactions_limit(Some(5)).unwrap(), 5);
        assert!(validate_transactions_limit(Some(0)).is_err());
        assert!(validate_transactions_limit(Some(MAX_LIMIT + 1)).is_err());

        assert_eq!(validate_offset(None).unwrap(), 0);
        assert_eq!(validate_offset(Some(20)).unwrap(), 20);
        assert!(validate_offset(Some(MAX_OFFSET + 1)).is_err());
    }
}
