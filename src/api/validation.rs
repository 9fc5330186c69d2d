//! Input validation for API requests.
//!
//! For collecting multiple validation errors and returning them as an
//! ApiError, use the `ValidationErrorBuilder` from the `error` module.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Permissive email shape check; the identity provider is the real
    /// arbiter of deliverability.
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if email.trim().is_empty() {
        return Err("Email is required".to_string());
    }
    if email.len() > 254 {
        return Err("Email is too long".to_string());
    }
    if !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email address".to_string());
    }
    Ok(())
}

pub fn validate_required(value: &str, label: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", label));
    }
    Ok(())
}

/// Validate a UUID-shaped identifier (user ids issued by the provider).
pub fn validate_uuid(value: &str, label: &str) -> Result<(), String> {
    uuid::Uuid::parse_str(value)
        .map(|_| ())
        .map_err(|_| format!("{} is not a valid id", label))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_reasonable_emails() {
        assert!(validate_email("parent@example.com").is_ok());
        assert!(validate_email("a.b+c@school.co.za").is_ok());
    }

    #[test]
    fn rejects_malformed_emails() {
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("two@@example.com").is_err());
        assert!(validate_email("spaces in@example.com").is_err());
        assert!(validate_email("nodot@example").is_err());
    }

    #[test]
    fn required_checks_trimmed_content() {
        assert!(validate_required("value", "Field").is_ok());
        assert_eq!(
            validate_required("   ", "Full name").unwrap_err(),
            "Full name is required"
        );
    }

    #[test]
    fn uuid_check() {
        assert!(validate_uuid("8c2f84f0-93c5-4cbd-8f4a-6a1e0a9d4a11", "user id").is_ok());
        assert!(validate_uuid("not-a-uuid", "user id").is_err());
    }
}
