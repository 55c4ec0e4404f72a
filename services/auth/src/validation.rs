//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Missing email".to_string());
    }

    if email.len() > 254 {
        return Err("Invalid email".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email".to_string());
    }

    Ok(())
}

/// Validate password; any non-empty password is accepted
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Missing password".to_string());
    }

    Ok(())
}
