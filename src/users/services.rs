use lazy_static::lazy_static;
use regex::Regex;

use crate::error::AppError;

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Shape checks shared by sign-up and update. `email` must be normalized.
pub fn validate_account_fields(email: &str, password: &str, username: &str) -> Result<(), AppError> {
    if !is_valid_email(email) {
        return Err(AppError::BadRequest("Invalid email".into()));
    }
    if password.is_empty() {
        return Err(AppError::BadRequest("Password is required".into()));
    }
    if username.trim().is_empty() {
        return Err(AppError::BadRequest("Username is required".into()));
    }
    Ok(())
}
