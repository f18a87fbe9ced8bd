//! Input checks shared by the request DTOs.
//!
//! Every request body is validated here before it reaches a service, so the
//! services can assume normalized emails, usernames and country codes.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{AppError, AppResult};

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_.-]{3,32}$").unwrap();
    static ref COUNTRY_CODE_RE: Regex = Regex::new(r"^[A-Z]{3}$").unwrap();
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Trims and lowercases, then checks the shape.
pub fn normalize_email(raw: &str) -> AppResult<String> {
    let email = raw.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::validation("Invalid email"));
    }
    Ok(email)
}

pub fn normalize_username(raw: &str) -> AppResult<String> {
    let username = raw.trim();
    if !USERNAME_RE.is_match(username) {
        return Err(AppError::validation(
            "Username must be 3-32 characters of letters, digits, '_', '.' or '-'",
        ));
    }
    Ok(username.to_string())
}

pub fn check_password(password: &str) -> AppResult<()> {
    if password.trim().is_empty() {
        return Err(AppError::validation("Password is required"));
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::validation("Password too short"));
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::validation("Password too long"));
    }
    Ok(())
}

/// Country codes are stored uppercase, three ASCII letters (`FRA`, `JPN`).
pub fn normalize_country_code(raw: &str) -> AppResult<String> {
    let code = raw.trim().to_ascii_uppercase();
    if !COUNTRY_CODE_RE.is_match(&code) {
        return Err(AppError::validation("Invalid country code"));
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  A@X.Com ").unwrap(), "a@x.com");
        assert!(normalize_email("not-an-email").is_err());
        assert!(normalize_email("a b@x.com").is_err());
    }

    #[test]
    fn username_rules() {
        assert_eq!(normalize_username(" alice ").unwrap(), "alice");
        assert!(normalize_username("al").is_err());
        assert!(normalize_username("has space").is_err());
        assert!(normalize_username("a@b").is_err());
    }

    #[test]
    fn password_rules() {
        assert!(check_password("Secret123").is_ok());
        assert!(matches!(check_password(""), Err(AppError::Validation(_))));
        assert!(check_password("        ").is_err());
        assert!(check_password("short").is_err());
        assert!(check_password(&"x".repeat(MAX_PASSWORD_LEN + 1)).is_err());
    }

    #[test]
    fn country_codes_are_uppercased() {
        assert_eq!(normalize_country_code("fra").unwrap(), "FRA");
        assert_eq!(normalize_country_code(" Jpn ").unwrap(), "JPN");
        assert!(normalize_country_code("FR").is_err());
        assert!(normalize_country_code("F1A").is_err());
        assert!(normalize_country_code("").is_err());
    }
}
