//! Account holders and signup rules.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::TrackerError;

pub const MIN_PASSWORD_LEN: usize = 6;

/// A registered user. The password hash is an argon2 PHC string.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// The parts of a user that may leave the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
        }
    }
}

/// Emails are matched case-insensitively and stored lower-case.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_signup(email: &str, password: &str) -> Result<(), TrackerError> {
    let email = email.trim();
    let well_formed = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.ends_with('.'),
        None => false,
    };
    if !well_formed {
        return Err(TrackerError::validation("email", "not a valid email address"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(TrackerError::validation(
            "password",
            format!("must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_normalized_to_lowercase() {
        assert_eq!(normalize_email("  Trader@Example.COM "), "trader@example.com");
    }

    #[test]
    fn signup_accepts_reasonable_input() {
        assert!(validate_signup("me@example.com", "secret1").is_ok());
    }

    #[test]
    fn signup_rejects_short_password() {
        let err = validate_signup("me@example.com", "12345").unwrap_err();
        assert!(matches!(err, TrackerError::Validation { ref field, .. } if field == "password"));
    }

    #[test]
    fn signup_rejects_malformed_email() {
        for email in ["", "plain", "@example.com", "me@localhost", "me@example."] {
            assert!(validate_signup(email, "secret1").is_err(), "{email} accepted");
        }
    }
}
