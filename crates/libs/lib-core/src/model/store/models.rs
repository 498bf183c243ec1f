//! # User Models
//!
//! Row type and input types for the `users` table.

use chrono::{DateTime, Utc};
use lib_utils::{validate_email, validate_max_length, validate_min_length, validate_username_chars};
use serde::Serialize;
use sqlx::FromRow;

/// Username and email length limits.
pub const USERNAME_MIN_LEN: usize = 3;
pub const FIELD_MAX_LEN: usize = 255;

/// User entity representing a complete user record from the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_guest: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data structure for creating a new user.
///
/// The password must already be hashed by the caller.
#[derive(Debug, Clone)]
pub struct UserForCreate {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_guest: bool,
}

impl UserForCreate {
    /// Create a new `UserForCreate` instance for a registered (non-guest) user.
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        Self {
            username,
            email,
            password_hash,
            is_guest: false,
        }
    }

    /// Mark the user as a guest account.
    pub fn guest(mut self) -> Self {
        self.is_guest = true;
        self
    }

    /// Validate username and email.
    pub fn validate(&self) -> Result<(), String> {
        validate_username(&self.username)?;
        validate_user_email(&self.email)
    }
}

/// Data structure for updating an existing user.
///
/// All fields are optional - only provided fields will be updated.
#[derive(Debug, Clone, Default)]
pub struct UserForUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub is_guest: Option<bool>,
}

impl UserForUpdate {
    /// Create a new empty `UserForUpdate` instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the username.
    pub fn username(mut self, username: String) -> Self {
        self.username = Some(username);
        self
    }

    /// Set the email.
    pub fn email(mut self, email: String) -> Self {
        self.email = Some(email);
        self
    }

    /// Set the guest flag.
    pub fn is_guest(mut self, is_guest: bool) -> Self {
        self.is_guest = Some(is_guest);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.is_guest.is_none()
    }

    /// Validate the fields that are set.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(username) = &self.username {
            validate_username(username)?;
        }
        if let Some(email) = &self.email {
            validate_user_email(email)?;
        }
        Ok(())
    }
}

fn validate_username(username: &str) -> Result<(), String> {
    validate_min_length(username, USERNAME_MIN_LEN, "Username")?;
    validate_max_length(username, FIELD_MAX_LEN, "Username")?;
    validate_username_chars(username)
}

fn validate_user_email(email: &str) -> Result<(), String> {
    validate_max_length(email, FIELD_MAX_LEN, "Email")?;
    validate_email(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_validation() {
        let ok = UserForCreate::new("alice_1".into(), "alice@example.com".into(), "hash".into());
        assert!(ok.validate().is_ok());

        let short = UserForCreate::new("al".into(), "alice@example.com".into(), "hash".into());
        assert!(short.validate().is_err());

        let spaces = UserForCreate::new("al ice".into(), "alice@example.com".into(), "hash".into());
        assert!(spaces.validate().is_err());

        let bad_email = UserForCreate::new("alice".into(), "alice".into(), "hash".into());
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn test_update_validates_only_set_fields() {
        assert!(UserForUpdate::new().validate().is_ok());
        assert!(UserForUpdate::new().is_empty());
        assert!(UserForUpdate::new().username("x".into()).validate().is_err());
        assert!(UserForUpdate::new().is_guest(true).validate().is_ok());
    }
}
