//! # Validation Utilities
//!
//! Input validation helpers.

/// Validate that a string is not empty.
pub fn validate_not_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} cannot be empty", field_name))
    } else {
        Ok(())
    }
}

/// Validate email format (basic check).
pub fn validate_email(email: &str) -> Result<(), String> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err("Invalid email format".to_string());
    };

    if local.is_empty() || !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate minimum length.
pub fn validate_min_length(value: &str, min: usize, field_name: &str) -> Result<(), String> {
    if value.chars().count() < min {
        Err(format!("{} must be at least {} characters", field_name, min))
    } else {
        Ok(())
    }
}

/// Validate maximum length.
pub fn validate_max_length(value: &str, max: usize, field_name: &str) -> Result<(), String> {
    if value.chars().count() > max {
        Err(format!("{} must be at most {} characters", field_name, max))
    } else {
        Ok(())
    }
}

/// Validate that a username only contains letters, numbers, underscores, and hyphens.
pub fn validate_username_chars(value: &str) -> Result<(), String> {
    if value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        Ok(())
    } else {
        Err("Username can only contain letters, numbers, underscores, and hyphens".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_empty_rejects_whitespace() {
        assert!(validate_not_empty("   \t\n", "content").is_err());
        assert!(validate_not_empty(" hi ", "content").is_ok());
    }

    #[test]
    fn test_email() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("alice.example.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("alice@example.").is_err());
    }

    #[test]
    fn test_username_chars() {
        assert!(validate_username_chars("user_test-123").is_ok());
        assert!(validate_username_chars("user name").is_err());
        assert!(validate_username_chars("user@name").is_err());
    }

    #[test]
    fn test_lengths() {
        assert!(validate_min_length("ab", 3, "Username").is_err());
        assert!(validate_min_length("abc", 3, "Username").is_ok());
        assert!(validate_max_length("abcd", 3, "Username").is_err());
    }
}
