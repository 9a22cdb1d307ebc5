//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest accepted username.
pub const MAX_USERNAME_LEN: usize = 32;

/// Validates that a username is non-blank, reasonably short, and free of
/// surrounding whitespace or control characters.
///
/// # Examples
///
/// ```ignore
/// validate_username("ada")      // Ok
/// validate_username(" ada")     // Err - surrounding whitespace
/// validate_username("")         // Err - empty
/// ```
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.trim().is_empty() {
        let mut err = ValidationError::new("username_empty");
        err.message = Some("Username must not be empty".into());
        return Err(err);
    }

    if username.chars().count() > MAX_USERNAME_LEN {
        let mut err = ValidationError::new("username_length");
        err.message = Some(
            format!("Username must be at most {MAX_USERNAME_LEN} characters").into(),
        );
        return Err(err);
    }

    if username.trim() != username || username.chars().any(char::is_control) {
        let mut err = ValidationError::new("username_format");
        err.message =
            Some("Username must not contain surrounding whitespace or control characters".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a board name can be used as a path segment.
pub fn validate_board_name(name: &str) -> Result<(), ValidationError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        let mut err = ValidationError::new("board_name_format");
        err.message =
            Some("Board name must be non-empty and use only letters, digits, '-', '_' or '.'".into());
        Err(err)
    }
}
