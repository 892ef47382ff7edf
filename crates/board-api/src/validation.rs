use thiserror::Error;

use crate::error::ApiError;

const MIN_NICKNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 4;

/// Reasons a registration is refused, in the order they are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("invalid nickname format")]
    InvalidNickname,
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("invalid password format")]
    InvalidPassword,
    #[error("password contains nickname")]
    PasswordContainsNickname,
    #[error("duplicate nickname")]
    DuplicateNickname,
}

/// Nickname must be at least three ASCII letters or digits.
pub fn is_valid_nickname(nickname: &str) -> bool {
    nickname.len() >= MIN_NICKNAME_LEN && nickname.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Format checks for a new account. The duplicate check needs the store and
/// runs after this passes.
pub fn validate_registration(
    nickname: &str,
    password: &str,
    confirm_password: &str,
) -> Result<(), RegistrationError> {
    if !is_valid_nickname(nickname) {
        return Err(RegistrationError::InvalidNickname);
    }
    if password != confirm_password {
        return Err(RegistrationError::PasswordMismatch);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(RegistrationError::InvalidPassword);
    }
    if password.to_lowercase().contains(&nickname.to_lowercase()) {
        return Err(RegistrationError::PasswordContainsNickname);
    }
    Ok(())
}

/// Reject empty or whitespace-only text fields.
pub fn require_text(value: &str, field: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{} must not be empty", field)));
    }
    Ok(())
}
