//! Password hashing and strength policy.
//!
//! Hashes are salted bcrypt digests; verification relies on bcrypt's own
//! comparison and never on string equality.

use anyhow::anyhow;
use bcrypt::{DEFAULT_COST, hash, verify};

use crate::errors::AppError;

pub const MIN_PASSWORD_LENGTH: usize = 8;
const REQUIRED_CHARACTER_CLASSES: usize = 3;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::internal_error(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::internal_error(format!("Failed to verify password: {}", e)))
}

/// Number of character classes (lowercase, uppercase, digit, symbol) present.
fn character_classes(password: &str) -> usize {
    let checks = [
        password.chars().any(|c| c.is_lowercase()),
        password.chars().any(|c| c.is_uppercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| !c.is_alphanumeric()),
    ];
    checks.iter().filter(|passed| **passed).count()
}

/// Enforces the password policy: at least eight characters drawn from at
/// least three of the four character classes.
pub fn ensure_password_strength(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::bad_request(anyhow!(
            "password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    if character_classes(password) < REQUIRED_CHARACTER_CLASSES {
        return Err(AppError::bad_request(anyhow!(
            "password must contain at least three of: lowercase letter, uppercase letter, digit, symbol"
        )));
    }

    Ok(())
}

/// Checks that `password` and its confirmation match, then applies the policy.
pub fn ensure_new_password(password: &str, confirm_password: &str) -> Result<(), AppError> {
    if password != confirm_password {
        return Err(AppError::bad_request(anyhow!(
            "confirm_password does not match password"
        )));
    }
    ensure_password_strength(password)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("Abcdefg1").unwrap();
        assert_ne!(hash, "Abcdefg1");
        assert!(verify_password("Abcdefg1", &hash).unwrap());
        assert!(!verify_password("abcdefg1", &hash).unwrap());
    }

    #[test]
    fn test_verify_invalid_hash() {
        assert!(verify_password("whatever", "not_a_valid_bcrypt_hash").is_err());
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("Samepass1").unwrap();
        let second = hash_password("Samepass1").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_only_lowercase_rejected() {
        let err = ensure_password_strength("abcdefgh").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_three_classes_accepted() {
        assert!(ensure_password_strength("Abcdefg1").is_ok());
        assert!(ensure_password_strength("abcdef1!").is_ok());
        assert!(ensure_password_strength("ABCDEF1!").is_ok());
    }

    #[test]
    fn test_two_classes_rejected() {
        assert!(ensure_password_strength("abcdefg1").is_err());
        assert!(ensure_password_strength("ABCDEFGh").is_err());
    }

    #[test]
    fn test_too_short_rejected() {
        assert!(ensure_password_strength("Ab1!").is_err());
        assert!(ensure_password_strength("Abcde1!").is_err());
    }

    #[test]
    fn test_character_class_count() {
        assert_eq!(character_classes("abc"), 1);
        assert_eq!(character_classes("aB"), 2);
        assert_eq!(character_classes("aB3"), 3);
        assert_eq!(character_classes("aB3$"), 4);
    }

    #[test]
    fn test_confirmation_mismatch() {
        let err = ensure_new_password("Abcdefg1", "Abcdefg2").unwrap_err();
        assert!(err.error.to_string().contains("confirm_password"));
        assert!(ensure_new_password("Abcdefg1", "Abcdefg1").is_ok());
    }
}
