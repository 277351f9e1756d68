//! Argument checks shared by every token store operation.
//!
//! All of these run before the backend is touched, so a rejected call never
//! leaves anything behind.

use chrono::Duration;

use crate::{crypto::MAX_SECRET_BYTES, error::ValidationError};

/// Validates a presented or issued token
///
/// bcrypt ignores input past 72 bytes, so longer tokens are rejected rather
/// than compared on their prefix.
///
/// # Examples
///
/// ```rust
/// use tokenstore_core::validation::validate_token;
///
/// assert!(validate_token("abc123").is_ok());
/// assert!(validate_token("").is_err());
/// assert!(validate_token(&"a".repeat(73)).is_err());
/// ```
pub fn validate_token(token: &str) -> Result<(), ValidationError> {
    if token.is_empty() {
        return Err(ValidationError::MissingField(
            "Token is required".to_string(),
        ));
    }

    if token.len() > MAX_SECRET_BYTES {
        return Err(ValidationError::InvalidField(format!(
            "Token must be at most {MAX_SECRET_BYTES} bytes"
        )));
    }

    Ok(())
}

/// Validates a user identifier
///
/// # Examples
///
/// ```rust
/// use tokenstore_core::validation::validate_uid;
///
/// assert!(validate_uid("user1").is_ok());
/// assert!(validate_uid("").is_err());
/// ```
pub fn validate_uid(uid: &str) -> Result<(), ValidationError> {
    if uid.is_empty() {
        return Err(ValidationError::MissingField(
            "User ID is required".to_string(),
        ));
    }

    if uid.trim().is_empty() {
        return Err(ValidationError::InvalidField(
            "User ID cannot be only whitespace".to_string(),
        ));
    }

    Ok(())
}

/// Validates a token lifetime, which must be strictly positive
pub fn validate_lifetime(lifetime: Duration) -> Result<(), ValidationError> {
    if lifetime <= Duration::zero() {
        return Err(ValidationError::InvalidLifetime(format!(
            "Lifetime must be positive, got {} ms",
            lifetime.num_milliseconds()
        )));
    }

    Ok(())
}

/// Validates and normalizes an optional referer URL
///
/// An empty referer is treated as absent. Length is counted in characters.
pub fn normalize_referer(
    referer: Option<&str>,
    max_length: usize,
) -> Result<Option<String>, ValidationError> {
    match referer {
        None | Some("") => Ok(None),
        Some(url) if url.chars().count() > max_length => {
            Err(ValidationError::RefererTooLong { max: max_length })
        }
        Some(url) => Ok(Some(url.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_token() {
        assert!(validate_token("abc123").is_ok());
        assert!(matches!(
            validate_token(""),
            Err(ValidationError::MissingField(_))
        ));
    }

    #[test]
    fn test_validate_token_length_in_bytes() {
        assert!(validate_token(&"a".repeat(72)).is_ok());
        assert!(matches!(
            validate_token(&"a".repeat(73)),
            Err(ValidationError::InvalidField(_))
        ));
        // 36 two-byte characters is exactly 72 bytes
        assert!(validate_token(&"é".repeat(36)).is_ok());
        assert!(validate_token(&"é".repeat(37)).is_err());
    }

    #[test]
    fn test_validate_uid() {
        assert!(validate_uid("user1").is_ok());
        assert!(validate_uid("user@example.com").is_ok());
        assert!(matches!(
            validate_uid(""),
            Err(ValidationError::MissingField(_))
        ));
        assert!(matches!(
            validate_uid("   "),
            Err(ValidationError::InvalidField(_))
        ));
    }

    #[test]
    fn test_validate_lifetime() {
        assert!(validate_lifetime(Duration::milliseconds(1)).is_ok());
        assert!(validate_lifetime(Duration::minutes(15)).is_ok());
        assert!(validate_lifetime(Duration::zero()).is_err());
        assert!(validate_lifetime(Duration::milliseconds(-60_000)).is_err());
    }

    #[test]
    fn test_normalize_referer() {
        assert_eq!(normalize_referer(None, 2048).unwrap(), None);
        assert_eq!(normalize_referer(Some(""), 2048).unwrap(), None);
        assert_eq!(
            normalize_referer(Some("/dashboard"), 2048).unwrap(),
            Some("/dashboard".to_string())
        );

        let at_limit = "a".repeat(2048);
        assert!(normalize_referer(Some(&at_limit), 2048).is_ok());

        let too_long = "a".repeat(2049);
        assert!(matches!(
            normalize_referer(Some(&too_long), 2048),
            Err(ValidationError::RefererTooLong { max: 2048 })
        ));
    }

    #[test]
    fn test_referer_length_counts_characters() {
        let multibyte = "é".repeat(10);
        assert!(normalize_referer(Some(&multibyte), 10).is_ok());
        assert!(normalize_referer(Some(&multibyte), 9).is_err());
    }
}
