//! Credential hashing for stored login tokens
//!
//! Tokens are persisted only as bcrypt digests. bcrypt is adaptive: its cost
//! factor sets the number of key-expansion rounds (2^cost), so an attacker who
//! obtains the token table has to pay that price for every guess. The digest
//! is self-describing (`$2b$<cost>$<salt><hash>`), so verification needs
//! nothing but the stored string.
//!
//! Both operations are CPU-bound. [`TokenService`](crate::TokenService) runs
//! them on tokio's blocking pool.

use rand::{TryRngCore, rngs::OsRng};

use crate::error::{CryptoError, ValidationError};

/// Cost factor used when none is configured.
pub const DEFAULT_COST: u32 = 10;

/// Smallest cost factor bcrypt accepts.
pub const MIN_COST: u32 = 4;

/// Largest cost factor bcrypt accepts.
pub const MAX_COST: u32 = 31;

/// bcrypt only reads this many bytes of its input.
pub const MAX_SECRET_BYTES: usize = 72;

/// One-way hash and verify primitive for raw tokens.
///
/// Implementations must produce digests that embed everything `verify` needs.
/// `verify` reports a malformed digest as a mismatch rather than an error.
pub trait CredentialHasher: Send + Sync + 'static {
    /// Hash a secret with a freshly generated salt.
    fn hash(&self, secret: &str) -> Result<String, CryptoError>;

    /// Check a secret against a digest previously produced by [`hash`](Self::hash).
    fn verify(&self, secret: &str, digest: &str) -> bool;
}

/// [`CredentialHasher`] backed by bcrypt.
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    /// Create a hasher with the given cost factor.
    ///
    /// Returns a validation error if `cost` is outside `MIN_COST..=MAX_COST`.
    pub fn new(cost: u32) -> Result<Self, ValidationError> {
        if !(MIN_COST..=MAX_COST).contains(&cost) {
            return Err(ValidationError::InvalidCost {
                cost,
                min: MIN_COST,
                max: MAX_COST,
            });
        }
        Ok(Self { cost })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}

impl CredentialHasher for BcryptHasher {
    fn hash(&self, secret: &str) -> Result<String, CryptoError> {
        if secret.len() > MAX_SECRET_BYTES {
            return Err(CryptoError::Hash(format!(
                "Secret exceeds {MAX_SECRET_BYTES} bytes"
            )));
        }
        bcrypt::hash(secret, self.cost).map_err(|e| CryptoError::Hash(e.to_string()))
    }

    fn verify(&self, secret: &str, digest: &str) -> bool {
        // Would otherwise match any secret sharing the first 72 bytes
        if secret.len() > MAX_SECRET_BYTES {
            return false;
        }
        match bcrypt::verify(secret, digest) {
            Ok(matched) => matched,
            Err(e) => {
                tracing::debug!(error = %e, "Stored digest could not be parsed");
                false
            }
        }
    }
}

/// Generate a cryptographically secure random token.
///
/// This produces a 256-bit (32-byte) random token encoded as URL-safe base64
/// without padding (43 characters), suitable for embedding in a magic link.
pub fn generate_secure_token() -> Result<String, CryptoError> {
    let mut bytes = [0u8; 32]; // 256 bits of entropy
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CryptoError::Rng(e.to_string()))?;
    Ok(base64::Engine::encode(
        &base64::engine::general_purpose::URL_SAFE_NO_PAD,
        bytes,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> BcryptHasher {
        BcryptHasher::new(MIN_COST).unwrap()
    }

    #[test]
    fn test_hash_and_verify_token() {
        let hasher = fast_hasher();
        let digest = hasher.hash("test_token_12345").unwrap();

        assert!(hasher.verify("test_token_12345", &digest));
        assert!(!hasher.verify("wrong_token", &digest));
    }

    #[test]
    fn test_digest_is_not_the_plaintext() {
        let hasher = fast_hasher();
        let digest = hasher.hash("abc123").unwrap();

        assert_ne!(digest, "abc123");
        assert!(!digest.contains("abc123"));
    }

    #[test]
    fn test_hash_is_salted() {
        let hasher = fast_hasher();
        let first = hasher.hash("same_token").unwrap();
        let second = hasher.hash("same_token").unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify("same_token", &first));
        assert!(hasher.verify("same_token", &second));
    }

    #[test]
    fn test_digest_embeds_cost() {
        let digest = BcryptHasher::new(5).unwrap().hash("token").unwrap();
        assert!(digest.starts_with("$2"));
        assert!(digest.contains("$05$"));
    }

    #[test]
    fn test_verify_malformed_digest_is_false() {
        let hasher = fast_hasher();
        assert!(!hasher.verify("token", ""));
        assert!(!hasher.verify("token", "not-a-bcrypt-digest"));
        assert!(!hasher.verify("token", "$2b$04$short"));
    }

    #[test]
    fn test_secrets_past_bcrypt_limit_are_refused() {
        let hasher = fast_hasher();
        let prefix = "a".repeat(MAX_SECRET_BYTES);
        let digest = hasher.hash(&prefix).unwrap();

        assert!(hasher.verify(&prefix, &digest));
        assert!(!hasher.verify(&format!("{prefix}extra"), &digest));
        assert!(matches!(
            hasher.hash(&format!("{prefix}extra")),
            Err(CryptoError::Hash(_))
        ));
    }

    #[test]
    fn test_cost_bounds() {
        assert!(BcryptHasher::new(MIN_COST).is_ok());
        assert!(BcryptHasher::new(MAX_COST).is_ok());
        assert!(matches!(
            BcryptHasher::new(3),
            Err(ValidationError::InvalidCost { cost: 3, .. })
        ));
        assert!(BcryptHasher::new(32).is_err());
        assert_eq!(BcryptHasher::default().cost(), DEFAULT_COST);
    }

    #[test]
    fn test_generate_secure_token() {
        let token = generate_secure_token().unwrap();
        assert_eq!(token.len(), 43);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );

        let other = generate_secure_token().unwrap();
        assert_ne!(token, other);
    }
}
