use thiserror::Error;

/// Errors returned by every token store operation.
///
/// The three variants map onto the three failure kinds a caller has to tell
/// apart: bad input, a failed hashing primitive, and a failed backend.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Cryptographic error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Invalid lifetime: {0}")]
    InvalidLifetime(String),

    #[error("Referer is longer than {max} characters")]
    RefererTooLong { max: usize },

    #[error("Invalid hash cost {cost}: must be between {min} and {max}")]
    InvalidCost { cost: u32, min: u32, max: u32 },
}

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Token hashing failed: {0}")]
    Hash(String),

    #[error("Random number generator unavailable: {0}")]
    Rng(String),

    #[error("Hashing task failed: {0}")]
    Task(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

impl Error {
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub fn is_crypto_error(&self) -> bool {
        matches!(self, Error::Crypto(_))
    }

    pub fn is_storage_error(&self) -> bool {
        matches!(self, Error::Storage(_))
    }

    /// Whether retrying the same call later could succeed.
    ///
    /// Only connection-level backend failures qualify; the store itself never
    /// retries.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Storage(StorageError::Connection(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let validation_error = Error::Validation(ValidationError::MissingField("uid".to_string()));
        assert_eq!(
            validation_error.to_string(),
            "Validation error: Missing required field: uid"
        );

        let storage_error = Error::Storage(StorageError::Database("disk full".to_string()));
        assert_eq!(
            storage_error.to_string(),
            "Storage error: Database error: disk full"
        );

        let crypto_error = Error::Crypto(CryptoError::Hash("invalid cost".to_string()));
        assert_eq!(
            crypto_error.to_string(),
            "Cryptographic error: Token hashing failed: invalid cost"
        );
    }

    #[test]
    fn test_validation_error_variants() {
        let too_long = ValidationError::RefererTooLong { max: 2048 };
        assert_eq!(too_long.to_string(), "Referer is longer than 2048 characters");

        let cost = ValidationError::InvalidCost {
            cost: 40,
            min: 4,
            max: 31,
        };
        assert_eq!(
            cost.to_string(),
            "Invalid hash cost 40: must be between 4 and 31"
        );
    }

    #[test]
    fn test_error_kind_helpers() {
        let validation: Error = ValidationError::MissingField("token".to_string()).into();
        assert!(validation.is_validation_error());
        assert!(!validation.is_storage_error());
        assert!(!validation.is_crypto_error());

        let crypto: Error = CryptoError::Task("cancelled".to_string()).into();
        assert!(crypto.is_crypto_error());
        assert!(!crypto.is_validation_error());

        let storage: Error = StorageError::Constraint("token_hash".to_string()).into();
        assert!(storage.is_storage_error());
        assert!(!storage.is_transient());
    }

    #[test]
    fn test_connection_errors_are_transient() {
        let err: Error = StorageError::Connection("pool timed out".to_string()).into();
        assert!(err.is_transient());

        let err: Error = StorageError::Database("syntax error".to_string()).into();
        assert!(!err.is_transient());
    }
}
