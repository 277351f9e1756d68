use serde::{Deserialize, Serialize};

use crate::{
    crypto::{DEFAULT_COST, MAX_COST, MIN_COST},
    error::ValidationError,
};

/// Longest referer URL a record may carry, in characters.
pub const DEFAULT_MAX_REFERER_LENGTH: usize = 2048;

/// Settings applied when a token store is constructed.
///
/// Deserializes with every field optional, so an application can embed it in
/// its own config file and override only what it needs.
///
/// # Example
///
/// ```rust
/// use tokenstore_core::TokenStoreConfig;
///
/// let config = TokenStoreConfig::default().with_bcrypt_cost(12);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenStoreConfig {
    /// bcrypt cost factor used when hashing new tokens
    pub bcrypt_cost: u32,
    /// Referers longer than this are rejected
    pub max_referer_length: usize,
}

impl Default for TokenStoreConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: DEFAULT_COST,
            max_referer_length: DEFAULT_MAX_REFERER_LENGTH,
        }
    }
}

impl TokenStoreConfig {
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    pub fn with_max_referer_length(mut self, length: usize) -> Self {
        self.max_referer_length = length;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(MIN_COST..=MAX_COST).contains(&self.bcrypt_cost) {
            return Err(ValidationError::InvalidCost {
                cost: self.bcrypt_cost,
                min: MIN_COST,
                max: MAX_COST,
            });
        }

        self.validate_limits()
    }

    /// Checks every setting except the bcrypt cost.
    pub fn validate_limits(&self) -> Result<(), ValidationError> {
        if self.max_referer_length == 0 {
            return Err(ValidationError::InvalidField(
                "max_referer_length must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TokenStoreConfig::default();
        assert_eq!(config.bcrypt_cost, 10);
        assert_eq!(config.max_referer_length, 2048);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(
            TokenStoreConfig::default()
                .with_bcrypt_cost(2)
                .validate()
                .is_err()
        );
        assert!(
            TokenStoreConfig::default()
                .with_max_referer_length(0)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_validate_limits_ignores_cost() {
        let config = TokenStoreConfig::default().with_bcrypt_cost(99);
        assert!(config.validate().is_err());
        assert!(config.validate_limits().is_ok());
        assert!(config.with_max_referer_length(0).validate_limits().is_err());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: TokenStoreConfig = serde_json::from_str(r#"{"bcrypt_cost": 12}"#).unwrap();
        assert_eq!(config.bcrypt_cost, 12);
        assert_eq!(config.max_referer_length, DEFAULT_MAX_REFERER_LENGTH);

        let config: TokenStoreConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, TokenStoreConfig::default());
    }
}
