//! # tokenstore
//!
//! tokenstore keeps the short-lived tokens behind passwordless ("magic link")
//! login. An application generates a token, stores it for a user together with
//! a lifetime and an optional referer URL, and sends the raw token to the user
//! out of band. When the token comes back, [`TokenStore::authenticate`] checks
//! it and hands back the referer so the user can be returned to where they
//! started.
//!
//! Tokens are hashed with bcrypt before they reach storage, each user holds at
//! most one token, and expiry is enforced when a token is presented.
//!
//! ## Storage Support
//!
//! - SQLite (`sqlite` feature, enabled by default)
//! - Postgres (`postgres` feature)
//! - In-process memory, always available
//!
//! ## Example
//!
//! ```rust,no_run
//! use chrono::Duration;
//! use tokenstore::{TokenStore, TokenStoreBuilder, generate_secure_token};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = TokenStoreBuilder::new()
//!         .with_sqlite("sqlite://tokens.db")
//!         .await?
//!         .apply_migrations(true)
//!         .build()
//!         .await?;
//!
//!     let token = generate_secure_token()?;
//!     store
//!         .store_or_update(&token, "user@example.com", Duration::minutes(15), Some("/account"))
//!         .await?;
//!
//!     let result = store.authenticate(&token, "user@example.com").await?;
//!     assert_eq!(result.referer(), Some("/account"));
//!     Ok(())
//! }
//! ```

mod builder;

pub use builder::{NoStorage, TokenStoreBuilder, TokenStoreBuilderError, WithStorage};

/// Re-export core types from tokenstore_core
pub use tokenstore_core::{
    Authentication, BcryptHasher, CredentialHasher, Error, MemoryTokenRepository, TokenRecord,
    TokenRepository, TokenService, TokenStore, TokenStoreConfig, generate_secure_token,
};

/// Error kinds carried inside [`Error`]
pub use tokenstore_core::error::{CryptoError, StorageError, ValidationError};

#[cfg(feature = "sqlite")]
pub use tokenstore_storage_sqlite::{SqliteStorage, SqliteTokenRepository};

#[cfg(feature = "postgres")]
pub use tokenstore_storage_postgres::{PostgresStorage, PostgresTokenRepository};
