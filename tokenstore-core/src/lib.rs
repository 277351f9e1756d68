//! Core functionality for the tokenstore project
//!
//! This crate implements the lifecycle of passwordless login tokens: issuing a
//! token for a user, checking a presented token, and removing tokens again.
//!
//! Raw tokens never reach storage. They are hashed with a [`CredentialHasher`]
//! (bcrypt by default) and persisted through a [`TokenRepository`]. Each user
//! has at most one token; issuing a new one replaces the old.
//!
//! See [`TokenStore`] for the operations, [`TokenService`] for the
//! implementation, and [`MemoryTokenRepository`] for an in-process backend.
//! SQL backends live in the `tokenstore-storage-*` crates.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use chrono::Duration;
//! use tokenstore_core::{MemoryTokenRepository, TokenService, TokenStore, TokenStoreConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), tokenstore_core::Error> {
//! let config = TokenStoreConfig::default().with_bcrypt_cost(4);
//! let store = TokenService::with_config(Arc::new(MemoryTokenRepository::new()), config)?;
//!
//! store
//!     .store_or_update("abc123", "user1", Duration::minutes(1), Some("/dashboard"))
//!     .await?;
//!
//! let result = store.authenticate("abc123", "user1").await?;
//! assert_eq!(result.referer(), Some("/dashboard"));
//! # Ok(())
//! # }
//! ```
pub mod config;
pub mod crypto;
pub mod error;
pub mod repositories;
pub mod services;
pub mod storage;
pub mod store;
pub mod validation;

pub use config::TokenStoreConfig;
pub use crypto::{BcryptHasher, CredentialHasher, generate_secure_token};
pub use error::Error;
pub use repositories::{MemoryTokenRepository, TokenRepository};
pub use services::TokenService;
pub use storage::{Authentication, TokenRecord};
pub use store::TokenStore;
