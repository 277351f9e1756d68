//! Repository implementations for PostgreSQL storage

pub mod token;

pub use token::PostgresTokenRepository;
