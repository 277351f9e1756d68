//! Repository implementations for SQLite storage

pub mod token;

pub use token::SqliteTokenRepository;
