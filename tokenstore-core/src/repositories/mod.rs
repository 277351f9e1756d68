//! Repository traits for data access layer
//!
//! [`TokenRepository`] is the only seam between the token store and its
//! persistence backend. Storage crates implement it over a database pool;
//! [`MemoryTokenRepository`] implements it in process.

pub mod memory;
pub mod token;

pub use memory::MemoryTokenRepository;
pub use token::TokenRepository;
