//! Service layer for business logic
//!
//! [`TokenService`] implements the token lifecycle on top of a
//! [`TokenRepository`](crate::repositories::TokenRepository).

pub mod token;

pub use token::TokenService;
