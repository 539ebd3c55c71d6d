//! Authentication primitives.
//!
//! - [`password`] -- Argon2id hashing of the access authorization code.
//! - [`jwt`] -- access-token generation and validation.
//! - [`session`] -- revocation list and login throttling.

pub mod jwt;
pub mod password;
pub mod session;
