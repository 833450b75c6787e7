//! Credential hashing and session tokens.

pub mod password;
pub mod token;

pub use password::PasswordHasher;
pub use token::{TokenManager, TokenSubject};
