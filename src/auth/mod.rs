//! Credential primitives: bcrypt password hashes and the opaque session token.

pub mod password;
pub mod token;

pub use password::{hash_password, verify_password, PasswordError};
pub use token::{issue_token, parse_token, validate_token, SessionToken};
