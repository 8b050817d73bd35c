use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Stored password hash is malformed: {0}")]
    MalformedHash(String),
}

/// Hash a plaintext password with a fresh salt at the given bcrypt cost
pub fn hash_password(plain: &str, cost: u32) -> Result<String, PasswordError> {
    bcrypt::hash(plain, cost).map_err(|e| PasswordError::Hashing(e.to_string()))
}

/// Compare a plaintext password against a stored bcrypt hash.
///
/// `Ok(false)` is a plain mismatch; an `Err` means the stored hash could not
/// be parsed at all.
pub fn verify_password(plain: &str, hash: &str) -> Result<bool, PasswordError> {
    bcrypt::verify(plain, hash).map_err(|e| PasswordError::MalformedHash(e.to_string()))
}
