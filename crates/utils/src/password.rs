use crate::{AppError, AppResult};
use rand::RngCore;

const SALT_LEN: usize = 16;

/// Hash a plain-text password into an encoded argon2 string.
pub fn hash_password(password: &str) -> AppResult<String> {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);

    argon2::hash_encoded(password.as_bytes(), &salt, &argon2::Config::default())
        .map_err(|e| AppError::InternalServerErrorWithContext(format!("password hashing failed: {}", e)))
}

/// Compare a plain-text password with a stored hash.
/// Accounts created before the switch to argon2 still carry bcrypt (`$2a$`/`$2b$`/`$2y$`) hashes.
/// A malformed hash compares as a mismatch.
pub fn verify_password(password: &str, encoded: &str) -> bool {
    if encoded.starts_with("$2") {
        return bcrypt::verify(password, encoded).unwrap_or(false);
    }
    argon2::verify_encoded(encoded, password.as_bytes()).unwrap_or(false)
}
