use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use log::{debug, error};

use crate::error::AppError;

/// Stored form of a password: argon2 PHC string plus the account salt that
/// is prefixed to the plaintext before hashing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedPassword {
    pub hash: String,
    pub salt: String,
}

/// Hashes a password with a fresh account salt
///
/// # Arguments
/// * `password` - The plaintext password
///
/// # Returns
/// * `Result<HashedPassword, AppError>` - Hash and salt to store, or error
pub fn hash_password(password: &str) -> Result<HashedPassword, AppError> {
    debug!("Generating password hash");
    let salt = SaltString::generate(&mut OsRng).as_str().to_string();
    let salted = format!("{}{}", salt, password);

    let phc_salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(salted.as_bytes(), &phc_salt)
        .map_err(|e| {
            error!("Couldn't generate password hash: {}", e);
            AppError::Internal(format!("Couldn't generate password: {}", e))
        })?
        .to_string();

    Ok(HashedPassword { hash, salt })
}

/// Checks a plaintext password against a stored salt and hash
///
/// # Returns
/// * `bool` - True when the password matches; false on mismatch or an
///   unreadable hash
pub fn verify_password(password: &str, salt: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            error!("Stored password hash is unreadable: {}", e);
            return false;
        }
    };
    let salted = format!("{}{}", salt, password);
    Argon2::default()
        .verify_password(salted.as_bytes(), &parsed)
        .is_ok()
}
