// ============================
// crates/backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
use scrypt::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Params, Scrypt,
};

use crate::error::AppError;

/// Default scrypt cost (N = 2^15)
pub const DEFAULT_LOG_N: u8 = 15;

/// Fixed work factor used for every new hash
#[derive(Debug, Clone, Copy)]
pub struct HashCost {
    pub log_n: u8,
}

impl HashCost {
    fn params(&self) -> Result<Params, AppError> {
        Params::new(
            self.log_n,
            Params::RECOMMENDED_R,
            Params::RECOMMENDED_P,
            Params::RECOMMENDED_LEN,
        )
        .map_err(|e| AppError::Hashing(e.to_string()))
    }
}

/// Hash a password using scrypt with a random salt
pub fn hash_password(plain: &str, cost: HashCost) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Scrypt
        .hash_password_customized(plain.as_bytes(), None, None, cost.params()?, &salt)
        .map_err(|e| AppError::Hashing(e.to_string()))?
        .to_string();
    Ok(hash)
}

/// Verify a password against a stored hash in constant time.
///
/// The cost parameters are read back from the PHC string, so hashes made
/// with an older work factor still verify.
pub fn verify_password(hash: &str, plain: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Scrypt.verify_password(plain.as_bytes(), &parsed_hash).is_ok()
}
