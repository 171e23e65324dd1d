use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::CryptoError;

pub const HASH_LENGTH: usize = 32;
pub const SALT_LENGTH: usize = 16;

/// Salted PBKDF2-SHA256 password hash, stored base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash {
    pub hash: String,
    pub salt: String,
    pub iterations: u32,
}

impl PasswordHash {
    /// Hash a password with a fresh random salt.
    pub fn derive(password: &str, iterations: u32) -> Self {
        let salt = generate_salt();
        let hash = derive_bytes(password, &salt, iterations);
        Self {
            hash: STANDARD.encode(hash),
            salt: STANDARD.encode(salt),
            iterations,
        }
    }

    /// Constant-time check of a candidate password.
    pub fn verify(&self, password: &str) -> Result<bool, CryptoError> {
        let salt = STANDARD
            .decode(&self.salt)
            .map_err(|_| CryptoError::CorruptedHash)?;
        let expected = STANDARD
            .decode(&self.hash)
            .map_err(|_| CryptoError::CorruptedHash)?;
        if expected.len() != HASH_LENGTH || self.iterations == 0 {
            return Err(CryptoError::CorruptedHash);
        }
        let candidate = derive_bytes(password, &salt, self.iterations);
        Ok(candidate[..].ct_eq(&expected[..]).into())
    }
}

fn derive_bytes(password: &str, salt: &[u8], iterations: u32) -> [u8; HASH_LENGTH] {
    let mut out = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut out);
    out
}

/// Generate a cryptographically random salt
pub fn generate_salt() -> [u8; SALT_LENGTH] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}
