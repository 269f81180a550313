//! Password-based key derivation using PBKDF2-HMAC-SHA256

use pbkdf2::pbkdf2_hmac;
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use zeroize::Zeroize;

use super::{DerivedKey, KEY_LEN};
use crate::error::{Result, VaultError};

/// Default PBKDF2 iteration count
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Lowest iteration count accepted. Anything cheaper makes offline guessing
/// of the master password practical.
pub const MIN_ITERATIONS: u32 = DEFAULT_ITERATIONS;

/// Salt length in bytes (128 bits)
pub const SALT_LEN: usize = 16;

/// Parameters for PBKDF2 key derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Iteration count (default: 100,000)
    pub iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl KdfParams {
    /// Reject parameters weaker than the minimum
    pub fn validate(&self) -> Result<()> {
        if self.iterations < MIN_ITERATIONS {
            return Err(VaultError::InvalidInput(format!(
                "Iteration count {} is below the minimum of {}",
                self.iterations, MIN_ITERATIONS
            )));
        }
        Ok(())
    }
}

/// Generate a cryptographically secure random salt, hex encoded
pub fn generate_salt() -> String {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    hex::encode(salt)
}

/// Derive a 256-bit key from the master password and the account salt
///
/// # Arguments
/// * `password` - The master password (must not be empty)
/// * `salt` - Hex-encoded salt (use `generate_salt()` to create one)
/// * `params` - Optional derivation parameters
///
/// The same `(password, salt, params)` always yields the same key.
pub fn derive_key(password: &str, salt: &str, params: Option<KdfParams>) -> Result<DerivedKey> {
    let params = params.unwrap_or_default();
    params.validate()?;

    if password.is_empty() {
        return Err(VaultError::InvalidInput(
            "Master password must not be empty".to_string(),
        ));
    }

    let salt_bytes = decode_salt(salt)?;

    let mut key_bytes = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(
        password.as_bytes(),
        &salt_bytes,
        params.iterations,
        &mut key_bytes,
    );

    let key = DerivedKey::new(key_bytes);
    key_bytes.zeroize();
    Ok(key)
}

fn decode_salt(salt: &str) -> Result<Vec<u8>> {
    if salt.is_empty() {
        return Err(VaultError::InvalidInput("Salt must not be empty".to_string()));
    }

    hex::decode(salt).map_err(|e| VaultError::InvalidInput(format!("Invalid salt: {}", e)))
}
