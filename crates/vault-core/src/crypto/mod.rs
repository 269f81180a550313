//! Cryptographic primitives for end-to-end encrypted credential storage
//!
//! This module provides:
//! - PBKDF2-HMAC-SHA256 key derivation from the master password
//! - AES-256-GCM envelope encryption of credential records
//! - Secure memory handling with zeroize
//! - A random password generator

mod envelope;
mod generator;
pub(crate) mod key_derivation;
mod secure_memory;

pub use envelope::{decrypt, encrypt, open, seal, Ciphertext};
pub use generator::{
    generate_strong_password, PasswordOptions, DEFAULT_LENGTH, NO_CHARACTERS_SELECTED,
};
pub use key_derivation::{
    derive_key, generate_salt, KdfParams, DEFAULT_ITERATIONS, MIN_ITERATIONS, SALT_LEN,
};
pub use secure_memory::{DerivedKey, KEY_LEN};
