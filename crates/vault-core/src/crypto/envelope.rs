//! AES-256-GCM envelope encryption for credential records
//!
//! Envelope format: `{iv_hex}:{auth_tag_hex}:{ciphertext_hex}`
//! - IV: 12 bytes (96 bits) - standard for GCM
//! - Auth tag: 16 bytes (128 bits)
//! - Ciphertext: variable length
//!
//! The plaintext is the canonical JSON form of the sealed value. Every way a
//! decryption can go wrong collapses into [`VaultError::DecryptionFailed`].

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::{rngs::OsRng, RngCore};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use super::DerivedKey;
use crate::credential::CredentialRecord;
use crate::error::{Result, VaultError};

const IV_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Opaque, storage-safe encrypted payload
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ciphertext(String);

impl Ciphertext {
    /// Borrow the encoded envelope
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the encoded envelope
    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for Ciphertext {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for Ciphertext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parsed envelope with IV and auth tag
#[derive(Debug, Clone)]
struct Envelope {
    iv: [u8; IV_LEN],
    auth_tag: [u8; TAG_LEN],
    ciphertext: Vec<u8>,
}

impl std::fmt::Display for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            hex::encode(self.iv),
            hex::encode(self.auth_tag),
            hex::encode(&self.ciphertext)
        )
    }
}

impl Envelope {
    fn parse(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 {
            return Err(rejected("envelope is not iv:tag:ciphertext"));
        }

        let iv: [u8; IV_LEN] = decode_fixed(parts[0]).ok_or_else(|| rejected("bad IV"))?;
        let auth_tag: [u8; TAG_LEN] =
            decode_fixed(parts[1]).ok_or_else(|| rejected("bad auth tag"))?;
        let ciphertext = hex::decode(parts[2]).map_err(|_| rejected("bad ciphertext hex"))?;

        Ok(Self {
            iv,
            auth_tag,
            ciphertext,
        })
    }
}

fn decode_fixed<const N: usize>(s: &str) -> Option<[u8; N]> {
    hex::decode(s).ok()?.try_into().ok()
}

/// Log the cause and return the single caller-facing failure kind
fn rejected(reason: &str) -> VaultError {
    debug!("Decryption rejected: {}", reason);
    VaultError::DecryptionFailed
}

fn encrypt_bytes(plaintext: &[u8], key: &DerivedKey) -> Result<Envelope> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::EncryptionError(e.to_string()))?;

    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);
    let nonce = Nonce::from_slice(&iv);

    // aes-gcm appends the auth tag to the ciphertext
    let mut sealed = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| VaultError::EncryptionError(e.to_string()))?;

    if sealed.len() < TAG_LEN {
        return Err(VaultError::EncryptionError("Ciphertext too short".to_string()));
    }

    let tag = sealed.split_off(sealed.len() - TAG_LEN);
    let mut auth_tag = [0u8; TAG_LEN];
    auth_tag.copy_from_slice(&tag);

    Ok(Envelope {
        iv,
        auth_tag,
        ciphertext: sealed,
    })
}

fn decrypt_bytes(envelope: &Envelope, key: &DerivedKey) -> Result<Zeroizing<Vec<u8>>> {
    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| rejected("unusable key"))?;

    let nonce = Nonce::from_slice(&envelope.iv);

    let mut with_tag = envelope.ciphertext.clone();
    with_tag.extend_from_slice(&envelope.auth_tag);

    cipher
        .decrypt(nonce, with_tag.as_slice())
        .map(Zeroizing::new)
        .map_err(|_| rejected("authentication failed"))
}

/// Serialize `value` to canonical JSON and encrypt it under `key`
pub fn seal<T: Serialize + ?Sized>(value: &T, key: &DerivedKey) -> Result<Ciphertext> {
    let plaintext = Zeroizing::new(serde_json::to_vec(value)?);
    let envelope = encrypt_bytes(&plaintext, key)?;
    Ok(Ciphertext(envelope.to_string()))
}

/// Decrypt `ciphertext` and parse it back into a `T`
///
/// All-or-nothing: a wrong key, a tampered envelope, an empty or non-text
/// payload and a payload of the wrong shape all fail with
/// [`VaultError::DecryptionFailed`].
pub fn open<T: DeserializeOwned>(ciphertext: &Ciphertext, key: &DerivedKey) -> Result<T> {
    let envelope = Envelope::parse(ciphertext.as_str())?;
    let plaintext = decrypt_bytes(&envelope, key)?;

    let text = std::str::from_utf8(&plaintext).map_err(|_| rejected("payload is not UTF-8"))?;
    if text.is_empty() {
        return Err(rejected("payload is empty"));
    }

    serde_json::from_str(text).map_err(|_| rejected("payload is not a valid record"))
}

/// Encrypt a credential record
pub fn encrypt(record: &CredentialRecord, key: &DerivedKey) -> Result<Ciphertext> {
    seal(record, key)
}

/// Decrypt a credential record
pub fn decrypt(ciphertext: &Ciphertext, key: &DerivedKey) -> Result<CredentialRecord> {
    open(ciphertext, key)
}
