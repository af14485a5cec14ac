//! Field-level encryption for submission payloads.
//!
//! Submission `data`/`metadata` documents hold end-user PII, so the store
//! keeps them as XChaCha20-Poly1305 ciphertext on disk.  The 256-bit data
//! key comes from the deployment's `ENCRYPTION_KEY` configuration value
//! (64 lowercase hex characters).

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::RngCore;

use crate::constants::{DATA_KEY_HEX_LEN, NONCE_SIZE};
use crate::error::CryptoError;

pub type DataKey = [u8; 32];

/// Generate a fresh random 256-bit data key.
pub fn generate_data_key() -> DataKey {
    let mut key = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut key);
    key
}

/// Generate a deployment encryption key as 64 lowercase hex characters,
/// ready to paste into the configuration file.
pub fn generate_key_hex() -> String {
    hex::encode(generate_data_key())
}

/// Parse a 64-hex-character encryption key into a 32-byte data key.
pub fn parse_key_hex(s: &str) -> Result<DataKey, CryptoError> {
    let s = s.trim();
    if s.len() != DATA_KEY_HEX_LEN {
        return Err(CryptoError::InvalidKeyLength {
            expected: DATA_KEY_HEX_LEN,
            got: s.len(),
        });
    }

    let bytes = hex::decode(s).map_err(|_| CryptoError::InvalidKeyEncoding)?;
    let mut key = [0u8; 32];
    key.copy_from_slice(&bytes);
    Ok(key)
}

pub fn generate_nonce() -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    nonce
}

// Returns nonce || ciphertext (24 bytes nonce prepended)
pub fn encrypt(key: &DataKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = XChaCha20Poly1305::new(key.into());
    let nonce_bytes = generate_nonce();
    let nonce = XNonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| CryptoError::EncryptionFailed)?;

    let mut output = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    output.extend_from_slice(&nonce_bytes);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

pub fn decrypt(key: &DataKey, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if data.len() < NONCE_SIZE {
        return Err(CryptoError::DecryptionFailed);
    }

    let (nonce_bytes, ciphertext) = data.split_at(NONCE_SIZE);
    let cipher = XChaCha20Poly1305::new(key.into());
    let nonce = XNonce::from_slice(nonce_bytes);

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| CryptoError::DecryptionFailed)
}
