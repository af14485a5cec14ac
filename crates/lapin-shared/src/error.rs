use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Decryption failed: invalid ciphertext or wrong key")]
    DecryptionFailed,

    #[error("Invalid key: expected {expected} hex characters, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("Invalid key: not a hex string")]
    InvalidKeyEncoding,
}
