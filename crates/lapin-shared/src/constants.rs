/// Application name
pub const APP_NAME: &str = "Lapin Forms";

/// XChaCha20-Poly1305 nonce size in bytes
pub const NONCE_SIZE: usize = 24;

/// Symmetric data-key size in bytes (for XChaCha20-Poly1305)
pub const DATA_KEY_SIZE: usize = 32;

/// Hex length of a deployment encryption key (32 bytes, lowercase hex)
pub const DATA_KEY_HEX_LEN: usize = 64;

/// Key derivation contexts (BLAKE3)
pub const KDF_CONTEXT_DUPLICATE_KEY: &str = "lapin-duplicate-check-v1";
