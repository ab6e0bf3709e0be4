//! Cryptographic primitives behind the protected values
//!
//! This module provides:
//! - The [`DataProtect`] strategy and its two implementations
//! - AES block modes (PBE) and AES-256-GCM sealing (scope keys)
//! - PBKDF2-HMAC-SHA1 / Argon2id key derivation
//! - A process-wide CSPRNG and zeroizing memory helpers

mod encoding;
mod encryption;
mod key_derivation;
mod password;
mod protect;
mod random;
mod scoped;
mod secure_memory;

pub use encoding::{base64_decode, base64_encode, decode_chars, encode_chars};
pub use encryption::{
    decrypt_blocks, encrypt_blocks, open, seal, CipherMode, KeySize, PaddingMode, BLOCK_LEN, NONCE_LEN,
    TAG_LEN,
};
pub use key_derivation::{derive_bytes, Argon2Params, Kdf};
pub use password::{PasswordOptions, PasswordProtect, DEFAULT_ITERATION_COUNT, MIN_SALT_LENGTH};
pub use protect::{DataProtect, ProtectorRef, SaltSource};
pub use random::{AsciiCategory, CryptoRandom, RAND};
pub use scoped::ScopedProtect;
pub use secure_memory::{clear_bytes, clear_chars, ScopeKey, SecretString};
