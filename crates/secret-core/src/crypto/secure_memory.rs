//! Secure memory handling with automatic zeroization

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Overwrite every byte with zero.
///
/// Writes go through `zeroize`, which uses volatile stores and a compiler
/// fence so they cannot be elided. Copies made earlier by reallocation are out
/// of reach. Always returns `true`.
pub fn clear_bytes(bytes: &mut [u8]) -> bool {
    bytes.zeroize();
    true
}

/// Overwrite every char with `'\0'`. Same guarantees as [`clear_bytes`].
pub fn clear_chars(chars: &mut [char]) -> bool {
    chars.zeroize();
    true
}

/// 256-bit scope key used by the local protection facility - zeroed when dropped
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ScopeKey {
    key: [u8; 32],
}

impl ScopeKey {
    /// Key length in bytes
    pub const LEN: usize = 32;

    /// Create a new scope key from raw bytes
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Generate a fresh random key
    pub fn generate() -> Self {
        let mut key = [0u8; 32];
        super::RAND.fill_bytes(&mut key);
        Self { key }
    }

    /// Get the key bytes (use carefully - avoid copying)
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.key
    }

    /// Create from a slice (must be exactly 32 bytes)
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() != Self::LEN {
            return None;
        }
        let mut key = [0u8; 32];
        key.copy_from_slice(slice);
        Some(Self { key })
    }
}

impl Clone for ScopeKey {
    fn clone(&self) -> Self {
        Self { key: self.key }
    }
}

impl std::fmt::Debug for ScopeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Decrypted secret value - automatically zeroed when dropped
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    /// Create a new secret string
    pub fn new(value: String) -> Self {
        Self { value }
    }

    /// Build from a char buffer, clearing the buffer after the transfer
    pub fn from_chars(chars: &mut [char]) -> Self {
        let mut value = String::with_capacity(chars.iter().map(|c| c.len_utf8()).sum());
        value.extend(chars.iter());
        clear_chars(chars);
        Self { value }
    }

    /// Get the secret value (use carefully)
    pub fn expose(&self) -> &str {
        &self.value
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.value.len()
    }

    /// Whether the secret is empty
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Consume and return the inner value
    pub fn into_inner(mut self) -> String {
        std::mem::take(&mut self.value)
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretString")
            .field("value", &"[REDACTED]")
            .finish()
    }
}
