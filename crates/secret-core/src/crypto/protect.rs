//! The pluggable protection strategy and how protected values hold it

use std::ops::Deref;
use std::sync::Arc;

use zeroize::Zeroizing;

use super::encoding::base64_decode;
use super::RAND;
use crate::error::Result;

/// Symmetric encrypt/decrypt engine bound to some derived key material.
///
/// Implementations keep their key material behind interior mutability so a
/// shared protector can be disposed (and its secrets cleared) while other
/// holders still reference it; those holders then get
/// [`ProtectError::UseAfterRelease`](crate::ProtectError::UseAfterRelease).
pub trait DataProtect: Send + Sync {
    /// Encrypt plaintext
    fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Decrypt ciphertext; the plaintext is zeroed when the buffer is dropped
    fn decrypt(&self, encrypted_data: &[u8]) -> Result<Zeroizing<Vec<u8>>>;

    /// Clear key material. Idempotent.
    fn dispose(&self);

    /// Whether [`DataProtect::dispose`] has run
    fn is_disposed(&self) -> bool;
}

/// Where the entropy (scoped protection) or salt (password protection) comes from
#[derive(Debug, Clone, Copy)]
pub enum SaltSource<'a> {
    /// Use these exact bytes
    Bytes(&'a [u8]),
    /// Decode from base64; invalid text is a format error
    Base64(&'a str),
    /// Generate this many random bytes. The caller must persist the result
    /// (see the protector's accessors) or the ciphertext cannot be decrypted later.
    Random(usize),
}

impl SaltSource<'_> {
    /// Default length for generated entropy and salts
    pub const DEFAULT_LENGTH: usize = 128;

    /// Materialize the bytes
    pub fn resolve(&self) -> Result<Vec<u8>> {
        match self {
            Self::Bytes(bytes) => Ok(bytes.to_vec()),
            Self::Base64(encoded) => base64_decode(encoded),
            Self::Random(len) => Ok(RAND.next_bytes(*len)),
        }
    }
}

impl Default for SaltSource<'_> {
    fn default() -> Self {
        Self::Random(Self::DEFAULT_LENGTH)
    }
}

/// A protected value's hold on its protector.
///
/// Only `Owned` protectors are disposed together with the value. `Shared`
/// protectors serve many values, e.g. so that one password can be rotated
/// across a set of stored secrets.
pub enum ProtectorRef<P: DataProtect> {
    Owned(P),
    Shared(Arc<P>),
}

impl<P: DataProtect> ProtectorRef<P> {
    /// Whether the value owns its protector
    pub fn is_owned(&self) -> bool {
        matches!(self, Self::Owned(_))
    }

    /// Dispose the protector if owned; a shared protector is left alone
    pub(crate) fn release(&self) {
        if let Self::Owned(protector) = self {
            protector.dispose();
        }
    }
}

impl<P: DataProtect> Deref for ProtectorRef<P> {
    type Target = P;

    fn deref(&self) -> &P {
        match self {
            Self::Owned(protector) => protector,
            Self::Shared(protector) => protector,
        }
    }
}

impl<P: DataProtect> From<P> for ProtectorRef<P> {
    fn from(protector: P) -> Self {
        Self::Owned(protector)
    }
}

impl<P: DataProtect> From<Arc<P>> for ProtectorRef<P> {
    fn from(protector: Arc<P>) -> Self {
        Self::Shared(protector)
    }
}

impl<P: DataProtect> std::fmt::Debug for ProtectorRef<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Owned(_) => f.write_str("ProtectorRef::Owned"),
            Self::Shared(_) => f.write_str("ProtectorRef::Shared"),
        }
    }
}
