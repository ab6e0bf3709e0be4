//! Values that keep their secret encrypted in memory
//!
//! [`ProtectedByteArray`] and [`ProtectedString`] hold ciphertext only and
//! decrypt on demand. Each holds its [`DataProtect`] either owned (disposed
//! with the value) or shared through an `Arc` (left to whoever rotates it).

mod byte_array;
mod local;
mod password;
mod string;

use std::sync::Arc;

use zeroize::Zeroizing;

use crate::crypto::DataProtect;
use crate::error::Result;

pub use byte_array::ProtectedByteArray;
pub use local::{LocalProtectedByteArray, LocalProtectedString};
pub use password::{PasswordProtectedByteArray, PasswordProtectedString};
pub use string::ProtectedString;

/// Common surface of protected values
pub trait ProtectedValue {
    /// Raw ciphertext
    fn encrypted_data(&self) -> Result<&[u8]>;

    /// Ciphertext as base64
    fn encrypted_data_base64(&self) -> Result<String>;

    /// Plaintext bytes, zeroed when the buffer drops. Never cached.
    fn decrypt(&self) -> Result<Zeroizing<Vec<u8>>>;

    /// Zero the ciphertext and dispose an owned protector. Idempotent.
    fn dispose(&mut self);

    fn is_disposed(&self) -> bool;
}

/// Builders for values that share one protector
pub trait SharedProtector<P: DataProtect> {
    fn create_protected_byte_array_from_data(&self, data: &[u8]) -> Result<ProtectedByteArray<P>>;

    fn create_protected_byte_array_from_encrypted_data(&self, encrypted_data: Vec<u8>) -> ProtectedByteArray<P>;

    fn create_protected_byte_array_from_encrypted_data_base64(
        &self,
        encrypted_data: &str,
    ) -> Result<ProtectedByteArray<P>>;

    fn create_protected_string_from_str(&self, text: &str) -> Result<ProtectedString<P>>;

    fn create_protected_string_from_chars(&self, chars: &[char]) -> Result<ProtectedString<P>>;

    fn create_protected_string_from_encrypted_data(&self, encrypted_data: Vec<u8>) -> ProtectedString<P>;

    fn create_protected_string_from_encrypted_data_base64(
        &self,
        encrypted_data: &str,
    ) -> Result<ProtectedString<P>>;

    /// Decrypt `source` under its own protector and re-encrypt under this one
    fn convert_to_protected_byte_array<Q: DataProtect>(
        &self,
        source: &ProtectedByteArray<Q>,
    ) -> Result<ProtectedByteArray<P>>;

    /// String form of [`SharedProtector::convert_to_protected_byte_array`]
    fn convert_to_protected_string<Q: DataProtect>(
        &self,
        source: &ProtectedString<Q>,
    ) -> Result<ProtectedString<P>>;
}

impl<P: DataProtect> SharedProtector<P> for Arc<P> {
    fn create_protected_byte_array_from_data(&self, data: &[u8]) -> Result<ProtectedByteArray<P>> {
        ProtectedByteArray::with_data(data, self.clone())
    }

    fn create_protected_byte_array_from_encrypted_data(&self, encrypted_data: Vec<u8>) -> ProtectedByteArray<P> {
        ProtectedByteArray::with_encrypted_data(encrypted_data, self.clone())
    }

    fn create_protected_byte_array_from_encrypted_data_base64(
        &self,
        encrypted_data: &str,
    ) -> Result<ProtectedByteArray<P>> {
        ProtectedByteArray::with_encrypted_data_base64(encrypted_data, self.clone())
    }

    fn create_protected_string_from_str(&self, text: &str) -> Result<ProtectedString<P>> {
        ProtectedString::with_str(text, self.clone())
    }

    fn create_protected_string_from_chars(&self, chars: &[char]) -> Result<ProtectedString<P>> {
        ProtectedString::with_chars(chars, self.clone())
    }

    fn create_protected_string_from_encrypted_data(&self, encrypted_data: Vec<u8>) -> ProtectedString<P> {
        ProtectedString::with_encrypted_data(encrypted_data, self.clone())
    }

    fn create_protected_string_from_encrypted_data_base64(
        &self,
        encrypted_data: &str,
    ) -> Result<ProtectedString<P>> {
        ProtectedString::with_encrypted_data_base64(encrypted_data, self.clone())
    }

    fn convert_to_protected_byte_array<Q: DataProtect>(
        &self,
        source: &ProtectedByteArray<Q>,
    ) -> Result<ProtectedByteArray<P>> {
        source.convert_to(self.clone())
    }

    fn convert_to_protected_string<Q: DataProtect>(
        &self,
        source: &ProtectedString<Q>,
    ) -> Result<ProtectedString<P>> {
        source.convert_to(self.clone())
    }
}
