//! Symmetric primitives: AES block modes for password-based protection and
//! AES-256-GCM sealing for the local protection facility.
//!
//! Sealed format: `{nonce (12 bytes)}{ciphertext}{auth tag (16 bytes)}`

use aes::{Aes128, Aes192, Aes256};
use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use cbc::cipher::block_padding::{AnsiX923, NoPadding, Pkcs7, ZeroPadding};
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, InvalidLength, KeyInit, KeyIvInit};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::{ScopeKey, RAND};
use crate::error::{ProtectError, Result};

/// AES block size in bytes
pub const BLOCK_LEN: usize = 16;
/// GCM nonce length
pub const NONCE_LEN: usize = 12;
/// GCM authentication tag length
pub const TAG_LEN: usize = 16;

/// AES key size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum KeySize {
    Aes128,
    Aes192,
    #[default]
    Aes256,
}

impl KeySize {
    /// Key size in bits
    pub fn bits(self) -> u32 {
        match self {
            Self::Aes128 => 128,
            Self::Aes192 => 192,
            Self::Aes256 => 256,
        }
    }

    /// Key size in bytes
    pub fn bytes(self) -> usize {
        (self.bits() >> 3) as usize
    }

    /// Parse a bit count
    pub fn from_bits(bits: u32) -> Result<Self> {
        match bits {
            128 => Ok(Self::Aes128),
            192 => Ok(Self::Aes192),
            256 => Ok(Self::Aes256),
            other => Err(ProtectError::Range(format!(
                "key size must be 128, 192 or 256 bits, got {}",
                other
            ))),
        }
    }
}

impl TryFrom<u32> for KeySize {
    type Error = ProtectError;

    fn try_from(bits: u32) -> Result<Self> {
        Self::from_bits(bits)
    }
}

impl From<KeySize> for u32 {
    fn from(size: KeySize) -> Self {
        size.bits()
    }
}

/// Block cipher mode of operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CipherMode {
    #[default]
    Cbc,
    /// No IV; equal plaintext blocks give equal ciphertext blocks
    Ecb,
}

/// Block padding scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaddingMode {
    /// Input must already be a multiple of the block size
    None,
    #[default]
    Pkcs7,
    /// Trailing zero bytes of the plaintext are not preserved
    Zeros,
    AnsiX923,
}

fn invalid_length(e: InvalidLength) -> ProtectError {
    ProtectError::CryptoFailure(format!("Invalid key or IV length: {}", e))
}

fn encrypt_with<E: BlockEncryptMut>(encryptor: E, padding: PaddingMode, data: &[u8]) -> Result<Vec<u8>> {
    let ciphertext = match padding {
        PaddingMode::Pkcs7 => encryptor.encrypt_padded_vec_mut::<Pkcs7>(data),
        PaddingMode::Zeros => encryptor.encrypt_padded_vec_mut::<ZeroPadding>(data),
        PaddingMode::AnsiX923 => encryptor.encrypt_padded_vec_mut::<AnsiX923>(data),
        PaddingMode::None => {
            if data.len() % BLOCK_LEN != 0 {
                return Err(ProtectError::Range(format!(
                    "data length {} is not a multiple of the block size without padding",
                    data.len()
                )));
            }
            encryptor.encrypt_padded_vec_mut::<NoPadding>(data)
        }
    };

    Ok(ciphertext)
}

fn decrypt_with<D: BlockDecryptMut>(
    decryptor: D,
    padding: PaddingMode,
    data: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    if data.len() % BLOCK_LEN != 0 {
        return Err(ProtectError::CryptoFailure(format!(
            "ciphertext length {} is not a multiple of the block size",
            data.len()
        )));
    }

    let plaintext = match padding {
        PaddingMode::Pkcs7 => decryptor.decrypt_padded_vec_mut::<Pkcs7>(data),
        PaddingMode::Zeros => decryptor.decrypt_padded_vec_mut::<ZeroPadding>(data),
        PaddingMode::AnsiX923 => decryptor.decrypt_padded_vec_mut::<AnsiX923>(data),
        PaddingMode::None => decryptor.decrypt_padded_vec_mut::<NoPadding>(data),
    };

    plaintext
        .map(Zeroizing::new)
        .map_err(|_| ProtectError::CryptoFailure("Padding is invalid and cannot be removed".to_string()))
}

/// Encrypt with AES in the given mode. The AES variant follows `key.len()`.
pub fn encrypt_blocks(
    key: &[u8],
    iv: &[u8; BLOCK_LEN],
    mode: CipherMode,
    padding: PaddingMode,
    data: &[u8],
) -> Result<Vec<u8>> {
    match (mode, key.len()) {
        (CipherMode::Cbc, 16) => encrypt_with(
            cbc::Encryptor::<Aes128>::new_from_slices(key, iv).map_err(invalid_length)?,
            padding,
            data,
        ),
        (CipherMode::Cbc, 24) => encrypt_with(
            cbc::Encryptor::<Aes192>::new_from_slices(key, iv).map_err(invalid_length)?,
            padding,
            data,
        ),
        (CipherMode::Cbc, 32) => encrypt_with(
            cbc::Encryptor::<Aes256>::new_from_slices(key, iv).map_err(invalid_length)?,
            padding,
            data,
        ),
        (CipherMode::Ecb, 16) => encrypt_with(
            ecb::Encryptor::<Aes128>::new_from_slice(key).map_err(invalid_length)?,
            padding,
            data,
        ),
        (CipherMode::Ecb, 24) => encrypt_with(
            ecb::Encryptor::<Aes192>::new_from_slice(key).map_err(invalid_length)?,
            padding,
            data,
        ),
        (CipherMode::Ecb, 32) => encrypt_with(
            ecb::Encryptor::<Aes256>::new_from_slice(key).map_err(invalid_length)?,
            padding,
            data,
        ),
        (_, other) => Err(ProtectError::Range(format!("unsupported AES key length {}", other))),
    }
}

/// Decrypt with AES in the given mode. Padding failures are crypto failures.
pub fn decrypt_blocks(
    key: &[u8],
    iv: &[u8; BLOCK_LEN],
    mode: CipherMode,
    padding: PaddingMode,
    data: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    match (mode, key.len()) {
        (CipherMode::Cbc, 16) => decrypt_with(
            cbc::Decryptor::<Aes128>::new_from_slices(key, iv).map_err(invalid_length)?,
            padding,
            data,
        ),
        (CipherMode::Cbc, 24) => decrypt_with(
            cbc::Decryptor::<Aes192>::new_from_slices(key, iv).map_err(invalid_length)?,
            padding,
            data,
        ),
        (CipherMode::Cbc, 32) => decrypt_with(
            cbc::Decryptor::<Aes256>::new_from_slices(key, iv).map_err(invalid_length)?,
            padding,
            data,
        ),
        (CipherMode::Ecb, 16) => decrypt_with(
            ecb::Decryptor::<Aes128>::new_from_slice(key).map_err(invalid_length)?,
            padding,
            data,
        ),
        (CipherMode::Ecb, 24) => decrypt_with(
            ecb::Decryptor::<Aes192>::new_from_slice(key).map_err(invalid_length)?,
            padding,
            data,
        ),
        (CipherMode::Ecb, 32) => decrypt_with(
            ecb::Decryptor::<Aes256>::new_from_slice(key).map_err(invalid_length)?,
            padding,
            data,
        ),
        (_, other) => Err(ProtectError::Range(format!("unsupported AES key length {}", other))),
    }
}

/// Seal `plaintext` under `key` with AES-256-GCM, binding `aad`
pub fn seal(key: &ScopeKey, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| ProtectError::CryptoFailure(e.to_string()))?;

    // Generate random nonce (12 bytes for GCM)
    let mut nonce = [0u8; NONCE_LEN];
    RAND.fill_bytes(&mut nonce);

    // aes-gcm appends the auth tag to the ciphertext
    let ciphertext_with_tag = cipher
        .encrypt(Nonce::from_slice(&nonce), Payload { msg: plaintext, aad })
        .map_err(|e| ProtectError::CryptoFailure(format!("Encryption failed: {}", e)))?;

    let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext_with_tag.len());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext_with_tag);
    Ok(sealed)
}

/// Open data produced by [`seal`]; any key, aad or ciphertext mismatch fails
pub fn open(key: &ScopeKey, sealed: &[u8], aad: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    if sealed.len() < NONCE_LEN + TAG_LEN {
        return Err(ProtectError::CryptoFailure(format!(
            "Sealed data too short: {} bytes",
            sealed.len()
        )));
    }

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| ProtectError::CryptoFailure(e.to_string()))?;

    let (nonce, ciphertext_with_tag) = sealed.split_at(NONCE_LEN);

    cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext_with_tag,
                aad,
            },
        )
        .map(Zeroizing::new)
        .map_err(|e| ProtectError::CryptoFailure(format!("Decryption failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_iv(size: KeySize) -> (Vec<u8>, [u8; BLOCK_LEN]) {
        let key = RAND.next_bytes(size.bytes());
        let mut iv = [0u8; BLOCK_LEN];
        RAND.fill_bytes(&mut iv);
        (key, iv)
    }

    #[test]
    fn test_block_roundtrip_all_sizes_and_modes() {
        let plaintext = b"attack at dawn, bring snacks";

        for size in [KeySize::Aes128, KeySize::Aes192, KeySize::Aes256] {
            for mode in [CipherMode::Cbc, CipherMode::Ecb] {
                for padding in [PaddingMode::Pkcs7, PaddingMode::AnsiX923, PaddingMode::Zeros] {
                    let (key, iv) = key_iv(size);
                    let ciphertext = encrypt_blocks(&key, &iv, mode, padding, plaintext).unwrap();
                    assert_eq!(ciphertext.len() % BLOCK_LEN, 0);

                    let decrypted = decrypt_blocks(&key, &iv, mode, padding, &ciphertext).unwrap();
                    assert_eq!(decrypted.as_slice(), plaintext);
                }
            }
        }
    }

    #[test]
    fn test_pkcs7_empty_input() {
        let (key, iv) = key_iv(KeySize::Aes256);
        let ciphertext = encrypt_blocks(&key, &iv, CipherMode::Cbc, PaddingMode::Pkcs7, b"").unwrap();
        assert_eq!(ciphertext.len(), BLOCK_LEN);

        let decrypted =
            decrypt_blocks(&key, &iv, CipherMode::Cbc, PaddingMode::Pkcs7, &ciphertext).unwrap();
        assert!(decrypted.is_empty());
    }

    #[test]
    fn test_no_padding_requires_full_blocks() {
        let (key, iv) = key_iv(KeySize::Aes128);

        let result = encrypt_blocks(&key, &iv, CipherMode::Cbc, PaddingMode::None, b"short");
        assert!(matches!(result, Err(ProtectError::Range(_))));

        let block = [0x5au8; 32];
        let ciphertext = encrypt_blocks(&key, &iv, CipherMode::Cbc, PaddingMode::None, &block).unwrap();
        assert_eq!(ciphertext.len(), 32);
        let decrypted =
            decrypt_blocks(&key, &iv, CipherMode::Cbc, PaddingMode::None, &ciphertext).unwrap();
        assert_eq!(decrypted.as_slice(), &block);
    }

    #[test]
    fn test_wrong_key_fails_or_differs() {
        let (key, iv) = key_iv(KeySize::Aes256);
        let (other_key, _) = key_iv(KeySize::Aes256);
        let plaintext = b"secret data";

        let ciphertext = encrypt_blocks(&key, &iv, CipherMode::Cbc, PaddingMode::Pkcs7, plaintext).unwrap();
        match decrypt_blocks(&other_key, &iv, CipherMode::Cbc, PaddingMode::Pkcs7, &ciphertext) {
            Ok(garbage) => assert_ne!(garbage.as_slice(), plaintext),
            Err(e) => assert!(e.is_crypto_failure()),
        }
    }

    #[test]
    fn test_truncated_ciphertext_is_crypto_failure() {
        let (key, iv) = key_iv(KeySize::Aes256);
        let result = decrypt_blocks(&key, &iv, CipherMode::Cbc, PaddingMode::Pkcs7, &[1, 2, 3]);
        assert!(matches!(result, Err(ProtectError::CryptoFailure(_))));
    }

    #[test]
    fn test_unsupported_key_length() {
        let iv = [0u8; BLOCK_LEN];
        let result = encrypt_blocks(&[0u8; 20], &iv, CipherMode::Cbc, PaddingMode::Pkcs7, b"x");
        assert!(matches!(result, Err(ProtectError::Range(_))));
    }

    #[test]
    fn test_key_size_bits() {
        assert_eq!(KeySize::from_bits(192).unwrap(), KeySize::Aes192);
        assert_eq!(KeySize::Aes256.bytes(), 32);
        assert!(KeySize::from_bits(512).is_err());
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let key = ScopeKey::generate();
        let sealed = seal(&key, b"payload", b"aad").unwrap();
        assert_eq!(sealed.len(), NONCE_LEN + 7 + TAG_LEN);

        let opened = open(&key, &sealed, b"aad").unwrap();
        assert_eq!(opened.as_slice(), b"payload");
    }

    #[test]
    fn test_open_with_wrong_aad_fails() {
        let key = ScopeKey::generate();
        let sealed = seal(&key, b"payload", b"entropy-1").unwrap();

        let result = open(&key, &sealed, b"entropy-2");
        assert!(matches!(result, Err(ProtectError::CryptoFailure(_))));
    }

    #[test]
    fn test_open_tampered_fails() {
        let key = ScopeKey::generate();
        let mut sealed = seal(&key, b"payload", b"").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0xFF;

        assert!(open(&key, &sealed, b"").is_err());
        assert!(open(&key, &sealed[..10], b"").is_err());
    }
}
