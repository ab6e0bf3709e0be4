//! Password-based key derivation (PBKDF2-HMAC-SHA1 or Argon2id)

use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use zeroize::Zeroizing;

use crate::error::{ProtectError, Result};

/// Parameters for Argon2id key derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Argon2Params {
    /// Memory cost in KiB (default: 65536 = 64MB)
    pub memory_cost: u32,
    /// Time cost / passes (default: 3)
    pub time_cost: u32,
    /// Parallelism (default: 4)
    pub parallelism: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            memory_cost: 65536, // 64 MB
            time_cost: 3,
            parallelism: 4,
        }
    }
}

/// Key derivation function used by password-based protection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Kdf {
    /// PBKDF2 with HMAC-SHA1, byte-compatible with RFC 2898 derive-bytes streams.
    /// Uses the protector's iteration count.
    #[default]
    Pbkdf2Sha1,
    /// Argon2id; the iteration count is ignored in favour of `time_cost`
    Argon2id(Argon2Params),
}

/// Derive `output_len` bytes of key material from a password and salt.
///
/// The caller splits the output; for PBKDF2 the leading bytes are identical to
/// successive reads from an RFC 2898 stream.
pub fn derive_bytes(
    password: &[u8],
    salt: &[u8],
    iteration_count: u32,
    output_len: usize,
    kdf: &Kdf,
) -> Result<Zeroizing<Vec<u8>>> {
    let mut output = Zeroizing::new(vec![0u8; output_len]);

    match kdf {
        Kdf::Pbkdf2Sha1 => {
            if iteration_count == 0 {
                return Err(ProtectError::Range(
                    "iteration_count must be at least 1".to_string(),
                ));
            }
            pbkdf2::pbkdf2_hmac::<Sha1>(password, salt, iteration_count, &mut output);
        }
        Kdf::Argon2id(params) => {
            let argon2_params = Params::new(
                params.memory_cost,
                params.time_cost,
                params.parallelism,
                Some(output_len),
            )
            .map_err(|e| ProtectError::Range(format!("Invalid Argon2 parameters: {}", e)))?;

            Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params)
                .hash_password_into(password, salt, &mut output)
                .map_err(|e| ProtectError::CryptoFailure(format!("Key derivation failed: {}", e)))?;
        }
    }

    Ok(output)
}
