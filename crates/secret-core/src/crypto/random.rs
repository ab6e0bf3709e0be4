//! Cryptographically strong random numbers backed by the OS generator

use std::ops::{BitOr, BitOrAssign};

use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{ProtectError, Result};

/// Process-wide generator used for entropy, salts and scrubbing.
pub static RAND: CryptoRandom = CryptoRandom;

const ASCII_UPPERS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const ASCII_LOWERS: &str = "abcdefghijklmnopqrstuvwxyz";
const ASCII_NUMBERS: &str = "0123456789";

/// Character classes accepted by [`CryptoRandom::ascii_chars`].
///
/// Symbols are not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AsciiCategory(u8);

impl AsciiCategory {
    /// No characters; yields NUL-filled output
    pub const NONE: Self = Self(0x00);
    /// `A-Z`
    pub const UPPER_ALPHABET: Self = Self(0x01);
    /// `a-z`
    pub const LOWER_ALPHABET: Self = Self(0x02);
    /// `0-9`
    pub const NUMBER: Self = Self(0x04);
    /// Upper, lower and digits
    pub const ALPHANUMERIC: Self = Self(0x07);

    /// Check whether every flag of `other` is enabled
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Build the sampling alphabet for the enabled flags
    fn alphabet(self) -> Vec<char> {
        let mut source = Vec::new();

        if self.contains(Self::UPPER_ALPHABET) {
            source.extend(ASCII_UPPERS.chars());
        }
        if self.contains(Self::LOWER_ALPHABET) {
            source.extend(ASCII_LOWERS.chars());
        }
        if self.contains(Self::NUMBER) {
            source.extend(ASCII_NUMBERS.chars());
        }

        source
    }
}

impl Default for AsciiCategory {
    fn default() -> Self {
        Self::ALPHANUMERIC
    }
}

impl BitOr for AsciiCategory {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for AsciiCategory {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Generator for random bytes, bounded integers and ASCII strings
#[derive(Debug, Clone, Copy, Default)]
pub struct CryptoRandom;

impl CryptoRandom {
    /// Return `byte_length` random bytes
    pub fn next_bytes(&self, byte_length: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; byte_length];

        if byte_length > 0 {
            self.fill_bytes(&mut bytes);
        }

        bytes
    }

    /// Fill `bytes` with random data
    pub fn fill_bytes(&self, bytes: &mut [u8]) {
        OsRng.fill_bytes(bytes);
    }

    /// Return a uniformly distributed integer in `[0, max_value)`.
    ///
    /// `0` and `1` return `0` without consuming randomness; negative values fail
    /// with [`ProtectError::Range`].
    pub fn next_int(&self, max_value: i32) -> Result<i32> {
        if max_value < 0 {
            return Err(ProtectError::Range(format!(
                "max_value must not be negative, got {}",
                max_value
            )));
        }

        if max_value <= 1 {
            return Ok(0);
        }

        Ok(self.sample_below(max_value))
    }

    /// Return `char_length` characters drawn from the enabled categories
    pub fn ascii_chars(&self, char_length: usize, category: AsciiCategory) -> Vec<char> {
        let mut chars = vec!['\0'; char_length];

        let source = category.alphabet();
        if source.is_empty() {
            return chars;
        }

        // The alphabet never exceeds 62 entries.
        let len = source.len() as i32;
        for slot in chars.iter_mut() {
            *slot = source[self.sample_below(len) as usize];
        }

        chars
    }

    /// Rejection sampling over the absolute value of a random i32.
    ///
    /// Each non-zero magnitude has two sources (`x` and `-x`); `i32::MIN` is
    /// folded onto zero so zero has two as well.
    fn sample_below(&self, max_value: i32) -> i32 {
        let bound = (i32::MAX / max_value) * max_value;
        let mut bytes = [0u8; 4];

        loop {
            self.fill_bytes(&mut bytes);

            let mut value = i32::from_le_bytes(bytes);
            if value == i32::MIN {
                value = 0;
            }
            let value = value.abs();

            if value < bound {
                return value % max_value;
            }
        }
    }
}
