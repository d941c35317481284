//! A 32-byte hash value and its base58 text form.
//!
//! Transactions carry a recent blockhash (or a durable nonce standing in for
//! one) in this form, so the type mirrors [`Address`] in layout and encoding
//! but is kept distinct to avoid mixing the two up.
//!
//! [`Address`]: https://docs.rs/solana-address

use {
    serde_derive::{Deserialize, Serialize},
    std::{fmt, str::FromStr},
    thiserror::Error,
};

/// Size of a hash in bytes.
pub const HASH_BYTES: usize = 32;
/// Maximum length of a base58-encoded hash.
pub const MAX_BASE58_LEN: usize = 44;

/// A 32-byte hash.
#[derive(
    Clone, Copy, Default, Deserialize, Serialize, Eq, PartialEq, Ord, PartialOrd, Hash,
)]
pub struct Hash([u8; HASH_BYTES]);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseHashError {
    #[error("string decoded to wrong size for hash")]
    WrongSize,
    #[error("failed to decoded string to hash")]
    Invalid,
}

impl Hash {
    pub const fn new_from_array(bytes: [u8; HASH_BYTES]) -> Self {
        Self(bytes)
    }

    pub const fn to_bytes(self) -> [u8; HASH_BYTES] {
        self.0
    }

    pub const fn as_array(&self) -> &[u8; HASH_BYTES] {
        &self.0
    }
}

impl From<[u8; HASH_BYTES]> for Hash {
    fn from(bytes: [u8; HASH_BYTES]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for Hash {
    type Err = ParseHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() > MAX_BASE58_LEN {
            return Err(ParseHashError::WrongSize);
        }
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|_| ParseHashError::Invalid)?;
        if bytes.len() != HASH_BYTES {
            return Err(ParseHashError::WrongSize);
        }
        let mut hash = [0u8; HASH_BYTES];
        hash.copy_from_slice(&bytes);
        Ok(Self(hash))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}
