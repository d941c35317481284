//! The address of a Solana account.
//!
//! Addresses are 32 bytes long and are conventionally rendered as base58
//! strings, the same form in which they appear in explorers and CLI output.

use {
    serde_derive::{Deserialize, Serialize},
    std::{
        fmt,
        str::FromStr,
        sync::atomic::{AtomicU64, Ordering},
    },
    thiserror::Error,
};

/// Number of bytes in an address.
pub const ADDRESS_BYTES: usize = 32;
/// Maximum length of a base58-encoded address.
pub const MAX_BASE58_LEN: usize = 44;

/// The address of a Solana account.
///
/// Most addresses are ed25519 public keys, but program-owned accounts and
/// well-known program ids are plain 32-byte values with no corresponding
/// private key.
#[derive(
    Clone, Copy, Default, Deserialize, Serialize, Eq, PartialEq, Ord, PartialOrd, Hash,
)]
pub struct Address([u8; ADDRESS_BYTES]);

/// Error produced when parsing an [`Address`] from a base58 string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseAddressError {
    #[error("string is the wrong size")]
    WrongSize,
    #[error("invalid base58 string")]
    Invalid,
}

impl Address {
    pub const fn new_from_array(bytes: [u8; ADDRESS_BYTES]) -> Self {
        Self(bytes)
    }

    pub const fn to_bytes(self) -> [u8; ADDRESS_BYTES] {
        self.0
    }

    pub const fn as_array(&self) -> &[u8; ADDRESS_BYTES] {
        &self.0
    }

    /// Returns a globally unique address, for tests.
    pub fn new_unique() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        let mut bytes = [0u8; ADDRESS_BYTES];
        bytes[..8].copy_from_slice(&COUNTER.fetch_add(1, Ordering::Relaxed).to_be_bytes());
        Self(bytes)
    }
}

impl From<[u8; ADDRESS_BYTES]> for Address {
    fn from(bytes: [u8; ADDRESS_BYTES]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Address {
    type Error = std::array::TryFromSliceError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        <[u8; ADDRESS_BYTES]>::try_from(bytes).map(Self)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for Address {
    type Err = ParseAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() > MAX_BASE58_LEN {
            return Err(ParseAddressError::WrongSize);
        }
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|_| ParseAddressError::Invalid)?;
        Self::try_from(bytes.as_slice()).map_err(|_| ParseAddressError::WrongSize)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}
