//! 64-byte ed25519 signatures.

use {
    std::fmt,
    thiserror::Error,
};

/// Number of bytes in a signature.
pub const SIGNATURE_BYTES: usize = 64;
/// Maximum length of a base58-encoded signature.
pub const MAX_BASE58_SIGNATURE_LEN: usize = 88;

/// An ed25519 signature over a serialized message.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Signature([u8; SIGNATURE_BYTES]);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature has wrong length: {0} bytes")]
    InvalidLength(usize),
}

impl Signature {
    pub const fn new_from_array(bytes: [u8; SIGNATURE_BYTES]) -> Self {
        Self(bytes)
    }

    pub const fn to_bytes(self) -> [u8; SIGNATURE_BYTES] {
        self.0
    }

    pub const fn as_array(&self) -> &[u8; SIGNATURE_BYTES] {
        &self.0
    }

    pub(crate) fn verify_verbose(
        &self,
        pubkey_bytes: &[u8],
        message_bytes: &[u8],
    ) -> Result<(), ed25519_dalek::SignatureError> {
        let publickey = ed25519_dalek::PublicKey::from_bytes(pubkey_bytes)?;
        let signature = self.0.as_slice().try_into()?;
        publickey.verify_strict(message_bytes, &signature)
    }

    /// Checks that this signature was produced by the holder of
    /// `pubkey_bytes` over exactly `message_bytes`.
    pub fn verify(&self, pubkey_bytes: &[u8], message_bytes: &[u8]) -> bool {
        self.verify_verbose(pubkey_bytes, message_bytes).is_ok()
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self([0u8; SIGNATURE_BYTES])
    }
}

impl From<[u8; SIGNATURE_BYTES]> for Signature {
    fn from(bytes: [u8; SIGNATURE_BYTES]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Signature {
    type Error = SignatureError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        <[u8; SIGNATURE_BYTES]>::try_from(bytes)
            .map(Self)
            .map_err(|_| SignatureError::InvalidLength(bytes.len()))
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

#[cfg(test)]
mod tests {
    use {super::*, assert_matches::assert_matches};

    #[test]
    fn test_try_from_slice() {
        let bytes = [42u8; SIGNATURE_BYTES];
        let signature = Signature::try_from(bytes.as_slice()).unwrap();
        assert_eq!(signature.to_bytes(), bytes);

        assert_matches!(
            Signature::try_from([42u8; 63].as_slice()),
            Err(SignatureError::InvalidLength(63))
        );
        assert_matches!(
            Signature::try_from([42u8; 65].as_slice()),
            Err(SignatureError::InvalidLength(65))
        );
    }

    #[test]
    fn test_default_is_all_zeros() {
        assert_eq!(
            Signature::default().to_bytes(),
            [0u8; SIGNATURE_BYTES]
        );
    }

    #[test]
    fn test_display_len() {
        let signature = Signature::new_from_array([255u8; SIGNATURE_BYTES]);
        assert!(signature.to_string().len() <= MAX_BASE58_SIGNATURE_LEN);
    }
}
