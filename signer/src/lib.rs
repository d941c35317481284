//! Abstractions and implementations for transaction signers.

pub mod keypair;
pub mod signature;

pub use crate::{
    keypair::{keypair_from_seed, Keypair},
    signature::{Signature, SignatureError, SIGNATURE_BYTES},
};
use {solana_address::Address, thiserror::Error};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignerError {
    #[error("keypair-pubkey mismatch")]
    KeypairPubkeyMismatch,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Custom(String),
}

/// The `Signer` trait declares operations that all digital signature providers
/// must support. It is the interface by which all signers are expected to be
/// exposed to software that needs their services.
pub trait Signer {
    /// The public key of the keypair, assuming it is available.
    fn pubkey(&self) -> Address {
        self.try_pubkey().unwrap_or_default()
    }

    /// Fallibly gets the implementor's public key.
    fn try_pubkey(&self) -> Result<Address, SignerError>;

    /// Signs `message` with the implementor's secret key.
    fn sign_message(&self, message: &[u8]) -> Signature {
        self.try_sign_message(message).unwrap_or_default()
    }

    /// Fallibly signs `message` with the implementor's secret key.
    fn try_sign_message(&self, message: &[u8]) -> Result<Signature, SignerError>;

    /// Whether the implementor requires user interaction to sign.
    fn is_interactive(&self) -> bool;
}

impl<T: Signer> Signer for &T {
    fn pubkey(&self) -> Address {
        (**self).pubkey()
    }

    fn try_pubkey(&self) -> Result<Address, SignerError> {
        (**self).try_pubkey()
    }

    fn sign_message(&self, message: &[u8]) -> Signature {
        (**self).sign_message(message)
    }

    fn try_sign_message(&self, message: &[u8]) -> Result<Signature, SignerError> {
        (**self).try_sign_message(message)
    }

    fn is_interactive(&self) -> bool {
        (**self).is_interactive()
    }
}
