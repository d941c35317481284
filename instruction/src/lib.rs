//! Types for directing the execution of Solana programs.
//!
//! Every transaction executes one or more instructions. An instruction names
//! the program to invoke, the accounts the program may read or write, and an
//! opaque byte payload the program decodes itself.
//!
//! The instruction set this crate can build is closed: each supported
//! operation gets its own constructor that validates its inputs up front and
//! emits the protocol-defined payload, so an [`Instruction`] that exists is
//! always well-formed.

mod nonce;
mod transfer;

pub use crate::{
    nonce::{AdvanceNonceInstruction, RECENT_BLOCKHASHES_SYSVAR},
    transfer::TransferInstruction,
};
use {solana_address::Address, thiserror::Error};

pub mod system_program {
    //! The system program, owner of all vanilla lamport accounts.

    use solana_address::Address;

    /// `11111111111111111111111111111111` in base58, the all-zeros key.
    pub const ID: Address = Address::new_from_array([0u8; 32]);

    pub fn id() -> Address {
        ID
    }

    pub fn check_id(address: &Address) -> bool {
        address == &ID
    }
}

/// Errors raised while constructing an instruction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InstructionError {
    #[error("instruction references no accounts")]
    NoAccounts,

    #[error("instruction data is empty")]
    EmptyData,

    #[error("instruction data is {actual} bytes, expected {expected}")]
    InvalidDataLength { expected: usize, actual: usize },

    #[error("malformed account address: {0}")]
    MalformedAddress(#[from] solana_address::ParseAddressError),
}

/// Describes a single account read or written by an instruction.
///
/// The program a transaction invokes sees accounts in exactly the order the
/// instruction lists them, so order is significant.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AccountMeta {
    /// The address of the account.
    pub pubkey: Address,
    /// Whether a transaction signature from this account is required.
    pub is_signer: bool,
    /// Whether the program may mutate the account's lamports or data.
    pub is_writable: bool,
}

impl AccountMeta {
    /// Constructs metadata for a writable account.
    pub fn new(pubkey: Address, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: true,
        }
    }

    /// Constructs metadata for a read-only account.
    pub fn new_readonly(pubkey: Address, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: false,
        }
    }
}

/// A single operation for an on-chain program to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Move lamports between two system accounts.
    Transfer(TransferInstruction),
    /// Advance the stored value of a durable nonce account.
    AdvanceNonce(AdvanceNonceInstruction),
}

impl Instruction {
    /// The accounts this instruction touches, in the order the program
    /// expects to receive them.
    pub fn accounts(&self) -> &[AccountMeta] {
        match self {
            Self::Transfer(ix) => ix.accounts(),
            Self::AdvanceNonce(ix) => ix.accounts(),
        }
    }

    /// The address of the program that executes this instruction.
    pub fn program_id(&self) -> &Address {
        match self {
            Self::Transfer(ix) => ix.program_id(),
            Self::AdvanceNonce(ix) => ix.program_id(),
        }
    }

    /// The opaque payload passed to the program.
    pub fn data(&self) -> &[u8] {
        match self {
            Self::Transfer(ix) => ix.data(),
            Self::AdvanceNonce(ix) => ix.data(),
        }
    }
}

fn validate(accounts: &[AccountMeta], data: &[u8]) -> Result<(), InstructionError> {
    if accounts.is_empty() {
        return Err(InstructionError::NoAccounts);
    }
    if data.is_empty() {
        return Err(InstructionError::EmptyData);
    }
    Ok(())
}
