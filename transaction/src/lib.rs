//! Building, signing, and wire-encoding transactions.
//!
//! A [`Transaction`] accumulates instructions and a recent blockhash (or a
//! durable nonce standing in for one), compiles them into a canonical
//! [`Message`], collects ed25519 signatures over the serialized message, and
//! emits the final wire bytes: a compact-length signature count, the raw
//! 64-byte signatures in signer order, then the message.
//!
//! The message is recompiled from the builder's state on every operation
//! that needs it. Compilation is deterministic, so signing and serializing
//! observe identical bytes as long as the transaction is left unchanged in
//! between.
//!
//! # Examples
//!
//! Transfer lamports between two accounts:
//!
//! ```
//! use {
//!     solana_instruction::{Instruction, TransferInstruction},
//!     solana_signer::{Keypair, Signer},
//!     solana_transaction::Transaction,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let payer = Keypair::new();
//! let recipient = Keypair::new();
//! // Would come from a `getLatestBlockhash` RPC response.
//! let recent_blockhash = "9zH5t54P51Cb2vPFnXDAJnmMbWihMHuhJbYSfDNQo2kc";
//!
//! let mut tx = Transaction::new(recent_blockhash);
//! tx.add_instruction(Instruction::Transfer(TransferInstruction::new(
//!     &payer.pubkey(),
//!     &recipient.pubkey(),
//!     1_000_000,
//! )?));
//! tx.sign(&[&payer])?;
//! let wire_bytes = tx.serialize()?;
//! # assert!(!wire_bytes.is_empty());
//! # Ok(())
//! # }
//! ```

use {
    solana_address::Address,
    solana_hash::{Hash, ParseHashError},
    solana_instruction::Instruction,
    solana_message::{CompileError, Message},
    solana_short_vec as short_vec,
    solana_signer::{Keypair, Signature, Signer, SignerError},
    std::str::FromStr,
    thiserror::Error,
};

/// Maximum over-the-wire size of a transaction,
/// 1280 is IPv6 minimum MTU, 40 bytes is the size of the IPv6 header, and 8
/// bytes is the size of the fragment header.
pub const PACKET_DATA_SIZE: usize = 1280 - 40 - 8;

#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("transaction recent blockhash is not set")]
    BlockhashNotSet,

    #[error("transaction contains no instructions")]
    NoInstructions,

    #[error("no signing keypairs were provided")]
    NoSigners,

    #[error("transaction has not been signed")]
    NotSigned,

    #[error("keypair `{0}` has no matching signature slot")]
    UnknownSigner(Address),

    #[error("serialized transaction is {size} bytes, exceeding the packet limit of {limit}")]
    ExceedsPacketSize { size: usize, limit: usize },

    #[error("invalid recent blockhash: {0}")]
    InvalidBlockhash(#[from] ParseHashError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Signer(#[from] SignerError),

    #[error("failed to write wire transaction: {0}")]
    Io(#[from] std::io::Error),
}

/// A signature slot paired with the account key expected to fill it.
///
/// Slots are created when the message is first compiled and filled by
/// [`Transaction::sign`]. Slot order always matches the compiled message's
/// required-signer order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignaturePubkeyPair {
    pub signature: Option<Signature>,
    pub pubkey: Address,
}

/// A durable nonce standing in for a recent blockhash.
///
/// The nonce account's stored value replaces the blockhash, and the
/// instruction advancing the nonce account must run first so the value is
/// consumed exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonceInformation {
    /// Base58-encoded stored value of the nonce account.
    pub nonce: String,
    /// The `AdvanceNonceAccount` instruction for the nonce account.
    pub nonce_instruction: Instruction,
}

/// A transaction under construction.
///
/// Not safe for unsynchronized sharing: compiling and signing mutate the
/// builder, so concurrent users must wrap it in a lock or finish building on
/// one thread before handing it off.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    /// Signature slots, in the compiled message's signer order once the
    /// message has been compiled.
    pub signatures: Vec<SignaturePubkeyPair>,

    /// The instructions to execute, in order.
    pub instructions: Vec<Instruction>,

    /// Base58-encoded recent blockhash, or the nonce value once a durable
    /// nonce is attached.
    pub recent_blockhash: String,

    /// Durable nonce settings, if this transaction uses one.
    pub nonce_info: Option<NonceInformation>,
}

impl Transaction {
    pub fn new(recent_blockhash: impl Into<String>) -> Self {
        Self {
            recent_blockhash: recent_blockhash.into(),
            ..Self::default()
        }
    }

    /// Constructs a transaction that uses a durable nonce in place of a
    /// recent blockhash.
    pub fn new_with_nonce(nonce_info: NonceInformation) -> Self {
        Self {
            nonce_info: Some(nonce_info),
            ..Self::default()
        }
    }

    /// Appends `instruction` to execute after those already queued.
    pub fn add_instruction(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    /// Compiles the canonical message for the transaction's current state.
    ///
    /// If a durable nonce is attached, its advance instruction is moved to
    /// the front of the instruction list and its stored value replaces the
    /// recent blockhash before compiling. Signature slots are created (or
    /// reordered) to match the compiled message's signer order.
    pub fn compile_message(&mut self) -> Result<Message, TransactionError> {
        // Validate the caller's state before the nonce rewrite: an attached
        // nonce supplies the blockhash but must not stand in for the
        // instructions the caller was supposed to queue.
        let has_nonce_value = self
            .nonce_info
            .as_ref()
            .map_or(false, |nonce_info| !nonce_info.nonce.is_empty());
        if self.recent_blockhash.is_empty() && !has_nonce_value {
            return Err(TransactionError::BlockhashNotSet);
        }
        if self.instructions.is_empty() {
            return Err(TransactionError::NoInstructions);
        }
        self.apply_nonce();

        let recent_blockhash = Hash::from_str(&self.recent_blockhash)?;

        let signature_keys: Vec<Address> =
            self.signatures.iter().map(|pair| pair.pubkey).collect();
        let message =
            Message::try_compile(&self.instructions, recent_blockhash, &signature_keys)?;

        if self.signatures.is_empty() {
            self.signatures = message
                .signer_keys()
                .iter()
                .map(|key| SignaturePubkeyPair {
                    signature: None,
                    pubkey: *key,
                })
                .collect();
        } else {
            self.align_signatures(&message);
        }

        Ok(message)
    }

    fn apply_nonce(&mut self) {
        if let Some(nonce_info) = &self.nonce_info {
            if self.instructions.first() != Some(&nonce_info.nonce_instruction) {
                self.instructions.insert(0, nonce_info.nonce_instruction.clone());
                self.recent_blockhash = nonce_info.nonce.clone();
            }
        }
    }

    /// Reorders signature slots to match the message's required-signer
    /// prefix, keeping each signature with its key. Keys the message does
    /// not require sort after those it does.
    fn align_signatures(&mut self, message: &Message) {
        let signer_keys = message.signer_keys();
        self.signatures.sort_by_key(|pair| {
            signer_keys
                .iter()
                .position(|key| key == &pair.pubkey)
                .unwrap_or(usize::MAX)
        });
    }

    /// The exact bytes a signer of this transaction must sign.
    pub fn message_data(&mut self) -> Result<Vec<u8>, TransactionError> {
        Ok(self.compile_message()?.serialize())
    }

    /// Signs the compiled message with every keypair in `keypairs`.
    ///
    /// Any previously held signatures are discarded: the signature slots are
    /// rebuilt from the given keypairs, the message is compiled, and each
    /// keypair's signature lands in the slot holding its public key.
    pub fn sign(&mut self, keypairs: &[&Keypair]) -> Result<(), TransactionError> {
        if keypairs.is_empty() {
            return Err(TransactionError::NoSigners);
        }

        // One slot per distinct key, in caller order; a keypair passed more
        // than once signs the same slot.
        self.signatures = Vec::with_capacity(keypairs.len());
        for keypair in keypairs {
            let pubkey = keypair.try_pubkey()?;
            if !self.signatures.iter().any(|pair| pair.pubkey == pubkey) {
                self.signatures.push(SignaturePubkeyPair {
                    signature: None,
                    pubkey,
                });
            }
        }

        let message_data = self.message_data()?;
        for keypair in keypairs {
            let pubkey = keypair.try_pubkey()?;
            let signature = keypair.try_sign_message(&message_data)?;
            let pair = self
                .signatures
                .iter_mut()
                .find(|pair| pair.pubkey == pubkey)
                .ok_or(TransactionError::UnknownSigner(pubkey))?;
            pair.signature = Some(signature);
        }
        Ok(())
    }

    /// Assembles the final wire transaction.
    ///
    /// Produces the compact-length signature count, each 64-byte signature
    /// in signer order, then the serialized message. Fails if any signature
    /// slot is unfilled or the result exceeds [`PACKET_DATA_SIZE`]; a
    /// too-large transaction is never emitted truncated.
    pub fn serialize(&mut self) -> Result<Vec<u8>, TransactionError> {
        if self.signatures.is_empty() {
            return Err(TransactionError::NotSigned);
        }
        let message_data = self.message_data()?;

        let mut wire = Vec::with_capacity(PACKET_DATA_SIZE);
        short_vec::encode_len(&mut wire, self.signatures.len())?;
        for pair in &self.signatures {
            let signature = pair.signature.as_ref().ok_or(TransactionError::NotSigned)?;
            wire.extend_from_slice(signature.as_ref());
        }
        wire.extend_from_slice(&message_data);

        if wire.len() > PACKET_DATA_SIZE {
            return Err(TransactionError::ExceedsPacketSize {
                size: wire.len(),
                limit: PACKET_DATA_SIZE,
            });
        }
        Ok(wire)
    }

    /// Verifies every held signature against the compiled message bytes.
    pub fn verify(&mut self) -> Result<bool, TransactionError> {
        let message_data = self.message_data()?;
        Ok(self.signatures.iter().all(|pair| {
            pair.signature
                .as_ref()
                .map_or(false, |signature| {
                    signature.verify(pair.pubkey.as_ref(), &message_data)
                })
        }))
    }
}
