//! Sequences of instructions compiled into the canonical wire form.
//!
//! A [`Message`] is the payload that actually gets signed: a three-byte
//! [`MessageHeader`], a deduplicated flat list of every account key the
//! instructions reference, a recent blockhash, and the instructions with
//! each account reference resolved to an index into the key list.
//!
//! Compiling the same instructions twice yields byte-identical output, so a
//! signature taken over a compiled message stays valid for as long as the
//! transaction is unchanged.
//!
//! To ensure reliable network delivery, serialized messages must fit into
//! the IPv6 MTU size, conservatively assumed to be 1280 bytes. Thus
//! constrained, care must be taken in the amount of data consumed by
//! instructions, and the number of accounts they require to function.

mod compiled_keys;

pub use crate::compiled_keys::CompileError;
use {
    crate::compiled_keys::CompiledKeys,
    serde_derive::{Deserialize, Serialize},
    solana_address::Address,
    solana_hash::Hash,
    solana_instruction::Instruction,
    solana_short_vec as short_vec,
};

/// The length of a message header in bytes.
pub const MESSAGE_HEADER_LENGTH: usize = 3;

/// Describes the organization of a `Message`'s account keys.
///
/// Keys are ordered by privilege: writable signers first, then read-only
/// signers, then writable non-signers, then read-only non-signers. The
/// three counts below are all a consumer needs to recover each key's
/// privileges from its position.
#[derive(Serialize, Deserialize, Default, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub struct MessageHeader {
    /// The number of signatures required for this message to be considered
    /// valid. The signers of those signatures must match the first
    /// `num_required_signatures` of the account keys.
    pub num_required_signatures: u8,

    /// The last `num_readonly_signed_accounts` of the signed keys are
    /// read-only accounts.
    pub num_readonly_signed_accounts: u8,

    /// The last `num_readonly_unsigned_accounts` of the unsigned keys are
    /// read-only accounts.
    pub num_readonly_unsigned_accounts: u8,
}

/// An instruction whose program id and accounts have been resolved to
/// indices into a message's account-key list.
#[derive(Serialize, Deserialize, Default, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CompiledInstruction {
    /// Index into the message's account keys of the program to invoke.
    pub program_id_index: u8,
    /// Ordered indices into the message's account keys of the accounts the
    /// instruction touches.
    #[serde(with = "short_vec")]
    pub accounts: Vec<u8>,
    /// The program's opaque input data.
    #[serde(with = "short_vec")]
    pub data: Vec<u8>,
}

/// The compiled, signable form of a transaction.
#[derive(Serialize, Deserialize, Default, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// The message header, identifying signed and read-only account keys.
    pub header: MessageHeader,

    /// All account keys used by this message, deduplicated.
    #[serde(with = "short_vec")]
    pub account_keys: Vec<Address>,

    /// A recent blockhash, or the stored value of a durable nonce.
    pub recent_blockhash: Hash,

    /// The instructions to execute, in order.
    #[serde(with = "short_vec")]
    pub instructions: Vec<CompiledInstruction>,
}

impl Message {
    /// Compiles `instructions` into a message.
    ///
    /// `signature_keys` carries the keys of any signature slots the caller
    /// already holds, in slot order. Those keys are forced to compile as
    /// signers, and any of them the instructions never reference are placed
    /// at the front of the account list as writable signers. When
    /// `signature_keys` is non-empty it also fixes the required-signature
    /// count, matching the slots the caller will fill.
    pub fn try_compile(
        instructions: &[Instruction],
        recent_blockhash: Hash,
        signature_keys: &[Address],
    ) -> Result<Self, CompileError> {
        let mut compiled_keys = CompiledKeys::compile(instructions);
        compiled_keys.apply_signature_keys(signature_keys);
        let (mut header, account_keys) = compiled_keys.try_into_message_components()?;

        if !signature_keys.is_empty() {
            header.num_required_signatures = u8::try_from(signature_keys.len())
                .map_err(|_| CompileError::AccountIndexOverflow)?;
        }

        let instructions = try_compile_instructions(instructions, &account_keys)?;
        Ok(Self {
            header,
            account_keys,
            recent_blockhash,
            instructions,
        })
    }

    /// Serializes this message to the canonical wire form.
    pub fn serialize(&self) -> Vec<u8> {
        bincode::serialize(self).unwrap()
    }

    /// The account keys that must sign this message, in signing order.
    pub fn signer_keys(&self) -> &[Address] {
        let num_signers =
            usize::from(self.header.num_required_signatures).min(self.account_keys.len());
        &self.account_keys[..num_signers]
    }

    /// Whether the account at `index` must sign.
    pub fn is_signer(&self, index: usize) -> bool {
        index < usize::from(self.header.num_required_signatures)
    }

    /// The program invoked by the instruction at `index`.
    pub fn program_id(&self, index: usize) -> Option<&Address> {
        let ix = self.instructions.get(index)?;
        self.account_keys.get(usize::from(ix.program_id_index))
    }
}

fn try_compile_instructions(
    instructions: &[Instruction],
    account_keys: &[Address],
) -> Result<Vec<CompiledInstruction>, CompileError> {
    let try_position = |key: &Address| -> Result<u8, CompileError> {
        account_keys
            .iter()
            .position(|k| k == key)
            .ok_or(CompileError::UnknownInstructionKey(*key))
            .and_then(|index| u8::try_from(index).map_err(|_| CompileError::AccountIndexOverflow))
    };

    instructions
        .iter()
        .map(|ix| {
            let accounts = ix
                .accounts()
                .iter()
                .map(|account_meta| try_position(&account_meta.pubkey))
                .collect::<Result<Vec<u8>, CompileError>>()?;
            Ok(CompiledInstruction {
                program_id_index: try_position(ix.program_id())?,
                accounts,
                data: ix.data().to_vec(),
            })
        })
        .collect()
}
