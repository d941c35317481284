//! The system program's `Transfer` instruction.

use {
    crate::{system_program, AccountMeta, InstructionError},
    solana_address::Address,
};

/// Position of `Transfer` in the system program's instruction set.
const TRANSFER_SELECTOR: u32 = 2;
/// Four selector bytes plus the little-endian lamport amount.
const TRANSFER_DATA_LEN: usize = 12;

/// Moves lamports from a funding account to a recipient.
///
/// The funding account must sign; both accounts are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferInstruction {
    accounts: Vec<AccountMeta>,
    data: Vec<u8>,
}

impl TransferInstruction {
    pub fn new(from: &Address, to: &Address, lamports: u64) -> Result<Self, InstructionError> {
        let mut data = Vec::with_capacity(TRANSFER_DATA_LEN);
        data.extend_from_slice(&TRANSFER_SELECTOR.to_le_bytes());
        data.extend_from_slice(&lamports.to_le_bytes());
        if data.len() != TRANSFER_DATA_LEN {
            return Err(InstructionError::InvalidDataLength {
                expected: TRANSFER_DATA_LEN,
                actual: data.len(),
            });
        }

        let accounts = vec![AccountMeta::new(*from, true), AccountMeta::new(*to, false)];
        crate::validate(&accounts, &data)?;
        Ok(Self { accounts, data })
    }

    pub fn accounts(&self) -> &[AccountMeta] {
        &self.accounts
    }

    pub fn program_id(&self) -> &Address {
        &system_program::ID
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::Instruction};

    #[test]
    fn test_transfer_data_layout() {
        let from = Address::new_unique();
        let to = Address::new_unique();
        let transfer = TransferInstruction::new(&from, &to, 100_000_000).unwrap();

        let mut expected = vec![2, 0, 0, 0];
        expected.extend_from_slice(&100_000_000u64.to_le_bytes());
        assert_eq!(transfer.data(), expected.as_slice());
        assert_eq!(transfer.data().len(), TRANSFER_DATA_LEN);
    }

    #[test]
    fn test_transfer_accounts() {
        let from = Address::new_unique();
        let to = Address::new_unique();
        let transfer = TransferInstruction::new(&from, &to, 1).unwrap();

        let accounts = transfer.accounts();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0], AccountMeta::new(from, true));
        assert_eq!(accounts[1], AccountMeta::new(to, false));
        assert!(system_program::check_id(transfer.program_id()));
    }

    #[test]
    fn test_transfer_zero_lamports() {
        // Zero-lamport transfers are valid on the wire; the runtime decides
        // their fate.
        let transfer =
            TransferInstruction::new(&Address::new_unique(), &Address::new_unique(), 0).unwrap();
        assert_eq!(&transfer.data()[4..], &[0u8; 8]);
    }

    #[test]
    fn test_instruction_accessors_dispatch() {
        let from = Address::new_unique();
        let to = Address::new_unique();
        let instruction =
            Instruction::Transfer(TransferInstruction::new(&from, &to, 42).unwrap());
        assert_eq!(instruction.accounts().len(), 2);
        assert_eq!(instruction.program_id(), &system_program::ID);
        assert_eq!(&instruction.data()[..4], &[2, 0, 0, 0]);
    }
}
