//! The system program's `AdvanceNonceAccount` instruction.

use {
    crate::{system_program, AccountMeta, InstructionError},
    solana_address::Address,
};

/// Position of `AdvanceNonceAccount` in the system program's instruction set.
const ADVANCE_NONCE_SELECTOR: u32 = 4;

/// Sysvar account holding recent blockhashes, read by the nonce program.
pub const RECENT_BLOCKHASHES_SYSVAR: &str = "SysvarRecentB1ockHashes11111111111111111111";

/// Advances a durable nonce account to a new stored value.
///
/// Prepending this instruction to a transaction lets the transaction use the
/// nonce account's stored value in place of a recent blockhash, which removes
/// the usual expiry window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvanceNonceInstruction {
    accounts: Vec<AccountMeta>,
    data: Vec<u8>,
}

impl AdvanceNonceInstruction {
    pub fn new(nonce_account: &Address, authority: &Address) -> Result<Self, InstructionError> {
        let recent_blockhashes = RECENT_BLOCKHASHES_SYSVAR.parse::<Address>()?;

        let data = ADVANCE_NONCE_SELECTOR.to_le_bytes().to_vec();
        let accounts = vec![
            AccountMeta::new(*nonce_account, false),
            AccountMeta::new_readonly(recent_blockhashes, false),
            AccountMeta::new_readonly(*authority, true),
        ];
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
    use super::*;

    #[test]
    fn test_sysvar_address_parses() {
        let sysvar = RECENT_BLOCKHASHES_SYSVAR.parse::<Address>().unwrap();
        assert_eq!(sysvar.to_string(), RECENT_BLOCKHASHES_SYSVAR);
    }

    #[test]
    fn test_advance_nonce_layout() {
        let nonce_account = Address::new_unique();
        let authority = Address::new_unique();
        let advance = AdvanceNonceInstruction::new(&nonce_account, &authority).unwrap();

        assert_eq!(advance.data(), &[4, 0, 0, 0]);
        assert!(system_program::check_id(advance.program_id()));

        let accounts = advance.accounts();
        assert_eq!(accounts.len(), 3);
        assert_eq!(accounts[0], AccountMeta::new(nonce_account, false));
        assert_eq!(
            accounts[1],
            AccountMeta::new_readonly(
                RECENT_BLOCKHASHES_SYSVAR.parse::<Address>().unwrap(),
                false
            )
        );
        assert_eq!(accounts[2], AccountMeta::new_readonly(authority, true));
    }
}
