use {
    crate::MessageHeader,
    solana_address::Address,
    solana_instruction::Instruction,
    thiserror::Error,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("account index overflowed during compilation")]
    AccountIndexOverflow,
    #[error("encountered unknown account key `{0}` during instruction compilation")]
    UnknownInstructionKey(Address),
}

/// A helper struct to collect the account keys referenced by a set of
/// instructions and organize them into the canonical message ordering.
///
/// Keys are tracked in first-seen order. Signer and writable flags are OR-ed
/// together across duplicate references, so the most permissive view of an
/// account wins.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub(crate) struct CompiledKeys {
    key_metas: Vec<(Address, CompiledKeyMeta)>,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
struct CompiledKeyMeta {
    is_signer: bool,
    is_writable: bool,
}

impl CompiledKeys {
    pub(crate) fn compile(instructions: &[Instruction]) -> Self {
        let mut compiled_keys = Self::default();
        for ix in instructions {
            for account_meta in ix.accounts() {
                let meta = compiled_keys.meta_mut(account_meta.pubkey);
                meta.is_signer |= account_meta.is_signer;
                meta.is_writable |= account_meta.is_writable;
            }
        }
        // Program ids occupy account slots of their own, after every key the
        // instructions reference directly.
        for ix in instructions {
            compiled_keys.meta_mut(*ix.program_id());
        }
        compiled_keys
    }

    fn meta_mut(&mut self, key: Address) -> &mut CompiledKeyMeta {
        let index = match self.key_metas.iter().position(|(k, _)| *k == key) {
            Some(index) => index,
            None => {
                self.key_metas.push((key, CompiledKeyMeta::default()));
                self.key_metas.len().saturating_sub(1)
            }
        };
        &mut self.key_metas[index].1
    }

    /// Reconciles the key list with the signature slots a transaction
    /// already holds.
    ///
    /// Every key with a signature slot must compile as a signer. Keys the
    /// instructions never mentioned are inserted at the front of the list as
    /// writable signers, preserving the order in which they were given.
    pub(crate) fn apply_signature_keys(&mut self, signature_keys: &[Address]) {
        let mut num_inserted = 0;
        for key in signature_keys {
            match self.key_metas.iter_mut().find(|(k, _)| k == key) {
                Some((_, meta)) => meta.is_signer = true,
                None => {
                    self.key_metas.insert(
                        num_inserted,
                        (
                            *key,
                            CompiledKeyMeta {
                                is_signer: true,
                                is_writable: true,
                            },
                        ),
                    );
                    num_inserted += 1;
                }
            }
        }
    }

    pub(crate) fn try_into_message_components(
        self,
    ) -> Result<(MessageHeader, Vec<Address>), CompileError> {
        let try_into_u8 = |num: usize| -> Result<u8, CompileError> {
            u8::try_from(num).map_err(|_| CompileError::AccountIndexOverflow)
        };

        let filter = |is_signer: bool, is_writable: bool| {
            self.key_metas
                .iter()
                .filter(move |(_, meta)| {
                    meta.is_signer == is_signer && meta.is_writable == is_writable
                })
                .map(|(key, _)| *key)
        };

        let mut writable_signer_keys: Vec<Address> = filter(true, true).collect();
        let mut readonly_signer_keys: Vec<Address> = filter(true, false).collect();
        let writable_non_signer_keys: Vec<Address> = filter(false, true).collect();
        let readonly_non_signer_keys: Vec<Address> = filter(false, false).collect();

        // The first signer pays the fee, and fee debiting requires a
        // writable account, so the fee payer is always loaded writable.
        if writable_signer_keys.is_empty() && !readonly_signer_keys.is_empty() {
            writable_signer_keys.push(readonly_signer_keys.remove(0));
        }

        let signers_len = writable_signer_keys
            .len()
            .saturating_add(readonly_signer_keys.len());
        let header = MessageHeader {
            num_required_signatures: try_into_u8(signers_len)?,
            num_readonly_signed_accounts: try_into_u8(readonly_signer_keys.len())?,
            num_readonly_unsigned_accounts: try_into_u8(readonly_non_signer_keys.len())?,
        };

        let static_account_keys = std::iter::empty()
            .chain(writable_signer_keys)
            .chain(readonly_signer_keys)
            .chain(writable_non_signer_keys)
            .chain(readonly_non_signer_keys)
            .collect();

        Ok((header, static_account_keys))
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        solana_instruction::{system_program, TransferInstruction},
    };

    fn meta(is_signer: bool, is_writable: bool) -> CompiledKeyMeta {
        CompiledKeyMeta {
            is_signer,
            is_writable,
        }
    }

    #[test]
    fn test_compile_transfer() {
        let from = Address::new_unique();
        let to = Address::new_unique();
        let instructions = vec![Instruction::Transfer(
            TransferInstruction::new(&from, &to, 42).unwrap(),
        )];

        let compiled_keys = CompiledKeys::compile(&instructions);
        assert_eq!(
            compiled_keys,
            CompiledKeys {
                key_metas: vec![
                    (from, meta(true, true)),
                    (to, meta(false, true)),
                    (system_program::ID, meta(false, false)),
                ],
            }
        );
    }

    #[test]
    fn test_compile_duplicate_keys_or_flags() {
        let from = Address::new_unique();
        let to = Address::new_unique();
        // `to` is writable in the first transfer and the signing funder in
        // the second; the compiled view must keep both privileges.
        let instructions = vec![
            Instruction::Transfer(TransferInstruction::new(&from, &to, 1).unwrap()),
            Instruction::Transfer(TransferInstruction::new(&to, &from, 2).unwrap()),
        ];

        let compiled_keys = CompiledKeys::compile(&instructions);
        assert_eq!(
            compiled_keys,
            CompiledKeys {
                key_metas: vec![
                    (from, meta(true, true)),
                    (to, meta(true, true)),
                    (system_program::ID, meta(false, false)),
                ],
            }
        );
    }

    #[test]
    fn test_apply_signature_keys_marks_existing() {
        let key = Address::new_unique();
        let mut compiled_keys = CompiledKeys {
            key_metas: vec![(key, meta(false, true))],
        };
        compiled_keys.apply_signature_keys(&[key]);
        assert_eq!(compiled_keys.key_metas, vec![(key, meta(true, true))]);
    }

    #[test]
    fn test_apply_signature_keys_inserts_unknown_in_order() {
        let known = Address::new_unique();
        let unknown1 = Address::new_unique();
        let unknown2 = Address::new_unique();
        let mut compiled_keys = CompiledKeys {
            key_metas: vec![(known, meta(false, true))],
        };

        compiled_keys.apply_signature_keys(&[unknown1, unknown2]);
        assert_eq!(
            compiled_keys.key_metas,
            vec![
                (unknown1, meta(true, true)),
                (unknown2, meta(true, true)),
                (known, meta(false, true)),
            ]
        );
    }

    #[test]
    fn test_partition_order_is_first_seen() {
        let keys: Vec<Address> = (0..6).map(|_| Address::new_unique()).collect();
        let compiled_keys = CompiledKeys {
            key_metas: vec![
                (keys[0], meta(false, false)),
                (keys[1], meta(true, true)),
                (keys[2], meta(true, false)),
                (keys[3], meta(false, true)),
                (keys[4], meta(true, true)),
                (keys[5], meta(false, false)),
            ],
        };

        let (header, account_keys) = compiled_keys.try_into_message_components().unwrap();
        assert_eq!(
            header,
            MessageHeader {
                num_required_signatures: 3,
                num_readonly_signed_accounts: 1,
                num_readonly_unsigned_accounts: 2,
            }
        );
        assert_eq!(
            account_keys,
            vec![keys[1], keys[4], keys[2], keys[3], keys[0], keys[5]]
        );
    }

    #[test]
    fn test_fee_payer_promotion() {
        let signer = Address::new_unique();
        let other = Address::new_unique();
        let compiled_keys = CompiledKeys {
            key_metas: vec![(signer, meta(true, false)), (other, meta(false, true))],
        };

        let (header, account_keys) = compiled_keys.try_into_message_components().unwrap();
        // The lone read-only signer becomes the writable fee payer.
        assert_eq!(
            header,
            MessageHeader {
                num_required_signatures: 1,
                num_readonly_signed_accounts: 0,
                num_readonly_unsigned_accounts: 0,
            }
        );
        assert_eq!(account_keys, vec![signer, other]);
    }

    #[test]
    fn test_fee_payer_promotion_keeps_later_readonly_signers() {
        let signer1 = Address::new_unique();
        let signer2 = Address::new_unique();
        let compiled_keys = CompiledKeys {
            key_metas: vec![(signer1, meta(true, false)), (signer2, meta(true, false))],
        };

        let (header, account_keys) = compiled_keys.try_into_message_components().unwrap();
        assert_eq!(
            header,
            MessageHeader {
                num_required_signatures: 2,
                num_readonly_signed_accounts: 1,
                num_readonly_unsigned_accounts: 0,
            }
        );
        assert_eq!(account_keys, vec![signer1, signer2]);
    }

    #[test]
    fn test_too_many_keys_overflows() {
        let compiled_keys = CompiledKeys {
            key_metas: (0..257)
                .map(|_| (Address::new_unique(), meta(true, true)))
                .collect(),
        };
        assert_eq!(
            compiled_keys.try_into_message_components(),
            Err(CompileError::AccountIndexOverflow)
        );
    }
}
