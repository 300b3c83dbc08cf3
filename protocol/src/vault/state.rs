//! # Vault Records
//!
//! A [`Vault`] is the per-account custody record: two registered keys, a
//! balance and a replay-protection counter.
//!
//! ## Sequence Model
//!
//! The sequence number starts at 0 and moves by exactly one per committed
//! outgoing transfer. A transfer signed for sequence `n` is only valid while
//! the vault's counter is exactly `n`, so once it commits the same signed
//! payload can never be applied again. Deposits and incoming transfers do
//! not touch the counter.
//!
//! ## Mutation
//!
//! Fields are private. The only writers are the `pub(crate)` methods used by
//! the engine's commit path, and each of them is all-or-nothing: every
//! check runs before any field is assigned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::account::AccountId;
use super::amount::Amount;
use super::error::VaultError;
use crate::crypto::keys::{VaultPublicKey, VaultSignature};

/// The two keys registered at setup, in their fixed roles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultKeys {
    pub a: VaultPublicKey,
    pub b: VaultPublicKey,
}

/// The two signatures accompanying a transfer, one per key role.
///
/// Slot `a` is only ever checked against key A and slot `b` against key B.
/// A valid signature from key B sitting in slot `a` is a failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DualSignature {
    pub a: VaultSignature,
    pub b: VaultSignature,
}

/// A custody vault.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Vault {
    owner: AccountId,
    keys: VaultKeys,
    sequence_number: u64,
    balance: Amount,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Vault {
    /// A fresh vault: sequence 0, balance 0.
    pub(crate) fn new(owner: AccountId, keys: VaultKeys) -> Self {
        let now = Utc::now();
        Self {
            owner,
            keys,
            sequence_number: 0,
            balance: Amount::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn owner(&self) -> AccountId {
        self.owner
    }

    pub fn keys(&self) -> &VaultKeys {
        &self.keys
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Exact-match sequence check.
    pub(crate) fn check_sequence(&self, got: u64) -> Result<(), VaultError> {
        if got != self.sequence_number {
            return Err(VaultError::StaleOrFutureSequenceNumber {
                expected: self.sequence_number,
                got,
            });
        }
        Ok(())
    }

    /// `0 < amount <= balance`.
    pub(crate) fn check_spendable(&self, amount: Amount) -> Result<(), VaultError> {
        if amount.is_zero() {
            return Err(VaultError::InvalidAmount);
        }
        if amount > self.balance {
            return Err(VaultError::InsufficientFunds {
                available: self.balance,
                requested: amount,
            });
        }
        Ok(())
    }

    /// Balance after crediting `amount`, without applying it.
    pub(crate) fn credited(&self, amount: Amount) -> Result<Amount, VaultError> {
        self.balance.checked_add(amount).ok_or(VaultError::Overflow)
    }

    /// Sequence number after one more outgoing transfer, without applying it.
    pub(crate) fn next_sequence(&self) -> Result<u64, VaultError> {
        self.sequence_number
            .checked_add(1)
            .ok_or(VaultError::Overflow)
    }

    pub(crate) fn set_balance(&mut self, balance: Amount) {
        self.balance = balance;
        self.updated_at = Utc::now();
    }

    pub(crate) fn set_sequence_number(&mut self, sequence_number: u64) {
        self.sequence_number = sequence_number;
        self.updated_at = Utc::now();
    }

    /// A point-in-time copy for callers outside the engine.
    pub fn snapshot(&self) -> VaultSnapshot {
        VaultSnapshot {
            owner: self.owner,
            keys: self.keys,
            sequence_number: self.sequence_number,
            balance: self.balance,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Read-only copy of a vault's fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultSnapshot {
    pub owner: AccountId,
    pub keys: VaultKeys,
    pub sequence_number: u64,
    pub balance: Amount,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::VaultKeypair;

    fn vault() -> Vault {
        let keys = VaultKeys {
            a: VaultKeypair::from_seed(&[1u8; 32]).public_key(),
            b: VaultKeypair::from_seed(&[2u8; 32]).public_key(),
        };
        Vault::new("0x01".parse().unwrap(), keys)
    }

    #[test]
    fn new_vault_starts_empty() {
        let v = vault();
        assert_eq!(v.sequence_number(), 0);
        assert_eq!(v.balance(), Amount::ZERO);
        assert_eq!(v.created_at(), v.updated_at());
    }

    #[test]
    fn sequence_must_match_exactly() {
        let mut v = vault();
        v.set_sequence_number(3);
        assert!(v.check_sequence(3).is_ok());
        assert!(matches!(
            v.check_sequence(2),
            Err(VaultError::StaleOrFutureSequenceNumber { expected: 3, got: 2 })
        ));
        assert!(matches!(
            v.check_sequence(4),
            Err(VaultError::StaleOrFutureSequenceNumber { expected: 3, got: 4 })
        ));
    }

    #[test]
    fn spendable_bounds() {
        let mut v = vault();
        v.set_balance(Amount::from_units(100));
        assert!(matches!(v.check_spendable(Amount::ZERO), Err(VaultError::InvalidAmount)));
        assert!(v.check_spendable(Amount::from_units(100)).is_ok());
        assert!(matches!(
            v.check_spendable(Amount::from_units(101)),
            Err(VaultError::InsufficientFunds { .. })
        ));
    }

    #[test]
    fn credit_overflow_detected() {
        let mut v = vault();
        v.set_balance(Amount::MAX);
        assert!(matches!(v.credited(Amount::from_units(1)), Err(VaultError::Overflow)));
    }

    #[test]
    fn sequence_exhaustion_detected() {
        let mut v = vault();
        v.set_sequence_number(u64::MAX);
        assert!(matches!(v.next_sequence(), Err(VaultError::Overflow)));
    }

    #[test]
    fn bincode_roundtrip() {
        let mut v = vault();
        v.set_balance(Amount::from_units(42));
        let bytes = bincode::serialize(&v).unwrap();
        let back: Vault = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back.snapshot(), v.snapshot());
    }
}
