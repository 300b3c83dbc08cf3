//! Error taxonomy for vault operations.
//!
//! Every variant is a validation failure the caller can recover from. None
//! of them leave a vault mutated: the engine checks everything before it
//! touches state, and commits in one step.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::account::AccountId;
use super::amount::{Amount, AmountError};
use crate::crypto::keys::KeyError;
use crate::storage::db::DbError;

/// Which of the two registered keys an error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyRole {
    A,
    B,
}

impl fmt::Display for KeyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

/// Errors returned by the vault engine.
#[derive(Debug, Error)]
pub enum VaultError {
    /// A public key failed length or point validation at setup.
    #[error("invalid public key {role}: {reason}")]
    InvalidKeyFormat { role: KeyRole, reason: String },

    /// An input does not fit its fixed-width field.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The submitted sequence number is not the vault's current one.
    #[error("stale or future sequence number: vault expects {expected}, got {got}")]
    StaleOrFutureSequenceNumber { expected: u64, got: u64 },

    /// Zero-amount transfers and deposits are rejected.
    #[error("amount must be greater than zero")]
    InvalidAmount,

    #[error("insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds { available: Amount, requested: Amount },

    /// The signature in the given slot does not verify against that slot's key.
    #[error("signature {0} is invalid")]
    SignatureInvalid(KeyRole),

    /// A balance or the sequence counter would leave its representable range.
    #[error("arithmetic overflow")]
    Overflow,

    #[error("vault already initialized for {0}")]
    AlreadyInitialized(AccountId),

    #[error("no vault for account {0}")]
    VaultNotFound(AccountId),

    #[error("storage error: {0}")]
    Storage(#[from] DbError),

    /// A local signer could not produce a signature.
    #[error("signing failed: {0}")]
    Signing(KeyError),
}

impl From<AmountError> for VaultError {
    fn from(err: AmountError) -> Self {
        VaultError::Encoding(err.to_string())
    }
}

/// Stable, payload-free discriminant of a [`VaultError`].
///
/// This is what crosses the boundary in reverted outcomes and CLI output;
/// the display message is for humans.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidKeyFormat,
    EncodingError,
    StaleOrFutureSequenceNumber,
    InvalidAmount,
    InsufficientFunds,
    SignatureInvalidA,
    SignatureInvalidB,
    Overflow,
    AlreadyInitialized,
    VaultNotFound,
    Storage,
    SigningFailed,
}

impl VaultError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidKeyFormat { .. } => ErrorKind::InvalidKeyFormat,
            Self::Encoding(_) => ErrorKind::EncodingError,
            Self::StaleOrFutureSequenceNumber { .. } => ErrorKind::StaleOrFutureSequenceNumber,
            Self::InvalidAmount => ErrorKind::InvalidAmount,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::SignatureInvalid(KeyRole::A) => ErrorKind::SignatureInvalidA,
            Self::SignatureInvalid(KeyRole::B) => ErrorKind::SignatureInvalidB,
            Self::Overflow => ErrorKind::Overflow,
            Self::AlreadyInitialized(_) => ErrorKind::AlreadyInitialized,
            Self::VaultNotFound(_) => ErrorKind::VaultNotFound,
            Self::Storage(_) => ErrorKind::Storage,
            Self::Signing(_) => ErrorKind::SigningFailed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_kind_names_the_role() {
        assert_eq!(
            VaultError::SignatureInvalid(KeyRole::A).kind(),
            ErrorKind::SignatureInvalidA
        );
        assert_eq!(
            VaultError::SignatureInvalid(KeyRole::B).kind(),
            ErrorKind::SignatureInvalidB
        );
    }

    #[test]
    fn amount_errors_become_encoding_errors() {
        let err: VaultError = AmountError::Empty.into();
        assert_eq!(err.kind(), ErrorKind::EncodingError);
    }

    #[test]
    fn messages_carry_context() {
        let err = VaultError::StaleOrFutureSequenceNumber { expected: 1, got: 0 };
        assert_eq!(
            err.to_string(),
            "stale or future sequence number: vault expects 1, got 0"
        );
        let err = VaultError::InsufficientFunds {
            available: Amount::from_units(1),
            requested: Amount::from_units(2),
        };
        assert_eq!(
            err.to_string(),
            "insufficient funds: available 0.00000001, requested 0.00000002"
        );
    }
}
