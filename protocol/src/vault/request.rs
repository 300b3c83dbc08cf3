//! Typed requests and responses for the vault engine.
//!
//! The operation set is closed: a caller picks a [`VaultRequest`] variant,
//! the engine returns the matching [`VaultResponse`] variant. There is no
//! string-keyed dispatch anywhere.

use serde::{Deserialize, Serialize};

use super::account::AccountId;
use super::amount::Amount;
use super::message::TransferIntent;
use super::state::{DualSignature, VaultSnapshot};

/// A fully signed outgoing transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub sender: AccountId,
    pub recipient: AccountId,
    pub amount: Amount,
    pub sequence_number: u64,
    pub signatures: DualSignature,
}

impl TransferRequest {
    /// The unsigned fields, i.e. what the signatures are over.
    pub fn intent(&self) -> TransferIntent {
        TransferIntent {
            sender: self.sender,
            recipient: self.recipient,
            amount: self.amount,
            sequence_number: self.sequence_number,
        }
    }
}

/// Result of a committed transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub sender: AccountId,
    pub recipient: AccountId,
    pub amount: Amount,
    /// The sequence number the transfer was signed for.
    pub consumed_sequence_number: u64,
    /// The sender's sequence number after commit.
    pub next_sequence_number: u64,
    pub sender_balance: Amount,
    pub recipient_balance: Amount,
}

/// Every operation the engine accepts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VaultRequest {
    /// Register a vault with its two keys. Keys arrive unvalidated.
    Setup {
        owner: AccountId,
        #[serde(with = "crate::crypto::keys::hex_bytes")]
        public_key_a: Vec<u8>,
        #[serde(with = "crate::crypto::keys::hex_bytes")]
        public_key_b: Vec<u8>,
    },
    Transfer(TransferRequest),
    /// Funding path. Carries no authorization.
    Deposit { owner: AccountId, amount: Amount },
    GetBalance { owner: AccountId },
}

impl VaultRequest {
    /// Short operation name, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Setup { .. } => "setup",
            Self::Transfer(_) => "transfer",
            Self::Deposit { .. } => "deposit",
            Self::GetBalance { .. } => "get_balance",
        }
    }

    /// Whether executing this request can change state.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Self::GetBalance { .. })
    }
}

/// What a successfully executed [`VaultRequest`] returns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VaultResponse {
    VaultCreated(VaultSnapshot),
    Transferred(TransferReceipt),
    Deposited { owner: AccountId, balance: Amount },
    Balance { owner: AccountId, balance: Amount },
}
