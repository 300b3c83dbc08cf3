//! # Cold Storage Contract
//!
//! The transaction surface over a [`VaultEngine`]. Callers wrap a
//! [`VaultRequest`] in a [`Transaction`] together with the accounts that
//! signed the envelope, submit it, and get back a [`TransactionOutcome`]:
//! either `Executed` with the engine's response or `Reverted` with a
//! stable reason code.
//!
//! ## Named Transactions
//!
//! | Constructor                         | Request    | Envelope signer  |
//! |-------------------------------------|------------|------------------|
//! | [`Transaction::setup_account`]      | `Setup`    | owner (required) |
//! | [`Transaction::transfer_tokens`]    | `Transfer` | sender (ignored) |
//! | [`Transaction::mint`]               | `Deposit`  | none             |
//! | [`Transaction::get_balance`]        | `GetBalance` | none           |
//!
//! A transfer is authorized by the two signatures it carries and nothing
//! else. Who submits the envelope does not matter.
//!
//! A revert never changes vault state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use cold_storage_protocol::vault::{
    AccountId, Amount, DualSignature, ErrorKind, TransferRequest, VaultEngine, VaultError,
    VaultRequest, VaultResponse,
};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Reasons a submitted transaction can revert.
#[derive(Debug, Error)]
pub enum ContractError {
    /// `setup_account` was not signed by the account the vault is for.
    #[error("transaction must be signed by vault owner {0}")]
    MissingOwnerSignature(AccountId),

    /// The engine rejected the request.
    #[error(transparent)]
    Vault(#[from] VaultError),
}

impl ContractError {
    pub fn reason(&self) -> RevertReason {
        match self {
            ContractError::MissingOwnerSignature(_) => RevertReason::MissingOwnerSignature,
            ContractError::Vault(err) => RevertReason::Vault(err.kind()),
        }
    }
}

/// Payload-free revert code carried by [`TransactionOutcome::Reverted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "kind", rename_all = "snake_case")]
pub enum RevertReason {
    MissingOwnerSignature,
    Vault(ErrorKind),
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// A request plus the accounts that signed its envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier, echoed in the outcome.
    pub id: Uuid,
    /// Accounts that authorized the envelope.
    #[serde(default)]
    pub signers: Vec<AccountId>,
    pub request: VaultRequest,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(request: VaultRequest, signers: Vec<AccountId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            signers,
            request,
            created_at: Utc::now(),
        }
    }

    /// Register a vault for `owner`, signed by `owner`.
    pub fn setup_account(owner: AccountId, public_key_a: &[u8], public_key_b: &[u8]) -> Self {
        Self::new(
            VaultRequest::Setup {
                owner,
                public_key_a: public_key_a.to_vec(),
                public_key_b: public_key_b.to_vec(),
            },
            vec![owner],
        )
    }

    /// Move `amount` out of `sender`'s vault, authorized by `signatures`.
    pub fn transfer_tokens(
        sender: AccountId,
        recipient: AccountId,
        amount: Amount,
        sequence_number: u64,
        signatures: DualSignature,
    ) -> Self {
        Self::new(
            VaultRequest::Transfer(TransferRequest {
                sender,
                recipient,
                amount,
                sequence_number,
                signatures,
            }),
            vec![sender],
        )
    }

    /// Fund a vault from outside the system.
    pub fn mint(owner: AccountId, amount: Amount) -> Self {
        Self::new(VaultRequest::Deposit { owner, amount }, Vec::new())
    }

    pub fn get_balance(owner: AccountId) -> Self {
        Self::new(VaultRequest::GetBalance { owner }, Vec::new())
    }

    pub fn is_signed_by(&self, account: &AccountId) -> bool {
        self.signers.contains(account)
    }
}

/// What happened to a submitted [`Transaction`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransactionOutcome {
    Executed {
        tx_id: Uuid,
        response: VaultResponse,
    },
    Reverted {
        tx_id: Uuid,
        reason: RevertReason,
        message: String,
    },
}

impl TransactionOutcome {
    pub fn tx_id(&self) -> Uuid {
        match self {
            TransactionOutcome::Executed { tx_id, .. } => *tx_id,
            TransactionOutcome::Reverted { tx_id, .. } => *tx_id,
        }
    }

    pub fn is_executed(&self) -> bool {
        matches!(self, TransactionOutcome::Executed { .. })
    }

    pub fn response(&self) -> Option<&VaultResponse> {
        match self {
            TransactionOutcome::Executed { response, .. } => Some(response),
            TransactionOutcome::Reverted { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<RevertReason> {
        match self {
            TransactionOutcome::Executed { .. } => None,
            TransactionOutcome::Reverted { reason, .. } => Some(*reason),
        }
    }
}

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

/// The deployed cold storage contract.
///
/// Cheap to clone; clones share one engine.
#[derive(Debug, Clone)]
pub struct ColdStorage {
    engine: Arc<VaultEngine>,
}

impl ColdStorage {
    pub fn new(engine: VaultEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    pub fn from_shared(engine: Arc<VaultEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &VaultEngine {
        &self.engine
    }

    /// Run `tx` and report the outcome. Never panics on bad input; every
    /// rejection is a `Reverted` outcome.
    pub fn submit(&self, tx: Transaction) -> TransactionOutcome {
        let tx_id = tx.id;
        let operation = tx.request.name();
        let mutating = tx.request.is_mutating();
        match self.execute(tx) {
            Ok(response) => {
                if mutating {
                    info!(%tx_id, operation, "transaction executed");
                } else {
                    debug!(%tx_id, operation, "query executed");
                }
                TransactionOutcome::Executed { tx_id, response }
            }
            Err(err) => {
                warn!(%tx_id, operation, reason = ?err.reason(), "transaction reverted");
                TransactionOutcome::Reverted {
                    tx_id,
                    reason: err.reason(),
                    message: err.to_string(),
                }
            }
        }
    }

    /// Read a balance without going through a transaction.
    pub fn balance(&self, owner: &AccountId) -> Result<Amount, ContractError> {
        Ok(self.engine.get_balance(owner)?)
    }

    fn execute(&self, tx: Transaction) -> Result<VaultResponse, ContractError> {
        if let VaultRequest::Setup { owner, .. } = &tx.request {
            if !tx.is_signed_by(owner) {
                return Err(ContractError::MissingOwnerSignature(*owner));
            }
        }
        Ok(self.engine.execute(tx.request)?)
    }
}
