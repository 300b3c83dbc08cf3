//! # Vault Authorization Engine
//!
//! Owns every vault and is the only path that mutates one. Three
//! operations write state: [`VaultEngine::setup`], [`VaultEngine::deposit`]
//! and [`VaultEngine::transfer`].
//!
//! ## Transfer Pipeline
//!
//! A transfer is checked in a fixed order and the first failure wins:
//!
//! 1. the sequence number must equal the sender's current one;
//! 2. the amount must be non-zero and covered by the sender's balance;
//! 3. the canonical message is rebuilt under the engine's domain tag;
//! 4. signature A must verify against key A;
//! 5. signature B must verify against key B.
//!
//! Only then is anything written. Sender debit, recipient credit and the
//! sequence increment land together or not at all.
//!
//! ## Locking
//!
//! Vaults sit in a `DashMap` of `Arc<RwLock<Vault>>`. Steps 1-2 run under a
//! read lock, signature verification runs with no lock held, and the commit
//! takes write locks on both vaults in ascending account id order. Under
//! the write locks steps 1-2 are repeated, so of two racing submissions of
//! the same signed transfer exactly one commits; the other sees the
//! advanced sequence number and is rejected as stale.
//!
//! When a [`VaultDb`] is attached, the new records are written in a single
//! batch while the locks are held and before memory is updated. A storage
//! error leaves the in-memory vaults as they were.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use super::account::AccountId;
use super::amount::Amount;
use super::error::{KeyRole, VaultError};
use super::message::{CanonicalMessage, DomainTag, TransferIntent};
use super::request::{TransferReceipt, TransferRequest, VaultRequest, VaultResponse};
use super::state::{Vault, VaultKeys, VaultSnapshot};
use crate::config::EngineConfig;
use crate::crypto::hash::HashAlgorithm;
use crate::crypto::keys::{VaultKeypair, VaultPublicKey, VaultSignature};
use crate::crypto::signatures;
use crate::storage::VaultDb;

type VaultCell = Arc<RwLock<Vault>>;

// ---------------------------------------------------------------------------
// VaultHandle
// ---------------------------------------------------------------------------

/// Read-only view of a live vault, returned by [`VaultEngine::setup`].
///
/// Reads go through the vault's lock, so a handle always reflects the
/// latest committed state.
#[derive(Clone, Debug)]
pub struct VaultHandle {
    owner: AccountId,
    cell: VaultCell,
}

impl VaultHandle {
    pub fn owner(&self) -> AccountId {
        self.owner
    }

    pub fn keys(&self) -> VaultKeys {
        *self.cell.read().keys()
    }

    pub fn balance(&self) -> Amount {
        self.cell.read().balance()
    }

    pub fn sequence_number(&self) -> u64 {
        self.cell.read().sequence_number()
    }

    pub fn snapshot(&self) -> VaultSnapshot {
        self.cell.read().snapshot()
    }
}

// ---------------------------------------------------------------------------
// VaultEngine
// ---------------------------------------------------------------------------

/// The vault registry and its authorization rules.
#[derive(Debug)]
pub struct VaultEngine {
    config: EngineConfig,
    vaults: DashMap<AccountId, VaultCell>,
    store: Option<VaultDb>,
}

impl VaultEngine {
    /// An in-memory engine with no persistence.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            vaults: DashMap::new(),
            store: None,
        }
    }

    /// An engine backed by `db`. Every persisted vault is loaded, and the
    /// store is bound to (or checked against) the configured domain tag.
    pub fn with_store(config: EngineConfig, db: VaultDb) -> Result<Self, VaultError> {
        db.bind_domain(&config.domain_tag)?;
        let vaults = DashMap::new();
        for vault in db.load_all()? {
            vaults.insert(vault.owner(), Arc::new(RwLock::new(vault)));
        }
        info!(
            domain = %config.domain_tag,
            vaults = vaults.len(),
            "vault engine opened with persistent store"
        );
        Ok(Self {
            config,
            vaults,
            store: Some(db),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The domain tag every transfer signature is bound to.
    pub fn domain_tag(&self) -> &DomainTag {
        &self.config.domain_tag
    }

    /// The message signers must sign for `intent` on this engine.
    pub fn canonical_message(&self, intent: &TransferIntent) -> CanonicalMessage {
        intent.canonical_message(&self.config.domain_tag)
    }

    /// Sign `intent` the way this engine will verify it. `hash_algorithm`
    /// falls back to the configured default prehash.
    pub fn sign_intent(
        &self,
        keypair: &VaultKeypair,
        intent: &TransferIntent,
        hash_algorithm: Option<HashAlgorithm>,
    ) -> Result<VaultSignature, VaultError> {
        let hash_algorithm = hash_algorithm.unwrap_or(self.config.default_hash_algorithm);
        let message = self.canonical_message(intent);
        keypair
            .sign(message.as_bytes(), hash_algorithm)
            .map_err(VaultError::Signing)
    }

    // -- Setup --------------------------------------------------------------

    /// Register a vault for `owner` with keys A and B.
    ///
    /// Keys are validated as Ed25519 points and must differ. A vault can be
    /// set up once; a second attempt fails and leaves the original keys in
    /// place.
    pub fn setup(
        &self,
        owner: AccountId,
        public_key_a: &[u8],
        public_key_b: &[u8],
    ) -> Result<VaultHandle, VaultError> {
        let a = parse_key(KeyRole::A, public_key_a)?;
        let b = parse_key(KeyRole::B, public_key_b)?;
        if a == b {
            return Err(VaultError::InvalidKeyFormat {
                role: KeyRole::B,
                reason: "key B must differ from key A".to_string(),
            });
        }

        match self.vaults.entry(owner) {
            Entry::Occupied(_) => {
                warn!(%owner, "setup rejected: vault already initialized");
                Err(VaultError::AlreadyInitialized(owner))
            }
            Entry::Vacant(slot) => {
                // The shard stays write-locked through the store write, so a
                // racing setup for the same owner waits and then sees
                // `Occupied`. Other owners on this shard wait too.
                let vault = Vault::new(owner, VaultKeys { a, b });
                self.persist(&[&vault])?;
                let cell = Arc::new(RwLock::new(vault));
                slot.insert(Arc::clone(&cell));
                info!(%owner, key_a = %a, key_b = %b, "vault created");
                Ok(VaultHandle { owner, cell })
            }
        }
    }

    // -- Deposit ------------------------------------------------------------

    /// Credit `amount` to `owner`'s vault. Requires no signatures and does
    /// not touch the sequence number. Returns the new balance.
    pub fn deposit(&self, owner: AccountId, amount: Amount) -> Result<Amount, VaultError> {
        let cell = self.cell(&owner)?;
        if amount.is_zero() {
            return Err(VaultError::InvalidAmount);
        }

        let mut vault = cell.write();
        let balance = vault.credited(amount)?;
        let mut next = vault.clone();
        next.set_balance(balance);
        self.persist(&[&next])?;
        *vault = next;

        info!(%owner, %amount, %balance, "deposit committed");
        Ok(balance)
    }

    // -- Transfer -----------------------------------------------------------

    /// Validate and commit a dual-signed transfer.
    pub fn transfer(&self, request: &TransferRequest) -> Result<TransferReceipt, VaultError> {
        let result = self.try_transfer(request);
        match &result {
            Ok(receipt) => info!(
                sender = %receipt.sender,
                recipient = %receipt.recipient,
                amount = %receipt.amount,
                sequence_number = receipt.consumed_sequence_number,
                "transfer committed"
            ),
            Err(err) => warn!(
                sender = %request.sender,
                recipient = %request.recipient,
                sequence_number = request.sequence_number,
                kind = ?err.kind(),
                "transfer rejected"
            ),
        }
        result
    }

    fn try_transfer(&self, request: &TransferRequest) -> Result<TransferReceipt, VaultError> {
        let sender_cell = self.cell(&request.sender)?;
        let recipient_cell = self.cell(&request.recipient)?;

        // Cheap checks first. Keys never change after setup, so a copy taken
        // here is still the vault's keys at commit time.
        let keys = {
            let sender = sender_cell.read();
            sender.check_sequence(request.sequence_number)?;
            sender.check_spendable(request.amount)?;
            *sender.keys()
        };

        let message = self.canonical_message(&request.intent());
        verify_role(&keys.a, KeyRole::A, &message, &request.signatures.a)?;
        verify_role(&keys.b, KeyRole::B, &message, &request.signatures.b)?;

        if request.sender == request.recipient {
            return self.commit_self_transfer(&sender_cell, request);
        }

        let (mut sender, mut recipient) = if request.sender < request.recipient {
            let s = sender_cell.write();
            let r = recipient_cell.write();
            (s, r)
        } else {
            let r = recipient_cell.write();
            let s = sender_cell.write();
            (s, r)
        };

        sender.check_sequence(request.sequence_number)?;
        sender.check_spendable(request.amount)?;
        let next_sequence = sender.next_sequence()?;
        let sender_balance = sender
            .balance()
            .checked_sub(request.amount)
            .ok_or(VaultError::InsufficientFunds {
                available: sender.balance(),
                requested: request.amount,
            })?;
        let recipient_balance = recipient.credited(request.amount)?;

        let mut next_sender = sender.clone();
        next_sender.set_balance(sender_balance);
        next_sender.set_sequence_number(next_sequence);
        let mut next_recipient = recipient.clone();
        next_recipient.set_balance(recipient_balance);

        self.persist(&[&next_sender, &next_recipient])?;
        *sender = next_sender;
        *recipient = next_recipient;

        Ok(TransferReceipt {
            sender: request.sender,
            recipient: request.recipient,
            amount: request.amount,
            consumed_sequence_number: request.sequence_number,
            next_sequence_number: next_sequence,
            sender_balance,
            recipient_balance,
        })
    }

    /// Sender and recipient are the same vault: one lock, balance unchanged,
    /// sequence number consumed.
    fn commit_self_transfer(
        &self,
        cell: &VaultCell,
        request: &TransferRequest,
    ) -> Result<TransferReceipt, VaultError> {
        let mut vault = cell.write();
        vault.check_sequence(request.sequence_number)?;
        vault.check_spendable(request.amount)?;
        let next_sequence = vault.next_sequence()?;

        let mut next = vault.clone();
        next.set_sequence_number(next_sequence);
        self.persist(&[&next])?;
        *vault = next;

        let balance = vault.balance();
        Ok(TransferReceipt {
            sender: request.sender,
            recipient: request.recipient,
            amount: request.amount,
            consumed_sequence_number: request.sequence_number,
            next_sequence_number: next_sequence,
            sender_balance: balance,
            recipient_balance: balance,
        })
    }

    // -- Reads --------------------------------------------------------------

    pub fn get_balance(&self, owner: &AccountId) -> Result<Amount, VaultError> {
        Ok(self.cell(owner)?.read().balance())
    }

    pub fn sequence_number(&self, owner: &AccountId) -> Result<u64, VaultError> {
        Ok(self.cell(owner)?.read().sequence_number())
    }

    pub fn vault(&self, owner: &AccountId) -> Result<VaultSnapshot, VaultError> {
        Ok(self.cell(owner)?.read().snapshot())
    }

    pub fn vault_count(&self) -> usize {
        self.vaults.len()
    }

    /// Flush the attached store, if any.
    pub fn flush(&self) -> Result<(), VaultError> {
        if let Some(store) = &self.store {
            store.flush()?;
        }
        Ok(())
    }

    // -- Dispatch -----------------------------------------------------------

    /// Run one typed request.
    pub fn execute(&self, request: VaultRequest) -> Result<VaultResponse, VaultError> {
        debug!(operation = request.name(), "executing vault request");
        match request {
            VaultRequest::Setup {
                owner,
                public_key_a,
                public_key_b,
            } => {
                let handle = self.setup(owner, &public_key_a, &public_key_b)?;
                Ok(VaultResponse::VaultCreated(handle.snapshot()))
            }
            VaultRequest::Transfer(transfer) => {
                Ok(VaultResponse::Transferred(self.transfer(&transfer)?))
            }
            VaultRequest::Deposit { owner, amount } => {
                let balance = self.deposit(owner, amount)?;
                Ok(VaultResponse::Deposited { owner, balance })
            }
            VaultRequest::GetBalance { owner } => {
                let balance = self.get_balance(&owner)?;
                Ok(VaultResponse::Balance { owner, balance })
            }
        }
    }

    // -- Internals ----------------------------------------------------------

    /// Clone the vault's `Arc` out of the map so no shard lock is held
    /// while the vault lock is taken.
    fn cell(&self, owner: &AccountId) -> Result<VaultCell, VaultError> {
        self.vaults
            .get(owner)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(VaultError::VaultNotFound(*owner))
    }

    fn persist(&self, vaults: &[&Vault]) -> Result<(), VaultError> {
        if let Some(store) = &self.store {
            store.put_vaults(vaults)?;
        }
        Ok(())
    }
}

fn parse_key(role: KeyRole, bytes: &[u8]) -> Result<VaultPublicKey, VaultError> {
    VaultPublicKey::try_from_slice(bytes).map_err(|e| VaultError::InvalidKeyFormat {
        role,
        reason: e.to_string(),
    })
}

fn verify_role(
    key: &VaultPublicKey,
    role: KeyRole,
    message: &CanonicalMessage,
    signature: &VaultSignature,
) -> Result<(), VaultError> {
    let result = signatures::verify(key, message.as_bytes(), signature);
    debug!(%role, hash = %signature.hash_algorithm, valid = result.is_ok(), "signature checked");
    result.map_err(|_| VaultError::SignatureInvalid(role))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
