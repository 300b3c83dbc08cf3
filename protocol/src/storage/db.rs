//! # VaultDb: Persistent Vault Store
//!
//! The persistence layer for vault records, built on sled's embedded
//! key-value store.
//!
//! ## Tree Layout
//!
//! | Tree       | Key                      | Value            |
//! |------------|--------------------------|------------------|
//! | `vaults`   | account id (20B raw)     | `bincode(Vault)` |
//! | `metadata` | key (UTF-8)              | value (bytes)    |
//!
//! ## Atomicity
//!
//! A transfer rewrites two vault records. Both go into a single `Batch`
//! applied to the `vaults` tree, so either both land or neither does. A
//! crash can never leave the sender debited without the recipient credited.
//!
//! ## Domain binding
//!
//! The first engine to open a store records its domain tag under
//! `metadata/domain_tag`. Reopening with a different tag fails: the
//! sequence numbers in the store were consumed under the original domain.

use sled::{Batch, Db, Tree};
use std::path::Path;

use crate::vault::account::AccountId;
use crate::vault::message::DomainTag;
use crate::vault::state::Vault;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("store was created for domain '{stored}', engine is configured for '{configured}'")]
    DomainMismatch { stored: String, configured: String },
}

pub type DbResult<T> = Result<T, DbError>;

/// Well-known key in the `metadata` tree for the bound domain tag.
const META_DOMAIN_TAG: &[u8] = b"domain_tag";

// ---------------------------------------------------------------------------
// VaultDb
// ---------------------------------------------------------------------------

/// Persistent storage for vault records.
///
/// Cloning is cheap; every clone shares the same underlying sled handle.
#[derive(Debug, Clone)]
pub struct VaultDb {
    db: Db,
    vaults: Tree,
    metadata: Tree,
}

impl VaultDb {
    /// Open or create a database at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// A throwaway in-memory database. For tests.
    pub fn open_temporary() -> DbResult<Self> {
        let config = sled::Config::new().temporary(true);
        let db = config.open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> DbResult<Self> {
        let vaults = db.open_tree("vaults")?;
        let metadata = db.open_tree("metadata")?;
        Ok(Self {
            db,
            vaults,
            metadata,
        })
    }

    // -- Domain binding -----------------------------------------------------

    /// Record `domain` on first use, or check it against the stored one.
    pub fn bind_domain(&self, domain: &DomainTag) -> DbResult<()> {
        match self.metadata.get(META_DOMAIN_TAG)? {
            Some(stored) if stored.as_ref() == domain.as_bytes() => Ok(()),
            Some(stored) => Err(DbError::DomainMismatch {
                stored: String::from_utf8_lossy(&stored)
                    .trim_end_matches('\0')
                    .to_string(),
                configured: domain.to_string(),
            }),
            None => {
                self.metadata.insert(META_DOMAIN_TAG, &domain.as_bytes()[..])?;
                self.db.flush()?;
                Ok(())
            }
        }
    }

    // -- Vault operations ---------------------------------------------------

    /// Persist a single vault record and flush.
    pub fn put_vault(&self, vault: &Vault) -> DbResult<()> {
        self.put_vaults(&[vault])
    }

    /// Persist several vault records in one atomic batch and flush.
    pub fn put_vaults(&self, vaults: &[&Vault]) -> DbResult<()> {
        let mut batch = Batch::default();
        for vault in vaults {
            let bytes =
                bincode::serialize(vault).map_err(|e| DbError::Serialization(e.to_string()))?;
            batch.insert(&vault.owner().as_bytes()[..], bytes);
        }
        self.vaults.apply_batch(batch)?;
        self.db.flush()?;
        Ok(())
    }

    /// Retrieve a vault by owner. `None` if no vault was ever set up there.
    pub fn get_vault(&self, owner: &AccountId) -> DbResult<Option<Vault>> {
        match self.vaults.get(owner.as_bytes())? {
            Some(bytes) => {
                let vault: Vault = bincode::deserialize(&bytes)
                    .map_err(|e| DbError::Serialization(e.to_string()))?;
                Ok(Some(vault))
            }
            None => Ok(None),
        }
    }

    /// Load every stored vault, in account id order.
    pub fn load_all(&self) -> DbResult<Vec<Vault>> {
        let mut out = Vec::with_capacity(self.vaults.len());
        for entry in self.vaults.iter() {
            let (_key, value) = entry?;
            let vault: Vault =
                bincode::deserialize(&value).map_err(|e| DbError::Serialization(e.to_string()))?;
            out.push(vault);
        }
        Ok(out)
    }

    /// Number of stored vaults.
    pub fn vault_count(&self) -> usize {
        self.vaults.len()
    }

    /// Force a flush of all pending writes to disk.
    pub fn flush(&self) -> DbResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
