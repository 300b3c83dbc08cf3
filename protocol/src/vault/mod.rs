//! # Vault Module: Dual-Key Custody
//!
//! A vault holds a balance that can only leave when two independent keys,
//! in fixed roles A and B, both sign the same transfer. Each vault carries
//! a sequence number so a signed transfer works exactly once.
//!
//! ## Architecture
//!
//! ```text
//! amount.rs  : fixed-point amounts, 8 decimals, lossless string form
//! account.rs : 20-byte account identifiers
//! message.rs : domain tags and the canonical bytes signers sign
//! state.rs   : the vault record and its check/mutate helpers
//! request.rs : typed requests, responses and receipts
//! engine.rs  : the registry and the authorization pipeline
//! error.rs   : VaultError and its stable ErrorKind
//! ```
//!
//! ## Design Principles
//!
//! 1. **Amounts are scaled `u64`.** No floating point anywhere, not even at
//!    the string boundary.
//!
//! 2. **Roles are positional.** Signature A is checked against key A only.
//!    Both keys signing is not enough if they sign in the wrong slots.
//!
//! 3. **Check everything, then write once.** A rejected operation never
//!    leaves a partially updated vault behind.

pub mod account;
pub mod amount;
pub mod engine;
pub mod error;
pub mod message;
pub mod request;
pub mod state;

pub use account::AccountId;
pub use amount::{Amount, AmountError};
pub use engine::{VaultEngine, VaultHandle};
pub use error::{ErrorKind, KeyRole, VaultError};
pub use message::{canonicalize, CanonicalMessage, DomainTag, TransferIntent};
pub use request::{TransferReceipt, TransferRequest, VaultRequest, VaultResponse};
pub use state::{DualSignature, Vault, VaultKeys, VaultSnapshot};
