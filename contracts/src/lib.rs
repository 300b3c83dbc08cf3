//! # Cold Storage Contracts
//!
//! The transaction layer in front of the vault engine. Requests arrive as
//! transactions carrying a list of envelope signers, and leave as executed
//! or reverted outcomes.
//!
//! - **Cold Storage**: vault setup, dual-signed transfers, minting and
//!   balance queries.
//!
//! ## Design Principles
//!
//! 1. Submission never panics. Every rejection becomes a `Reverted`
//!    outcome with a stable reason code.
//! 2. Envelope signers only gate setup. Transfers are authorized by the
//!    two vault signatures they carry.
//! 3. Every public type is serializable (serde) so outcomes can be logged,
//!    replayed or printed by the node.

pub mod cold_storage;

pub use cold_storage::{ColdStorage, ContractError, RevertReason, Transaction, TransactionOutcome};
