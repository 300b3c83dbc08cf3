// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Cold Storage Protocol: Core Library
//!
//! Custody vaults guarded by two keys. Moving funds out of a vault takes a
//! signature (Ed25519 or ECDSA P-256) from each of the vault's two
//! registered keys over one canonical, domain-separated message. A
//! per-vault sequence number makes every signed transfer single-use.
//!
//! ## Architecture
//!
//! - **crypto**: Ed25519 and ECDSA P-256 keys, signatures and the prehash
//!   algorithms.
//! - **vault**: Amounts, canonical messages, vault records and the engine.
//! - **storage**: Optional sled-backed persistence for vault records.
//! - **config**: Protocol constants and engine configuration.
//!
//! ## Quick Start
//!
//! ```
//! use cold_storage_protocol::config::EngineConfig;
//! use cold_storage_protocol::crypto::{HashAlgorithm, VaultKeypair};
//! use cold_storage_protocol::vault::{DualSignature, TransferIntent, TransferRequest, VaultEngine};
//!
//! let engine = VaultEngine::new(EngineConfig::default());
//! let (a, b) = (VaultKeypair::generate(), VaultKeypair::generate());
//! let sender = "0x0b".parse().unwrap();
//! let recipient = "0x0a".parse().unwrap();
//!
//! engine.setup(sender, a.public_key().as_bytes(), b.public_key().as_bytes()).unwrap();
//! engine
//!     .setup(recipient, VaultKeypair::generate().public_key().as_bytes(),
//!            VaultKeypair::generate().public_key().as_bytes())
//!     .unwrap();
//! engine.deposit(sender, "10.0".parse().unwrap()).unwrap();
//!
//! let intent = TransferIntent {
//!     sender,
//!     recipient,
//!     amount: "5.0".parse().unwrap(),
//!     sequence_number: 0,
//! };
//! let message = engine.canonical_message(&intent);
//! let request = TransferRequest {
//!     sender,
//!     recipient,
//!     amount: intent.amount,
//!     sequence_number: 0,
//!     signatures: DualSignature {
//!         a: a.sign(message.as_bytes(), HashAlgorithm::Sha2_256).unwrap(),
//!         b: b.sign(message.as_bytes(), HashAlgorithm::Sha2_256).unwrap(),
//!     },
//! };
//!
//! let receipt = engine.transfer(&request).unwrap();
//! assert_eq!(receipt.sender_balance.to_string(), "5.00000000");
//! ```

pub mod config;
pub mod crypto;
pub mod storage;
pub mod vault;
