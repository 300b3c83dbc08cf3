//! # Cryptographic Primitives
//!
//! Everything the vault needs to check a signature, and nothing more:
//!
//! - **Ed25519** and **ECDSA P-256** for signatures, via `ed25519-dalek`
//!   and `p256`.
//! - **SHA-256**, **SHA3-256** and **BLAKE3** as the prehash applied to
//!   canonical messages before signing.

pub mod hash;
pub mod keys;
pub mod signatures;

pub use hash::{blake3_hash, sha256, sha3_256, HashAlgorithm, UnknownAlgorithm};
pub use keys::{KeyError, SigningAlgorithm, VaultKeypair, VaultPublicKey, VaultSignature};
pub use signatures::{sign, verify, SignatureError};
