//! # Hashing Utilities
//!
//! Vault signatures are made over a digest of the canonical message, not
//! the raw bytes. The digest algorithm travels with every signature so the
//! verifier can rebuild exactly what the signer signed:
//!
//! - **SHA-256**: the default. What most external signers (HSMs, hardware
//!   wallets, cloud KMS) can produce without custom firmware.
//! - **SHA3-256**: what Flow-style ECDSA P-256 account keys sign with.
//! - **BLAKE3**: for signers that live in our own tooling and want the
//!   faster hash.
//!
//! Adding a third algorithm means adding a variant here and nowhere else.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sha3::Sha3_256;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::HASH_OUTPUT_LENGTH;

/// Hash applied to the canonical message before signing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    /// SHA-2 with a 256-bit digest.
    #[serde(rename = "SHA2_256")]
    Sha2_256,
    /// SHA-3 with a 256-bit digest.
    #[serde(rename = "SHA3_256")]
    Sha3_256,
    /// BLAKE3 with a 256-bit digest.
    #[serde(rename = "BLAKE3")]
    Blake3,
}

impl HashAlgorithm {
    /// Hash `data` with this algorithm.
    pub fn digest(&self, data: &[u8]) -> [u8; HASH_OUTPUT_LENGTH] {
        match self {
            Self::Sha2_256 => sha256(data),
            Self::Sha3_256 => sha3_256(data),
            Self::Blake3 => blake3_hash(data),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha2_256 => write!(f, "SHA2_256"),
            Self::Sha3_256 => write!(f, "SHA3_256"),
            Self::Blake3 => write!(f, "BLAKE3"),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = UnknownAlgorithm;

    /// Accepts the serde names case-insensitively, with `-` or `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "SHA2_256" | "SHA256" => Ok(Self::Sha2_256),
            "SHA3_256" => Ok(Self::Sha3_256),
            "BLAKE3" => Ok(Self::Blake3),
            _ => Err(UnknownAlgorithm(s.to_string())),
        }
    }
}

/// An algorithm name that matches no supported variant.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown algorithm '{0}'")]
pub struct UnknownAlgorithm(pub String);

/// Compute the SHA-256 hash of the input data.
///
/// # Example
///
/// ```
/// use cold_storage_protocol::crypto::sha256;
///
/// let hash = sha256(b"cold storage");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; HASH_OUTPUT_LENGTH] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; HASH_OUTPUT_LENGTH];
    output.copy_from_slice(&result);
    output
}

/// Compute the SHA3-256 hash of the input data.
pub fn sha3_256(data: &[u8]) -> [u8; HASH_OUTPUT_LENGTH] {
    let mut output = [0u8; HASH_OUTPUT_LENGTH];
    output.copy_from_slice(&Sha3_256::digest(data));
    output
}

/// Compute the BLAKE3 hash of the input data.
pub fn blake3_hash(data: &[u8]) -> [u8; HASH_OUTPUT_LENGTH] {
    *blake3::hash(data).as_bytes()
}
