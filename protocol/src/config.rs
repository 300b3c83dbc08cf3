//! # Protocol Configuration & Constants
//!
//! Every fixed width, every precision and every default that the canonical
//! message layout depends on lives here. Signers and verifiers must agree
//! on all of these byte-for-byte, so changing one is a protocol break, not
//! a tuning knob.

use serde::{Deserialize, Serialize};

use crate::crypto::hash::HashAlgorithm;
use crate::vault::message::DomainTag;

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// The full version string of the vault protocol.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Canonical Message Layout
// ---------------------------------------------------------------------------

/// Width of the domain tag prefix. Shorter tags are right-padded with zeros.
pub const DOMAIN_TAG_LENGTH: usize = 32;

/// Width of an account identifier in raw bytes.
pub const ACCOUNT_ID_LENGTH: usize = 20;

/// Width of the big-endian scaled amount field.
pub const AMOUNT_FIELD_LENGTH: usize = 8;

/// Width of the big-endian sequence number field.
pub const SEQUENCE_FIELD_LENGTH: usize = 8;

/// Total length of a canonical transfer message.
pub const CANONICAL_MESSAGE_LENGTH: usize = DOMAIN_TAG_LENGTH
    + ACCOUNT_ID_LENGTH
    + ACCOUNT_ID_LENGTH
    + AMOUNT_FIELD_LENGTH
    + SEQUENCE_FIELD_LENGTH;

/// The "user" signing domain. Every transfer signature is bound to it
/// unless the engine is configured with a different tag.
pub const USER_DOMAIN_TAG: &str = "FLOW-V0.0-user";

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Signature schemes vault keys can be registered under.
pub const SIGNING_ALGORITHMS: &str = "Ed25519, ECDSA P-256";

/// Ed25519 public key length in bytes.
pub const ED25519_PUBLIC_KEY_LENGTH: usize = 32;

/// ECDSA P-256 public key length in bytes: uncompressed `x || y` with no
/// SEC1 tag byte.
pub const ECDSA_P256_PUBLIC_KEY_LENGTH: usize = 64;

/// Longest public key any supported scheme registers.
pub const MAX_PUBLIC_KEY_LENGTH: usize = ECDSA_P256_PUBLIC_KEY_LENGTH;

/// Signature length in bytes. Ed25519 signatures and fixed-width ECDSA
/// P-256 `r || s` signatures are both 64 bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// Secret key length in bytes for both schemes.
pub const SECRET_KEY_LENGTH: usize = 32;

/// Digest length for every supported prehash algorithm.
pub const HASH_OUTPUT_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Amounts
// ---------------------------------------------------------------------------

/// Fractional digits carried by every amount. One whole unit is
/// `10^AMOUNT_DECIMALS` scaled units.
pub const AMOUNT_DECIMALS: u32 = 8;

/// Scaled units per whole unit.
pub const UNITS_PER_WHOLE: u64 = 100_000_000;

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Runtime configuration for a [`VaultEngine`](crate::vault::VaultEngine).
///
/// Loaded from JSON by the node; tests use [`EngineConfig::default`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Domain tag bound into every canonical message the engine rebuilds.
    pub domain_tag: DomainTag,

    /// Prehash used by [`VaultEngine::sign_intent`](crate::vault::VaultEngine::sign_intent)
    /// when the caller does not pick one. Verification always follows the
    /// algorithm carried by the signature.
    pub default_hash_algorithm: HashAlgorithm,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            domain_tag: DomainTag::user(),
            default_hash_algorithm: HashAlgorithm::Sha2_256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_message_length() {
        assert_eq!(CANONICAL_MESSAGE_LENGTH, 88);
    }

    #[test]
    fn test_user_domain_tag_fits() {
        assert!(USER_DOMAIN_TAG.len() <= DOMAIN_TAG_LENGTH);
    }

    #[test]
    fn test_max_public_key_length() {
        assert!(ED25519_PUBLIC_KEY_LENGTH <= MAX_PUBLIC_KEY_LENGTH);
        assert!(ECDSA_P256_PUBLIC_KEY_LENGTH <= MAX_PUBLIC_KEY_LENGTH);
    }

    #[test]
    fn test_units_match_decimals() {
        assert_eq!(10u64.pow(AMOUNT_DECIMALS), UNITS_PER_WHOLE);
    }

    #[test]
    fn test_engine_config_json_defaults() {
        // An empty object must fall back to the user domain.
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_engine_config_roundtrip() {
        let config = EngineConfig {
            domain_tag: DomainTag::new("custody-test").unwrap(),
            default_hash_algorithm: HashAlgorithm::Blake3,
        };
        let json = serde_json::to_string(&config).unwrap();
        let recovered: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, recovered);
    }
}
