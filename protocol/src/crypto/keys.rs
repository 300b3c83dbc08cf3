//! # Key Management
//!
//! Vault keys and signatures as the vault sees them.
//!
//! Two schemes are supported:
//!
//! - **Ed25519** via `ed25519-dalek`: 32-byte public keys, strict
//!   verification.
//! - **ECDSA P-256** via `p256`: 64-byte uncompressed `x || y` public keys
//!   and fixed-width `r || s` signatures, the encoding Flow account keys
//!   use.
//!
//! A vault registers two [`VaultPublicKey`]s at setup and never learns the
//! matching secrets. [`VaultKeypair`] exists for the people holding those
//! secrets: test fixtures, the benchmark harness, and offline signers that
//! want to produce a [`VaultSignature`] in exactly the shape the engine
//! verifies.
//!
//! ## Security considerations
//!
//! - Private keys are zeroized on drop (both backends do this).
//! - Key generation uses `OsRng`.
//! - Secret bytes never reach `Debug` output or log events.

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use p256::ecdsa::{
    Signature as P256Signature, SigningKey as P256SigningKey, VerifyingKey as P256VerifyingKey,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::hash::{HashAlgorithm, UnknownAlgorithm};
use crate::config::{
    ECDSA_P256_PUBLIC_KEY_LENGTH, ED25519_PUBLIC_KEY_LENGTH, MAX_PUBLIC_KEY_LENGTH,
    SECRET_KEY_LENGTH, SIGNATURE_LENGTH,
};

/// SEC1 tag for an uncompressed point.
const SEC1_UNCOMPRESSED_TAG: u8 = 0x04;

/// Errors that can occur during key operations.
///
/// Messages never include key material.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid secret key bytes: wrong length, not hex, or out of range")]
    InvalidSecretKey,

    #[error("invalid public key: expected 32 (Ed25519) or 64 (ECDSA P-256) bytes, got {0}")]
    InvalidLength(usize),

    #[error("invalid public key: not a valid {0} point")]
    InvalidPoint(SigningAlgorithm),

    #[error("invalid public key: not hex")]
    InvalidHex,

    #[error("{0} signing failed")]
    SigningFailed(SigningAlgorithm),
}

// ---------------------------------------------------------------------------
// SigningAlgorithm
// ---------------------------------------------------------------------------

/// Signature scheme of a key or of a [`VaultSignature`].
///
/// A signature only verifies against a key registered under the same
/// scheme.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SigningAlgorithm {
    #[serde(rename = "ED25519")]
    Ed25519,
    #[serde(rename = "ECDSA_P256")]
    EcdsaP256,
}

impl SigningAlgorithm {
    /// Raw public key length for this scheme.
    pub const fn public_key_length(&self) -> usize {
        match self {
            Self::Ed25519 => ED25519_PUBLIC_KEY_LENGTH,
            Self::EcdsaP256 => ECDSA_P256_PUBLIC_KEY_LENGTH,
        }
    }

    /// The scheme a raw public key of `len` bytes belongs to.
    pub fn for_public_key_length(len: usize) -> Option<Self> {
        match len {
            ED25519_PUBLIC_KEY_LENGTH => Some(Self::Ed25519),
            ECDSA_P256_PUBLIC_KEY_LENGTH => Some(Self::EcdsaP256),
            _ => None,
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ed25519 => write!(f, "ED25519"),
            Self::EcdsaP256 => write!(f, "ECDSA_P256"),
        }
    }
}

impl FromStr for SigningAlgorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "ED25519" => Ok(Self::Ed25519),
            "ECDSA_P256" | "P256" => Ok(Self::EcdsaP256),
            _ => Err(UnknownAlgorithm(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// VaultKeypair
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum SecretKey {
    Ed25519(SigningKey),
    EcdsaP256(P256SigningKey),
}

/// A signing keypair held by one of a vault's two signers.
///
/// Deliberately not `Serialize`. Export the secret with
/// [`secret_key_bytes`](Self::secret_key_bytes) when you mean to.
#[derive(Clone)]
pub struct VaultKeypair {
    secret: SecretKey,
}

impl VaultKeypair {
    /// Generate a fresh Ed25519 keypair from the OS RNG.
    pub fn generate() -> Self {
        Self::generate_with(SigningAlgorithm::Ed25519)
    }

    /// Generate a fresh keypair for `algorithm` from the OS RNG.
    pub fn generate_with(algorithm: SigningAlgorithm) -> Self {
        let secret = match algorithm {
            SigningAlgorithm::Ed25519 => SecretKey::Ed25519(SigningKey::generate(&mut OsRng)),
            SigningAlgorithm::EcdsaP256 => SecretKey::EcdsaP256(P256SigningKey::random(&mut OsRng)),
        };
        Self { secret }
    }

    /// Build an Ed25519 keypair deterministically from a 32-byte seed.
    ///
    /// Test fixtures use this so that signatures are reproducible.
    pub fn from_seed(seed: &[u8; SECRET_KEY_LENGTH]) -> Self {
        Self {
            secret: SecretKey::Ed25519(SigningKey::from_bytes(seed)),
        }
    }

    /// Load a keypair for `algorithm` from its raw 32-byte secret.
    ///
    /// For ECDSA P-256 the secret is the big-endian scalar and must lie in
    /// `1..n`.
    pub fn from_secret_bytes(algorithm: SigningAlgorithm, bytes: &[u8]) -> Result<Self, KeyError> {
        let secret = match algorithm {
            SigningAlgorithm::Ed25519 => {
                let seed: [u8; SECRET_KEY_LENGTH] =
                    bytes.try_into().map_err(|_| KeyError::InvalidSecretKey)?;
                SecretKey::Ed25519(SigningKey::from_bytes(&seed))
            }
            SigningAlgorithm::EcdsaP256 => {
                if bytes.len() != SECRET_KEY_LENGTH {
                    return Err(KeyError::InvalidSecretKey);
                }
                SecretKey::EcdsaP256(
                    P256SigningKey::from_slice(bytes).map_err(|_| KeyError::InvalidSecretKey)?,
                )
            }
        };
        Ok(Self { secret })
    }

    /// Load an Ed25519 keypair from a hex-encoded 32-byte secret.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        Self::from_secret_hex(SigningAlgorithm::Ed25519, hex_str)
    }

    /// Load a keypair for `algorithm` from a hex-encoded secret, with or
    /// without a `0x` prefix.
    pub fn from_secret_hex(algorithm: SigningAlgorithm, hex_str: &str) -> Result<Self, KeyError> {
        let trimmed = hex_str.trim();
        let bytes = hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))
            .map_err(|_| KeyError::InvalidSecretKey)?;
        Self::from_secret_bytes(algorithm, &bytes)
    }

    pub fn algorithm(&self) -> SigningAlgorithm {
        match self.secret {
            SecretKey::Ed25519(_) => SigningAlgorithm::Ed25519,
            SecretKey::EcdsaP256(_) => SigningAlgorithm::EcdsaP256,
        }
    }

    /// The public half, ready to register with a vault.
    pub fn public_key(&self) -> VaultPublicKey {
        match &self.secret {
            SecretKey::Ed25519(key) => {
                VaultPublicKey::packed(SigningAlgorithm::Ed25519, &key.verifying_key().to_bytes())
            }
            SecretKey::EcdsaP256(key) => {
                let point = key.verifying_key().to_encoded_point(false);
                // Drop the SEC1 tag byte.
                VaultPublicKey::packed(SigningAlgorithm::EcdsaP256, &point.as_bytes()[1..])
            }
        }
    }

    /// Sign `message` after hashing it with `hash_algorithm`.
    ///
    /// The signature is over the digest, matching what
    /// [`VaultPublicKey::verify`] reconstructs.
    pub fn sign(
        &self,
        message: &[u8],
        hash_algorithm: HashAlgorithm,
    ) -> Result<VaultSignature, KeyError> {
        let digest = hash_algorithm.digest(message);
        let bytes = match &self.secret {
            SecretKey::Ed25519(key) => key.sign(&digest).to_bytes().to_vec(),
            SecretKey::EcdsaP256(key) => {
                let sig: P256Signature = key
                    .sign_prehash(&digest)
                    .map_err(|_| KeyError::SigningFailed(SigningAlgorithm::EcdsaP256))?;
                sig.to_bytes().to_vec()
            }
        };
        Ok(VaultSignature {
            bytes,
            signing_algorithm: self.algorithm(),
            hash_algorithm,
        })
    }

    /// Exports the raw 32-byte secret. Handle with care.
    pub fn secret_key_bytes(&self) -> [u8; SECRET_KEY_LENGTH] {
        match &self.secret {
            SecretKey::Ed25519(key) => key.to_bytes(),
            SecretKey::EcdsaP256(key) => {
                let mut out = [0u8; SECRET_KEY_LENGTH];
                out.copy_from_slice(&key.to_bytes());
                out
            }
        }
    }
}

impl fmt::Debug for VaultKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VaultKeypair({}, pub={})", self.algorithm(), self.public_key())
    }
}

// ---------------------------------------------------------------------------
// VaultPublicKey
// ---------------------------------------------------------------------------

/// A validated public key registered in a vault slot.
///
/// Construction always goes through point validation for the key's
/// scheme, so a `VaultPublicKey` in hand is known to decode.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct VaultPublicKey {
    algorithm: SigningAlgorithm,
    bytes: [u8; MAX_PUBLIC_KEY_LENGTH],
}

impl VaultPublicKey {
    /// Store already-validated key bytes. Unused trailing bytes stay zero.
    fn packed(algorithm: SigningAlgorithm, raw: &[u8]) -> Self {
        let mut bytes = [0u8; MAX_PUBLIC_KEY_LENGTH];
        bytes[..raw.len()].copy_from_slice(raw);
        Self { algorithm, bytes }
    }

    /// Validate raw key bytes, picking the scheme from their length:
    /// 32 bytes is Ed25519, 64 bytes is ECDSA P-256.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let algorithm = SigningAlgorithm::for_public_key_length(slice.len())
            .ok_or(KeyError::InvalidLength(slice.len()))?;
        Self::from_slice_with(algorithm, slice)
    }

    /// Validate raw key bytes as a key for `algorithm`: exact length, and a
    /// point on that scheme's curve.
    pub fn from_slice_with(algorithm: SigningAlgorithm, slice: &[u8]) -> Result<Self, KeyError> {
        if slice.len() != algorithm.public_key_length() {
            return Err(KeyError::InvalidLength(slice.len()));
        }
        let valid = match algorithm {
            SigningAlgorithm::Ed25519 => ed25519_key(slice).is_some(),
            SigningAlgorithm::EcdsaP256 => p256_key(slice).is_some(),
        };
        if !valid {
            return Err(KeyError::InvalidPoint(algorithm));
        }
        Ok(Self::packed(algorithm, slice))
    }

    /// Parse a hex-encoded key, with or without a `0x` prefix.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let trimmed = hex_str.trim();
        let stripped = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(stripped).map_err(|_| KeyError::InvalidHex)?;
        Self::try_from_slice(&bytes)
    }

    pub fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    /// Raw key bytes: 32 for Ed25519, 64 for ECDSA P-256.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.algorithm.public_key_length()]
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }

    /// Verify `signature` over `message` with this key.
    ///
    /// The message is hashed with the algorithm the signature declares.
    /// Returns `false` for any failure: scheme mismatch, wrong length, or a
    /// signature that does not check out. Ed25519 uses strict
    /// verification, so malleated and small-order edge cases are rejected
    /// too.
    pub fn verify(&self, message: &[u8], signature: &VaultSignature) -> bool {
        if signature.signing_algorithm != self.algorithm {
            return false;
        }
        let Ok(sig_bytes) = <[u8; SIGNATURE_LENGTH]>::try_from(signature.bytes.as_slice()) else {
            return false;
        };
        let digest = signature.hash_algorithm.digest(message);
        match self.algorithm {
            SigningAlgorithm::Ed25519 => {
                let Some(key) = ed25519_key(self.as_bytes()) else {
                    return false;
                };
                let sig = ed25519_dalek::Signature::from_bytes(&sig_bytes);
                key.verify_strict(&digest, &sig).is_ok()
            }
            SigningAlgorithm::EcdsaP256 => {
                let Some(key) = p256_key(self.as_bytes()) else {
                    return false;
                };
                let Ok(sig) = P256Signature::from_slice(&sig_bytes) else {
                    return false;
                };
                key.verify_prehash(&digest, &sig).is_ok()
            }
        }
    }
}

fn ed25519_key(raw: &[u8]) -> Option<VerifyingKey> {
    let bytes: [u8; ED25519_PUBLIC_KEY_LENGTH] = raw.try_into().ok()?;
    VerifyingKey::from_bytes(&bytes).ok()
}

fn p256_key(raw: &[u8]) -> Option<P256VerifyingKey> {
    if raw.len() != ECDSA_P256_PUBLIC_KEY_LENGTH {
        return None;
    }
    let mut sec1 = [0u8; ECDSA_P256_PUBLIC_KEY_LENGTH + 1];
    sec1[0] = SEC1_UNCOMPRESSED_TAG;
    sec1[1..].copy_from_slice(raw);
    P256VerifyingKey::from_sec1_bytes(&sec1).ok()
}

impl fmt::Display for VaultPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for VaultPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VaultPublicKey({}, {})", self.algorithm, self.to_hex())
    }
}

impl FromStr for VaultPublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for VaultPublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            serializer.serialize_bytes(self.as_bytes())
        }
    }
}

impl<'de> Deserialize<'de> for VaultPublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Self::from_hex(&s).map_err(serde::de::Error::custom)
        } else {
            let bytes = Vec::<u8>::deserialize(deserializer)?;
            Self::try_from_slice(&bytes).map_err(serde::de::Error::custom)
        }
    }
}

// ---------------------------------------------------------------------------
// VaultSignature
// ---------------------------------------------------------------------------

/// A signature over a canonical message, tagged with how it was made.
///
/// `bytes` is kept as a `Vec<u8>` because it arrives off the wire with
/// unchecked length. A wrong-length signature simply fails verification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultSignature {
    #[serde(with = "hex_bytes")]
    pub bytes: Vec<u8>,
    pub signing_algorithm: SigningAlgorithm,
    pub hash_algorithm: HashAlgorithm,
}

impl VaultSignature {
    /// Build an Ed25519 signature record from hex-encoded bytes.
    pub fn from_hex(hex_str: &str, hash_algorithm: HashAlgorithm) -> Result<Self, hex::FromHexError> {
        Self::from_hex_with(hex_str, SigningAlgorithm::Ed25519, hash_algorithm)
    }

    /// Build a signature record for any scheme from hex-encoded bytes.
    pub fn from_hex_with(
        hex_str: &str,
        signing_algorithm: SigningAlgorithm,
        hash_algorithm: HashAlgorithm,
    ) -> Result<Self, hex::FromHexError> {
        let trimmed = hex_str.trim();
        let bytes = hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))?;
        Ok(Self {
            bytes,
            signing_algorithm,
            hash_algorithm,
        })
    }

    /// Hex encoding of the raw signature bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

/// Serde adapter: byte vectors as hex strings in JSON.
pub(crate) mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&hex::encode(bytes))
        } else {
            serializer.serialize_bytes(bytes)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            hex::decode(s.strip_prefix("0x").unwrap_or(&s)).map_err(serde::de::Error::custom)
        } else {
            Vec::<u8>::deserialize(deserializer)
        }
    }
}
