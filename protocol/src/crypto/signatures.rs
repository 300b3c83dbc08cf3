//! # Digital Signatures
//!
//! Signing and verification entry points for vault transfer messages.
//!
//! Every release of funds is gated on two calls to [`verify`], one per key
//! role.
//!
//! ## Strictness
//!
//! Ed25519 verification uses `verify_strict`. Signatures that lenient
//! implementations accept (non-canonical `S`, small-order `R`) are
//! rejected. ECDSA P-256 signatures must be 64-byte `r || s` with both
//! scalars in range; DER is not accepted.

use thiserror::Error;

use super::hash::HashAlgorithm;
use super::keys::{KeyError, VaultKeypair, VaultPublicKey, VaultSignature};

/// Errors during signature operations. Carries no detail about which
/// part of a signature was wrong.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature verification failed")]
    VerificationFailed,

    #[error(transparent)]
    Key(#[from] KeyError),
}

/// Sign a message with a vault signer's keypair.
///
/// # Example
///
/// ```
/// use cold_storage_protocol::crypto::{sign, verify, HashAlgorithm, VaultKeypair};
///
/// let keypair = VaultKeypair::generate();
/// let message = b"release 5.00000000";
/// let signature = sign(&keypair, message, HashAlgorithm::Sha2_256).unwrap();
///
/// assert!(verify(&keypair.public_key(), message, &signature).is_ok());
/// ```
pub fn sign(
    keypair: &VaultKeypair,
    message: &[u8],
    hash_algorithm: HashAlgorithm,
) -> Result<VaultSignature, SignatureError> {
    Ok(keypair.sign(message, hash_algorithm)?)
}

/// Verify a signature against a registered public key.
pub fn verify(
    public_key: &VaultPublicKey,
    message: &[u8],
    signature: &VaultSignature,
) -> Result<(), SignatureError> {
    if public_key.verify(message, signature) {
        Ok(())
    } else {
        Err(SignatureError::VerificationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::SigningAlgorithm;

    #[test]
    fn test_sign_and_verify() {
        let kp = VaultKeypair::generate();
        let sig = sign(&kp, b"hello, vault", HashAlgorithm::Sha2_256).unwrap();
        assert!(verify(&kp.public_key(), b"hello, vault", &sig).is_ok());
    }

    #[test]
    fn test_wrong_message_fails() {
        let kp = VaultKeypair::generate();
        let sig = sign(&kp, b"correct message", HashAlgorithm::Sha2_256).unwrap();
        assert_eq!(
            verify(&kp.public_key(), b"wrong message", &sig),
            Err(SignatureError::VerificationFailed)
        );
    }

    #[test]
    fn test_deterministic_signatures() {
        let kp = VaultKeypair::generate();
        let sig1 = sign(&kp, b"determinism", HashAlgorithm::Blake3).unwrap();
        let sig2 = sign(&kp, b"determinism", HashAlgorithm::Blake3).unwrap();
        assert_eq!(sig1, sig2);
    }

    #[test]
    fn test_flipped_bit_fails() {
        let kp = VaultKeypair::generate();
        let mut sig = sign(&kp, b"msg", HashAlgorithm::Sha2_256).unwrap();
        sig.bytes[10] ^= 0x01;
        assert!(verify(&kp.public_key(), b"msg", &sig).is_err());
    }

    #[test]
    fn test_p256_deterministic_and_bit_sensitive() {
        let kp = VaultKeypair::generate_with(SigningAlgorithm::EcdsaP256);
        let sig1 = sign(&kp, b"determinism", HashAlgorithm::Sha3_256).unwrap();
        let sig2 = sign(&kp, b"determinism", HashAlgorithm::Sha3_256).unwrap();
        assert_eq!(sig1, sig2);

        let mut flipped = sig1.clone();
        flipped.bytes[40] ^= 0x01;
        assert!(verify(&kp.public_key(), b"determinism", &flipped).is_err());
    }

    #[test]
    fn test_empty_signature_fails() {
        let kp = VaultKeypair::generate();
        let mut sig = sign(&kp, b"msg", HashAlgorithm::Sha2_256).unwrap();
        sig.bytes.clear();
        assert!(verify(&kp.public_key(), b"msg", &sig).is_err());
    }
}
