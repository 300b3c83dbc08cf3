//! # Canonical Transfer Messages
//!
//! The byte string both signers sign and the engine rebuilds. Its layout is
//! the contract between them; any drift in field width, byte order or tag
//! padding breaks every signature, so the layout is defined exactly once:
//!
//! ```text
//! offset  len  field
//!      0   32  domain tag, UTF-8, right-padded with 0x00
//!     32   20  sender account id, raw bytes
//!     52   20  recipient account id, raw bytes
//!     72    8  amount, big-endian u64 scaled units
//!     80    8  sequence number, big-endian u64
//! ```
//!
//! Fields are positional. There are no separators and no length prefixes,
//! so two different intents can never serialize to the same bytes.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use super::account::AccountId;
use super::amount::Amount;
use super::error::VaultError;
use crate::config::{
    ACCOUNT_ID_LENGTH, AMOUNT_FIELD_LENGTH, CANONICAL_MESSAGE_LENGTH, DOMAIN_TAG_LENGTH,
    SEQUENCE_FIELD_LENGTH, USER_DOMAIN_TAG,
};

const SENDER_OFFSET: usize = DOMAIN_TAG_LENGTH;
const RECIPIENT_OFFSET: usize = SENDER_OFFSET + ACCOUNT_ID_LENGTH;
const AMOUNT_OFFSET: usize = RECIPIENT_OFFSET + ACCOUNT_ID_LENGTH;
const SEQUENCE_OFFSET: usize = AMOUNT_OFFSET + AMOUNT_FIELD_LENGTH;

// ---------------------------------------------------------------------------
// DomainTag
// ---------------------------------------------------------------------------

/// A signing context, fixed at 32 bytes.
///
/// Binding the tag into every message stops a signature made for some
/// other protocol (or another deployment with a different tag) from
/// authorizing a vault transfer.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DomainTag([u8; DOMAIN_TAG_LENGTH]);

impl DomainTag {
    /// Right-pad `tag` with zeros. Fails if it is longer than 32 bytes or
    /// contains a NUL, since NUL is the padding byte.
    pub fn new(tag: &str) -> Result<Self, VaultError> {
        let raw = tag.as_bytes();
        if raw.len() > DOMAIN_TAG_LENGTH {
            return Err(VaultError::Encoding(format!(
                "domain tag is {} bytes, maximum is {}",
                raw.len(),
                DOMAIN_TAG_LENGTH
            )));
        }
        if raw.contains(&0) {
            return Err(VaultError::Encoding(
                "domain tag must not contain NUL bytes".to_string(),
            ));
        }
        let mut bytes = [0u8; DOMAIN_TAG_LENGTH];
        bytes[..raw.len()].copy_from_slice(raw);
        Ok(DomainTag(bytes))
    }

    /// The "user" signing domain.
    pub fn user() -> Self {
        let raw = USER_DOMAIN_TAG.as_bytes();
        let mut bytes = [0u8; DOMAIN_TAG_LENGTH];
        bytes[..raw.len()].copy_from_slice(raw);
        DomainTag(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; DOMAIN_TAG_LENGTH] {
        &self.0
    }

    /// The tag with its zero padding stripped.
    pub fn as_str(&self) -> &str {
        let end = self
            .0
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(DOMAIN_TAG_LENGTH);
        // Built from a &str, so the unpadded prefix is valid UTF-8; parsed
        // tags are validated in `from_padded`.
        std::str::from_utf8(&self.0[..end]).unwrap_or_default()
    }

    fn from_padded(bytes: &[u8]) -> Result<Self, VaultError> {
        let arr: [u8; DOMAIN_TAG_LENGTH] = bytes
            .try_into()
            .map_err(|_| VaultError::Encoding("domain tag must be 32 bytes".to_string()))?;
        let end = arr.iter().position(|&b| b == 0).unwrap_or(DOMAIN_TAG_LENGTH);
        if arr[end..].iter().any(|&b| b != 0) {
            return Err(VaultError::Encoding(
                "domain tag padding contains non-zero bytes".to_string(),
            ));
        }
        std::str::from_utf8(&arr[..end])
            .map_err(|_| VaultError::Encoding("domain tag is not UTF-8".to_string()))?;
        Ok(DomainTag(arr))
    }
}

impl Default for DomainTag {
    fn default() -> Self {
        Self::user()
    }
}

impl fmt::Display for DomainTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for DomainTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DomainTag({:?})", self.as_str())
    }
}

impl Serialize for DomainTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DomainTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        DomainTag::new(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// TransferIntent
// ---------------------------------------------------------------------------

/// What the two signers are agreeing to: move `amount` from `sender` to
/// `recipient`, consuming the sender's sequence number `sequence_number`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferIntent {
    pub sender: AccountId,
    pub recipient: AccountId,
    pub amount: Amount,
    pub sequence_number: u64,
}

impl TransferIntent {
    /// Serialize this intent under `domain`.
    pub fn canonical_message(&self, domain: &DomainTag) -> CanonicalMessage {
        let mut bytes = [0u8; CANONICAL_MESSAGE_LENGTH];
        bytes[..SENDER_OFFSET].copy_from_slice(domain.as_bytes());
        bytes[SENDER_OFFSET..RECIPIENT_OFFSET].copy_from_slice(self.sender.as_bytes());
        bytes[RECIPIENT_OFFSET..AMOUNT_OFFSET].copy_from_slice(self.recipient.as_bytes());
        bytes[AMOUNT_OFFSET..SEQUENCE_OFFSET].copy_from_slice(&self.amount.units().to_be_bytes());
        bytes[SEQUENCE_OFFSET..].copy_from_slice(&self.sequence_number.to_be_bytes());
        CanonicalMessage(bytes)
    }
}

// ---------------------------------------------------------------------------
// CanonicalMessage
// ---------------------------------------------------------------------------

/// The exact bytes a vault signer signs.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CanonicalMessage([u8; CANONICAL_MESSAGE_LENGTH]);

impl CanonicalMessage {
    pub fn as_bytes(&self) -> &[u8; CANONICAL_MESSAGE_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Decode a message back into its domain tag and intent.
    ///
    /// Signers use this to display what they are about to sign.
    pub fn parse(bytes: &[u8]) -> Result<(DomainTag, TransferIntent), VaultError> {
        if bytes.len() != CANONICAL_MESSAGE_LENGTH {
            return Err(VaultError::Encoding(format!(
                "canonical message is {} bytes, expected {}",
                bytes.len(),
                CANONICAL_MESSAGE_LENGTH
            )));
        }
        let domain = DomainTag::from_padded(&bytes[..SENDER_OFFSET])?;
        let sender = AccountId::from_slice(&bytes[SENDER_OFFSET..RECIPIENT_OFFSET])?;
        let recipient = AccountId::from_slice(&bytes[RECIPIENT_OFFSET..AMOUNT_OFFSET])?;

        let mut amount = [0u8; AMOUNT_FIELD_LENGTH];
        amount.copy_from_slice(&bytes[AMOUNT_OFFSET..SEQUENCE_OFFSET]);
        let mut sequence = [0u8; SEQUENCE_FIELD_LENGTH];
        sequence.copy_from_slice(&bytes[SEQUENCE_OFFSET..]);

        Ok((
            domain,
            TransferIntent {
                sender,
                recipient,
                amount: Amount::from_units(u64::from_be_bytes(amount)),
                sequence_number: u64::from_be_bytes(sequence),
            },
        ))
    }
}

impl AsRef<[u8]> for CanonicalMessage {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for CanonicalMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CanonicalMessage({})", self.to_hex())
    }
}

/// Canonicalize from untyped inputs.
///
/// This is the entry point for callers holding raw bytes (an external
/// signer reading addresses off a request, for instance). Account ids
/// shorter than 20 bytes are left-padded; anything that does not fit its
/// field is an [`VaultError::Encoding`].
pub fn canonicalize(
    domain_tag: &str,
    sender: &[u8],
    recipient: &[u8],
    amount: Amount,
    sequence_number: u64,
) -> Result<Vec<u8>, VaultError> {
    let domain = DomainTag::new(domain_tag)?;
    let intent = TransferIntent {
        sender: AccountId::from_slice(sender)?,
        recipient: AccountId::from_slice(recipient)?,
        amount,
        sequence_number,
    };
    Ok(intent.canonical_message(&domain).as_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent(seq: u64) -> TransferIntent {
        TransferIntent {
            sender: "0x01cf0e2f2f715450".parse().unwrap(),
            recipient: "0x179b6b1cb6755e31".parse().unwrap(),
            amount: Amount::from_units(500_000_000),
            sequence_number: seq,
        }
    }

    #[test]
    fn layout_matches_field_table() {
        let msg = intent(0).canonical_message(&DomainTag::user());
        let bytes = msg.as_bytes();

        assert_eq!(&bytes[..14], b"FLOW-V0.0-user");
        assert!(bytes[14..32].iter().all(|&b| b == 0));
        assert_eq!(&bytes[44..52], &hex::decode("01cf0e2f2f715450").unwrap()[..]);
        assert_eq!(&bytes[64..72], &hex::decode("179b6b1cb6755e31").unwrap()[..]);
        assert_eq!(&bytes[72..80], &500_000_000u64.to_be_bytes());
        assert_eq!(&bytes[80..88], &[0u8; 8]);
    }

    #[test]
    fn deterministic() {
        let a = intent(7).canonical_message(&DomainTag::user());
        let b = intent(7).canonical_message(&DomainTag::user());
        assert_eq!(a, b);
    }

    #[test]
    fn sequence_number_changes_message() {
        let domain = DomainTag::user();
        let base = intent(5).canonical_message(&domain);
        assert_ne!(base, intent(4).canonical_message(&domain));
        assert_ne!(base, intent(6).canonical_message(&domain));
    }

    #[test]
    fn swapping_sender_and_recipient_changes_message() {
        let domain = DomainTag::user();
        let forward = intent(0);
        let backward = TransferIntent {
            sender: forward.recipient,
            recipient: forward.sender,
            ..forward
        };
        assert_ne!(
            forward.canonical_message(&domain),
            backward.canonical_message(&domain)
        );
    }

    #[test]
    fn domain_tag_changes_message() {
        let other = DomainTag::new("FLOW-V0.0-transaction").unwrap();
        assert_ne!(
            intent(0).canonical_message(&DomainTag::user()),
            intent(0).canonical_message(&other)
        );
    }

    #[test]
    fn oversized_domain_tag_rejected() {
        let long = "x".repeat(33);
        assert!(matches!(DomainTag::new(&long), Err(VaultError::Encoding(_))));
        assert!(DomainTag::new(&"x".repeat(32)).is_ok());
    }

    #[test]
    fn nul_in_domain_tag_rejected() {
        for tag in ["user\0evil", "\0", "FLOW-V0.0-user\0"] {
            assert!(matches!(DomainTag::new(tag), Err(VaultError::Encoding(_))));
        }
        assert!(serde_json::from_str::<DomainTag>("\"user\\u0000evil\"").is_err());

        // Every tag `new` accepts survives display and its own messages.
        let tag = DomainTag::new("custody-prod").unwrap();
        let back: DomainTag = serde_json::from_str(&serde_json::to_string(&tag).unwrap()).unwrap();
        assert_eq!(back, tag);
        let msg = intent(0).canonical_message(&tag);
        assert_eq!(CanonicalMessage::parse(msg.as_bytes()).unwrap().0, tag);
    }

    #[test]
    fn untyped_canonicalize_matches_typed() {
        let i = intent(3);
        let raw = canonicalize(
            "FLOW-V0.0-user",
            &hex::decode("01cf0e2f2f715450").unwrap(),
            &hex::decode("179b6b1cb6755e31").unwrap(),
            i.amount,
            3,
        )
        .unwrap();
        assert_eq!(raw, i.canonical_message(&DomainTag::user()).as_bytes().to_vec());
    }

    #[test]
    fn untyped_canonicalize_rejects_wide_account() {
        let result = canonicalize("FLOW-V0.0-user", &[1u8; 21], &[2u8; 20], Amount::ZERO, 0);
        assert!(matches!(result, Err(VaultError::Encoding(_))));
    }

    #[test]
    fn parse_recovers_intent() {
        let domain = DomainTag::new("custody").unwrap();
        let original = intent(42);
        let msg = original.canonical_message(&domain);
        let (parsed_domain, parsed) = CanonicalMessage::parse(msg.as_bytes()).unwrap();
        assert_eq!(parsed_domain, domain);
        assert_eq!(parsed, original);
    }

    #[test]
    fn parse_rejects_wrong_length_and_dirty_padding() {
        assert!(CanonicalMessage::parse(&[0u8; 87]).is_err());

        let mut bytes = *intent(0).canonical_message(&DomainTag::user()).as_bytes();
        bytes[20] = b'x';
        assert!(CanonicalMessage::parse(&bytes).is_err());
    }

    #[test]
    fn domain_tag_serde_uses_text() {
        let tag = DomainTag::user();
        assert_eq!(serde_json::to_string(&tag).unwrap(), "\"FLOW-V0.0-user\"");
        let back: DomainTag = serde_json::from_str("\"FLOW-V0.0-user\"").unwrap();
        assert_eq!(back, tag);
    }
}
