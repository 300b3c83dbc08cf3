//! Account identifiers.
//!
//! An [`AccountId`] is 20 raw bytes and is encoded into canonical messages
//! as exactly those bytes. The text form is `0x` followed by 40 lowercase
//! hex characters. Shorter hex addresses (the 8-byte `0x01cf0e2f2f715450`
//! style) are left-padded with zeros so they keep their numeric value.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::config::ACCOUNT_ID_LENGTH;
use crate::vault::error::VaultError;

/// Opaque, fixed-width account identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountId([u8; ACCOUNT_ID_LENGTH]);

impl AccountId {
    pub const fn from_bytes(bytes: [u8; ACCOUNT_ID_LENGTH]) -> Self {
        AccountId(bytes)
    }

    /// Accept up to 20 raw bytes, left-padding shorter input with zeros.
    pub fn from_slice(slice: &[u8]) -> Result<Self, VaultError> {
        if slice.len() > ACCOUNT_ID_LENGTH {
            return Err(VaultError::Encoding(format!(
                "account id is {} bytes, maximum is {}",
                slice.len(),
                ACCOUNT_ID_LENGTH
            )));
        }
        let mut bytes = [0u8; ACCOUNT_ID_LENGTH];
        bytes[ACCOUNT_ID_LENGTH - slice.len()..].copy_from_slice(slice);
        Ok(AccountId(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; ACCOUNT_ID_LENGTH] {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self)
    }
}

impl FromStr for AccountId {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.is_empty() {
            return Err(VaultError::Encoding("empty account id".to_string()));
        }
        // Odd-length hex gets one leading zero nibble.
        let padded = if digits.len() % 2 == 1 {
            format!("0{digits}")
        } else {
            digits.to_string()
        };
        let bytes = hex::decode(&padded)
            .map_err(|e| VaultError::Encoding(format!("account id '{s}' is not hex: {e}")))?;
        Self::from_slice(&bytes)
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(serde::de::Error::custom)
        } else {
            <[u8; ACCOUNT_ID_LENGTH]>::deserialize(deserializer).map(AccountId)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_addresses_are_left_padded() {
        let id: AccountId = "0x01cf0e2f2f715450".parse().unwrap();
        assert_eq!(id.to_string(), "0x00000000000000000000000001cf0e2f2f715450");
        assert_eq!(&id.as_bytes()[12..], &[0x01, 0xcf, 0x0e, 0x2f, 0x2f, 0x71, 0x54, 0x50]);
    }

    #[test]
    fn display_parse_roundtrip() {
        let id = AccountId::from_bytes([0xab; ACCOUNT_ID_LENGTH]);
        let parsed: AccountId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn prefix_is_optional() {
        let a: AccountId = "0xf8d6e0586b0a20c7".parse().unwrap();
        let b: AccountId = "f8d6e0586b0a20c7".parse().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn odd_length_hex_is_accepted() {
        let id: AccountId = "0x1".parse().unwrap();
        assert_eq!(id.as_bytes()[ACCOUNT_ID_LENGTH - 1], 1);
    }

    #[test]
    fn oversized_ids_are_encoding_errors() {
        let too_long = format!("0x{}", "11".repeat(21));
        assert!(matches!(too_long.parse::<AccountId>(), Err(VaultError::Encoding(_))));
        assert!(matches!(AccountId::from_slice(&[0u8; 21]), Err(VaultError::Encoding(_))));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!("0x".parse::<AccountId>().is_err());
        assert!("0xnothex".parse::<AccountId>().is_err());
    }

    #[test]
    fn ordering_follows_bytes() {
        let low: AccountId = "0x01".parse().unwrap();
        let high: AccountId = "0x02".parse().unwrap();
        assert!(low < high);
    }
}
