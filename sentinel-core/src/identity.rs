//! Wallet identities and their field encoding
//!
//! A proof is bound to a wallet by carrying the wallet's field encoding as a
//! public input. The encoding must be computed identically by the prover
//! (when it writes the circuit input) and by the gateway (when it checks the
//! binding), so it lives here and nowhere else.

use std::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::field::FieldElement;

/// A public-key-derived account address.
///
/// Accepts NEAR account ids (`alice.near`, 64-hex implicit accounts) and
/// EVM-style `0x` addresses. Addresses are compared case-insensitively, so
/// checksummed and lowercase spellings name the same holder.
#[derive(
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
#[serde(from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    pub fn new(address: impl AsRef<str>) -> Self {
        Self(address.as_ref().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `0x` followed by exactly 40 hex digits.
    pub fn is_evm_address(&self) -> bool {
        self.0
            .strip_prefix("0x")
            .map(|digits| digits.len() == 40 && digits.bytes().all(|b| b.is_ascii_hexdigit()))
            .unwrap_or(false)
    }

    /// Field element the circuit receives as `userAddress`.
    ///
    /// EVM addresses encode as their 160-bit integer value. Every other
    /// account id is hashed with SHA-256 and the top three bits are cleared,
    /// which keeps the result below 2^253 and therefore inside the scalar
    /// field.
    pub fn to_field_element(&self) -> FieldElement {
        if self.is_evm_address() {
            let mut bytes = [0u8; 32];
            // 40 validated hex digits always decode to 20 bytes
            if let Ok(raw) = hex::decode(&self.0[2..]) {
                bytes[12..].copy_from_slice(&raw);
            }
            return FieldElement::from_be_bytes(bytes);
        }

        let digest = Sha256::digest(self.0.as_bytes());
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        bytes[0] &= 0x1f;
        FieldElement::from_be_bytes(bytes)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Identity {
    fn from(value: String) -> Self {
        Identity::new(value)
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Identity::new(value)
    }
}

impl From<Identity> for String {
    fn from(value: Identity) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evm_address_encodes_as_integer() {
        let identity = Identity::new("0x00000000000000000000000000000000000000ff");
        assert!(identity.is_evm_address());
        assert_eq!(identity.to_field_element(), FieldElement::from_u64(255));
    }

    #[test]
    fn test_checksummed_address_is_same_identity() {
        let mixed = Identity::new("0xAbC0000000000000000000000000000000000123");
        let lower = Identity::new("0xabc0000000000000000000000000000000000123");
        assert_eq!(mixed, lower);
        assert_eq!(mixed.to_field_element(), lower.to_field_element());
    }

    #[test]
    fn test_named_account_hashes_into_scalar_field() {
        let alice = Identity::new("alice.near");
        let bob = Identity::new("bob.near");

        assert!(!alice.is_evm_address());
        assert!(alice.to_field_element().is_scalar_field());
        assert!(alice.to_field_element().to_be_bytes()[0] < 0x20);
        assert_ne!(alice.to_field_element(), bob.to_field_element());
    }

    #[test]
    fn test_short_hex_is_not_an_evm_address() {
        // Hashed, not decoded
        let identity = Identity::new("0xabc");
        assert!(!identity.is_evm_address());
        assert_ne!(identity.to_field_element(), FieldElement::from_u64(0xabc));
    }

    #[test]
    fn test_serde_is_a_plain_string() {
        let identity = Identity::new("alice.near");
        assert_eq!(serde_json::to_string(&identity).unwrap(), "\"alice.near\"");
        let back: Identity = serde_json::from_str("\"ALICE.near\"").unwrap();
        assert_eq!(back, identity);
    }
}
