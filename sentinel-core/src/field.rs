//! BN254 field elements
//!
//! Proof coordinates live in the base field `Fq`, public inputs in the scalar
//! field `Fr`. Both moduli are just below 2^254, so every element fits in 32
//! bytes. Elements are stored big-endian, which makes byte-wise comparison the
//! same as numeric comparison.

use std::fmt;
use std::str::FromStr;

use borsh::{BorshDeserialize, BorshSerialize};
use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Base field modulus p (big-endian)
/// p = 21888242871839275222246405745257275088696311157297823662689037894645226208583
pub const BASE_FIELD_MODULUS: [u8; 32] = [
    0x30, 0x64, 0x4e, 0x72, 0xe1, 0x31, 0xa0, 0x29, 0xb8, 0x50, 0x45, 0xb6, 0x81, 0x81, 0x58, 0x5d,
    0x97, 0x81, 0x6a, 0x91, 0x68, 0x71, 0xca, 0x8d, 0x3c, 0x20, 0x8c, 0x16, 0xd8, 0x7c, 0xfd, 0x47,
];

/// Scalar field modulus r (big-endian)
/// r = 21888242871839275222246405745257275088548364400416034343698204186575808495617
pub const SCALAR_FIELD_MODULUS: [u8; 32] = [
    0x30, 0x64, 0x4e, 0x72, 0xe1, 0x31, 0xa0, 0x29, 0xb8, 0x50, 0x45, 0xb6, 0x81, 0x81, 0x58, 0x5d,
    0x28, 0x33, 0xe8, 0x48, 0x79, 0xb9, 0x70, 0x91, 0x43, 0xe1, 0xf5, 0x93, 0xf0, 0x00, 0x00, 0x01,
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldParseError {
    #[error("empty field element")]
    Empty,
    #[error("not a decimal or 0x-prefixed hex integer: {0}")]
    NotAnInteger(String),
    #[error("integer does not fit in 256 bits")]
    Overflow,
}

/// A 256-bit unsigned integer used as a BN254 field element.
///
/// The type itself does not enforce a modulus: the same value may be a valid
/// base-field coordinate and an invalid scalar. Callers check membership with
/// [`FieldElement::is_base_field`] or [`FieldElement::is_scalar_field`].
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, BorshSerialize, BorshDeserialize,
)]
pub struct FieldElement([u8; 32]);

impl FieldElement {
    pub const ZERO: FieldElement = FieldElement([0u8; 32]);
    pub const ONE: FieldElement = FieldElement::from_u64(1);

    pub const fn from_be_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn from_u64(value: u64) -> Self {
        let be = value.to_be_bytes();
        let mut bytes = [0u8; 32];
        let mut i = 0;
        while i < 8 {
            bytes[24 + i] = be[i];
            i += 1;
        }
        Self(bytes)
    }

    /// Left-pads a big-endian byte string of at most 32 bytes.
    pub fn from_be_slice(slice: &[u8]) -> Result<Self, FieldParseError> {
        if slice.len() > 32 {
            return Err(FieldParseError::Overflow);
        }
        let mut bytes = [0u8; 32];
        bytes[32 - slice.len()..].copy_from_slice(slice);
        Ok(Self(bytes))
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        self.0
    }

    /// Little-endian encoding, as consumed by NEAR's alt_bn128 host functions.
    pub fn to_le_bytes(&self) -> [u8; 32] {
        let mut bytes = self.0;
        bytes.reverse();
        bytes
    }

    pub fn from_le_bytes(mut bytes: [u8; 32]) -> Self {
        bytes.reverse();
        Self(bytes)
    }

    /// Canonical element of the base field (`< p`).
    pub fn is_base_field(&self) -> bool {
        self.0 < BASE_FIELD_MODULUS
    }

    /// Canonical element of the scalar field (`< r`).
    pub fn is_scalar_field(&self) -> bool {
        self.0 < SCALAR_FIELD_MODULUS
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Returns the value as `u64` when it fits.
    pub fn to_u64(&self) -> Option<u64> {
        if self.0[..24].iter().any(|b| *b != 0) {
            return None;
        }
        let mut low = [0u8; 8];
        low.copy_from_slice(&self.0[24..]);
        Some(u64::from_be_bytes(low))
    }

    /// Decimal rendering, the format snarkjs uses for every field element.
    pub fn to_decimal_string(&self) -> String {
        BigUint::from_bytes_be(&self.0).to_str_radix(10)
    }

    pub fn to_hex_string(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for FieldElement {
    type Err = FieldParseError;

    /// Accepts decimal (`"12345"`) or `0x`-prefixed hex (`"0x3039"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(FieldParseError::Empty);
        }

        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(digits) if !digits.is_empty() => BigUint::parse_bytes(digits.as_bytes(), 16),
            Some(_) => None,
            None => BigUint::parse_bytes(s.as_bytes(), 10),
        };
        let value = parsed.ok_or_else(|| FieldParseError::NotAnInteger(s.to_string()))?;

        FieldElement::from_be_slice(&value.to_bytes_be())
    }
}

impl From<u64> for FieldElement {
    fn from(value: u64) -> Self {
        FieldElement::from_u64(value)
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({})", self.to_hex_string())
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_decimal_string())
    }
}

impl Serialize for FieldElement {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_decimal_string())
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = <String as Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
