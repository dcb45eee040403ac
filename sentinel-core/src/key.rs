//! Groth16 verification keys
//!
//! [`VerificationKey`] stores every G2 element in verifier order, the same
//! order as [`crate::proof::VerifierArguments::b`]. Keys exported by snarkjs
//! are converted on load.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{KeyError, MalformedProof};
use crate::proof::{parse_g1, parse_g2, G1Coordinates, G2Coordinates};
use crate::transcode::swap_g2_coordinates;

#[derive(
    Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct VerificationKey {
    pub alpha_g1: G1Coordinates,
    pub beta_g2: G2Coordinates,
    pub gamma_g2: G2Coordinates,
    pub delta_g2: G2Coordinates,
    /// One point per public input, plus the constant term at index 0.
    pub ic: Vec<G1Coordinates>,
}

/// `verification_key.json` as exported by `snarkjs zkey export verificationkey`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SnarkjsVerificationKey {
    pub protocol: String,
    pub curve: String,
    #[serde(rename = "nPublic")]
    pub n_public: usize,
    pub vk_alpha_1: Vec<String>,
    pub vk_beta_2: Vec<Vec<String>>,
    pub vk_gamma_2: Vec<Vec<String>>,
    pub vk_delta_2: Vec<Vec<String>>,
    #[serde(rename = "IC")]
    pub ic: Vec<Vec<String>>,
}

impl VerificationKey {
    /// Number of public inputs a proof under this key must carry.
    pub fn n_public(&self) -> usize {
        self.ic.len().saturating_sub(1)
    }

    pub fn from_snarkjs(raw: &SnarkjsVerificationKey) -> Result<Self, KeyError> {
        if raw.protocol != "groth16" {
            return Err(KeyError::UnsupportedProtocol(raw.protocol.clone()));
        }
        if !matches!(raw.curve.as_str(), "bn128" | "bn254" | "alt_bn128") {
            return Err(KeyError::UnsupportedCurve(raw.curve.clone()));
        }

        let ic = raw
            .ic
            .iter()
            .map(|p| parse_g1("IC", p))
            .collect::<Result<Vec<_>, _>>()?;

        let key = Self {
            alpha_g1: parse_g1("vk_alpha_1", &raw.vk_alpha_1)?,
            beta_g2: swap_g2_coordinates(&parse_g2("vk_beta_2", &raw.vk_beta_2)?),
            gamma_g2: swap_g2_coordinates(&parse_g2("vk_gamma_2", &raw.vk_gamma_2)?),
            delta_g2: swap_g2_coordinates(&parse_g2("vk_delta_2", &raw.vk_delta_2)?),
            ic,
        };
        key.validate()?;

        if raw.n_public != key.n_public() {
            return Err(KeyError::InputCountMismatch {
                declared: raw.n_public,
                ic_points: key.ic.len(),
            });
        }
        Ok(key)
    }

    /// Structural checks: non-empty IC and base-field coordinates.
    pub fn validate(&self) -> Result<(), KeyError> {
        if self.ic.is_empty() {
            return Err(KeyError::EmptyIc);
        }

        let g1 = [("vk_alpha_1", &self.alpha_g1)]
            .into_iter()
            .chain(self.ic.iter().map(|p| ("IC", p)));
        for (element, point) in g1 {
            if let Some(index) = point.iter().position(|x| !x.is_base_field()) {
                return Err(MalformedProof::CoordinateOutOfField { element, index }.into());
            }
        }

        let g2 = [
            ("vk_beta_2", &self.beta_g2),
            ("vk_gamma_2", &self.gamma_g2),
            ("vk_delta_2", &self.delta_g2),
        ];
        for (element, point) in g2 {
            if let Some(index) = point.iter().flatten().position(|x| !x.is_base_field()) {
                return Err(MalformedProof::CoordinateOutOfField { element, index }.into());
            }
        }
        Ok(())
    }

    /// SHA-256 over the Borsh encoding, hex encoded. Identifies which key a
    /// deployment is running without shipping the key itself.
    pub fn key_hash(&self) -> String {
        let mut hasher = Sha256::new();
        let bytes = borsh::to_vec(self).unwrap_or_default();
        hasher.update(&bytes);
        hex::encode(hasher.finalize())
    }
}
