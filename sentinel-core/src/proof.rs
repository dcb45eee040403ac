//! Proof data model
//!
//! A [`ProofArtifact`] holds curve points exactly as the proving toolchain
//! wrote them. [`VerifierArguments`] holds the same points after the G2
//! coordinate reordering, ready for the pairing check. The two types are kept
//! distinct so a prover-order point can never reach the verifier by accident.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::error::MalformedProof;
use crate::field::FieldElement;
use crate::identity::Identity;

/// Affine G1 point `[x, y]`.
pub type G1Coordinates = [FieldElement; 2];

/// Affine G2 point `[[x_0, x_1], [y_0, y_1]]`, each pair an Fq2 element.
///
/// Which half of each pair is the real part depends on the convention of
/// whoever produced it; see [`crate::transcode::swap_g2_coordinates`].
pub type G2Coordinates = [[FieldElement; 2]; 2];

// ==================== SCORING ====================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Output of the external scoring oracle. Carried alongside the proof as
/// evidence only; the proof is the trust anchor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub score: u64,
    pub risk_level: RiskLevel,
}

// ==================== PROOFS ====================

/// Groth16 proof with G2 in prover (snarkjs) coordinate order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofArtifact {
    pub a: G1Coordinates,
    pub b: G2Coordinates,
    pub c: G1Coordinates,
    pub public_inputs: Vec<FieldElement>,
}

/// Proof points in the order the pairing check consumes them.
#[derive(
    Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct VerifierArguments {
    pub a: G1Coordinates,
    pub b: G2Coordinates,
    pub c: G1Coordinates,
}

/// Everything the off-chain pipeline hands over for one submission.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProofBundle {
    pub identity: Identity,
    pub analysis: AnalysisResult,
    pub artifact: ProofArtifact,
    pub threshold: u64,
}

/// `proof.json` as written by `snarkjs groth16 prove`.
///
/// Points are projective with decimal-string coordinates; for an affine
/// point the last entry is `"1"` (G1) or `["1", "0"]` (G2).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SnarkjsProof {
    pub pi_a: Vec<String>,
    pub pi_b: Vec<Vec<String>>,
    pub pi_c: Vec<String>,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default = "default_curve")]
    pub curve: String,
}

fn default_protocol() -> String {
    "groth16".to_string()
}

fn default_curve() -> String {
    "bn128".to_string()
}

impl ProofArtifact {
    /// Builds an artifact from snarkjs `proof.json` and `public.json`.
    ///
    /// Coordinates are parsed but not range-checked here; the transcoder
    /// owns field-membership validation.
    pub fn from_snarkjs(proof: &SnarkjsProof, public_signals: &[String]) -> Result<Self, MalformedProof> {
        let public_inputs = public_signals
            .iter()
            .map(|s| s.parse::<FieldElement>())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            a: parse_g1("pi_a", &proof.pi_a)?,
            b: parse_g2("pi_b", &proof.pi_b)?,
            c: parse_g1("pi_c", &proof.pi_c)?,
            public_inputs,
        })
    }

    /// Inverse of [`ProofArtifact::from_snarkjs`], used by the mock prover
    /// and by clients that want snarkjs-shaped JSON back.
    pub fn to_snarkjs(&self) -> (SnarkjsProof, Vec<String>) {
        let g1 = |p: &G1Coordinates| {
            vec![p[0].to_decimal_string(), p[1].to_decimal_string(), "1".to_string()]
        };
        let proof = SnarkjsProof {
            pi_a: g1(&self.a),
            pi_b: vec![
                vec![self.b[0][0].to_decimal_string(), self.b[0][1].to_decimal_string()],
                vec![self.b[1][0].to_decimal_string(), self.b[1][1].to_decimal_string()],
                vec!["1".to_string(), "0".to_string()],
            ],
            pi_c: g1(&self.c),
            protocol: default_protocol(),
            curve: default_curve(),
        };
        let signals = self.public_inputs.iter().map(|x| x.to_decimal_string()).collect();
        (proof, signals)
    }
}

/// Parses a G1 point given as `[x, y]` or projective `[x, y, "1"]`.
pub fn parse_g1(element: &'static str, raw: &[String]) -> Result<G1Coordinates, MalformedProof> {
    match raw.len() {
        2 => {}
        3 => {
            if raw[2].parse::<FieldElement>()? != FieldElement::ONE {
                return Err(MalformedProof::NotAffine { element });
            }
        }
        actual => {
            return Err(MalformedProof::CoordinateCount {
                element,
                expected: 3,
                actual,
            })
        }
    }
    Ok([raw[0].parse()?, raw[1].parse()?])
}

/// Parses a G2 point given as `[[x0, x1], [y0, y1]]` or projective with a
/// trailing `["1", "0"]`. Coordinate order inside each pair is preserved.
pub fn parse_g2(element: &'static str, raw: &[Vec<String>]) -> Result<G2Coordinates, MalformedProof> {
    match raw.len() {
        2 => {}
        3 => {
            let z = parse_pair(element, &raw[2])?;
            if z != [FieldElement::ONE, FieldElement::ZERO] {
                return Err(MalformedProof::NotAffine { element });
            }
        }
        actual => {
            return Err(MalformedProof::CoordinateCount {
                element,
                expected: 3,
                actual,
            })
        }
    }
    Ok([parse_pair(element, &raw[0])?, parse_pair(element, &raw[1])?])
}

fn parse_pair(element: &'static str, raw: &[String]) -> Result<[FieldElement; 2], MalformedProof> {
    if raw.len() != 2 {
        return Err(MalformedProof::CoordinateCount {
            element,
            expected: 2,
            actual: raw.len(),
        });
    }
    Ok([raw[0].parse()?, raw[1].parse()?])
}
