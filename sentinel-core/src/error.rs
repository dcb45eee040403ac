//! Error taxonomy shared by the transcoder, the gateway and key loading.

use thiserror::Error;

use crate::field::{FieldElement, FieldParseError};
use crate::identity::Identity;

/// Structural failure of a proof or its public inputs.
///
/// Always raised before the pairing check runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedProof {
    #[error("{element} coordinate {index} is not a canonical base field element")]
    CoordinateOutOfField { element: &'static str, index: usize },

    #[error("public input {index} is not a canonical scalar field element")]
    PublicInputOutOfField { index: usize },

    #[error("expected {expected} public inputs, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("{element} has {actual} coordinates, expected {expected}")]
    CoordinateCount {
        element: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{element} is not an affine point")]
    NotAffine { element: &'static str },

    #[error("invalid field element: {0}")]
    Encoding(#[from] FieldParseError),
}

/// The public statement is well-formed but not one this gateway accepts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatementViolation {
    #[error("threshold predicate output is {0}, expected 1")]
    PredicateNotSatisfied(FieldElement),

    #[error("proven threshold {threshold} is below the minimum {minimum}")]
    ThresholdBelowMinimum { threshold: u64, minimum: u64 },
}

/// Why a submission was rejected. Nothing is committed for any of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("malformed proof: {0}")]
    MalformedProof(#[from] MalformedProof),

    #[error("identity mismatch: proof is bound to {bound_to}, submitted for {identity}")]
    IdentityMismatch {
        identity: Identity,
        bound_to: FieldElement,
    },

    #[error("statement rejected: {0}")]
    StatementRejected(#[from] StatementViolation),

    #[error("proof rejected by the pairing check")]
    ProofRejected,
}

/// Failure to load or register a verification key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("unsupported proof protocol: {0}")]
    UnsupportedProtocol(String),

    #[error("unsupported curve: {0}")]
    UnsupportedCurve(String),

    #[error("verification key has no IC points")]
    EmptyIc,

    #[error("nPublic is {declared} but the key has {ic_points} IC points")]
    InputCountMismatch { declared: usize, ic_points: usize },

    #[error("public input index {index} is outside the key's {arity} inputs")]
    LayoutOutOfRange { index: usize, arity: usize },

    #[error("public input index {0} is used twice")]
    LayoutDuplicateIndex(u32),

    #[error("invalid key point: {0}")]
    Point(#[from] MalformedProof),
}
