//! Proof transcoder
//!
//! snarkjs writes each Fq2 coordinate of a G2 point as `[c0, c1]` (real part
//! first). The pairing verifier, following the EVM precompile convention,
//! takes `[c1, c0]`. Everything else passes through unchanged.

use crate::error::MalformedProof;
use crate::field::FieldElement;
use crate::proof::{G1Coordinates, G2Coordinates, ProofArtifact, VerifierArguments};

/// Swaps the two halves of each Fq2 coordinate of a G2 point.
///
/// `[[b00, b01], [b10, b11]]` becomes `[[b01, b00], [b11, b10]]`. The swap is
/// its own inverse, so the same function converts verifier order back to
/// prover order.
pub fn swap_g2_coordinates(point: &G2Coordinates) -> G2Coordinates {
    [[point[0][1], point[0][0]], [point[1][1], point[1][0]]]
}

/// Converts a prover-order artifact into verifier arguments.
///
/// Fails with [`MalformedProof`] when any coordinate is not a canonical
/// base-field element. Public inputs are not touched here; see
/// [`check_public_inputs`].
pub fn transcode(artifact: &ProofArtifact) -> Result<VerifierArguments, MalformedProof> {
    let arguments = VerifierArguments {
        a: artifact.a,
        b: swap_g2_coordinates(&artifact.b),
        c: artifact.c,
    };
    check_arguments(&arguments)?;
    Ok(arguments)
}

/// Field-membership check on already transcoded arguments.
///
/// The gateway runs this on everything it receives, since callers may submit
/// arguments they transcoded themselves.
pub fn check_arguments(arguments: &VerifierArguments) -> Result<(), MalformedProof> {
    check_g1("a", &arguments.a)?;
    check_g2("b", &arguments.b)?;
    check_g1("c", &arguments.c)
}

/// Exact arity and scalar-field membership of the public inputs.
pub fn check_public_inputs(inputs: &[FieldElement], expected: usize) -> Result<(), MalformedProof> {
    if inputs.len() != expected {
        return Err(MalformedProof::ArityMismatch {
            expected,
            actual: inputs.len(),
        });
    }
    match inputs.iter().position(|x| !x.is_scalar_field()) {
        Some(index) => Err(MalformedProof::PublicInputOutOfField { index }),
        None => Ok(()),
    }
}

fn check_g1(element: &'static str, point: &G1Coordinates) -> Result<(), MalformedProof> {
    match point.iter().position(|x| !x.is_base_field()) {
        Some(index) => Err(MalformedProof::CoordinateOutOfField { element, index }),
        None => Ok(()),
    }
}

fn check_g2(element: &'static str, point: &G2Coordinates) -> Result<(), MalformedProof> {
    match point.iter().flatten().position(|x| !x.is_base_field()) {
        Some(index) => Err(MalformedProof::CoordinateOutOfField { element, index }),
        None => Ok(()),
    }
}
