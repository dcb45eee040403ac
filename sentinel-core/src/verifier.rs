//! Pairing-check seam.
//!
//! The gateway never does curve arithmetic itself. On-chain the check runs on
//! NEAR's alt_bn128 host functions, off-chain on arkworks, and in tests on
//! stubs that accept or reject deterministically.

use crate::field::FieldElement;
use crate::key::VerificationKey;
use crate::proof::VerifierArguments;

/// Groth16 verification over BN254.
///
/// Implementations must be deterministic and side-effect free. Anything
/// other than `true` is a rejection, including points that are not on the
/// curve.
pub trait PairingVerifier {
    fn check(
        &self,
        key: &VerificationKey,
        arguments: &VerifierArguments,
        public_inputs: &[FieldElement],
    ) -> bool;
}

impl<V: PairingVerifier + ?Sized> PairingVerifier for &V {
    fn check(
        &self,
        key: &VerificationKey,
        arguments: &VerifierArguments,
        public_inputs: &[FieldElement],
    ) -> bool {
        (**self).check(key, arguments, public_inputs)
    }
}
