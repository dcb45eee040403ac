//! Off-chain Groth16 verification with arkworks.
//!
//! Used by the proof server for pre-flight checks and by the test suite to
//! produce real proofs. Points that are off the curve or outside the prime
//! order subgroup are rejected here rather than handed to the pairing.

use ark_bn254::{Bn254, Fq, Fq2, Fr, G1Affine, G2Affine};
use ark_ec::AffineRepr;
use ark_ff::{BigInteger, PrimeField};
use ark_groth16::{Groth16, Proof, VerifyingKey};
use ark_snark::SNARK;

use crate::field::FieldElement;
use crate::key::VerificationKey;
use crate::proof::{G1Coordinates, G2Coordinates, ProofArtifact, VerifierArguments};
use crate::transcode::swap_g2_coordinates;
use crate::verifier::PairingVerifier;

#[derive(Clone, Copy, Debug, Default)]
pub struct ArkworksVerifier;

impl PairingVerifier for ArkworksVerifier {
    fn check(
        &self,
        key: &VerificationKey,
        arguments: &VerifierArguments,
        public_inputs: &[FieldElement],
    ) -> bool {
        let (Some(vk), Some(proof)) = (to_ark_key(key), to_ark_proof(arguments)) else {
            return false;
        };
        let Some(inputs) = public_inputs.iter().map(to_fr).collect::<Option<Vec<_>>>() else {
            return false;
        };
        if inputs.len() + 1 != vk.gamma_abc_g1.len() {
            return false;
        }
        Groth16::<Bn254>::verify(&vk, &inputs, &proof).unwrap_or(false)
    }
}

pub fn to_ark_key(key: &VerificationKey) -> Option<VerifyingKey<Bn254>> {
    Some(VerifyingKey {
        alpha_g1: to_g1(&key.alpha_g1)?,
        beta_g2: to_g2(&key.beta_g2)?,
        gamma_g2: to_g2(&key.gamma_g2)?,
        delta_g2: to_g2(&key.delta_g2)?,
        gamma_abc_g1: key.ic.iter().map(to_g1).collect::<Option<Vec<_>>>()?,
    })
}

pub fn to_ark_proof(arguments: &VerifierArguments) -> Option<Proof<Bn254>> {
    Some(Proof {
        a: to_g1(&arguments.a)?,
        b: to_g2(&arguments.b)?,
        c: to_g1(&arguments.c)?,
    })
}

impl VerificationKey {
    pub fn from_ark(vk: &VerifyingKey<Bn254>) -> Self {
        Self {
            alpha_g1: from_g1(&vk.alpha_g1),
            beta_g2: from_g2(&vk.beta_g2),
            gamma_g2: from_g2(&vk.gamma_g2),
            delta_g2: from_g2(&vk.delta_g2),
            ic: vk.gamma_abc_g1.iter().map(from_g1).collect(),
        }
    }
}

pub fn arguments_from_proof(proof: &Proof<Bn254>) -> VerifierArguments {
    VerifierArguments {
        a: from_g1(&proof.a),
        b: from_g2(&proof.b),
        c: from_g1(&proof.c),
    }
}

/// Prover-order artifact, the shape snarkjs would have written.
pub fn artifact_from_proof(proof: &Proof<Bn254>, public_inputs: &[Fr]) -> ProofArtifact {
    let arguments = arguments_from_proof(proof);
    ProofArtifact {
        a: arguments.a,
        b: swap_g2_coordinates(&arguments.b),
        c: arguments.c,
        public_inputs: public_inputs.iter().map(from_prime_field).collect(),
    }
}

pub fn from_prime_field<F: PrimeField>(x: &F) -> FieldElement {
    // BN254 elements are always 32 bytes
    FieldElement::from_be_slice(&x.into_bigint().to_bytes_be()).unwrap_or_default()
}

pub fn to_fr(x: &FieldElement) -> Option<Fr> {
    x.is_scalar_field()
        .then(|| Fr::from_be_bytes_mod_order(&x.to_be_bytes()))
}

fn to_fq(x: &FieldElement) -> Option<Fq> {
    x.is_base_field()
        .then(|| Fq::from_be_bytes_mod_order(&x.to_be_bytes()))
}

/// `[0, 0]` is the point at infinity, as in the EVM precompiles.
fn to_g1(point: &G1Coordinates) -> Option<G1Affine> {
    if point.iter().all(FieldElement::is_zero) {
        return Some(G1Affine::zero());
    }
    let p = G1Affine::new_unchecked(to_fq(&point[0])?, to_fq(&point[1])?);
    (p.is_on_curve() && p.is_in_correct_subgroup_assuming_on_curve()).then_some(p)
}

/// Takes verifier order, `[[x.c1, x.c0], [y.c1, y.c0]]`.
fn to_g2(point: &G2Coordinates) -> Option<G2Affine> {
    if point.iter().flatten().all(FieldElement::is_zero) {
        return Some(G2Affine::zero());
    }
    let x = Fq2::new(to_fq(&point[0][1])?, to_fq(&point[0][0])?);
    let y = Fq2::new(to_fq(&point[1][1])?, to_fq(&point[1][0])?);
    let p = G2Affine::new_unchecked(x, y);
    (p.is_on_curve() && p.is_in_correct_subgroup_assuming_on_curve()).then_some(p)
}

fn from_g1(p: &G1Affine) -> G1Coordinates {
    if p.infinity {
        return [FieldElement::ZERO; 2];
    }
    [from_prime_field(&p.x), from_prime_field(&p.y)]
}

fn from_g2(p: &G2Affine) -> G2Coordinates {
    if p.infinity {
        return [[FieldElement::ZERO; 2]; 2];
    }
    [
        [from_prime_field(&p.x.c1), from_prime_field(&p.x.c0)],
        [from_prime_field(&p.y.c1), from_prime_field(&p.y.c0)],
    ]
}
