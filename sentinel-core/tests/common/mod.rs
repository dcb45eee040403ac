// Shared fixtures: a tiny credit-score circuit proved with arkworks, so the
// gateway can be exercised against real Groth16 proofs.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use ark_bn254::{Bn254, Fr};
use ark_groth16::{Groth16, ProvingKey};
use ark_relations::lc;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError, Variable};
use ark_snark::SNARK;
use ark_std::rand::{rngs::StdRng, SeedableRng};

use sentinel_core::ark::{artifact_from_proof, to_fr};
use sentinel_core::{
    ArkworksVerifier, FieldElement, Identity, PairingVerifier, ProofArtifact, VerificationKey,
    VerifierArguments,
};

/// Width of the `score - threshold` range check.
pub const RANGE_BITS: usize = 10;

/// Public inputs `[predicate, threshold, identity]`, private `score`.
///
/// Proves `predicate == 1` and `0 <= score - threshold < 2^RANGE_BITS`.
#[derive(Clone)]
pub struct CreditScoreCircuit {
    pub score: u64,
    pub threshold: u64,
    pub identity: Fr,
}

impl ConstraintSynthesizer<Fr> for CreditScoreCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        let predicate = cs.new_input_variable(|| Ok(Fr::from(1u64)))?;
        let threshold = cs.new_input_variable(|| Ok(Fr::from(self.threshold)))?;
        let identity = cs.new_input_variable(|| Ok(self.identity))?;
        let score = cs.new_witness_variable(|| Ok(Fr::from(self.score)))?;

        cs.enforce_constraint(lc!() + predicate, lc!() + Variable::One, lc!() + Variable::One)?;

        let diff = self.score.wrapping_sub(self.threshold);
        let mut bits = lc!();
        for i in 0..RANGE_BITS {
            let bit = cs.new_witness_variable(|| Ok(Fr::from((diff >> i) & 1)))?;
            cs.enforce_constraint(lc!() + bit, lc!() + Variable::One - bit, lc!())?;
            bits = bits + (Fr::from(1u64 << i), bit);
        }
        cs.enforce_constraint(lc!() + score - threshold, lc!() + Variable::One, bits)?;

        let identity_sq = cs.new_witness_variable(|| Ok(self.identity * self.identity))?;
        cs.enforce_constraint(lc!() + identity, lc!() + identity, lc!() + identity_sq)?;

        Ok(())
    }
}

pub struct Fixture {
    pub key: VerificationKey,
    proving_key: ProvingKey<Bn254>,
    rng: StdRng,
}

impl Fixture {
    pub fn new() -> Self {
        let mut rng = StdRng::seed_from_u64(42);
        let circuit = CreditScoreCircuit {
            score: 700,
            threshold: 700,
            identity: Fr::from(0u64),
        };
        let (proving_key, vk) = Groth16::<Bn254>::circuit_specific_setup(circuit, &mut rng)
            .expect("setup should succeed");

        Self {
            key: VerificationKey::from_ark(&vk),
            proving_key,
            rng,
        }
    }

    /// Proves `score >= threshold` for `identity`, returning the artifact in
    /// prover (snarkjs) coordinate order.
    pub fn prove(&mut self, identity: &Identity, score: u64, threshold: u64) -> ProofArtifact {
        let identity_fr = to_fr(&identity.to_field_element()).expect("identity is a scalar");
        let circuit = CreditScoreCircuit {
            score,
            threshold,
            identity: identity_fr,
        };
        let proof = Groth16::<Bn254>::prove(&self.proving_key, circuit, &mut self.rng)
            .expect("proving should succeed");

        let inputs = [Fr::from(1u64), Fr::from(threshold), identity_fr];
        artifact_from_proof(&proof, &inputs)
    }
}

/// Real verifier that counts how often the pairing check runs.
#[derive(Default)]
pub struct CountingVerifier {
    calls: AtomicUsize,
}

impl CountingVerifier {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PairingVerifier for CountingVerifier {
    fn check(
        &self,
        key: &VerificationKey,
        arguments: &VerifierArguments,
        public_inputs: &[FieldElement],
    ) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ArkworksVerifier.check(key, arguments, public_inputs)
    }
}

/// Flips one bit, counting from the least significant.
pub fn flip_bit(value: FieldElement, bit: usize) -> FieldElement {
    let mut bytes = value.to_be_bytes();
    bytes[31 - bit / 8] ^= 1 << (bit % 8);
    FieldElement::from_be_bytes(bytes)
}
