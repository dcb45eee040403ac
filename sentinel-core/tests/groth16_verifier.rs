// Pairing-check tests against real Groth16 proofs.
// Run with: cargo test -p sentinel-core --test groth16_verifier

#![cfg(feature = "arkworks")]

mod common;

use common::{flip_bit, Fixture};
use sentinel_core::{
    swap_g2_coordinates, transcode, ArkworksVerifier, FieldElement, Identity, PairingVerifier,
    ProofArtifact, SnarkjsProof,
};

#[test]
fn test_valid_proof_verifies() {
    let mut fixture = Fixture::new();
    let alice = Identity::new("alice.near");
    let artifact = fixture.prove(&alice, 742, 700);

    let arguments = transcode(&artifact).unwrap();
    assert!(ArkworksVerifier.check(&fixture.key, &arguments, &artifact.public_inputs));
}

#[test]
fn test_untranscoded_g2_is_rejected() {
    let mut fixture = Fixture::new();
    let artifact = fixture.prove(&Identity::new("alice.near"), 742, 700);

    let mut arguments = transcode(&artifact).unwrap();
    arguments.b = swap_g2_coordinates(&arguments.b);
    assert_eq!(arguments.b, artifact.b);
    assert!(!ArkworksVerifier.check(&fixture.key, &arguments, &artifact.public_inputs));
}

#[test]
fn test_bit_flip_in_any_coordinate_is_rejected() {
    let mut fixture = Fixture::new();
    let artifact = fixture.prove(&Identity::new("alice.near"), 742, 700);
    let arguments = transcode(&artifact).unwrap();
    let inputs = &artifact.public_inputs;

    for bit in [0, 1, 7, 64, 128, 200, 252] {
        for i in 0..2 {
            let mut tampered = arguments.clone();
            tampered.a[i] = flip_bit(tampered.a[i], bit);
            assert!(!ArkworksVerifier.check(&fixture.key, &tampered, inputs), "a[{i}] bit {bit}");

            let mut tampered = arguments.clone();
            tampered.c[i] = flip_bit(tampered.c[i], bit);
            assert!(!ArkworksVerifier.check(&fixture.key, &tampered, inputs), "c[{i}] bit {bit}");

            for j in 0..2 {
                let mut tampered = arguments.clone();
                tampered.b[i][j] = flip_bit(tampered.b[i][j], bit);
                assert!(
                    !ArkworksVerifier.check(&fixture.key, &tampered, inputs),
                    "b[{i}][{j}] bit {bit}"
                );
            }
        }
    }
}

#[test]
fn test_tampered_public_input_is_rejected() {
    let mut fixture = Fixture::new();
    let artifact = fixture.prove(&Identity::new("alice.near"), 742, 700);
    let arguments = transcode(&artifact).unwrap();

    for index in 0..artifact.public_inputs.len() {
        let mut inputs = artifact.public_inputs.clone();
        inputs[index] = flip_bit(inputs[index], 0);
        assert!(!ArkworksVerifier.check(&fixture.key, &arguments, &inputs), "input {index}");
    }

    // Lower threshold than the one proven
    let mut inputs = artifact.public_inputs.clone();
    inputs[1] = FieldElement::from_u64(650);
    assert!(!ArkworksVerifier.check(&fixture.key, &arguments, &inputs));
}

#[test]
fn test_wrong_arity_is_rejected_without_panicking() {
    let mut fixture = Fixture::new();
    let artifact = fixture.prove(&Identity::new("alice.near"), 742, 700);
    let arguments = transcode(&artifact).unwrap();

    assert!(!ArkworksVerifier.check(&fixture.key, &arguments, &artifact.public_inputs[..2]));
    let mut long = artifact.public_inputs.clone();
    long.push(FieldElement::ZERO);
    assert!(!ArkworksVerifier.check(&fixture.key, &arguments, &long));
}

#[test]
fn test_snarkjs_json_round_trip_still_verifies() {
    let mut fixture = Fixture::new();
    let artifact = fixture.prove(&Identity::new("bob.near"), 800, 700);

    let (proof, public) = artifact.to_snarkjs();
    let json = serde_json::to_string(&proof).unwrap();
    let parsed: SnarkjsProof = serde_json::from_str(&json).unwrap();
    let reparsed = ProofArtifact::from_snarkjs(&parsed, &public).unwrap();

    assert_eq!(reparsed, artifact);
    let arguments = transcode(&reparsed).unwrap();
    assert!(ArkworksVerifier.check(&fixture.key, &arguments, &reparsed.public_inputs));
}
