//! Groth16 Verification using NEAR's alt_bn128 host functions
//!
//! The verification equation is checked as a single product of pairings:
//! e(-A, B) * e(α, β) * e(vk_x, γ) * e(C, δ) == 1
//!
//! where vk_x = IC[0] + Σ(public_input[i] * IC[i+1]).
//!
//! All host functions take little-endian field elements. A G2 point is packed
//! as x.c0, x.c1, y.c0, y.c1 (real part first), the reverse of the verifier
//! order stored in [`VerificationKey`] and [`VerifierArguments`].
//!
//! Points that are not on the curve make the host function abort the
//! transaction. Nothing is committed in that case either.

use near_sdk::env;
use sentinel_core::field::BASE_FIELD_MODULUS;
use sentinel_core::{
    FieldElement, G1Coordinates, G2Coordinates, PairingVerifier, VerificationKey,
    VerifierArguments,
};

/// Size of one `(G1, G2)` pair in the pairing-check input.
const PAIR_SIZE: usize = 64 + 128;

#[derive(Clone, Copy, Debug, Default)]
pub struct AltBn128Verifier;

impl PairingVerifier for AltBn128Verifier {
    fn check(
        &self,
        key: &VerificationKey,
        arguments: &VerifierArguments,
        public_inputs: &[FieldElement],
    ) -> bool {
        if public_inputs.len() + 1 != key.ic.len() {
            return false;
        }
        let vk_x = match linear_combination(&key.ic, public_inputs) {
            Some(point) => point,
            None => return false,
        };
        env::alt_bn128_pairing_check(&pairing_input(key, arguments, &vk_x))
    }
}

/// `(x, y)` little-endian.
pub fn encode_g1(point: &G1Coordinates) -> [u8; 64] {
    let mut out = [0u8; 64];
    out[..32].copy_from_slice(&point[0].to_le_bytes());
    out[32..].copy_from_slice(&point[1].to_le_bytes());
    out
}

/// Takes verifier order `[[x.c1, x.c0], [y.c1, y.c0]]`, writes
/// `x.c0, x.c1, y.c0, y.c1` little-endian.
pub fn encode_g2(point: &G2Coordinates) -> [u8; 128] {
    let mut out = [0u8; 128];
    out[..32].copy_from_slice(&point[0][1].to_le_bytes());
    out[32..64].copy_from_slice(&point[0][0].to_le_bytes());
    out[64..96].copy_from_slice(&point[1][1].to_le_bytes());
    out[96..].copy_from_slice(&point[1][0].to_le_bytes());
    out
}

/// On BN254, -(x, y) = (x, p - y). The point at infinity is its own negation.
pub fn negate_g1(point: &G1Coordinates) -> G1Coordinates {
    let y = point[1].to_be_bytes();
    if point[0].is_zero() && point[1].is_zero() {
        return *point;
    }

    let mut neg_y = [0u8; 32];
    let mut borrow = 0i16;
    for i in (0..32).rev() {
        let mut diff = BASE_FIELD_MODULUS[i] as i16 - y[i] as i16 - borrow;
        borrow = if diff < 0 { 1 } else { 0 };
        if diff < 0 {
            diff += 256;
        }
        neg_y[i] = diff as u8;
    }

    [point[0], FieldElement::from_be_bytes(neg_y)]
}

/// Items for `alt_bn128_g1_multiexp`: `(G1, scalar)` per public input.
pub fn multiexp_input(ic: &[G1Coordinates], scalars: &[FieldElement]) -> Vec<u8> {
    let mut input = Vec::with_capacity(scalars.len() * 96);
    for (point, scalar) in ic.iter().zip(scalars) {
        input.extend_from_slice(&encode_g1(point));
        input.extend_from_slice(&scalar.to_le_bytes());
    }
    input
}

/// IC[0] + Σ(scalar[i] * IC[i+1]) using multiexp and g1_sum.
fn linear_combination(ic: &[G1Coordinates], scalars: &[FieldElement]) -> Option<G1Coordinates> {
    let (first, rest) = ic.split_first()?;
    if scalars.is_empty() {
        return Some(*first);
    }

    let product = decode_g1(&env::alt_bn128_g1_multiexp(&multiexp_input(rest, scalars)))?;

    // g1_sum items are (sign, G1); sign 0 keeps the point as is
    let mut input = Vec::with_capacity(2 * 65);
    for point in [first, &product] {
        input.push(0u8);
        input.extend_from_slice(&encode_g1(point));
    }
    decode_g1(&env::alt_bn128_g1_sum(&input))
}

fn decode_g1(bytes: &[u8]) -> Option<G1Coordinates> {
    if bytes.len() != 64 {
        return None;
    }
    let mut x = [0u8; 32];
    let mut y = [0u8; 32];
    x.copy_from_slice(&bytes[..32]);
    y.copy_from_slice(&bytes[32..]);
    Some([FieldElement::from_le_bytes(x), FieldElement::from_le_bytes(y)])
}

/// Four `(G1, G2)` pairs for `alt_bn128_pairing_check`.
pub fn pairing_input(
    key: &VerificationKey,
    arguments: &VerifierArguments,
    vk_x: &G1Coordinates,
) -> Vec<u8> {
    let pairs = [
        (negate_g1(&arguments.a), &arguments.b),
        (key.alpha_g1, &key.beta_g2),
        (*vk_x, &key.gamma_g2),
        (arguments.c, &key.delta_g2),
    ];

    let mut input = Vec::with_capacity(pairs.len() * PAIR_SIZE);
    for (g1, g2) in pairs {
        input.extend_from_slice(&encode_g1(&g1));
        input.extend_from_slice(&encode_g2(g2));
    }
    input
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fe(v: u64) -> FieldElement {
        FieldElement::from_u64(v)
    }

    #[test]
    fn test_g1_encoding_is_little_endian() {
        let bytes = encode_g1(&[fe(1), fe(2)]);
        assert_eq!(bytes[0], 1);
        assert_eq!(bytes[32], 2);
        assert!(bytes[1..32].iter().all(|b| *b == 0));
        assert_eq!(decode_g1(&bytes), Some([fe(1), fe(2)]));
    }

    #[test]
    fn test_g2_encoding_puts_real_part_first() {
        // Verifier order [[x.c1, x.c0], [y.c1, y.c0]]
        let point = [[fe(11), fe(10)], [fe(21), fe(20)]];
        let bytes = encode_g2(&point);
        assert_eq!(bytes[0], 10);
        assert_eq!(bytes[32], 11);
        assert_eq!(bytes[64], 20);
        assert_eq!(bytes[96], 21);
    }

    #[test]
    fn test_negate_g1() {
        let negated = negate_g1(&[fe(1), fe(2)]);
        assert_eq!(negated[0], fe(1));
        // p - 2
        assert_eq!(
            negated[1].to_decimal_string(),
            "21888242871839275222246405745257275088696311157297823662689037894645226208581"
        );
        assert_eq!(negate_g1(&negated), [fe(1), fe(2)]);
        assert_eq!(negate_g1(&[FieldElement::ZERO; 2]), [FieldElement::ZERO; 2]);
    }

    #[test]
    fn test_multiexp_input_pairs_points_with_scalars() {
        let ic = [[fe(1), fe(2)], [fe(3), fe(4)]];
        let input = multiexp_input(&ic, &[fe(7), fe(8)]);
        assert_eq!(input.len(), 2 * 96);
        assert_eq!(input[64], 7);
        assert_eq!(input[96], 3);
        assert_eq!(input[96 + 64], 8);
    }

    #[test]
    fn test_pairing_input_layout() {
        let g2 = [[fe(5), fe(6)], [fe(7), fe(8)]];
        let key = VerificationKey {
            alpha_g1: [fe(1), fe(2)],
            beta_g2: g2,
            gamma_g2: g2,
            delta_g2: g2,
            ic: vec![[fe(1), fe(2)]; 2],
        };
        let arguments = VerifierArguments {
            a: [fe(1), fe(2)],
            b: g2,
            c: [fe(3), fe(4)],
        };
        let input = pairing_input(&key, &arguments, &[fe(9), fe(10)]);

        assert_eq!(input.len(), 4 * PAIR_SIZE);
        // -A keeps x, negates y
        assert_eq!(input[0], 1);
        assert_ne!(input[32], 2);
        assert_eq!(input[2 * PAIR_SIZE], 9);
        assert_eq!(input[3 * PAIR_SIZE], 3);
    }
}
