//! Services for the Proof Server
//!
//! Proof generation and verification key loading.

pub mod keys;
pub mod prover;

pub use keys::{load_verification_key, LoadKeyError};
pub use prover::{
    MockProver, ProofGenerator, ProofRequest, ProverBackend, ProverError, ProverService,
    SnarkjsProver,
};
