//! # ZK-Sentinel core
//!
//! Shared by the NEAR contract and the proof server:
//!
//! - **Proof data model**: BN254 field elements, curve points, snarkjs
//!   artifacts and verification keys
//! - **Transcoder**: prover-order artifacts to verifier-order arguments
//! - **Verification gateway**: the per-identity `Unverified → Verified`
//!   state machine over an injected [`RecordStore`] and [`PairingVerifier`]
//!
//! The crate has no NEAR dependency. With the `arkworks` feature (on by
//! default) it also provides an off-chain [`ArkworksVerifier`].

pub mod error;
pub mod event;
pub mod field;
pub mod gateway;
pub mod identity;
pub mod key;
pub mod layout;
pub mod proof;
pub mod store;
pub mod transcode;
pub mod verifier;

#[cfg(feature = "arkworks")]
pub mod ark;

pub use error::{KeyError, MalformedProof, StatementViolation, VerificationError};
pub use event::VerificationEvent;
pub use field::{FieldElement, FieldParseError};
pub use gateway::{is_verified, preflight, VerificationGateway, VerificationOutcome};
pub use identity::Identity;
pub use key::{SnarkjsVerificationKey, VerificationKey};
pub use layout::{LayoutParseError, PublicInputLayout};
pub use proof::{
    AnalysisResult, G1Coordinates, G2Coordinates, ProofArtifact, ProofBundle, RiskLevel,
    SnarkjsProof, VerifierArguments,
};
pub use store::{
    BlockTime, MemoryRecordStore, RecordLookup, RecordStore, SharedRecordStore, VerificationRecord,
};
pub use transcode::{swap_g2_coordinates, transcode};
pub use verifier::PairingVerifier;

#[cfg(feature = "arkworks")]
pub use ark::ArkworksVerifier;
