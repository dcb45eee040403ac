//! Request and response types for the proof server API

use serde::{Deserialize, Serialize};

use sentinel_core::{
    AnalysisResult, FieldElement, Identity, ProofArtifact, SnarkjsProof, VerifierArguments,
};

// ==================== Requests ====================

/// Request to generate a credit-score proof
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateProofRequest {
    /// Wallet the proof is bound to
    pub identity: Identity,
    /// Scoring oracle output; the score stays private to the proof
    pub analysis: AnalysisResult,
    /// Falls back to the server's default threshold
    #[serde(default)]
    pub threshold: Option<u64>,
}

/// snarkjs `proof.json` and `public.json` contents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeRequest {
    pub proof: SnarkjsProof,
    pub public_signals: Vec<String>,
}

/// Pre-flight verification of verifier-ready arguments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyProofRequest {
    pub identity: Identity,
    pub verifier_arguments: VerifierArguments,
    pub public_inputs: Vec<FieldElement>,
}

// ==================== Responses ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateProofResponse {
    /// Unique proof request ID
    pub request_id: String,
    pub identity: Identity,
    /// The identity as the circuit sees it
    pub identity_field: FieldElement,
    pub analysis: AnalysisResult,
    pub threshold: u64,
    /// Proof in prover (snarkjs) coordinate order
    pub artifact: ProofArtifact,
    /// The same proof, ready for `verify_credit_score`
    pub verifier_arguments: VerifierArguments,
    pub public_inputs: Vec<FieldElement>,
    /// Proof generation time in milliseconds
    pub generation_time_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeResponse {
    pub verifier_arguments: VerifierArguments,
    pub public_inputs: Vec<FieldElement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyProofResponse {
    /// Whether the ledger would accept the proof
    pub valid: bool,
    /// Why it would not
    pub error: Option<String>,
    pub code: Option<ErrorCode>,
}

/// Error codes for API responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Score is below the requested threshold
    ThresholdNotMet,
    /// Witness or proof generation failed
    ProofGenerationFailed,
    /// Compiled circuit is missing
    CircuitNotFound,
    /// Request could not be used as given
    InvalidInput,
    /// Proof or public inputs are structurally invalid
    MalformedProof,
    /// Public inputs are bound to another identity
    IdentityMismatch,
    /// Public inputs do not state what the ledger requires
    StatementRejected,
    /// Pairing check failed
    ProofRejected,
    /// No verification key is configured
    VerificationKeyMissing,
    /// Too many proofs in flight
    ServerBusy,
    /// Internal server error
    InternalError,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional additional details
    pub details: Option<serde_json::Value>,
}

/// Server health status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Server status
    pub status: String,
    /// Server version
    pub version: String,
    /// Current proof queue length
    pub queue_length: usize,
    /// Estimated wait time in seconds
    pub estimated_wait_secs: u64,
}

/// Server status with more details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Server status
    pub status: String,
    /// Server version
    pub version: String,
    /// Whether proofs are mocked
    pub dev_mode: bool,
    pub queue_length: usize,
    /// Total proofs generated
    pub total_proofs: u64,
    /// Uptime in seconds
    pub uptime_secs: u64,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub verification_key_loaded: bool,
    /// SHA-256 of the loaded key, matching the contract's key info
    pub verification_key_hash: Option<String>,
    /// Public inputs each proof must carry
    pub expected_public_inputs: usize,
}
