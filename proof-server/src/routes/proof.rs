//! Proof generation, transcoding and pre-flight verification endpoints

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use sentinel_core::{
    preflight, transcode, ArkworksVerifier, PairingVerifier, ProofArtifact, VerificationError,
};

use super::ApiError;
use crate::services::{ProofRequest, ProverError};
use crate::state::AppState;
use crate::types::{
    ErrorCode, GenerateProofRequest, GenerateProofResponse, TranscodeRequest, TranscodeResponse,
    VerifyProofRequest, VerifyProofResponse,
};

/// Create proof routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/proof/generate", post(generate_proof))
        .route("/proof/transcode", post(transcode_proof))
        .route("/proof/verify", post(verify_proof))
}

/// Generate a credit-score proof
/// POST /api/v1/proof/generate
#[instrument(skip(state, request), fields(identity = %request.identity))]
async fn generate_proof(
    State(state): State<AppState>,
    Json(request): Json<GenerateProofRequest>,
) -> Result<Json<GenerateProofResponse>, ApiError> {
    info!("Received proof generation request");

    if request.identity.as_str().is_empty() {
        return Err(ApiError::bad_request(ErrorCode::InvalidInput, "identity is empty"));
    }

    let Some(_slot) = state.try_acquire_proof_slot() else {
        warn!("All proof slots are busy");
        return Err(ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::ServerBusy,
            "Too many proofs in flight, retry later",
        ));
    };

    let request_id = Uuid::new_v4().to_string();
    let proof_request = ProofRequest {
        identity: request.identity,
        analysis: request.analysis,
        threshold: request.threshold.unwrap_or(state.default_threshold()),
    };

    let queued = state.enqueue_proof(request_id.clone());
    let result = state.prover().generate_proof(&proof_request).await;
    drop(queued);

    let proof = result.map_err(prover_error)?;
    state.increment_proofs();

    info!(
        request_id = %request_id,
        generation_time_ms = proof.generation_time_ms,
        "Proof generated successfully"
    );

    Ok(Json(GenerateProofResponse {
        request_id,
        identity_field: proof_request.identity.to_field_element(),
        identity: proof_request.identity,
        analysis: proof_request.analysis,
        threshold: proof_request.threshold,
        public_inputs: proof.artifact.public_inputs.clone(),
        artifact: proof.artifact,
        verifier_arguments: proof.arguments,
        generation_time_ms: proof.generation_time_ms,
    }))
}

fn prover_error(e: ProverError) -> ApiError {
    let status = match e {
        ProverError::ThresholdNotMet { .. } => StatusCode::BAD_REQUEST,
        ProverError::CircuitNotFound(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error!(code = ?e.code(), error = %e, "Proof generation failed");
    ApiError::new(status, e.code(), e.to_string())
}

/// Convert snarkjs output into verifier-ready arguments
/// POST /api/v1/proof/transcode
#[instrument(skip_all)]
async fn transcode_proof(
    Json(request): Json<TranscodeRequest>,
) -> Result<Json<TranscodeResponse>, ApiError> {
    let artifact = ProofArtifact::from_snarkjs(&request.proof, &request.public_signals)
        .and_then(|artifact| Ok((transcode(&artifact)?, artifact)));

    match artifact {
        Ok((verifier_arguments, artifact)) => Ok(Json(TranscodeResponse {
            verifier_arguments,
            public_inputs: artifact.public_inputs,
        })),
        Err(e) => {
            warn!(error = %e, "Transcoding failed");
            Err(ApiError::bad_request(ErrorCode::MalformedProof, e.to_string()))
        }
    }
}

/// Check a proof the way the ledger would, without touching it
/// POST /api/v1/proof/verify
#[instrument(skip(state, request), fields(identity = %request.identity))]
async fn verify_proof(
    State(state): State<AppState>,
    Json(request): Json<VerifyProofRequest>,
) -> Result<Json<VerifyProofResponse>, ApiError> {
    let Some(key) = state.verification_key().cloned() else {
        return Err(ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::VerificationKeyMissing,
            "No verification key configured",
        ));
    };

    if let Err(e) = preflight(
        &key,
        state.layout(),
        &request.identity,
        &request.verifier_arguments,
        &request.public_inputs,
    ) {
        info!(error = %e, "Proof fails pre-flight checks");
        return Ok(Json(rejected(&e)));
    }

    let VerifyProofRequest {
        verifier_arguments,
        public_inputs,
        ..
    } = request;
    let valid = tokio::task::spawn_blocking(move || {
        ArkworksVerifier.check(&key, &verifier_arguments, &public_inputs)
    })
    .await
    .map_err(|e| {
        error!(error = %e, "Verifier task failed");
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalError,
            "Verifier task failed",
        )
    })?;

    if !valid {
        info!("Pairing check failed");
        return Ok(Json(rejected(&VerificationError::ProofRejected)));
    }

    info!("Proof verified successfully");
    Ok(Json(VerifyProofResponse {
        valid: true,
        error: None,
        code: None,
    }))
}

fn rejected(e: &VerificationError) -> VerifyProofResponse {
    let code = match e {
        VerificationError::MalformedProof(_) => ErrorCode::MalformedProof,
        VerificationError::IdentityMismatch { .. } => ErrorCode::IdentityMismatch,
        VerificationError::StatementRejected(_) => ErrorCode::StatementRejected,
        VerificationError::ProofRejected => ErrorCode::ProofRejected,
    };
    VerifyProofResponse {
        valid: false,
        error: Some(e.to_string()),
        code: Some(code),
    }
}
