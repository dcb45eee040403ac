//! Health and status endpoints

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};

use crate::state::AppState;
use crate::types::{HealthResponse, StatusResponse};

/// Rough cost of one snarkjs proof, for the wait estimate
const SECS_PER_PROOF: u64 = 5;

/// Create health routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/status", get(status))
}

/// Health check endpoint
/// GET /health
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let queue_length = state.proof_queue_length();

    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        queue_length,
        estimated_wait_secs: queue_length as u64 * SECS_PER_PROOF,
    };

    (StatusCode::OK, Json(response))
}

/// Detailed status endpoint
/// GET /status
async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let key = state.verification_key();

    let response = StatusResponse {
        status: "running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        dev_mode: state.prover().is_mock(),
        queue_length: state.proof_queue_length(),
        total_proofs: state.total_proofs_generated(),
        uptime_secs: state.uptime_secs(),
        started_at: state.started_at(),
        verification_key_loaded: key.is_some(),
        verification_key_hash: key.map(|k| k.key_hash()),
        expected_public_inputs: state.expected_public_inputs(),
    };

    (StatusCode::OK, Json(response))
}
