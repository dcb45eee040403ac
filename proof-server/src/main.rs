//! # ZK-Sentinel - Proof Server
//!
//! Off-chain companion of the `zk-sentinel` contract.
//!
//! ## Features
//!
//! - Generate Groth16 credit-score proofs with the compiled circom circuit
//!   (`node` + `snarkjs`), bound to the caller's wallet
//! - Transcode snarkjs output into the argument order the contract expects
//! - Pre-flight verification with the contract's own checks and an arkworks
//!   pairing check
//!
//! ## Usage
//!
//! ```bash
//! # Development mode (mock proofs)
//! DEV_MODE=true cargo run -p sentinel-proof-server
//!
//! # Production
//! CIRCUIT_DIR=circuits/build \
//! VERIFICATION_KEY_PATH=circuits/build/verification_key.json \
//! cargo run -p sentinel-proof-server
//! ```
//!
//! ## API Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Detailed server status
//! - `POST /api/v1/proof/generate` - Generate a proof
//! - `POST /api/v1/proof/transcode` - Convert snarkjs output
//! - `POST /api/v1/proof/verify` - Pre-flight verification

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use proof_server::services::load_verification_key;
use proof_server::{create_routes, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        dev_mode = config.dev_mode,
        layout = %config.public_input_layout,
        "Starting ZK-Sentinel Proof Server"
    );

    let verification_key = match &config.verification_key_path {
        Some(path) => Some(load_verification_key(path, &config.public_input_layout).await?),
        None => {
            warn!("VERIFICATION_KEY_PATH not set, pre-flight verification is disabled");
            None
        }
    };

    if config.dev_mode {
        info!("Running in DEVELOPMENT mode - proofs are MOCKED");
    } else {
        info!(circuit_dir = %config.circuit_dir.display(), "Using snarkjs prover");
    }

    // Create application state
    let state = AppState::new(&config, verification_key);

    // Build router
    let app = create_routes(state)
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = config.socket_addr()?;
    info!(%addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

/// Initialize logging based on configuration
fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(true),
            )
            .init();
    }
}
