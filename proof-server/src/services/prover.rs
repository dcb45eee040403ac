//! Credit-score Prover Service
//!
//! Proofs come from an injected [`ProofGenerator`]. In production that is the
//! compiled circom circuit driven through `node` (witness) and `snarkjs`
//! (Groth16); in development mode a mock returns a structurally valid
//! artifact without running any external tool.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use sentinel_core::{
    transcode, AnalysisResult, FieldElement, Identity, MalformedProof, ProofArtifact,
    PublicInputLayout, SnarkjsProof, VerifierArguments,
};

use crate::config::Config;
use crate::types::ErrorCode;

#[derive(Error, Debug)]
pub enum ProverError {
    #[error("Score {score} does not meet threshold {threshold}")]
    ThresholdNotMet { score: u64, threshold: u64 },
    #[error("Circuit artifact not found: {}", .0.display())]
    CircuitNotFound(PathBuf),
    #[error("{step} failed ({status}): {stderr}")]
    ToolFailed {
        step: &'static str,
        status: String,
        stderr: String,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Prover output is malformed: {0}")]
    MalformedOutput(#[from] MalformedProof),
}

impl ProverError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::ThresholdNotMet { .. } => ErrorCode::ThresholdNotMet,
            Self::CircuitNotFound(_) => ErrorCode::CircuitNotFound,
            _ => ErrorCode::ProofGenerationFailed,
        }
    }
}

/// What the circuit is asked to prove.
#[derive(Debug, Clone)]
pub struct ProofRequest {
    pub identity: Identity,
    pub analysis: AnalysisResult,
    pub threshold: u64,
}

impl ProofRequest {
    fn check_threshold(&self) -> Result<(), ProverError> {
        if self.analysis.score < self.threshold {
            return Err(ProverError::ThresholdNotMet {
                score: self.analysis.score,
                threshold: self.threshold,
            });
        }
        Ok(())
    }
}

/// Turns a [`ProofRequest`] into a proof in prover (snarkjs) coordinate order.
pub trait ProofGenerator: Send + Sync {
    fn generate(
        &self,
        request: &ProofRequest,
    ) -> impl Future<Output = Result<ProofArtifact, ProverError>> + Send;
}

// ============================================================================
// snarkjs pipeline
// ============================================================================

/// Input signals of the credit-score circuit.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CircuitInput {
    pub credit_score: u64,
    pub threshold: u64,
    /// Identity field element in decimal
    pub user_address: String,
}

impl From<&ProofRequest> for CircuitInput {
    fn from(request: &ProofRequest) -> Self {
        Self {
            credit_score: request.analysis.score,
            threshold: request.threshold,
            user_address: request.identity.to_field_element().to_decimal_string(),
        }
    }
}

/// Compiled circuit files
#[derive(Debug, Clone)]
pub struct CircuitArtifacts {
    pub wasm: PathBuf,
    pub witness_script: PathBuf,
    pub zkey: PathBuf,
}

impl CircuitArtifacts {
    /// Standard circom output layout under `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            wasm: dir.join("credit_score_js/credit_score.wasm"),
            witness_script: dir.join("credit_score_js/generate_witness.js"),
            zkey: dir.join("credit_score_final.zkey"),
        }
    }

    pub fn check(&self) -> Result<(), ProverError> {
        for path in [&self.wasm, &self.witness_script, &self.zkey] {
            if !path.exists() {
                return Err(ProverError::CircuitNotFound(path.clone()));
            }
        }
        Ok(())
    }
}

/// Per-request scratch files, named by a fresh UUID. They are removed when
/// the session is dropped, so a cancelled request leaves no circuit input
/// behind.
struct Session {
    input: PathBuf,
    witness: PathBuf,
    proof: PathBuf,
    public: PathBuf,
}

impl Session {
    fn new(temp_dir: &Path) -> Self {
        let id = Uuid::new_v4();
        Self {
            input: temp_dir.join(format!("input_{id}.json")),
            witness: temp_dir.join(format!("witness_{id}.wtns")),
            proof: temp_dir.join(format!("proof_{id}.json")),
            public: temp_dir.join(format!("public_{id}.json")),
        }
    }

    fn files(&self) -> [&PathBuf; 4] {
        [&self.input, &self.witness, &self.proof, &self.public]
    }

}

impl Drop for Session {
    fn drop(&mut self) {
        for file in self.files() {
            match std::fs::remove_file(file) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %file.display(), error = %e, "Failed to remove temp file"),
            }
        }
    }
}

/// Runs the circom witness generator and `snarkjs groth16 prove`.
#[derive(Debug, Clone)]
pub struct SnarkjsProver {
    pub artifacts: CircuitArtifacts,
    pub temp_dir: PathBuf,
    pub node_bin: String,
    pub snarkjs_bin: String,
}

impl SnarkjsProver {
    pub fn from_config(config: &Config) -> Self {
        Self {
            artifacts: CircuitArtifacts::in_dir(&config.circuit_dir),
            temp_dir: config.temp_dir.clone(),
            node_bin: config.node_bin.clone(),
            snarkjs_bin: config.snarkjs_bin.clone(),
        }
    }

    async fn prove_in(&self, session: &Session, request: &ProofRequest) -> Result<ProofArtifact, ProverError> {
        let input = serde_json::to_vec(&CircuitInput::from(request))?;
        tokio::fs::write(&session.input, input).await?;

        let mut witness = Command::new(&self.node_bin);
        witness
            .arg(&self.artifacts.witness_script)
            .arg(&self.artifacts.wasm)
            .arg(&session.input)
            .arg(&session.witness);
        run_tool("Witness generation", witness).await?;

        let mut prove = Command::new(&self.snarkjs_bin);
        prove
            .args(["groth16", "prove"])
            .arg(&self.artifacts.zkey)
            .arg(&session.witness)
            .arg(&session.proof)
            .arg(&session.public);
        run_tool("Proof generation", prove).await?;

        let proof: SnarkjsProof = serde_json::from_slice(&tokio::fs::read(&session.proof).await?)?;
        let public: Vec<String> = serde_json::from_slice(&tokio::fs::read(&session.public).await?)?;
        Ok(ProofArtifact::from_snarkjs(&proof, &public)?)
    }
}

impl ProofGenerator for SnarkjsProver {
    async fn generate(&self, request: &ProofRequest) -> Result<ProofArtifact, ProverError> {
        request.check_threshold()?;
        self.artifacts.check()?;
        tokio::fs::create_dir_all(&self.temp_dir).await?;

        let session = Session::new(&self.temp_dir);
        self.prove_in(&session, request).await
    }
}

async fn run_tool(step: &'static str, mut command: Command) -> Result<(), ProverError> {
    info!("Starting {step}");
    let output = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        error!(status = %output.status, %stderr, "{step} failed");
        return Err(ProverError::ToolFailed {
            step,
            status: output.status.to_string(),
            stderr,
        });
    }
    debug!(stdout = %String::from_utf8_lossy(&output.stdout), "{step} finished");
    Ok(())
}

// ============================================================================
// Development mode
// ============================================================================

/// BN254 G2 generator, snarkjs order `[[x.c0, x.c1], [y.c0, y.c1]]`.
const G2_GENERATOR: [[&str; 2]; 2] = [
    [
        "10857046999023057135944570762232829481370756359578518086990519993285655852781",
        "11559732032986387107991004021392285783925812861821192530917403151452391805634",
    ],
    [
        "8495653923123431417604973247489272438418190587263600148770280649306958101930",
        "4082367875863433681332203403145435568316851327593401208105741076214120093531",
    ],
];

/// Returns generator points with correctly laid out public inputs. The
/// artifact transcodes and passes every pre-flight check, never the
/// pairing check.
#[derive(Debug, Clone)]
pub struct MockProver {
    pub layout: PublicInputLayout,
    /// Number of public inputs to emit
    pub arity: usize,
}

impl MockProver {
    pub fn new(layout: PublicInputLayout, arity: usize) -> Self {
        Self {
            arity: arity.max(layout.required_arity()),
            layout,
        }
    }

    fn public_inputs(&self, request: &ProofRequest) -> Vec<FieldElement> {
        let mut inputs = vec![FieldElement::ZERO; self.arity];
        inputs[self.layout.predicate_index as usize] = FieldElement::ONE;
        if let Some(index) = self.layout.threshold_index {
            inputs[index as usize] = FieldElement::from_u64(request.threshold);
        }
        inputs[self.layout.identity_index as usize] = request.identity.to_field_element();
        inputs
    }
}

impl ProofGenerator for MockProver {
    async fn generate(&self, request: &ProofRequest) -> Result<ProofArtifact, ProverError> {
        info!("Generating mock proof (dev mode)");
        request.check_threshold()?;

        let g1 = [FieldElement::ONE, FieldElement::from_u64(2)];
        let mut b = [[FieldElement::ZERO; 2]; 2];
        for (i, pair) in G2_GENERATOR.iter().enumerate() {
            for (j, value) in pair.iter().enumerate() {
                b[i][j] = value.parse().map_err(MalformedProof::from)?;
            }
        }

        Ok(ProofArtifact {
            a: g1,
            b,
            c: g1,
            public_inputs: self.public_inputs(request),
        })
    }
}

// ============================================================================
// Service
// ============================================================================

/// Chosen at start-up from `DEV_MODE`.
#[derive(Debug, Clone)]
pub enum ProverBackend {
    Snarkjs(SnarkjsProver),
    Mock(MockProver),
}

impl ProofGenerator for ProverBackend {
    async fn generate(&self, request: &ProofRequest) -> Result<ProofArtifact, ProverError> {
        match self {
            Self::Snarkjs(prover) => prover.generate(request).await,
            Self::Mock(prover) => prover.generate(request).await,
        }
    }
}

/// A generated proof in both coordinate orders.
#[derive(Debug, Clone)]
pub struct GeneratedProof {
    pub artifact: ProofArtifact,
    pub arguments: VerifierArguments,
    pub generation_time_ms: u64,
}

pub struct ProverService<G = ProverBackend> {
    generator: G,
}

impl ProverService<ProverBackend> {
    /// `arity` is the public-input count of the loaded verification key, if any.
    pub fn from_config(config: &Config, arity: Option<usize>) -> Self {
        let layout = config.public_input_layout.clone();
        let backend = if config.dev_mode {
            let arity = arity.unwrap_or_else(|| layout.required_arity());
            ProverBackend::Mock(MockProver::new(layout, arity))
        } else {
            ProverBackend::Snarkjs(SnarkjsProver::from_config(config))
        };
        Self::new(backend)
    }

    pub fn is_mock(&self) -> bool {
        matches!(self.generator, ProverBackend::Mock(_))
    }
}

impl<G: ProofGenerator> ProverService<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    /// Generate a proof and transcode it for the ledger
    #[instrument(skip_all, fields(identity = %request.identity, threshold = request.threshold))]
    pub async fn generate_proof(&self, request: &ProofRequest) -> Result<GeneratedProof, ProverError> {
        let start = Instant::now();

        let result = self
            .generator
            .generate(request)
            .await
            .and_then(|artifact| Ok((transcode(&artifact)?, artifact)));
        let generation_time_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok((arguments, artifact)) => {
                info!(
                    generation_time_ms,
                    public_inputs = artifact.public_inputs.len(),
                    "Proof generated successfully"
                );
                Ok(GeneratedProof {
                    artifact,
                    arguments,
                    generation_time_ms,
                })
            }
            Err(e) => {
                error!(error = %e, "Proof generation failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::{preflight, swap_g2_coordinates, RiskLevel, VerificationError, VerificationKey};

    fn request(identity: &str, score: u64, threshold: u64) -> ProofRequest {
        ProofRequest {
            identity: Identity::new(identity),
            analysis: AnalysisResult {
                score,
                risk_level: RiskLevel::Low,
            },
            threshold,
        }
    }

    fn mock_service() -> ProverService<MockProver> {
        ProverService::new(MockProver::new(PublicInputLayout::default(), 3))
    }

    /// Only the shape matters to the pre-flight checks.
    fn key(n_public: usize) -> VerificationKey {
        let g1 = [FieldElement::ONE, FieldElement::from_u64(2)];
        let g2 = [[FieldElement::ONE; 2]; 2];
        VerificationKey {
            alpha_g1: g1,
            beta_g2: g2,
            gamma_g2: g2,
            delta_g2: g2,
            ic: vec![g1; n_public + 1],
        }
    }

    #[tokio::test]
    async fn test_mock_proof_passes_preflight() {
        let service = mock_service();
        let alice = request("alice.near", 742, 700);

        let proof = service.generate_proof(&alice).await.unwrap();
        let inputs = &proof.artifact.public_inputs;
        assert_eq!(inputs.len(), 3);
        assert_eq!(inputs[0], FieldElement::ONE);
        assert_eq!(inputs[1], FieldElement::from_u64(700));
        assert_eq!(inputs[2], alice.identity.to_field_element());
        assert_eq!(proof.arguments.b, swap_g2_coordinates(&proof.artifact.b));

        let layout = PublicInputLayout::default();
        preflight(&key(3), &layout, &alice.identity, &proof.arguments, inputs).unwrap();

        let err = preflight(&key(3), &layout, &Identity::new("bob.near"), &proof.arguments, inputs)
            .unwrap_err();
        assert!(matches!(err, VerificationError::IdentityMismatch { .. }));
    }

    #[tokio::test]
    async fn test_mock_respects_layout_and_arity() {
        let layout: PublicInputLayout = "identity=0,predicate=3,threshold=none".parse().unwrap();
        let service = ProverService::new(MockProver::new(layout, 2));
        let bob = request("0x00000000000000000000000000000000000000ff", 800, 700);

        let proof = service.generate_proof(&bob).await.unwrap();
        let inputs = proof.artifact.public_inputs;
        assert_eq!(inputs.len(), 4);
        assert_eq!(inputs[0], FieldElement::from_u64(255));
        assert_eq!(inputs[3], FieldElement::ONE);
        assert!(inputs[1].is_zero() && inputs[2].is_zero());
    }

    #[tokio::test]
    async fn test_threshold_not_met_is_rejected_early() {
        let err = mock_service()
            .generate_proof(&request("alice.near", 650, 700))
            .await
            .unwrap_err();
        assert!(matches!(err, ProverError::ThresholdNotMet { score: 650, threshold: 700 }));
        assert_eq!(err.code(), ErrorCode::ThresholdNotMet);
    }

    #[tokio::test]
    async fn test_missing_circuit_is_reported() {
        let temp_dir = std::env::temp_dir().join(format!("sentinel-test-{}", Uuid::new_v4()));
        let prover = SnarkjsProver {
            artifacts: CircuitArtifacts::in_dir(&temp_dir.join("missing")),
            temp_dir: temp_dir.clone(),
            node_bin: "node".to_string(),
            snarkjs_bin: "snarkjs".to_string(),
        };

        let err = prover.generate(&request("alice.near", 742, 700)).await.unwrap_err();
        assert!(matches!(err, ProverError::CircuitNotFound(ref path) if path.ends_with("credit_score.wasm")));
        assert_eq!(err.code(), ErrorCode::CircuitNotFound);

        // Threshold is checked before the circuit is looked up
        let err = prover.generate(&request("alice.near", 100, 700)).await.unwrap_err();
        assert!(matches!(err, ProverError::ThresholdNotMet { .. }));
    }

    /// Empty circuit files under `dir`, scratch space in `dir/scratch`.
    async fn stub_prover(dir: &Path, node_bin: &str) -> SnarkjsProver {
        let circuit_dir = dir.join("circuit");
        tokio::fs::create_dir_all(circuit_dir.join("credit_score_js")).await.unwrap();
        let artifacts = CircuitArtifacts::in_dir(&circuit_dir);
        for path in [&artifacts.wasm, &artifacts.witness_script, &artifacts.zkey] {
            tokio::fs::write(path, b"").await.unwrap();
        }

        SnarkjsProver {
            artifacts,
            temp_dir: dir.join("scratch"),
            node_bin: node_bin.to_string(),
            snarkjs_bin: "/nonexistent/snarkjs".to_string(),
        }
    }

    async fn assert_empty(dir: &Path) {
        let mut entries = tokio::fs::read_dir(dir).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failing_tool_cleans_up_temp_files() {
        let dir = std::env::temp_dir().join(format!("sentinel-test-{}", Uuid::new_v4()));
        let prover = stub_prover(&dir, "/nonexistent/node").await;

        let err = prover.generate(&request("alice.near", 742, 700)).await.unwrap_err();
        assert!(matches!(err, ProverError::Io(_)));
        assert_eq!(err.code(), ErrorCode::ProofGenerationFailed);

        assert_empty(&prover.temp_dir).await;
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancelled_generation_removes_scratch_files() {
        let dir = std::env::temp_dir().join(format!("sentinel-test-{}", Uuid::new_v4()));
        // `sh` runs the witness script, which stalls past the deadline
        let prover = stub_prover(&dir, "sh").await;
        tokio::fs::write(&prover.artifacts.witness_script, b"sleep 5\n").await.unwrap();

        let request = request("alice.near", 742, 700);
        let result =
            tokio::time::timeout(std::time::Duration::from_millis(300), prover.generate(&request)).await;
        assert!(result.is_err(), "generation should still be running");

        assert_empty(&prover.temp_dir).await;
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[test]
    fn test_circuit_input_uses_identity_field_element() {
        let input = CircuitInput::from(&request("0x0000000000000000000000000000000000000010", 742, 700));
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "creditScore": 742, "threshold": 700, "userAddress": "16" })
        );
    }

    #[test]
    fn test_backend_follows_dev_mode() {
        let config = Config {
            dev_mode: true,
            ..Default::default()
        };
        assert!(ProverService::from_config(&config, Some(5)).is_mock());
        assert!(!ProverService::from_config(&Config::default(), None).is_mock());
    }
}
