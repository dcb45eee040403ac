//! Application State
//!
//! Shared state for the proof server, accessible from all route handlers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use chrono::{DateTime, Utc};
use tokio::sync::{Semaphore, SemaphorePermit};

use sentinel_core::{PublicInputLayout, VerificationKey};

use crate::config::Config;
use crate::services::ProverService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Proof generation service
    prover: ProverService,
    /// Key for pre-flight verification, if configured
    verification_key: Option<VerificationKey>,
    layout: PublicInputLayout,
    default_threshold: u64,
    /// Bounds the proofs in flight
    proof_permits: Semaphore,
    /// Request IDs of proofs in flight. Never held across an await.
    proof_queue: Mutex<Vec<String>>,
    /// Total proofs generated
    total_proofs: AtomicU64,
    /// Server start time
    start_time: Instant,
    started_at: DateTime<Utc>,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: &Config, verification_key: Option<VerificationKey>) -> Self {
        let prover = ProverService::from_config(config, verification_key.as_ref().map(|k| k.n_public()));

        Self {
            inner: Arc::new(AppStateInner {
                prover,
                verification_key,
                layout: config.public_input_layout.clone(),
                default_threshold: config.default_threshold,
                proof_permits: Semaphore::new(config.max_concurrent_proofs),
                proof_queue: Mutex::new(Vec::new()),
                total_proofs: AtomicU64::new(0),
                start_time: Instant::now(),
                started_at: Utc::now(),
            }),
        }
    }

    /// Get the prover service
    pub fn prover(&self) -> &ProverService {
        &self.inner.prover
    }

    pub fn verification_key(&self) -> Option<&VerificationKey> {
        self.inner.verification_key.as_ref()
    }

    pub fn layout(&self) -> &PublicInputLayout {
        &self.inner.layout
    }

    pub fn default_threshold(&self) -> u64 {
        self.inner.default_threshold
    }

    /// Public inputs a proof must carry: the key's arity, else what the
    /// layout needs.
    pub fn expected_public_inputs(&self) -> usize {
        self.verification_key()
            .map(|key| key.n_public())
            .unwrap_or_else(|| self.inner.layout.required_arity())
    }

    /// A generation slot, or `None` when all are taken.
    pub fn try_acquire_proof_slot(&self) -> Option<SemaphorePermit<'_>> {
        self.inner.proof_permits.try_acquire().ok()
    }

    /// Get current proof queue length
    pub fn proof_queue_length(&self) -> usize {
        self.proof_queue().len()
    }

    /// Add a proof request to the queue. It leaves the queue when the
    /// returned entry is dropped, including when the request is cancelled.
    pub fn enqueue_proof(&self, id: String) -> QueuedProof {
        self.proof_queue().push(id.clone());
        QueuedProof {
            state: self.clone(),
            id,
        }
    }

    fn proof_queue(&self) -> MutexGuard<'_, Vec<String>> {
        // The queue holds plain ids, so a panic elsewhere cannot leave it torn
        self.inner
            .proof_queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Get total proofs generated
    pub fn total_proofs_generated(&self) -> u64 {
        self.inner.total_proofs.load(Ordering::Relaxed)
    }

    /// Increment proof counter
    pub fn increment_proofs(&self) {
        self.inner.total_proofs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.inner.started_at
    }

    /// Get server uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.inner.start_time.elapsed().as_secs()
    }
}

/// A proof request counted in the queue.
pub struct QueuedProof {
    state: AppState,
    id: String,
}

impl Drop for QueuedProof {
    fn drop(&mut self) {
        self.state.proof_queue().retain(|x| x != &self.id);
    }
}
