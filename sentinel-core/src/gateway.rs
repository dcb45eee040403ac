//! Verification gateway
//!
//! Per identity the gateway moves from `Unverified` (no record) to `Verified`
//! exactly once. A submission for an identity that is already verified
//! succeeds without looking at the proof. Every other submission is checked
//! in this order, stopping at the first failure:
//!
//! 1. argument and public-input structure ([`MalformedProof`])
//! 2. identity binding ([`VerificationError::IdentityMismatch`])
//! 3. statement policy ([`VerificationError::StatementRejected`])
//! 4. the pairing check ([`VerificationError::ProofRejected`])
//!
//! Only after all four pass is a record written, through the store's atomic
//! `insert_if_absent`. A failed submission never touches the store.
//!
//! [`MalformedProof`]: crate::error::MalformedProof

use crate::error::{MalformedProof, VerificationError};
use crate::event::VerificationEvent;
use crate::field::FieldElement;
use crate::identity::Identity;
use crate::key::VerificationKey;
use crate::layout::PublicInputLayout;
use crate::proof::VerifierArguments;
use crate::store::{BlockTime, RecordLookup, RecordStore, VerificationRecord};
use crate::transcode::{check_arguments, check_public_inputs};
use crate::verifier::PairingVerifier;

/// Successful result of a submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// This submission created the record.
    Committed(VerificationRecord),
    /// The identity was already verified. Carries the original record.
    AlreadyVerified(VerificationRecord),
}

impl VerificationOutcome {
    pub fn record(&self) -> &VerificationRecord {
        match self {
            Self::Committed(record) | Self::AlreadyVerified(record) => record,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Committed(_))
    }

    /// Event to publish, only for fresh commits.
    pub fn event(&self) -> Option<VerificationEvent> {
        match self {
            Self::Committed(record) => Some(VerificationEvent::from_record(record)),
            Self::AlreadyVerified(_) => None,
        }
    }
}

pub struct VerificationGateway<'k, S, V> {
    store: S,
    verifier: V,
    key: &'k VerificationKey,
    layout: &'k PublicInputLayout,
}

impl<'k, S: RecordStore, V: PairingVerifier> VerificationGateway<'k, S, V> {
    pub fn new(store: S, verifier: V, key: &'k VerificationKey, layout: &'k PublicInputLayout) -> Self {
        Self {
            store,
            verifier,
            key,
            layout,
        }
    }

    pub fn verify_credit_score(
        &mut self,
        identity: &Identity,
        arguments: &VerifierArguments,
        public_inputs: &[FieldElement],
        now: BlockTime,
    ) -> Result<VerificationOutcome, VerificationError> {
        if let Some(record) = self.already_verified(identity) {
            return Ok(VerificationOutcome::AlreadyVerified(record));
        }

        preflight(self.key, self.layout, identity, arguments, public_inputs)?;

        if !self.verifier.check(self.key, arguments, public_inputs) {
            return Err(VerificationError::ProofRejected);
        }

        let record = VerificationRecord::verified(identity.clone(), now);
        match self.store.insert_if_absent(record.clone()) {
            Ok(()) => Ok(VerificationOutcome::Committed(record)),
            // Lost a race with a concurrent submission for the same identity
            Err(existing) => Ok(VerificationOutcome::AlreadyVerified(existing)),
        }
    }

    pub fn already_verified(&self, identity: &Identity) -> Option<VerificationRecord> {
        self.store.get(identity).filter(|record| record.verified)
    }

    pub fn is_verified(&self, identity: &Identity) -> bool {
        is_verified(&self.store, identity)
    }
}

/// Status query. `false` for identities without a record.
pub fn is_verified<S: RecordLookup + ?Sized>(store: &S, identity: &Identity) -> bool {
    store.get(identity).map(|record| record.verified).unwrap_or(false)
}

/// Every check the gateway runs before the pairing check.
///
/// Stateless, so the proof server uses it to tell a caller why a submission
/// would fail before anything is sent to the ledger.
pub fn preflight(
    key: &VerificationKey,
    layout: &PublicInputLayout,
    identity: &Identity,
    arguments: &VerifierArguments,
    public_inputs: &[FieldElement],
) -> Result<(), VerificationError> {
    check_arguments(arguments)?;
    check_public_inputs(public_inputs, key.n_public())?;

    let bound_to = layout
        .identity_of(public_inputs)
        .copied()
        .ok_or(MalformedProof::ArityMismatch {
            expected: layout.required_arity(),
            actual: public_inputs.len(),
        })?;
    if bound_to != identity.to_field_element() {
        return Err(VerificationError::IdentityMismatch {
            identity: identity.clone(),
            bound_to,
        });
    }

    layout.check_statement(public_inputs)?;
    Ok(())
}
