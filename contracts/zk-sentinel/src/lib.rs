//! # ZK-Sentinel Contract for NEAR Protocol
//!
//! Records, per account, that the account holder proved a credit score above
//! a threshold without revealing the score.
//!
//! ## Flow
//! 1. The owner registers the circuit's Groth16 verification key (snarkjs
//!    `verification_key.json`) and, if it differs from the default, the
//!    public-input layout.
//! 2. A holder calls `verify_credit_score` with transcoded proof points and
//!    the public inputs. The proof must be bound to the caller's account.
//! 3. On success the account is marked verified, permanently. Later
//!    submissions for the same account succeed without re-running the
//!    pairing check.
//!
//! ## Verification
//! Structural, binding and statement checks come from `sentinel-core`. The
//! pairing check runs on NEAR's alt_bn128 host functions.
//!
//! Proofs are never stored; only the verified status is.

use std::borrow::Borrow;
use std::fmt;

use near_sdk::borsh::{BorshDeserialize, BorshSerialize};
use near_sdk::collections::LookupMap;
use near_sdk::json_types::U64;
use near_sdk::serde::{Deserialize, Serialize};
use near_sdk::{env, log, near_bindgen, AccountId, BorshStorageKey, NearSchema, PanicOnDefault};

use sentinel_core::{
    BlockTime, FieldElement, Identity, MalformedProof, PairingVerifier, PublicInputLayout,
    RecordLookup, RecordStore, SnarkjsVerificationKey, VerificationError, VerificationGateway,
    VerificationKey, VerificationOutcome, VerificationRecord, VerifierArguments,
};

mod groth16;

use groth16::AltBn128Verifier;

#[derive(BorshStorageKey, BorshSerialize)]
#[borsh(crate = "near_sdk::borsh")]
pub enum StorageKey {
    VerificationRecords,
}

// ==================== JSON TYPES ====================

/// Transcoded proof points as decimal (or `0x` hex) strings, G2 in verifier
/// order `[[x.c1, x.c0], [y.c1, y.c0]]`.
#[derive(Serialize, Deserialize, Clone, Debug, NearSchema)]
#[serde(crate = "near_sdk::serde")]
pub struct ProofArguments {
    pub a: [String; 2],
    pub b: [[String; 2]; 2],
    pub c: [String; 2],
}

impl ProofArguments {
    fn to_arguments(&self) -> Result<VerifierArguments, MalformedProof> {
        let pair = |raw: &[String; 2]| -> Result<[FieldElement; 2], MalformedProof> {
            Ok([raw[0].parse()?, raw[1].parse()?])
        };
        Ok(VerifierArguments {
            a: pair(&self.a)?,
            b: [pair(&self.b[0])?, pair(&self.b[1])?],
            c: pair(&self.c)?,
        })
    }
}

/// snarkjs `verification_key.json`, as exported.
#[derive(Serialize, Deserialize, Clone, Debug, NearSchema)]
#[serde(crate = "near_sdk::serde")]
pub struct VerificationKeyJson {
    pub protocol: String,
    pub curve: String,
    #[serde(rename = "nPublic")]
    pub n_public: u32,
    pub vk_alpha_1: Vec<String>,
    pub vk_beta_2: Vec<Vec<String>>,
    pub vk_gamma_2: Vec<Vec<String>>,
    pub vk_delta_2: Vec<Vec<String>>,
    #[serde(rename = "IC")]
    pub ic: Vec<Vec<String>>,
}

impl From<VerificationKeyJson> for SnarkjsVerificationKey {
    fn from(vk: VerificationKeyJson) -> Self {
        SnarkjsVerificationKey {
            protocol: vk.protocol,
            curve: vk.curve,
            n_public: vk.n_public as usize,
            vk_alpha_1: vk.vk_alpha_1,
            vk_beta_2: vk.vk_beta_2,
            vk_gamma_2: vk.vk_gamma_2,
            vk_delta_2: vk.vk_delta_2,
            ic: vk.ic,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, NearSchema)]
#[serde(crate = "near_sdk::serde")]
pub struct PublicInputLayoutJson {
    pub predicate_index: u32,
    pub threshold_index: Option<u32>,
    pub identity_index: u32,
    pub min_threshold: Option<u64>,
}

impl From<PublicInputLayoutJson> for PublicInputLayout {
    fn from(layout: PublicInputLayoutJson) -> Self {
        PublicInputLayout {
            predicate_index: layout.predicate_index,
            threshold_index: layout.threshold_index,
            identity_index: layout.identity_index,
            min_threshold: layout.min_threshold,
        }
    }
}

impl From<&PublicInputLayout> for PublicInputLayoutJson {
    fn from(layout: &PublicInputLayout) -> Self {
        PublicInputLayoutJson {
            predicate_index: layout.predicate_index,
            threshold_index: layout.threshold_index,
            identity_index: layout.identity_index,
            min_threshold: layout.min_threshold,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, NearSchema)]
#[serde(crate = "near_sdk::serde")]
pub enum VerificationStatus {
    /// This call created the record
    Verified,
    /// The account was already verified; nothing changed
    AlreadyVerified,
}

#[derive(Serialize, Deserialize, Clone, Debug, NearSchema)]
#[serde(crate = "near_sdk::serde")]
pub struct VerificationReceipt {
    pub account_id: AccountId,
    pub status: VerificationStatus,
    pub verified_at: Option<U64>,
    pub block_height: Option<U64>,
}

#[derive(Serialize, Deserialize, Clone, Debug, NearSchema)]
#[serde(crate = "near_sdk::serde")]
pub struct VerificationRecordView {
    pub account_id: AccountId,
    pub verified: bool,
    pub verified_at: Option<U64>,
    pub block_height: Option<U64>,
}

#[derive(Serialize, Deserialize, Clone, Debug, NearSchema)]
#[serde(crate = "near_sdk::serde")]
pub struct VerificationKeyInfo {
    pub n_public: u32,
    /// SHA-256 of the stored key, hex
    pub key_hash: String,
}

/// Why a submission failed before or during verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    KeyNotRegistered,
    Rejected(VerificationError),
}

impl fmt::Display for SubmissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionError::KeyNotRegistered => write!(f, "No verification key registered"),
            SubmissionError::Rejected(err) => write!(f, "Verification failed: {}", err),
        }
    }
}

impl From<VerificationError> for SubmissionError {
    fn from(err: VerificationError) -> Self {
        SubmissionError::Rejected(err)
    }
}

impl From<MalformedProof> for SubmissionError {
    fn from(err: MalformedProof) -> Self {
        SubmissionError::Rejected(err.into())
    }
}

// ==================== STORAGE ====================

type Records = LookupMap<Identity, VerificationRecord>;

/// Contract storage seen through the gateway's store interface. Views wrap a
/// shared borrow, submissions a mutable one.
struct LedgerRecords<M>(M);

impl<M: Borrow<Records>> RecordLookup for LedgerRecords<M> {
    fn get(&self, identity: &Identity) -> Option<VerificationRecord> {
        self.0.borrow().get(identity)
    }
}

impl RecordStore for LedgerRecords<&mut Records> {
    fn insert_if_absent(&mut self, record: VerificationRecord) -> Result<(), VerificationRecord> {
        if let Some(existing) = self.0.get(&record.identity) {
            return Err(existing);
        }
        self.0.insert(&record.identity, &record);
        Ok(())
    }
}

// ==================== CONTRACT ====================

#[near_bindgen]
#[derive(BorshDeserialize, BorshSerialize, PanicOnDefault)]
#[borsh(crate = "near_sdk::borsh")]
pub struct ZkSentinel {
    owner: AccountId,
    verification_key: Option<VerificationKey>,
    layout: PublicInputLayout,
    records: Records,
    total_verified: u64,
}

#[near_bindgen]
impl ZkSentinel {
    #[init]
    pub fn new(owner: AccountId, layout: Option<PublicInputLayoutJson>) -> Self {
        let layout = layout.map(checked_layout).unwrap_or_default();
        log!("ZK-Sentinel initialized, public input layout {}", layout);
        Self {
            owner,
            verification_key: None,
            layout,
            records: LookupMap::new(StorageKey::VerificationRecords),
            total_verified: 0,
        }
    }

    // ==================== ADMIN OPERATIONS ====================

    /// Register the circuit's verification key (owner only)
    pub fn register_verification_key(&mut self, vk: VerificationKeyJson) {
        self.assert_owner();

        let key = VerificationKey::from_snarkjs(&vk.into())
            .unwrap_or_else(|e| env::panic_str(&format!("Invalid verification key: {}", e)));
        if let Err(e) = self.layout.validate_for(key.n_public()) {
            env::panic_str(&format!("Verification key does not fit the layout: {}", e));
        }

        log!(
            "Registered verification key with {} public inputs, hash {}",
            key.n_public(),
            key.key_hash()
        );
        self.verification_key = Some(key);
    }

    /// Change where the statement values sit in the public inputs (owner only)
    pub fn set_public_input_layout(&mut self, layout: PublicInputLayoutJson) {
        self.assert_owner();

        let layout = checked_layout(layout);
        if let Some(key) = &self.verification_key {
            if let Err(e) = layout.validate_for(key.n_public()) {
                env::panic_str(&format!("Layout does not fit the verification key: {}", e));
            }
        }
        log!("Public input layout set to {}", layout);
        self.layout = layout;
    }

    pub fn transfer_ownership(&mut self, new_owner: AccountId) {
        self.assert_owner();
        self.owner = new_owner.clone();
        log!("Ownership transferred to {}", new_owner);
    }

    // ==================== VERIFICATION ====================

    /// Verify a credit-score proof for the calling account.
    ///
    /// Panics with the rejection reason if the proof is malformed, bound to
    /// another account, proves an unacceptable statement, or fails the
    /// pairing check.
    pub fn verify_credit_score(
        &mut self,
        proof: ProofArguments,
        public_inputs: Vec<String>,
    ) -> VerificationReceipt {
        let account_id = env::predecessor_account_id();
        match self.submit(&account_id, &proof, &public_inputs, AltBn128Verifier) {
            Ok(outcome) => receipt(account_id, &outcome),
            Err(e) => env::panic_str(&e.to_string()),
        }
    }

    // ==================== VIEW METHODS ====================

    pub fn is_verified(&self, account_id: AccountId) -> bool {
        sentinel_core::is_verified(
            &LedgerRecords(&self.records),
            &Identity::new(account_id.as_str()),
        )
    }

    pub fn get_verification_record(&self, account_id: AccountId) -> Option<VerificationRecordView> {
        self.records
            .get(&Identity::new(account_id.as_str()))
            .map(|record| VerificationRecordView {
                account_id,
                verified: record.verified,
                verified_at: record.verified_at.map(U64),
                block_height: record.block_height.map(U64),
            })
    }

    pub fn get_verification_key_info(&self) -> Option<VerificationKeyInfo> {
        self.verification_key.as_ref().map(|key| VerificationKeyInfo {
            n_public: key.n_public() as u32,
            key_hash: key.key_hash(),
        })
    }

    pub fn get_public_input_layout(&self) -> PublicInputLayoutJson {
        PublicInputLayoutJson::from(&self.layout)
    }

    pub fn get_owner(&self) -> AccountId {
        self.owner.clone()
    }

    /// Number of accounts verified so far.
    pub fn get_total_verified(&self) -> u64 {
        self.total_verified
    }
}

/// Layouts arrive as plain JSON, so shared positions are caught here.
fn checked_layout(layout: PublicInputLayoutJson) -> PublicInputLayout {
    let layout = PublicInputLayout::from(layout);
    if let Err(e) = layout.validate_for(layout.required_arity()) {
        env::panic_str(&format!("Invalid public input layout: {}", e));
    }
    layout
}

impl ZkSentinel {
    fn assert_owner(&self) {
        assert_eq!(
            env::predecessor_account_id(),
            self.owner,
            "Only owner can call this"
        );
    }

    fn submit<V: PairingVerifier>(
        &mut self,
        account_id: &AccountId,
        proof: &ProofArguments,
        public_inputs: &[String],
        verifier: V,
    ) -> Result<VerificationOutcome, SubmissionError> {
        let identity = Identity::new(account_id.as_str());

        // Already verified accounts succeed before anything is parsed
        if let Some(record) = self.records.get(&identity).filter(|r| r.verified) {
            log!("{} is already verified", account_id);
            return Ok(VerificationOutcome::AlreadyVerified(record));
        }

        let key = self
            .verification_key
            .as_ref()
            .ok_or(SubmissionError::KeyNotRegistered)?;
        let arguments = proof.to_arguments()?;
        let inputs = public_inputs
            .iter()
            .map(|s| s.parse::<FieldElement>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(MalformedProof::from)?;

        let now = BlockTime::at(env::block_timestamp()).with_height(env::block_height());
        let store = LedgerRecords(&mut self.records);
        let outcome = VerificationGateway::new(store, verifier, key, &self.layout)
            .verify_credit_score(&identity, &arguments, &inputs, now)?;

        if let Some(event) = outcome.event() {
            self.total_verified += 1;
            log!("{}", event.to_log_line());
            log!("Credit score verified for {}", account_id);
        }
        Ok(outcome)
    }
}

fn receipt(account_id: AccountId, outcome: &VerificationOutcome) -> VerificationReceipt {
    let record = outcome.record();
    VerificationReceipt {
        account_id,
        status: if outcome.is_fresh() {
            VerificationStatus::Verified
        } else {
            VerificationStatus::AlreadyVerified
        },
        verified_at: record.verified_at.map(U64),
        block_height: record.block_height.map(U64),
    }
}
