//! Verification records and the stores that own them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::identity::Identity;

/// Ledger time at which a submission executes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlockTime {
    /// Nanoseconds since the Unix epoch.
    pub timestamp_ns: u64,
    pub block_height: Option<u64>,
}

impl BlockTime {
    pub fn at(timestamp_ns: u64) -> Self {
        Self {
            timestamp_ns,
            block_height: None,
        }
    }

    pub fn with_height(mut self, height: u64) -> Self {
        self.block_height = Some(height);
        self
    }
}

#[derive(
    Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct VerificationRecord {
    pub identity: Identity,
    pub verified: bool,
    pub verified_at: Option<u64>,
    pub block_height: Option<u64>,
}

impl VerificationRecord {
    pub fn verified(identity: Identity, now: BlockTime) -> Self {
        Self {
            identity,
            verified: true,
            verified_at: Some(now.timestamp_ns),
            block_height: now.block_height,
        }
    }
}

/// Read access to verification records. Enough for status queries.
pub trait RecordLookup {
    fn get(&self, identity: &Identity) -> Option<VerificationRecord>;
}

/// Identity → record mapping owned by a gateway.
///
/// Records are never removed or overwritten. `insert_if_absent` is the only
/// write and must be atomic: when a record already exists it is returned
/// untouched as the error value.
pub trait RecordStore: RecordLookup {
    fn insert_if_absent(&mut self, record: VerificationRecord) -> Result<(), VerificationRecord>;
}

impl<S: RecordLookup + ?Sized> RecordLookup for &S {
    fn get(&self, identity: &Identity) -> Option<VerificationRecord> {
        (**self).get(identity)
    }
}

impl<S: RecordLookup + ?Sized> RecordLookup for &mut S {
    fn get(&self, identity: &Identity) -> Option<VerificationRecord> {
        (**self).get(identity)
    }
}

impl<S: RecordStore + ?Sized> RecordStore for &mut S {
    fn insert_if_absent(&mut self, record: VerificationRecord) -> Result<(), VerificationRecord> {
        (**self).insert_if_absent(record)
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryRecordStore {
    records: HashMap<Identity, VerificationRecord>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordLookup for MemoryRecordStore {
    fn get(&self, identity: &Identity) -> Option<VerificationRecord> {
        self.records.get(identity).cloned()
    }
}

impl RecordStore for MemoryRecordStore {
    fn insert_if_absent(&mut self, record: VerificationRecord) -> Result<(), VerificationRecord> {
        match self.records.get(&record.identity) {
            Some(existing) => Err(existing.clone()),
            None => {
                self.records.insert(record.identity.clone(), record);
                Ok(())
            }
        }
    }
}

/// A [`MemoryRecordStore`] shared between threads.
///
/// Each handle locks only for the duration of a single read or insert, so
/// gateways on different threads run their pairing checks in parallel and
/// race only on the final insert.
#[derive(Clone, Debug, Default)]
pub struct SharedRecordStore {
    inner: Arc<Mutex<MemoryRecordStore>>,
}

impl SharedRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryRecordStore> {
        // A panic elsewhere cannot leave a half-written HashMap entry behind
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RecordLookup for SharedRecordStore {
    fn get(&self, identity: &Identity) -> Option<VerificationRecord> {
        self.lock().get(identity)
    }
}

impl RecordStore for SharedRecordStore {
    fn insert_if_absent(&mut self, record: VerificationRecord) -> Result<(), VerificationRecord> {
        self.lock().insert_if_absent(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_if_absent_keeps_first_record() {
        let mut store = MemoryRecordStore::new();
        let alice = Identity::new("alice.near");

        let first = VerificationRecord::verified(alice.clone(), BlockTime::at(100).with_height(7));
        let second = VerificationRecord::verified(alice.clone(), BlockTime::at(200));

        assert!(store.insert_if_absent(first.clone()).is_ok());
        assert_eq!(store.insert_if_absent(second), Err(first.clone()));
        assert_eq!(store.get(&alice), Some(first));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_missing_identity_has_no_record() {
        let store = MemoryRecordStore::new();
        assert!(store.get(&Identity::new("nobody.near")).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_shared_handles_see_the_same_records() {
        let mut a = SharedRecordStore::new();
        let b = a.clone();
        let bob = Identity::new("bob.near");

        a.insert_if_absent(VerificationRecord::verified(bob.clone(), BlockTime::at(1)))
            .unwrap();
        assert_eq!(b.get(&bob).map(|r| r.verified_at), Some(Some(1)));
        assert_eq!(b.len(), 1);
    }
}
