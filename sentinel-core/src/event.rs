//! NEP-297 event emitted on every fresh verification.

use serde::{Deserialize, Serialize};

use crate::store::VerificationRecord;

pub const EVENT_STANDARD: &str = "zk-sentinel";
pub const EVENT_VERSION: &str = "1.0.0";
pub const CREDIT_SCORE_VERIFIED: &str = "credit_score_verified";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationEvent {
    pub identity: String,
    pub verified_at: Option<u64>,
    pub block_height: Option<u64>,
}

#[derive(Serialize)]
struct EventEnvelope<'a> {
    standard: &'static str,
    version: &'static str,
    event: &'static str,
    data: [&'a VerificationEvent; 1],
}

impl VerificationEvent {
    pub fn from_record(record: &VerificationRecord) -> Self {
        Self {
            identity: record.identity.to_string(),
            verified_at: record.verified_at,
            block_height: record.block_height,
        }
    }

    /// `EVENT_JSON:{...}` line as indexers expect it.
    pub fn to_log_line(&self) -> String {
        let envelope = EventEnvelope {
            standard: EVENT_STANDARD,
            version: EVENT_VERSION,
            event: CREDIT_SCORE_VERIFIED,
            data: [self],
        };
        // Plain strings and integers only, serialization cannot fail
        let json = serde_json::to_string(&envelope).unwrap_or_default();
        format!("EVENT_JSON:{}", json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;
    use crate::store::BlockTime;

    #[test]
    fn test_log_line_is_nep297() {
        let record = VerificationRecord::verified(
            Identity::new("alice.near"),
            BlockTime::at(1_700_000_000_000_000_000).with_height(42),
        );
        let line = VerificationEvent::from_record(&record).to_log_line();

        let json: serde_json::Value =
            serde_json::from_str(line.strip_prefix("EVENT_JSON:").unwrap()).unwrap();
        assert_eq!(json["standard"], "zk-sentinel");
        assert_eq!(json["version"], "1.0.0");
        assert_eq!(json["event"], "credit_score_verified");
        assert_eq!(json["data"][0]["identity"], "alice.near");
        assert_eq!(json["data"][0]["block_height"], 42);
    }
}
