use crate::identifier::IdentifierRejection;
use crate::lookup::LookupOutcome;
use metrics::{counter, Counter};

const MESSAGES: &str = "bot.messages";
const ACCEPTED: &str = "identifier.accepted";
const REJECTED: &str = "identifier.rejected";
const LOOKUP: &str = "lookup.outcome";

const REASON: &str = "reason";
const OUTCOME: &str = "outcome";

pub struct Metrics {
    pub messages: Counter,
    pub identifiers_accepted: Counter,
    rejected_wrong_length: Counter,
    rejected_checksum_mismatch: Counter,
    lookups_found: Counter,
    lookups_not_found: Counter,
    lookups_failed: Counter,
}

impl Metrics {
    pub fn new() -> Self {
        Metrics {
            messages: counter!(MESSAGES),
            identifiers_accepted: counter!(ACCEPTED),
            rejected_wrong_length: counter!(
                REJECTED,
                REASON => IdentifierRejection::WrongLength { found: 0 }.kind()
            ),
            rejected_checksum_mismatch: counter!(
                REJECTED,
                REASON => IdentifierRejection::ChecksumMismatch.kind()
            ),
            lookups_found: counter!(LOOKUP, OUTCOME => "found"),
            lookups_not_found: counter!(LOOKUP, OUTCOME => "not_found"),
            lookups_failed: counter!(LOOKUP, OUTCOME => "failed"),
        }
    }

    pub fn record_rejection(&self, rejection: &IdentifierRejection) {
        match rejection {
            IdentifierRejection::WrongLength { .. } => self.rejected_wrong_length.increment(1),
            IdentifierRejection::ChecksumMismatch => self.rejected_checksum_mismatch.increment(1),
        }
    }

    pub fn record_lookup(&self, outcome: &LookupOutcome) {
        match outcome {
            LookupOutcome::Found(_) => self.lookups_found.increment(1),
            LookupOutcome::NotFound => self.lookups_not_found.increment(1),
            LookupOutcome::LookupFailed(_) => self.lookups_failed.increment(1),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Metrics::new()
    }
}
