//! Append-only log of per-record load outcomes.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;

/// Result of one attempted row load, keyed by the sale's central ticket
/// number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    pub nrocentral: i64,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncOutcome {
    pub fn success(nrocentral: i64) -> Self {
        Self {
            nrocentral,
            status: OutcomeStatus::Success,
            error: None,
        }
    }

    pub fn error(nrocentral: i64, detail: impl Into<String>) -> Self {
        Self {
            nrocentral,
            status: OutcomeStatus::Error,
            error: Some(detail.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Error,
}

/// Process-wide outcome log shared between the sync loop and the
/// reporting endpoints.
///
/// Appends preserve insertion order, and a snapshot is a point-in-time
/// copy: a reader never observes a partially-appended entry. Without a
/// capacity bound the ledger grows for the life of the process; with one,
/// the oldest entries are evicted once the bound is reached.
#[derive(Debug)]
pub struct ResultLedger {
    entries: Mutex<VecDeque<SyncOutcome>>,
    capacity: Option<usize>,
}

impl ResultLedger {
    pub fn unbounded() -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity: None,
        }
    }

    /// Ledger retaining at most `capacity` entries (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity: Some(capacity.max(1)),
        }
    }

    pub fn append(&self, outcome: SyncOutcome) {
        let mut entries = self.entries.lock();
        if let Some(capacity) = self.capacity {
            while entries.len() >= capacity {
                entries.pop_front();
            }
        }
        entries.push_back(outcome);
    }

    /// Point-in-time copy of all retained outcomes, oldest first.
    pub fn snapshot(&self) -> Vec<SyncOutcome> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_preserves_insertion_order() {
        let ledger = ResultLedger::unbounded();
        ledger.append(SyncOutcome::success(1));
        ledger.append(SyncOutcome::error(2, "duplicate key"));
        ledger.append(SyncOutcome::success(3));

        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[0], SyncOutcome::success(1));
        assert_eq!(snapshot[1], SyncOutcome::error(2, "duplicate key"));
        assert_eq!(snapshot[2], SyncOutcome::success(3));
    }

    #[test]
    fn bounded_ledger_evicts_oldest() {
        let ledger = ResultLedger::with_capacity(2);
        for n in 1..=4 {
            ledger.append(SyncOutcome::success(n));
        }

        let keys: Vec<i64> = ledger.snapshot().iter().map(|o| o.nrocentral).collect();
        assert_eq!(keys, vec![3, 4]);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let ledger = ResultLedger::with_capacity(0);
        ledger.append(SyncOutcome::success(1));
        ledger.append(SyncOutcome::success(2));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn success_outcome_serializes_without_error_field() {
        let json = serde_json::to_value(SyncOutcome::success(42)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"nrocentral": 42, "status": "success"})
        );
    }

    #[test]
    fn error_outcome_carries_detail() {
        let json = serde_json::to_value(SyncOutcome::error(7, "connection reset")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"nrocentral": 7, "status": "error", "error": "connection reset"})
        );
    }
}
