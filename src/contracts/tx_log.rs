//! Transaction log - append-only record of every processed inscription.

use serde::{Deserialize, Serialize};

use crate::types::{ContractId, Event};

/// Result of one inscription
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// Committed
    Success {
        /// Events collected during execution
        events: Vec<Event>,
    },
    /// Rolled back
    Error {
        /// Error message
        message: String,
    },
}

/// Immutable record of one processed inscription
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionLogEntry {
    /// External actor that submitted the inscription
    pub origin: String,
    /// Block the inscription executed at
    pub block_number: u64,
    /// Submission timestamp (ms)
    pub timestamp: i64,
    /// Transaction hash
    pub transaction_hash: String,
    /// Target contract of a single-call inscription
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract: Option<ContractId>,
    /// Called operation of a single-call inscription
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Serialized inscription as received
    pub inscription: String,
    /// Status and payload
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl TransactionLogEntry {
    /// Check if the inscription committed
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success { .. })
    }

    /// Events of a committed inscription (empty on error)
    #[must_use]
    pub fn events(&self) -> &[Event] {
        match &self.outcome {
            Outcome::Success { events } => events,
            Outcome::Error { .. } => &[],
        }
    }

    /// Error message of a rolled-back inscription
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Success { .. } => None,
            Outcome::Error { message } => Some(message),
        }
    }
}

/// Append-only, order-preserving log
#[derive(Clone, Debug, Default)]
pub struct TransactionLog {
    entries: Vec<TransactionLogEntry>,
}

impl TransactionLog {
    /// Create an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, returning the stored record
    pub fn append(&mut self, entry: TransactionLogEntry) -> &TransactionLogEntry {
        let index = self.entries.len();
        self.entries.push(entry);
        &self.entries[index]
    }

    /// Copy of every entry in commit order
    #[must_use]
    pub fn read_all(&self) -> Vec<TransactionLogEntry> {
        self.entries.clone()
    }

    /// Most recent entry
    #[must_use]
    pub fn last(&self) -> Option<&TransactionLogEntry> {
        self.entries.last()
    }

    /// Entry at position `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&TransactionLogEntry> {
        self.entries.get(index)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(hash: &str, outcome: Outcome) -> TransactionLogEntry {
        TransactionLogEntry {
            origin: "walletA".into(),
            block_number: 1,
            timestamp: 0,
            transaction_hash: hash.into(),
            contract: Some("bitcoin".into()),
            method: Some("mint".into()),
            inscription: "{}".into(),
            outcome,
        }
    }

    #[test]
    fn test_append_preserves_order() {
        let mut log = TransactionLog::new();
        log.append(entry("a", Outcome::Success { events: vec![] }));
        log.append(entry(
            "b",
            Outcome::Error {
                message: "boom".into(),
            },
        ));

        assert_eq!(log.len(), 2);
        assert_eq!(log.get(0).unwrap().transaction_hash, "a");
        assert_eq!(log.last().unwrap().error_message(), Some("boom"));
    }

    #[test]
    fn test_read_all_is_a_copy() {
        let mut log = TransactionLog::new();
        log.append(entry("a", Outcome::Success { events: vec![] }));

        let mut copy = log.read_all();
        copy.clear();
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_status_wire_shape() {
        let ok = serde_json::to_value(entry(
            "a",
            Outcome::Success {
                events: vec![Event::new("TRANSFER", "x")],
            },
        ))
        .unwrap();
        assert_eq!(ok["status"], "SUCCESS");
        assert_eq!(ok["events"][0]["type"], "TRANSFER");
        assert_eq!(ok["transactionHash"], "a");

        let err = serde_json::to_value(entry(
            "b",
            Outcome::Error {
                message: "no".into(),
            },
        ))
        .unwrap();
        assert_eq!(err["status"], "ERROR");
        assert_eq!(err["message"], "no");
    }
}
