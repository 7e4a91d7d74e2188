//! Call metadata.
//!
//! Every call frame sees an immutable [`Metadata`]. The top-level frame is
//! built from the submission [`Envelope`]; each nested frame is derived from
//! its parent by swapping `sender` and `current_contract`, so `origin`,
//! `block_number`, `timestamp` and `transaction_hash` stay fixed across the
//! whole call tree.

use serde::{Deserialize, Serialize};

use super::ContractId;

/// Immutable call context of one frame
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// External actor that triggered the call chain
    pub origin: String,
    /// Immediate caller (external actor or contract id)
    pub sender: String,
    /// Contract being executed in this frame
    pub current_contract: ContractId,
    /// Block height the inscription executes at
    pub block_number: u64,
    /// Timestamp supplied with the inscription (ms)
    pub timestamp: i64,
    /// Hash identifying the inscription
    pub transaction_hash: String,
}

impl Metadata {
    /// Metadata of the top-level frame for an externally submitted inscription
    #[must_use]
    pub fn top_level(envelope: &Envelope, target: ContractId, transaction_hash: String) -> Self {
        Self {
            origin: envelope.sender.clone(),
            sender: envelope.sender.clone(),
            current_contract: target,
            block_number: envelope.block_number,
            timestamp: envelope.timestamp,
            transaction_hash,
        }
    }

    /// Metadata of a frame in which `caller` invokes `callee`
    #[must_use]
    pub fn nested(&self, caller: &ContractId, callee: ContractId) -> Self {
        Self {
            sender: caller.to_string(),
            current_contract: callee,
            ..self.clone()
        }
    }

    /// Metadata used for read-only queries
    #[must_use]
    pub fn query(target: ContractId) -> Self {
        Self {
            origin: "query".to_string(),
            sender: "query".to_string(),
            current_contract: target,
            block_number: 0,
            timestamp: 0,
            transaction_hash: String::new(),
        }
    }
}

/// Out-of-band data submitted alongside an inscription
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// External actor submitting the inscription
    pub sender: String,
    /// Block height to execute at
    pub block_number: u64,
    /// Timestamp (ms); the only clock contracts may observe
    #[serde(default)]
    pub timestamp: i64,
    /// Explicit transaction hash; derived deterministically when absent
    #[serde(default)]
    pub transaction_hash: Option<String>,
}

impl Envelope {
    /// Create an envelope with a zero timestamp and a derived hash
    #[must_use]
    pub fn new(sender: impl Into<String>, block_number: u64) -> Self {
        Self {
            sender: sender.into(),
            block_number,
            timestamp: 0,
            transaction_hash: None,
        }
    }

    /// Set the timestamp
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Set an explicit transaction hash
    #[must_use]
    pub fn with_transaction_hash(mut self, hash: impl Into<String>) -> Self {
        self.transaction_hash = Some(hash.into());
        self
    }
}
