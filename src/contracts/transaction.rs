//! Inscription types.
//!
//! Inscriptions are the external unit of work. On the wire they are JSON:
//!
//! ```json
//! { "p": "lam", "op": "call", "contract": "bitcoin", "function": "mint", "args": ["walletA", "100"] }
//! { "p": "lam", "op": "multi", "calls": [ { "contract": "...", "function": "...", "args": [] } ] }
//! ```

use serde::{Deserialize, Serialize};

use crate::types::{ContractId, Value};

/// Wire format errors
#[derive(Debug, thiserror::Error)]
pub enum InscriptionError {
    /// Not a valid inscription document
    #[error("invalid inscription: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Batch without calls
    #[error("invalid inscription: multi inscription has no calls")]
    EmptyBatch,
}

/// Protocol tag carried in `p`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Protocol {
    /// The only supported protocol
    #[default]
    #[serde(rename = "lam")]
    Lam,
}

/// One contract execution
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCall {
    /// Target contract
    pub contract: ContractId,
    /// Operation name
    pub function: String,
    /// Positional arguments
    pub args: Vec<Value>,
}

impl ContractCall {
    /// Create a call
    #[must_use]
    pub fn new(contract: impl Into<ContractId>, function: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            contract: contract.into(),
            function: function.into(),
            args,
        }
    }
}

/// What an inscription asks the engine to do
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Operation {
    /// Execute a single contract call
    Call(ContractCall),
    /// Execute several calls as one atomic batch
    Multi {
        /// Calls, executed in order
        calls: Vec<ContractCall>,
    },
}

/// A complete inscription
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inscription {
    /// Protocol tag
    pub p: Protocol,
    /// Requested operation
    #[serde(flatten)]
    pub op: Operation,
}

impl Inscription {
    /// Inscription executing one call
    #[must_use]
    pub fn call(contract: impl Into<ContractId>, function: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            p: Protocol::Lam,
            op: Operation::Call(ContractCall::new(contract, function, args)),
        }
    }

    /// Inscription executing a batch
    #[must_use]
    pub fn multi(calls: Vec<ContractCall>) -> Self {
        Self {
            p: Protocol::Lam,
            op: Operation::Multi { calls },
        }
    }

    /// Parse the JSON wire format
    ///
    /// # Errors
    /// Returns error on malformed JSON, wrong protocol, unknown op, or an empty batch
    pub fn from_json(raw: &str) -> Result<Self, InscriptionError> {
        let inscription: Self = serde_json::from_str(raw)?;
        if inscription.calls().is_empty() {
            return Err(InscriptionError::EmptyBatch);
        }
        Ok(inscription)
    }

    /// Serialize to the JSON wire format
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Calls this inscription executes, in order
    #[must_use]
    pub fn calls(&self) -> &[ContractCall] {
        match &self.op {
            Operation::Call(call) => std::slice::from_ref(call),
            Operation::Multi { calls } => calls,
        }
    }

    /// Target contract and method, for single-call inscriptions
    #[must_use]
    pub fn single(&self) -> Option<&ContractCall> {
        match &self.op {
            Operation::Call(call) => Some(call),
            Operation::Multi { .. } => None,
        }
    }
}
