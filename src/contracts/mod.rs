//! Contract execution framework.
//!
//! This module provides the core infrastructure for executing inscriptions
//! against stateful contracts. Contracts are long-lived objects that:
//! - Expose a closed set of named public operations
//! - Mutate their own state in place while they are being called
//! - Reach other contracts (and create new ones) through an [`Ecosystem`]
//!
//! ## Architecture
//!
//! 1. **Contracts**: Implement the [`Contract`] trait to define logic
//! 2. **Registry**: Owns every live contract, keyed by [`ContractId`]
//! 3. **Dispatcher**: Filters operation names and shapes the call input
//! 4. **Ecosystem**: Cross-contract calls with sender/origin attribution
//! 5. **Engine**: Processes one inscription at a time, snapshot/commit/rollback
//!
//! ## Enforcement Mechanism
//!
//! The engine is the only recovery point. Any error raised at any depth of a
//! call tree unwinds to it; it restores the snapshot taken before the call and
//! appends exactly one entry to the transaction log either way.

pub mod context;
pub mod deployed;
pub mod dispatcher;
pub mod ecosystem;
pub mod handle;
pub mod loader;
pub mod processor;
pub mod query;
pub mod state;
pub mod transaction;
pub mod tx_log;

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;

use crate::types::{ContractId, Value};

pub use self::context::{CallContext, EventLogger};
pub use self::dispatcher::Dispatcher;
pub use self::ecosystem::Ecosystem;

/// Result type for contract operations
pub type ContractResult<T> = Result<T, ContractError>;

/// A stateful contract hosted by the runtime
///
/// Operations are dispatched by name through [`Contract::invoke`]. Only names
/// listed in [`Contract::operations`] are reachable from outside, and names
/// starting with `_` are never reachable regardless of that list.
pub trait Contract: ContractSnapshot + Send + Sync {
    /// Template this instance was built from
    fn template(&self) -> &'static str;

    /// Minimum block at which external callers may invoke the contract
    fn active_on(&self) -> u64;

    /// Public operation names
    fn operations(&self) -> &'static [&'static str];

    /// Execute an operation
    ///
    /// # Errors
    /// Returns error if the operation is unknown, its arguments do not parse,
    /// or its own logic rejects the call
    fn invoke(&mut self, operation: &str, ctx: CallContext<'_>) -> ContractResult<Value>;

    /// Serialized view of the contract state, for readers and snapshot comparison
    fn state(&self) -> Value;
}

/// Deep copy of a contract, used for snapshots and read-only queries
pub trait ContractSnapshot {
    /// Copy this contract into a new box
    fn snapshot(&self) -> Box<dyn Contract>;
}

impl<T> ContractSnapshot for T
where
    T: Contract + Clone + 'static,
{
    fn snapshot(&self) -> Box<dyn Contract> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn Contract> {
    fn clone(&self) -> Self {
        self.snapshot()
    }
}

/// Contract execution errors
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// Contract not found
    #[error("contract not found: {0}")]
    NotFound(ContractId),

    /// Operation is internal or does not exist
    #[error("operation '{operation}' not found or not callable on {contract}")]
    NotCallable {
        /// Target contract
        contract: ContractId,
        /// Requested operation
        operation: String,
    },

    /// Contract is not active at the current block
    #[error("contract {contract} is not active yet (active on block {active_on}, current block {block})")]
    Inactive {
        /// Target contract
        contract: ContractId,
        /// Activation block
        active_on: u64,
        /// Block of the current call
        block: u64,
    },

    /// Contract is already executing further up the call stack
    #[error("re-entrant call into {0}")]
    Reentrancy(ContractId),

    /// Rejected instance name
    #[error("deploy: {0}")]
    InvalidName(String),

    /// Instance name already bound
    #[error("redeploy: this contract name {0} is already taken!")]
    NameTaken(String),

    /// No template with this name
    #[error("unknown contract template: {0}")]
    UnknownTemplate(String),

    /// Registry id already bound
    #[error("contract already registered: {0}")]
    AlreadyRegistered(ContractId),

    /// Arguments do not match the operation's signature
    #[error("{0}: args parsing error")]
    InvalidArgs(String),

    /// Ecosystem access from a read-only query
    #[error("{0} is not available in read-only queries")]
    ReadOnly(&'static str),

    /// Domain error raised by contract logic
    #[error("execution failed: {0}")]
    Execution(String),
}

impl ContractError {
    /// Domain error with a human-readable reason
    #[must_use]
    pub fn execution(reason: impl Into<String>) -> Self {
        Self::Execution(reason.into())
    }

    /// Operation not reachable on `contract`
    #[must_use]
    pub fn not_callable(contract: ContractId, operation: &str) -> Self {
        Self::NotCallable {
            contract,
            operation: operation.to_string(),
        }
    }
}

/// Parse positional arguments into a typed tuple
///
/// Arity and element types must match exactly, e.g. `(String, Amount)` for
/// `["walletA", "100"]`.
///
/// # Errors
/// Returns `InvalidArgs` naming `function` if the arguments do not fit `T`
pub fn parse_args<T: DeserializeOwned>(args: &[Value], function: &str) -> ContractResult<T> {
    serde_json::from_value(Value::Array(args.to_vec()))
        .map_err(|_| ContractError::InvalidArgs(function.to_string()))
}

/// Registry of live contracts
///
/// A contract being executed is checked out of its slot for the duration of
/// the call, which is how the registry detects re-entrant calls.
///
/// Note: Cannot derive Clone or Debug because it contains trait objects
#[derive(Default)]
pub struct ContractRegistry {
    /// Contracts by ID; `None` while the contract is on the call stack
    contracts: BTreeMap<ContractId, Option<Box<dyn Contract>>>,
}

impl ContractRegistry {
    /// Create new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            contracts: BTreeMap::new(),
        }
    }

    /// Bind a contract to a fresh id
    ///
    /// # Errors
    /// Returns `AlreadyRegistered` if the id is bound; ids are never rebound
    pub fn register(&mut self, id: ContractId, contract: Box<dyn Contract>) -> ContractResult<()> {
        if self.contracts.contains_key(&id) {
            return Err(ContractError::AlreadyRegistered(id));
        }
        self.contracts.insert(id, Some(contract));
        Ok(())
    }

    /// Get contract by ID
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&dyn Contract> {
        self.contracts
            .get(id)
            .and_then(Option::as_ref)
            .map(AsRef::as_ref)
    }

    /// Get contract by ID, distinguishing missing from executing
    ///
    /// # Errors
    /// Returns `NotFound` or `Reentrancy`
    pub fn lookup(&self, id: &ContractId) -> ContractResult<&dyn Contract> {
        match self.contracts.get(id) {
            None => Err(ContractError::NotFound(id.clone())),
            Some(None) => Err(ContractError::Reentrancy(id.clone())),
            Some(Some(contract)) => Ok(contract.as_ref()),
        }
    }

    /// Check if contract exists
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.contracts.contains_key(id)
    }

    /// List all contract IDs in order
    #[must_use]
    pub fn list(&self) -> Vec<ContractId> {
        self.contracts.keys().cloned().collect()
    }

    /// Get number of registered contracts
    #[must_use]
    pub fn contract_count(&self) -> usize {
        self.contracts.len()
    }

    /// Take a contract out of its slot for execution
    pub(crate) fn check_out(&mut self, id: &ContractId) -> ContractResult<Box<dyn Contract>> {
        match self.contracts.get_mut(id) {
            None => Err(ContractError::NotFound(id.clone())),
            Some(slot) => slot.take().ok_or_else(|| ContractError::Reentrancy(id.clone())),
        }
    }

    /// Return a checked-out contract to its slot
    pub(crate) fn check_in(&mut self, id: ContractId, contract: Box<dyn Contract>) {
        self.contracts.insert(id, Some(contract));
    }

    /// Overwrite a slot with a snapshot
    pub(crate) fn restore(&mut self, id: ContractId, contract: Box<dyn Contract>) {
        self.contracts.insert(id, Some(contract));
    }

    /// Drop a contract created during an aborted call tree
    pub(crate) fn remove(&mut self, id: &ContractId) {
        self.contracts.remove(id);
    }
}
