//! Inscription processor - executes contracts and applies state transitions.
//!
//! This is the **enforcement mechanism** of the runtime. It takes one
//! inscription at a time, executes the targeted operation, and either keeps
//! the resulting state or restores the pre-call snapshot. Every call to
//! [`Engine::process`] appends exactly one entry to the transaction log.

use std::cell::RefCell;

use tracing::{debug, error, info, warn};

use super::deployed::DeployedContracts;
use super::ecosystem::ensure_active;
use super::loader::{ContractLoader, NativeLoader};
use super::query;
use super::state::{ExecutionPolicy, World};
use super::transaction::{ContractCall, Inscription};
use super::tx_log::{Outcome, TransactionLog, TransactionLogEntry};
use super::{Contract, ContractError, ContractRegistry, ContractResult, Dispatcher};
use crate::genesis::config::{ConfigError, EngineConfig};
use crate::types::{ContractId, Envelope, Event, Metadata, Value, DEPLOY_PREFIX};

/// Single-writer execution engine
///
/// Owns the only registry of the runtime. Inscriptions are processed strictly
/// one after another; nested cross-contract calls run depth-first to
/// completion before control returns to their caller.
pub struct Engine {
    /// Contracts, deployment mapping, journal
    world: World,
    /// Outcome of every processed inscription
    log: TransactionLog,
}

impl Engine {
    /// Create an engine with an empty registry
    #[must_use]
    pub fn new(loader: Box<dyn ContractLoader>, policy: ExecutionPolicy) -> Self {
        Self {
            world: World::new(loader, policy),
            log: TransactionLog::new(),
        }
    }

    /// Create an engine and register the configured genesis contracts
    ///
    /// # Errors
    /// Returns error if a genesis template is unknown or a name is repeated
    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        let mut engine = Self::new(Box::new(NativeLoader), config.policy());
        for entry in &config.genesis {
            engine
                .register_template(&entry.name, &entry.template)
                .map_err(|source| ConfigError::Genesis {
                    name: entry.name.clone(),
                    source,
                })?;
        }
        info!(
            contracts = engine.world.registry.contract_count(),
            atomicity = ?config.atomicity,
            nested_events = ?config.nested_events,
            "Engine initialized"
        );
        Ok(engine)
    }

    /// Register a genesis contract under a plain name
    ///
    /// # Errors
    /// Returns `InvalidName` if the name carries the redeployed-instance
    /// prefix, `AlreadyRegistered` if the name is bound
    pub fn register(
        &mut self,
        id: impl Into<ContractId>,
        contract: Box<dyn Contract>,
    ) -> ContractResult<()> {
        let id = id.into();
        if id.is_deployed_instance() {
            return Err(ContractError::InvalidName(format!(
                "genesis contract {id} cannot use the {DEPLOY_PREFIX} prefix"
            )));
        }
        debug!(contract = %id, template = contract.template(), "Registering genesis contract");
        self.world.registry.register(id, contract)
    }

    /// Instantiate `template` from the loader and register it as `name`
    ///
    /// # Errors
    /// Returns `UnknownTemplate` or `AlreadyRegistered`
    pub fn register_template(&mut self, name: &str, template: &str) -> ContractResult<()> {
        let contract = self.world.loader.instantiate(template)?;
        self.register(name, contract)
    }

    /// Runtime behaviour switches
    #[must_use]
    pub fn policy(&self) -> ExecutionPolicy {
        self.world.policy
    }

    /// Read access to the registry
    #[must_use]
    pub fn registry(&self) -> &ContractRegistry {
        &self.world.registry
    }

    /// Read access to the redeployed-instance mapping
    #[must_use]
    pub fn deployed(&self) -> &DeployedContracts {
        &self.world.deployed
    }

    /// Read access to the transaction log
    #[must_use]
    pub fn transaction_log(&self) -> &TransactionLog {
        &self.log
    }

    /// Run a public operation read-only against a copy of `contract`
    ///
    /// # Errors
    /// Returns error if the contract or operation is unknown, or the operation fails
    pub fn query(&self, contract: &str, function: &str, args: &[Value]) -> ContractResult<Value> {
        query::execute(&self.world.registry, contract, function, args)
    }

    /// Serialized state of a contract
    #[must_use]
    pub fn state_of(&self, contract: &str) -> Option<Value> {
        query::state_view(&self.world.registry, contract)
    }

    /// Process one inscription to completion
    ///
    /// 1. Resolves each call's target and checks it is active
    /// 2. Snapshots the target
    /// 3. Invokes the operation with top-level metadata and an event collector
    /// 4. On success: keeps the mutated state, logs SUCCESS with the events
    /// 5. On failure: restores the snapshot, logs ERROR with the message
    pub fn process(&mut self, inscription: &Inscription, envelope: &Envelope) -> &TransactionLogEntry {
        let raw = inscription.to_json();
        let tx_hash = self.transaction_hash(&raw, envelope);
        let events = RefCell::new(Vec::new());

        let outcome = match self.execute_calls(inscription.calls(), envelope, &tx_hash, &events) {
            Ok(()) => {
                self.world.commit();
                let events = events.into_inner();
                info!(
                    tx_hash = %tx_hash,
                    origin = %envelope.sender,
                    block = envelope.block_number,
                    events = events.len(),
                    "Inscription committed"
                );
                Outcome::Success { events }
            }
            Err(e) => {
                self.world.rollback();
                error!(
                    tx_hash = %tx_hash,
                    origin = %envelope.sender,
                    block = envelope.block_number,
                    error = %e,
                    "Inscription failed, state rolled back"
                );
                Outcome::Error {
                    message: e.to_string(),
                }
            }
        };

        let single = inscription.single();
        self.log.append(TransactionLogEntry {
            origin: envelope.sender.clone(),
            block_number: envelope.block_number,
            timestamp: envelope.timestamp,
            transaction_hash: tx_hash,
            contract: single.map(|call| call.contract.clone()),
            method: single.map(|call| call.function.clone()),
            inscription: raw,
            outcome,
        })
    }

    /// Parse and process a wire-format inscription
    ///
    /// Malformed input is logged as an ERROR entry like any other failure.
    pub fn process_json(&mut self, raw: &str, envelope: &Envelope) -> &TransactionLogEntry {
        match Inscription::from_json(raw) {
            Ok(inscription) => self.process(&inscription, envelope),
            Err(e) => {
                warn!(origin = %envelope.sender, error = %e, "Rejected malformed inscription");
                let tx_hash = self.transaction_hash(raw, envelope);
                self.log.append(TransactionLogEntry {
                    origin: envelope.sender.clone(),
                    block_number: envelope.block_number,
                    timestamp: envelope.timestamp,
                    transaction_hash: tx_hash,
                    contract: None,
                    method: None,
                    inscription: raw.to_string(),
                    outcome: Outcome::Error {
                        message: e.to_string(),
                    },
                })
            }
        }
    }

    /// Run every call of an inscription; the first failure aborts the rest
    fn execute_calls(
        &mut self,
        calls: &[ContractCall],
        envelope: &Envelope,
        tx_hash: &str,
        events: &RefCell<Vec<Event>>,
    ) -> ContractResult<()> {
        for call in calls {
            let output = self.execute_call(call, envelope, tx_hash, events)?;
            debug!(
                contract = %call.contract,
                function = %call.function,
                output = %output,
                "Contract call returned"
            );
        }
        Ok(())
    }

    fn execute_call(
        &mut self,
        call: &ContractCall,
        envelope: &Envelope,
        tx_hash: &str,
        events: &RefCell<Vec<Event>>,
    ) -> ContractResult<Value> {
        let target = &call.contract;

        let contract = self.world.registry.lookup(target)?;
        ensure_active(target, contract.active_on(), envelope.block_number)?;
        self.world.journal.capture(target, contract);

        let metadata = Metadata::top_level(envelope, target.clone(), tx_hash.to_string());
        let mut dispatcher =
            Dispatcher::new(&mut self.world, events, Some(events), target.clone(), metadata);
        dispatcher.call(&call.function, &call.args)
    }

    /// Explicit hash from the envelope, or a deterministic one derived from
    /// the inscription, its envelope and its position in the log
    fn transaction_hash(&self, raw: &str, envelope: &Envelope) -> String {
        if let Some(hash) = &envelope.transaction_hash {
            return hash.clone();
        }
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(raw.len() as u64).to_le_bytes());
        hasher.update(raw.as_bytes());
        hasher.update(envelope.sender.as_bytes());
        hasher.update(&envelope.block_number.to_le_bytes());
        hasher.update(&envelope.timestamp.to_le_bytes());
        hasher.update(&(self.log.len() as u64).to_le_bytes());
        hex::encode(hasher.finalize().as_bytes())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Box::new(NativeLoader), ExecutionPolicy::default())
    }
}
