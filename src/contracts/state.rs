//! Execution state - the single mutable world an engine owns.
//!
//! Contracts touch the world only through a [`Dispatcher`](super::Dispatcher)
//! or an [`Ecosystem`](super::Ecosystem), which:
//! - Check contracts out of the registry while they execute
//! - Record pre-call snapshots in the [`Journal`]
//! - Record instances created by redeploys
//!
//! On abort the journal is replayed in reverse to restore the world.

use std::cell::RefCell;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::deployed::DeployedContracts;
use super::loader::ContractLoader;
use super::{Contract, ContractRegistry, ContractResult};
use crate::types::{ContractId, Event};

/// How much of the world an aborted inscription restores
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Atomicity {
    /// Only the contracts directly named by the inscription
    #[default]
    Target,
    /// Every contract touched and every instance created in the call tree
    CallTree,
}

/// What happens to events raised by nested calls
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NestedEvents {
    /// Nested frames log into a no-op sink
    #[default]
    Discard,
    /// Nested events join the transaction's event list in emission order
    Propagate,
}

impl NestedEvents {
    /// Sink for a nested frame given the transaction's buffer
    pub(crate) fn sink<'a>(
        self,
        buffer: &'a RefCell<Vec<Event>>,
    ) -> Option<&'a RefCell<Vec<Event>>> {
        match self {
            Self::Discard => None,
            Self::Propagate => Some(buffer),
        }
    }
}

/// Runtime behaviour switches
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPolicy {
    /// Rollback scope
    pub atomicity: Atomicity,
    /// Nested event handling
    pub nested_events: NestedEvents,
}

/// Represents a world mutation that can be rolled back
enum Mutation {
    /// Contract state before the inscription first touched it
    Touched {
        /// Contract id
        id: ContractId,
        /// Snapshot to restore
        before: Box<dyn Contract>,
    },
    /// Instance created by a redeploy
    Deployed {
        /// New instance id
        id: ContractId,
    },
}

/// Undo log of one inscription
#[derive(Default)]
pub struct Journal {
    /// Rollback scope
    atomicity: Atomicity,
    /// Pending mutations, oldest first
    mutations: Vec<Mutation>,
    /// Contracts with a recorded snapshot
    captured: BTreeSet<ContractId>,
}

impl Journal {
    /// Create an empty journal
    #[must_use]
    pub fn new(atomicity: Atomicity) -> Self {
        Self {
            atomicity,
            mutations: Vec::new(),
            captured: BTreeSet::new(),
        }
    }

    /// Snapshot a contract unless it was already captured this inscription
    pub fn capture(&mut self, id: &ContractId, contract: &dyn Contract) {
        if self.captured.insert(id.clone()) {
            self.mutations.push(Mutation::Touched {
                id: id.clone(),
                before: contract.snapshot(),
            });
        }
    }

    /// Note a contract about to execute; only journaled for call-tree atomicity
    pub fn touch(&mut self, id: &ContractId, contract: &dyn Contract) {
        if self.atomicity == Atomicity::CallTree {
            self.capture(id, contract);
        }
    }

    /// Note a redeployed instance; only journaled for call-tree atomicity
    pub fn deployed(&mut self, id: &ContractId) {
        if self.atomicity == Atomicity::CallTree {
            self.mutations.push(Mutation::Deployed { id: id.clone() });
        }
    }

    /// Number of pending mutations
    #[must_use]
    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    /// Check if nothing is journaled
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    /// Forget all pending mutations
    ///
    /// This finalizes the state changes. After commit, rollback is no longer possible.
    pub fn commit(&mut self) {
        self.mutations.clear();
        self.captured.clear();
    }

    fn drain(&mut self) -> Vec<Mutation> {
        self.captured.clear();
        std::mem::take(&mut self.mutations)
    }
}

/// Everything an engine mutates
pub struct World {
    /// Live contracts
    pub(crate) registry: ContractRegistry,
    /// Logical name mapping of redeployed instances
    pub(crate) deployed: DeployedContracts,
    /// Template instantiation
    pub(crate) loader: Box<dyn ContractLoader>,
    /// Undo log of the inscription in flight
    pub(crate) journal: Journal,
    /// Behaviour switches
    pub(crate) policy: ExecutionPolicy,
}

impl World {
    /// Create an empty world
    #[must_use]
    pub fn new(loader: Box<dyn ContractLoader>, policy: ExecutionPolicy) -> Self {
        Self {
            registry: ContractRegistry::new(),
            deployed: DeployedContracts::new(),
            loader,
            journal: Journal::new(policy.atomicity),
            policy,
        }
    }

    /// Check a contract out for execution, journaling it first
    pub(crate) fn check_out(&mut self, id: &ContractId) -> ContractResult<Box<dyn Contract>> {
        let contract = self.registry.check_out(id)?;
        self.journal.touch(id, contract.as_ref());
        Ok(contract)
    }

    /// Return a contract after execution
    pub(crate) fn check_in(&mut self, id: ContractId, contract: Box<dyn Contract>) {
        self.registry.check_in(id, contract);
    }

    /// Keep every mutation made since the last commit
    pub(crate) fn commit(&mut self) {
        self.journal.commit();
    }

    /// Revert journaled mutations, newest first
    pub(crate) fn rollback(&mut self) {
        for mutation in self.journal.drain().into_iter().rev() {
            match mutation {
                Mutation::Touched { id, before } => self.registry.restore(id, before),
                Mutation::Deployed { id } => {
                    self.registry.remove(&id);
                    self.deployed.remove(&id);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::deployed::DeployedContract;
    use crate::contracts::loader::NativeLoader;
    use crate::genesis::read_and_store::ReadAndStore;

    fn world(atomicity: Atomicity) -> World {
        let mut world = World::new(
            Box::new(NativeLoader),
            ExecutionPolicy {
                atomicity,
                ..ExecutionPolicy::default()
            },
        );
        world
            .registry
            .register("readAndStore".into(), Box::new(ReadAndStore::default()))
            .unwrap();
        world
    }

    fn store(world: &mut World, value: &str) {
        let id = ContractId::from("readAndStore");
        let _original = world.check_out(&id).unwrap();
        let mut replaced = ReadAndStore::default();
        replaced.set("walletA", value);
        world.check_in(id, Box::new(replaced));
    }

    #[test]
    fn test_target_rollback_restores_captured_only() {
        let mut world = world(Atomicity::Target);
        let id = ContractId::from("readAndStore");
        let before = world.registry.get("readAndStore").unwrap().state();

        let snapshot = world.registry.get("readAndStore").unwrap().snapshot();
        world.journal.capture(&id, snapshot.as_ref());
        store(&mut world, "hello");
        assert_ne!(world.registry.get("readAndStore").unwrap().state(), before);

        world.rollback();
        assert_eq!(world.registry.get("readAndStore").unwrap().state(), before);
        assert!(world.journal.is_empty());
    }

    #[test]
    fn test_target_mode_does_not_journal_touches() {
        let mut world = world(Atomicity::Target);
        store(&mut world, "kept");
        world.rollback();

        let state = world.registry.get("readAndStore").unwrap().state();
        assert_eq!(state["message"]["walletA"], "kept");
    }

    #[test]
    fn test_call_tree_rollback_removes_deployments() {
        let mut world = world(Atomicity::CallTree);
        let id = ContractId::deployed("fresh");
        world
            .registry
            .register(id.clone(), Box::new(ReadAndStore::default()))
            .unwrap();
        world
            .deployed
            .record(DeployedContract {
                logical_name: "fresh".into(),
                template: "readAndStore".into(),
                id: id.clone(),
                block_number: 0,
            })
            .unwrap();
        world.journal.deployed(&id);
        store(&mut world, "touched");

        world.rollback();
        assert!(!world.registry.contains(id.as_str()));
        assert!(!world.deployed.contains(&id));
        let state = world.registry.get("readAndStore").unwrap().state();
        assert!(state["message"].get("walletA").is_none());
    }

    #[test]
    fn test_commit_clears_journal() {
        let mut world = world(Atomicity::CallTree);
        store(&mut world, "x");
        assert_eq!(world.journal.len(), 1);
        world.commit();
        assert!(world.journal.is_empty());
    }
}
