//! Ecosystem - cross-contract capability handed to every running operation.
//!
//! An ecosystem is scoped to "I am contract X, acting under metadata M".
//! Dispatchers it hands out derive a new frame in which X is the `sender`
//! and the callee is `current_contract`; `origin`, block, timestamp and
//! transaction hash carry through unchanged.

use std::cell::RefCell;

use tracing::{debug, info};

use super::deployed::DeployedContract;
use super::state::World;
use super::{ContractError, ContractResult, Dispatcher};
use crate::types::{ContractId, Event, Metadata};

/// Fail if a non-instance contract is not yet active at `block`
///
/// # Errors
/// Returns `Inactive` if `active_on > block` and `id` is not a redeployed instance
pub fn ensure_active(id: &ContractId, active_on: u64, block: u64) -> ContractResult<()> {
    if active_on > block && !id.is_deployed_instance() {
        return Err(ContractError::Inactive {
            contract: id.clone(),
            active_on,
            block,
        });
    }
    Ok(())
}

/// Reject instance names that cannot be registered
///
/// # Errors
/// Returns `InvalidName` for an empty name or one containing `.`
pub fn validate_instance_name(name: &str) -> ContractResult<()> {
    if name.is_empty() {
        return Err(ContractError::InvalidName("name cant be empty".to_string()));
    }
    if name.contains('.') {
        return Err(ContractError::InvalidName(
            "'.' is not allowed in contract name".to_string(),
        ));
    }
    Ok(())
}

/// Cross-contract capability of one call frame
pub struct Ecosystem<'a> {
    world: Option<&'a mut World>,
    events: &'a RefCell<Vec<Event>>,
    caller: ContractId,
    metadata: Metadata,
}

impl<'a> Ecosystem<'a> {
    pub(crate) fn new(
        world: &'a mut World,
        events: &'a RefCell<Vec<Event>>,
        caller: ContractId,
        metadata: Metadata,
    ) -> Self {
        Self {
            world: Some(world),
            events,
            caller,
            metadata,
        }
    }

    /// Ecosystem of a read-only query; every capability fails
    pub(crate) fn read_only(
        events: &'a RefCell<Vec<Event>>,
        caller: ContractId,
        metadata: Metadata,
    ) -> Self {
        Self {
            world: None,
            events,
            caller,
            metadata,
        }
    }

    /// Contract this ecosystem acts for
    #[must_use]
    pub fn caller(&self) -> &ContractId {
        &self.caller
    }

    /// Metadata of the frame this ecosystem belongs to
    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Get a dispatcher for another contract
    ///
    /// # Errors
    /// Returns `NotFound` if absent, `Reentrancy` if it is executing further up
    /// the stack, `Inactive` if it is a genesis contract not active yet
    pub fn get_contract_obj(&mut self, id: &str) -> ContractResult<Dispatcher<'_>> {
        let world = self
            .world
            .as_deref_mut()
            .ok_or(ContractError::ReadOnly("getContractObj"))?;
        let id = ContractId::from(id);

        let active_on = world.registry.lookup(&id)?.active_on();
        ensure_active(&id, active_on, self.metadata.block_number)?;

        debug!(caller = %self.caller, callee = %id, "Resolved cross-contract call");

        let sink = world.policy.nested_events.sink(self.events);
        let metadata = self.metadata.nested(&self.caller, id.clone());
        Ok(Dispatcher::new(world, self.events, sink, id, metadata))
    }

    /// Instantiate `template` under `dep:<new_name>` and get a dispatcher for it
    ///
    /// The instance is built from the template's default state and is callable
    /// immediately, whatever its activation block.
    ///
    /// # Errors
    /// Returns `InvalidName` or `NameTaken` before anything is mutated, or
    /// `UnknownTemplate` if the loader cannot build `template`
    pub fn redeploy_contract(
        &mut self,
        template: &str,
        new_name: &str,
    ) -> ContractResult<Dispatcher<'_>> {
        let world = self
            .world
            .as_deref_mut()
            .ok_or(ContractError::ReadOnly("redeployContract"))?;

        validate_instance_name(new_name)?;
        let id = ContractId::deployed(new_name);
        if world.registry.contains(id.as_str()) || world.deployed.contains(&id) {
            return Err(ContractError::NameTaken(new_name.to_string()));
        }

        let contract = world.loader.instantiate(template)?;
        world.registry.register(id.clone(), contract)?;
        world.deployed.record(DeployedContract {
            logical_name: new_name.to_string(),
            template: template.to_string(),
            id: id.clone(),
            block_number: self.metadata.block_number,
        })?;
        world.journal.deployed(&id);

        info!(
            deployer = %self.caller,
            template,
            contract = %id,
            block = self.metadata.block_number,
            "Redeployed contract"
        );

        let sink = world.policy.nested_events.sink(self.events);
        if let Some(sink) = sink {
            sink.borrow_mut().push(
                Event::new("DEPLOY", format!("contract '{id}' has been deployed!"))
                    .emitted_by(self.caller.clone()),
            );
        }

        let metadata = self.metadata.nested(&self.caller, id.clone());
        Ok(Dispatcher::new(world, self.events, sink, id, metadata))
    }
}
