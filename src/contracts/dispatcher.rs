//! Contract dispatcher - the uniform callable surface of one contract.
//!
//! A dispatcher binds a registry entry to a call frame (metadata + event
//! sink). Calling an operation:
//! 1. Rejects internal (`_`-prefixed) and unknown names
//! 2. Checks the contract out of the registry
//! 3. Builds the [`CallContext`] with an ecosystem scoped to the callee
//! 4. Invokes the operation and checks the contract back in

use std::cell::RefCell;

use tracing::debug;

use super::state::World;
use super::{CallContext, Contract, ContractError, ContractResult, Ecosystem, EventLogger};
use crate::types::{ContractId, Event, Metadata, Value};

/// Prefix of internal operation names
pub const INTERNAL_PREFIX: char = '_';

/// Check that `operation` is a public operation of `contract`
///
/// # Errors
/// Returns `NotCallable` for internal or unknown names
pub fn ensure_callable(
    id: &ContractId,
    contract: &dyn Contract,
    operation: &str,
) -> ContractResult<()> {
    if operation.starts_with(INTERNAL_PREFIX) || !contract.operations().contains(&operation) {
        return Err(ContractError::not_callable(id.clone(), operation));
    }
    Ok(())
}

/// Callable handle over one contract in the registry
pub struct Dispatcher<'a> {
    world: &'a mut World,
    /// Transaction-wide event buffer, inherited by nested frames
    events: &'a RefCell<Vec<Event>>,
    /// Where this frame's own events go
    sink: Option<&'a RefCell<Vec<Event>>>,
    target: ContractId,
    metadata: Metadata,
}

impl<'a> Dispatcher<'a> {
    pub(crate) fn new(
        world: &'a mut World,
        events: &'a RefCell<Vec<Event>>,
        sink: Option<&'a RefCell<Vec<Event>>>,
        target: ContractId,
        metadata: Metadata,
    ) -> Self {
        Self {
            world,
            events,
            sink,
            target,
            metadata,
        }
    }

    /// Contract this dispatcher calls into
    #[must_use]
    pub fn contract_id(&self) -> &ContractId {
        &self.target
    }

    /// Metadata every call through this dispatcher sees
    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Call a public operation
    ///
    /// # Errors
    /// Returns `NotCallable` for internal or unknown operations (without
    /// running any contract logic), or whatever the operation itself raises
    pub fn call(&mut self, operation: &str, args: &[Value]) -> ContractResult<Value> {
        if operation.starts_with(INTERNAL_PREFIX) {
            return Err(ContractError::not_callable(self.target.clone(), operation));
        }

        let mut contract = self.world.check_out(&self.target)?;
        if let Err(e) = ensure_callable(&self.target, contract.as_ref(), operation) {
            self.world.check_in(self.target.clone(), contract);
            return Err(e);
        }

        debug!(
            contract = %self.target,
            operation,
            sender = %self.metadata.sender,
            origin = %self.metadata.origin,
            "Dispatching contract call"
        );

        let ctx = CallContext {
            args,
            metadata: self.metadata.clone(),
            ecosystem: Ecosystem::new(
                &mut *self.world,
                self.events,
                self.target.clone(),
                self.metadata.clone(),
            ),
            event_logger: EventLogger::new(self.target.clone(), self.sink),
        };
        let result = contract.invoke(operation, ctx);

        self.world.check_in(self.target.clone(), contract);

        if let Err(e) = &result {
            debug!(contract = %self.target, operation, error = %e, "Contract call failed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::loader::NativeLoader;
    use crate::contracts::state::ExecutionPolicy;
    use crate::genesis::read_and_store::ReadAndStore;
    use crate::types::Envelope;
    use serde_json::json;

    fn world() -> World {
        let mut world = World::new(Box::new(NativeLoader), ExecutionPolicy::default());
        world
            .registry
            .register("readAndStore".into(), Box::new(ReadAndStore::default()))
            .unwrap();
        world
    }

    fn metadata(sender: &str) -> Metadata {
        Metadata::top_level(&Envelope::new(sender, 5), "readAndStore".into(), "h".into())
    }

    #[test]
    fn test_call_public_operation() {
        let mut world = world();
        let events = RefCell::new(Vec::new());
        let mut dispatcher = Dispatcher::new(
            &mut world,
            &events,
            Some(&events),
            "readAndStore".into(),
            metadata("walletA"),
        );

        dispatcher.call("store", &[json!("hello")]).unwrap();
        let read = dispatcher.call("read", &[json!("walletA")]).unwrap();
        assert_eq!(read, json!("hello"));

        let events = events.into_inner();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, "SAVE");
    }

    #[test]
    fn test_internal_operation_is_rejected() {
        let mut world = world();
        let events = RefCell::new(Vec::new());
        let mut dispatcher = Dispatcher::new(
            &mut world,
            &events,
            Some(&events),
            "readAndStore".into(),
            metadata("walletA"),
        );

        let err = dispatcher.call("_message", &[]).unwrap_err();
        assert!(matches!(err, ContractError::NotCallable { .. }));
        let err = dispatcher.call("doesNotExist", &[]).unwrap_err();
        assert!(matches!(err, ContractError::NotCallable { .. }));

        // contract is back in its slot after a rejected call
        assert!(world.registry.get("readAndStore").is_some());
    }

    #[test]
    fn test_missing_contract() {
        let mut world = world();
        let events = RefCell::new(Vec::new());
        let mut dispatcher =
            Dispatcher::new(&mut world, &events, None, "ghost".into(), metadata("x"));
        assert_eq!(
            dispatcher.call("read", &[]).unwrap_err(),
            ContractError::NotFound("ghost".into())
        );
    }

    #[test]
    fn test_ensure_callable() {
        let contract = ReadAndStore::default();
        let id = ContractId::from("readAndStore");
        assert!(ensure_callable(&id, &contract, "read").is_ok());
        assert!(ensure_callable(&id, &contract, "_read").is_err());
        assert!(ensure_callable(&id, &contract, "write").is_err());
    }
}
