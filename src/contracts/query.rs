//! Read-only queries.
//!
//! A query runs a public operation against a throwaway copy of the contract.
//! The live registry is never written, events are dropped, and the
//! ecosystem refuses cross-contract access.

use std::cell::RefCell;

use tracing::trace;

use super::dispatcher::ensure_callable;
use super::{CallContext, ContractRegistry, ContractResult, Ecosystem, EventLogger};
use crate::types::{ContractId, Metadata, Value};

/// Run `function` on a copy of `contract`
///
/// # Errors
/// Returns `NotFound`, `NotCallable`, `ReadOnly` if the operation reaches for
/// the ecosystem, or whatever the operation itself raises
pub fn execute(
    registry: &ContractRegistry,
    contract: &str,
    function: &str,
    args: &[Value],
) -> ContractResult<Value> {
    let id = ContractId::from(contract);
    let live = registry.lookup(&id)?;
    ensure_callable(&id, live, function)?;

    let mut copy = live.snapshot();
    let events = RefCell::new(Vec::new());
    let metadata = Metadata::query(id.clone());
    let ctx = CallContext {
        args,
        metadata: metadata.clone(),
        ecosystem: Ecosystem::read_only(&events, id.clone(), metadata),
        event_logger: EventLogger::discard(id.clone()),
    };

    let result = copy.invoke(function, ctx);
    trace!(contract = %id, function, ok = result.is_ok(), "Query executed");
    result
}

/// Serialized state of a live contract
#[must_use]
pub fn state_view(registry: &ContractRegistry, contract: &str) -> Option<Value> {
    registry.get(contract).map(|live| live.state())
}
