//! The single composite input every contract operation receives.

use std::cell::RefCell;

use crate::contracts::Ecosystem;
use crate::types::{ContractId, Event, Metadata, Value};

/// Input of one operation call: `{ args, metadata, ecosystem, event_logger }`
pub struct CallContext<'a> {
    /// Positional arguments
    pub args: &'a [Value],
    /// Metadata of this call frame
    pub metadata: Metadata,
    /// Cross-contract capability scoped to the contract being called
    pub ecosystem: Ecosystem<'a>,
    /// Event sink of this call frame
    pub event_logger: EventLogger<'a>,
}

/// Event sink handed to an operation
///
/// The top-level frame always records into the transaction's event buffer.
/// Nested frames record only when the engine propagates nested events;
/// otherwise their logger is a no-op.
#[derive(Clone)]
pub struct EventLogger<'a> {
    contract: ContractId,
    sink: Option<&'a RefCell<Vec<Event>>>,
}

impl<'a> EventLogger<'a> {
    /// Logger that appends to `sink`, tagging events with `contract`
    pub(crate) fn new(contract: ContractId, sink: Option<&'a RefCell<Vec<Event>>>) -> Self {
        Self { contract, sink }
    }

    /// Logger that drops everything
    pub(crate) fn discard(contract: ContractId) -> Self {
        Self {
            contract,
            sink: None,
        }
    }

    /// Record an event
    pub fn log(&self, kind: impl Into<String>, message: impl Into<String>) {
        if let Some(sink) = self.sink {
            sink.borrow_mut()
                .push(Event::new(kind, message).emitted_by(self.contract.clone()));
        }
    }

    /// Whether logged events are kept
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.sink.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_tags_events() {
        let buffer = RefCell::new(Vec::new());
        let logger = EventLogger::new("bitcoin".into(), Some(&buffer));
        logger.log("TRANSFER", "x");
        assert!(logger.is_recording());

        let events = buffer.into_inner();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].contract.as_ref().unwrap(), "bitcoin");
    }

    #[test]
    fn test_discarding_logger() {
        let logger = EventLogger::discard("proto".into());
        logger.log("TRANSFER", "dropped");
        assert!(!logger.is_recording());
    }
}
