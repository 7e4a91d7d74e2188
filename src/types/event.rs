//! Events emitted by contract operations.

use serde::{Deserialize, Serialize};

use super::ContractId;

/// An event raised by a contract operation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event type (e.g. `TRANSFER`, `APPROVE`)
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable payload
    pub message: String,
    /// Contract that emitted the event, set when the event is persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract: Option<ContractId>,
}

impl Event {
    /// Create an untagged event
    #[must_use]
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            contract: None,
        }
    }

    /// Tag the event with the emitting contract
    #[must_use]
    pub fn emitted_by(mut self, contract: ContractId) -> Self {
        self.contract = Some(contract);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_shape() {
        let event = Event::new("TRANSFER", "FROM: '0x0'").emitted_by("bitcoin".into());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "TRANSFER");
        assert_eq!(json["contract"], "bitcoin");

        let untagged = serde_json::to_value(Event::new("SAVE", "x")).unwrap();
        assert!(untagged.get("contract").is_none());
    }
}
