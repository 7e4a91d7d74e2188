//! Core value types shared by the runtime and the contracts it hosts.

pub mod amount;
pub mod contract_id;
pub mod event;
pub mod metadata;

pub use amount::{Amount, AmountError};
pub use contract_id::{ContractId, DEPLOY_PREFIX};
pub use event::Event;
pub use metadata::{Envelope, Metadata};

/// Dynamically typed argument / return value of a contract operation
pub type Value = serde_json::Value;
