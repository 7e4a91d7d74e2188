//! # `LamVM`
//!
//! A deterministic, single-writer execution runtime for stateful contracts.
//!
//! ## Architecture
//!
//! An [`Engine`] owns every contract and processes one inscription at a time:
//! - **Inscriptions** name a contract, an operation and positional arguments
//! - **Contracts** mutate their own state and reach others through an
//!   [`Ecosystem`], which attributes each nested call to its caller
//! - **Redeploys** create new `dep:`-prefixed instances from templates
//! - **Transaction log** records exactly one outcome per inscription
//!
//! ## Atomicity Model
//!
//! - A failed inscription restores the snapshot of its target contract
//! - Call-tree atomicity (opt-in) also restores every nested contract and
//!   removes instances created during the call
//! - Events are only recorded for committed inscriptions

#![forbid(unsafe_code)]
#![deny(clippy::all, rust_2018_idioms)]
#![warn(clippy::pedantic, clippy::nursery, missing_docs)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::future_not_send,
    clippy::too_many_lines,
    clippy::too_many_arguments,
    // Log sequence numbers and lengths fit in u64
    clippy::cast_possible_truncation,
    clippy::cast_lossless,
    // Const fn not always beneficial for complex types
    clippy::missing_const_for_fn,
    // must_use on every fn is excessive
    clippy::must_use_candidate,
    // Pass by value is fine for small Copy types
    clippy::needless_pass_by_value,
    // Field naming matches domain terminology
    clippy::struct_field_names,
    // Match arms with same body are sometimes clearer separate
    clippy::match_same_arms
)]

pub mod contracts;
pub mod genesis;
pub mod logging;
pub mod types;

pub use contracts::handle::EngineHandle;
pub use contracts::processor::Engine;
pub use contracts::state::{Atomicity, ExecutionPolicy, NestedEvents};
pub use contracts::transaction::{ContractCall, Inscription, InscriptionError};
pub use contracts::tx_log::{Outcome, TransactionLog, TransactionLogEntry};
pub use contracts::{
    CallContext, Contract, ContractError, ContractRegistry, ContractResult, Dispatcher, Ecosystem,
    EventLogger,
};
pub use genesis::config::{ConfigError, EngineConfig};
pub use types::{Amount, ContractId, Envelope, Event, Metadata, Value};

/// Runtime version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
