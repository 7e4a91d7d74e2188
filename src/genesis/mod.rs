//! Genesis contracts.
//!
//! The contracts registered when an engine starts, and the templates the
//! native loader can instantiate at runtime:
//! - LRC-20 tokens (`bitcoin`, `proto`, `pusd`)
//! - `readAndStore`, a per-sender message store
//! - `move`, a relay over token allowances
//! - the Uniswap-V2 factory and its `uniV2Pair` template
//!
//! They are reference workloads for the calling convention. None of them
//! model financial math.

pub mod config;
pub mod lrc20;
pub mod mover;
pub mod read_and_store;
pub mod token_helper;
pub mod uni_v2;

/// Wallet allowed to mint bitcoin and collect protocol fees
pub const PROTOCOL_WALLET: &str = "protocol";

/// Contracts registered under their template name at startup
pub const DEFAULT_GENESIS: &[&str] = &[
    "bitcoin",
    "proto",
    "pusd",
    "readAndStore",
    "move",
    "uniV2Factory",
];
