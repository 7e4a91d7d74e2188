//! Contract Loading Infrastructure
//!
//! Turns a template name into a fresh, default-state contract instance. Used
//! for genesis registration and for runtime redeploys; a loader never clones
//! a live instance.

use crate::contracts::{Contract, ContractError, ContractResult};
use crate::genesis::lrc20::Lrc20Token;
use crate::genesis::mover::Move;
use crate::genesis::read_and_store::ReadAndStore;
use crate::genesis::uni_v2::{UniV2Factory, UniV2Pair};

/// A trait for instantiating contracts from template names
pub trait ContractLoader: Send + Sync {
    /// Build a fresh instance of `template`
    fn instantiate(&self, template: &str) -> ContractResult<Box<dyn Contract>>;

    /// Names this loader can instantiate
    fn templates(&self) -> &'static [&'static str];
}

/// Loads the native reference contracts
#[derive(Clone, Copy, Debug, Default)]
pub struct NativeLoader;

impl NativeLoader {
    /// Every template known to the native loader
    pub const TEMPLATES: &'static [&'static str] = &[
        "bitcoin",
        "proto",
        "pusd",
        "readAndStore",
        "move",
        "uniV2Factory",
        "uniV2Pair",
    ];
}

impl ContractLoader for NativeLoader {
    fn instantiate(&self, template: &str) -> ContractResult<Box<dyn Contract>> {
        match template {
            "bitcoin" => Ok(Box::new(Lrc20Token::bitcoin())),
            "proto" => Ok(Box::new(Lrc20Token::proto())),
            "pusd" => Ok(Box::new(Lrc20Token::pusd())),
            "readAndStore" => Ok(Box::new(ReadAndStore::default())),
            "move" => Ok(Box::new(Move)),
            "uniV2Factory" => Ok(Box::new(UniV2Factory::default())),
            "uniV2Pair" => Ok(Box::new(UniV2Pair::default())),
            _ => Err(ContractError::UnknownTemplate(template.to_string())),
        }
    }

    fn templates(&self) -> &'static [&'static str] {
        Self::TEMPLATES
    }
}
