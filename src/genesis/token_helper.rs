//! Typed cross-contract calls into LRC-20 tokens.

use serde_json::json;

use crate::contracts::{ContractError, ContractResult, Ecosystem};
use crate::types::{Amount, Value};

/// Calls a token through the caller's ecosystem, so the token sees the
/// calling contract as `sender`
#[derive(Clone, Debug)]
pub struct TokenHelper {
    contract: String,
}

impl TokenHelper {
    /// Helper for the token registered as `contract`
    #[must_use]
    pub fn new(contract: impl Into<String>) -> Self {
        Self {
            contract: contract.into(),
        }
    }

    /// `transfer(to, value)` from the calling contract's balance
    ///
    /// # Errors
    /// Propagates lookup and token errors
    pub fn transfer(&self, ecosystem: &mut Ecosystem<'_>, to: &str, value: Amount) -> ContractResult<()> {
        ecosystem
            .get_contract_obj(&self.contract)?
            .call("transfer", &[json!(to), value.into()])?;
        Ok(())
    }

    /// `transferFrom(from, to, value)` spending the calling contract's allowance
    ///
    /// # Errors
    /// Propagates lookup and token errors
    pub fn transfer_from(
        &self,
        ecosystem: &mut Ecosystem<'_>,
        from: &str,
        to: &str,
        value: Amount,
    ) -> ContractResult<()> {
        ecosystem
            .get_contract_obj(&self.contract)?
            .call("transferFrom", &[json!(from), json!(to), value.into()])?;
        Ok(())
    }

    /// `balanceOf(wallet)`
    ///
    /// # Errors
    /// Propagates lookup and token errors, or fails if the answer is not an amount
    pub fn balance_of(&self, ecosystem: &mut Ecosystem<'_>, wallet: &str) -> ContractResult<Amount> {
        let balance: Value = ecosystem
            .get_contract_obj(&self.contract)?
            .call("balanceOf", &[json!(wallet)])?;
        serde_json::from_value(balance).map_err(|_| {
            ContractError::execution(format!("balanceOf: {} returned no amount", self.contract))
        })
    }
}
