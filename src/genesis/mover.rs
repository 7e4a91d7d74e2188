//! Moves one token unit on behalf of its caller.

use serde_json::json;

use super::token_helper::TokenHelper;
use crate::contracts::{parse_args, CallContext, Contract, ContractError, ContractResult};
use crate::types::{Amount, Value};

/// Stateless relay over a token's `transferFrom`
///
/// `moveFrom(from, token)` pulls one unit from `from` to the caller. The
/// token sees this contract as `sender`, so `from` must have approved `move`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Move;

impl Contract for Move {
    fn template(&self) -> &'static str {
        "move"
    }

    fn active_on(&self) -> u64 {
        0
    }

    fn operations(&self) -> &'static [&'static str] {
        &["moveFrom"]
    }

    fn invoke(&mut self, operation: &str, mut ctx: CallContext<'_>) -> ContractResult<Value> {
        if operation != "moveFrom" {
            return Err(ContractError::not_callable(
                ctx.metadata.current_contract.clone(),
                operation,
            ));
        }
        let (from, token): (String, String) = parse_args(ctx.args, "moveFrom")?;
        TokenHelper::new(token).transfer_from(
            &mut ctx.ecosystem,
            &from,
            &ctx.metadata.sender,
            Amount::new(1),
        )?;
        Ok(Value::Null)
    }

    fn state(&self) -> Value {
        json!({})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genesis::testing::{call, engine};

    #[test]
    fn test_move_without_allowance_fails() {
        let mut engine = engine();
        call(&mut engine, "walletA", 0, "proto", "mint", &[json!("10")]);
        let before = engine.state_of("move").unwrap();

        let entry = call(&mut engine, "walletB", 0, "move", "moveFrom", &[json!("walletA"), json!("proto")]);
        assert!(entry
            .error_message()
            .unwrap()
            .contains("allowance for spender not enough"));
        assert_eq!(engine.state_of("move").unwrap(), before);
    }

    #[test]
    fn test_move_unknown_token() {
        let mut engine = engine();
        let entry = call(&mut engine, "walletB", 0, "move", "moveFrom", &[json!("walletA"), json!("nope")]);
        assert_eq!(entry.error_message(), Some("contract not found: nope"));
    }
}
