//! Per-sender string storage, active from block 1.

use std::collections::BTreeMap;

use serde_json::json;

use crate::contracts::{parse_args, CallContext, Contract, ContractError, ContractResult};
use crate::types::Value;

/// Stores one message per sender
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReadAndStore {
    message: BTreeMap<String, String>,
}

impl ReadAndStore {
    fn store(&mut self, ctx: &CallContext<'_>) -> ContractResult<Value> {
        let (value,): (String,) = parse_args(ctx.args, "save")?;
        let sender = &ctx.metadata.sender;
        ctx.event_logger
            .log("SAVE", format!("{value} stored for {sender}"));
        self.message.insert(sender.clone(), value);
        Ok(Value::Null)
    }

    #[cfg(test)]
    pub(crate) fn set(&mut self, sender: &str, value: &str) {
        self.message.insert(sender.to_string(), value.to_string());
    }
}

impl Contract for ReadAndStore {
    fn template(&self) -> &'static str {
        "readAndStore"
    }

    fn active_on(&self) -> u64 {
        1
    }

    fn operations(&self) -> &'static [&'static str] {
        &["store", "storeClassMethod", "read"]
    }

    fn invoke(&mut self, operation: &str, ctx: CallContext<'_>) -> ContractResult<Value> {
        match operation {
            "store" | "storeClassMethod" => self.store(&ctx),
            "read" => {
                let (from,): (String,) = parse_args(ctx.args, "read")?;
                Ok(json!(self.message.get(&from).map_or("", String::as_str)))
            }
            _ => Err(ContractError::not_callable(
                ctx.metadata.current_contract.clone(),
                operation,
            )),
        }
    }

    fn state(&self) -> Value {
        json!({ "message": self.message })
    }
}
