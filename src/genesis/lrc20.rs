//! LRC-20 fungible tokens.
//!
//! [`Ledger`] holds balances and allowances and implements the standard
//! token operations; [`Lrc20Token`] wraps it with metadata and a mint policy.
//! The same ledger backs the LP token of every Uniswap-V2 pair.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::json;

use super::PROTOCOL_WALLET;
use crate::contracts::{parse_args, CallContext, Contract, ContractError, ContractResult};
use crate::types::{Amount, Value};

/// Balances, allowances and supply of one token
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ledger {
    total_supply: Amount,
    balances: BTreeMap<String, Amount>,
    /// owner -> spender -> allowance
    allowances: BTreeMap<String, BTreeMap<String, Amount>>,
}

impl Ledger {
    /// Total minted supply
    #[must_use]
    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Balance of `wallet` (zero if unknown)
    #[must_use]
    pub fn balance_of(&self, wallet: &str) -> Amount {
        self.balances.get(wallet).copied().unwrap_or(Amount::ZERO)
    }

    /// Amount `spender` may move on behalf of `owner`
    #[must_use]
    pub fn allowance(&self, owner: &str, spender: &str) -> Amount {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    /// Create `amount` new units for `to`
    ///
    /// # Errors
    /// Returns error if the supply would overflow
    pub fn mint(&mut self, to: &str, amount: Amount) -> ContractResult<()> {
        let total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| ContractError::execution("mint: total supply overflow"))?;
        let balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or_else(|| ContractError::execution("mint: balance overflow"))?;
        self.total_supply = total_supply;
        self.balances.insert(to.to_string(), balance);
        Ok(())
    }

    /// Move `value` from `from` to `to`
    ///
    /// # Errors
    /// Returns error if `from` holds less than `value`; nothing is changed then
    pub fn transfer(&mut self, from: &str, to: &str, value: Amount) -> ContractResult<()> {
        let from_balance = self
            .balance_of(from)
            .checked_sub(value)
            .ok_or_else(|| ContractError::execution("transfer: balance to small"))?;
        self.balances.insert(from.to_string(), from_balance);

        // credit after the debit so a self-transfer nets out
        let to_balance = self
            .balance_of(to)
            .checked_add(value)
            .ok_or_else(|| ContractError::execution("transfer: balance overflow"))?;
        self.balances.insert(to.to_string(), to_balance);
        Ok(())
    }

    /// Set the allowance of `spender` over `owner`'s balance
    pub fn approve(&mut self, owner: &str, spender: &str, value: Amount) {
        self.allowances
            .entry(owner.to_string())
            .or_default()
            .insert(spender.to_string(), value);
    }

    /// Move `value` from `from` to `to`, spending `spender`'s allowance
    ///
    /// # Errors
    /// Returns error if the allowance or the balance is insufficient
    pub fn transfer_from(
        &mut self,
        spender: &str,
        from: &str,
        to: &str,
        value: Amount,
    ) -> ContractResult<()> {
        let remaining = self
            .allowance(from, spender)
            .checked_sub(value)
            .ok_or_else(|| ContractError::execution("transferFrom: allowance for spender not enough"))?;
        self.transfer(from, to, value)?;
        self.approve(from, spender, remaining);
        Ok(())
    }

    /// Run a standard token operation; `None` if `operation` is not one
    pub fn dispatch(
        &mut self,
        operation: &str,
        ctx: &CallContext<'_>,
    ) -> Option<ContractResult<Value>> {
        let result = match operation {
            "transfer" => self.transfer_op(ctx),
            "transferFrom" => self.transfer_from_op(ctx),
            "approve" => self.approve_op(ctx),
            "totalSupply" => Ok(self.total_supply.into()),
            "balanceOf" => parse_args::<(String,)>(ctx.args, "balanceOf")
                .map(|(wallet,)| self.balance_of(&wallet).into()),
            "allowance" => parse_args::<(String, String)>(ctx.args, "allowance")
                .map(|(owner, spender)| self.allowance(&owner, &spender).into()),
            _ => return None,
        };
        Some(result)
    }

    fn transfer_op(&mut self, ctx: &CallContext<'_>) -> ContractResult<Value> {
        let (to, value): (String, Amount) = parse_args(ctx.args, "transfer")?;
        let from = &ctx.metadata.sender;
        self.transfer(from, &to, value)?;
        ctx.event_logger.log(
            "TRANSFER",
            format!("FROM: '{from}'; TO: '{to}'; VALUE: {value}"),
        );
        Ok(Value::Null)
    }

    fn transfer_from_op(&mut self, ctx: &CallContext<'_>) -> ContractResult<Value> {
        let (from, to, value): (String, String, Amount) = parse_args(ctx.args, "transferFrom")?;
        self.transfer_from(&ctx.metadata.sender, &from, &to, value)?;
        ctx.event_logger.log(
            "TRANSFER",
            format!("FROM: '{from}'; TO: '{to}'; VALUE: {value}"),
        );
        Ok(Value::Null)
    }

    fn approve_op(&mut self, ctx: &CallContext<'_>) -> ContractResult<Value> {
        let (spender, value): (String, Amount) = parse_args(ctx.args, "approve")?;
        let owner = &ctx.metadata.sender;
        self.approve(owner, &spender, value);
        ctx.event_logger.log(
            "APPROVE",
            format!("OWNER: '{owner}'; SPENDER: '{spender}'; VALUE: {value}"),
        );
        Ok(Value::Null)
    }
}

/// Who may mint, and how often
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum MintPolicy {
    /// The owner mints the whole supply to itself, exactly once
    OwnerOnce {
        /// Only wallet allowed to mint
        owner: String,
        /// Set by the first successful mint
        #[serde(rename = "alreadyMinted")]
        already_minted: bool,
    },
    /// The protocol wallet mints to anyone, any number of times
    Protocol,
}

/// A genesis LRC-20 token
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lrc20Token {
    #[serde(skip)]
    template: &'static str,
    name: &'static str,
    symbol: &'static str,
    decimals: u8,
    mint_policy: MintPolicy,
    #[serde(flatten)]
    ledger: Ledger,
}

const TOKEN_OPERATIONS: &[&str] = &[
    "mint",
    "transfer",
    "transferFrom",
    "approve",
    "name",
    "symbol",
    "decimals",
    "totalSupply",
    "balanceOf",
    "allowance",
];

const BITCOIN_OPERATIONS: &[&str] = &[
    "mint",
    "payProtocolFees",
    "transfer",
    "transferFrom",
    "approve",
    "name",
    "symbol",
    "decimals",
    "totalSupply",
    "balanceOf",
    "allowance",
];

impl Lrc20Token {
    fn owned(template: &'static str, name: &'static str, symbol: &'static str, owner: &str) -> Self {
        Self {
            template,
            name,
            symbol,
            decimals: 8,
            mint_policy: MintPolicy::OwnerOnce {
                owner: owner.to_string(),
                already_minted: false,
            },
            ledger: Ledger::default(),
        }
    }

    /// Protocol Bitcoin, minted by the protocol wallet
    #[must_use]
    pub fn bitcoin() -> Self {
        Self {
            template: "bitcoin",
            name: "Protocol Bitcoin",
            symbol: "PBTC",
            decimals: 8,
            mint_policy: MintPolicy::Protocol,
            ledger: Ledger::default(),
        }
    }

    /// Proto, owned by `walletA`
    #[must_use]
    pub fn proto() -> Self {
        Self::owned("proto", "Proto", "PROTO", "walletA")
    }

    /// Protocol USD, owned by `walletB`
    #[must_use]
    pub fn pusd() -> Self {
        Self::owned("pusd", "Protocol USD", "PUSD", "walletB")
    }

    /// Token ledger
    #[must_use]
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    fn mint(&mut self, ctx: &CallContext<'_>) -> ContractResult<Value> {
        let sender = &ctx.metadata.sender;
        match &mut self.mint_policy {
            MintPolicy::Protocol => {
                let (to, amount): (String, Amount) = parse_args(ctx.args, "mint")?;
                if sender != PROTOCOL_WALLET {
                    return Err(ContractError::execution(
                        "mint: only the protocol wallet can mint bitcoin",
                    ));
                }
                self.ledger.mint(&to, amount)?;
                ctx.event_logger.log(
                    "TRANSFER",
                    format!("FROM: '0x0'; TO: '{to}'; VALUE: {amount}"),
                );
            }
            MintPolicy::OwnerOnce {
                owner,
                already_minted,
            } => {
                let (amount,): (Amount,) = parse_args(ctx.args, "mint")?;
                if sender.as_str() != owner.as_str() {
                    return Err(ContractError::execution("mint: only the owner can mint"));
                }
                if *already_minted {
                    return Err(ContractError::execution(
                        "mint: already minted; can only be done once",
                    ));
                }
                self.ledger.mint(sender, amount)?;
                *already_minted = true;
                ctx.event_logger.log(
                    "TRANSFER",
                    format!("FROM: 0x0; TO: '{sender}'; VALUE: {amount}"),
                );
            }
        }
        Ok(Value::Null)
    }

    fn pay_protocol_fees(&mut self, ctx: &CallContext<'_>) -> ContractResult<Value> {
        let (from, fees): (String, Amount) = parse_args(ctx.args, "payProtocolFees")?;
        if ctx.metadata.sender != PROTOCOL_WALLET {
            return Err(ContractError::execution(
                "payProtocolFees: only protocol wallet can do this",
            ));
        }
        if self.ledger.balance_of(&from) < fees {
            return Err(ContractError::execution("payProtocolFees: not enough balance"));
        }
        self.ledger.transfer(&from, PROTOCOL_WALLET, fees)?;
        ctx.event_logger
            .log("PROTOCOL FEES", format!("{from} paid {fees}"));
        Ok(Value::Null)
    }
}

impl Contract for Lrc20Token {
    fn template(&self) -> &'static str {
        self.template
    }

    fn active_on(&self) -> u64 {
        0
    }

    fn operations(&self) -> &'static [&'static str] {
        match self.mint_policy {
            MintPolicy::Protocol => BITCOIN_OPERATIONS,
            MintPolicy::OwnerOnce { .. } => TOKEN_OPERATIONS,
        }
    }

    fn invoke(&mut self, operation: &str, ctx: CallContext<'_>) -> ContractResult<Value> {
        if let Some(result) = self.ledger.dispatch(operation, &ctx) {
            return result;
        }
        match operation {
            "mint" => self.mint(&ctx),
            "payProtocolFees" if self.mint_policy == MintPolicy::Protocol => {
                self.pay_protocol_fees(&ctx)
            }
            "name" => Ok(json!(self.name)),
            "symbol" => Ok(json!(self.symbol)),
            "decimals" => Ok(json!(self.decimals)),
            _ => Err(ContractError::not_callable(
                ctx.metadata.current_contract.clone(),
                operation,
            )),
        }
    }

    fn state(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genesis::testing::{call, engine};

    #[test]
    fn test_ledger_transfer_from() {
        let mut ledger = Ledger::default();
        ledger.mint("alice", Amount::new(10)).unwrap();
        ledger.approve("alice", "bob", Amount::new(4));

        let err = ledger
            .transfer_from("bob", "alice", "carol", Amount::new(5))
            .unwrap_err();
        assert_eq!(
            err,
            ContractError::execution("transferFrom: allowance for spender not enough")
        );

        ledger
            .transfer_from("bob", "alice", "carol", Amount::new(3))
            .unwrap();
        assert_eq!(ledger.balance_of("alice"), Amount::new(7));
        assert_eq!(ledger.balance_of("carol"), Amount::new(3));
        assert_eq!(ledger.allowance("alice", "bob"), Amount::new(1));
    }

    #[test]
    fn test_failed_transfer_changes_nothing() {
        let mut ledger = Ledger::default();
        ledger.mint("alice", Amount::new(2)).unwrap();
        let before = ledger.clone();
        assert!(ledger.transfer("alice", "bob", Amount::new(3)).is_err());
        assert_eq!(ledger, before);

        ledger.transfer("alice", "alice", Amount::new(2)).unwrap();
        assert_eq!(ledger.balance_of("alice"), Amount::new(2));
    }

    #[test]
    fn test_owner_mints_once() {
        let mut engine = engine();
        let entry = call(&mut engine, "walletB", 0, "proto", "mint", &[json!("5")]);
        assert_eq!(
            entry.error_message(),
            Some("execution failed: mint: only the owner can mint")
        );

        let entry = call(&mut engine, "walletA", 0, "proto", "mint", &[json!("5")]);
        assert_eq!(entry.events()[0].message, "FROM: 0x0; TO: 'walletA'; VALUE: 5");

        let entry = call(&mut engine, "walletA", 0, "proto", "mint", &[json!("5")]);
        assert!(entry.error_message().unwrap().contains("already minted"));
        assert_eq!(engine.query("proto", "totalSupply", &[]).unwrap(), json!("5"));
    }

    #[test]
    fn test_token_metadata_queries() {
        let engine = engine();
        assert_eq!(engine.query("pusd", "name", &[]).unwrap(), json!("Protocol USD"));
        assert_eq!(engine.query("bitcoin", "symbol", &[]).unwrap(), json!("PBTC"));
        assert_eq!(engine.query("proto", "decimals", &[]).unwrap(), json!(8));
        assert_eq!(
            engine.query("proto", "balanceOf", &[json!("nobody")]).unwrap(),
            json!("0")
        );
    }

    #[test]
    fn test_approve_event_and_bad_args() {
        let mut engine = engine();
        let entry = call(&mut engine, "walletA", 0, "proto", "approve", &[json!("move"), json!(3)]);
        assert_eq!(entry.events()[0].kind, "APPROVE");
        assert_eq!(
            entry.events()[0].message,
            "OWNER: 'walletA'; SPENDER: 'move'; VALUE: 3"
        );

        let entry = call(&mut engine, "walletA", 0, "proto", "approve", &[json!("move")]);
        assert_eq!(entry.error_message(), Some("approve: args parsing error"));
    }

    #[test]
    fn test_protocol_fees() {
        let mut engine = engine();
        call(&mut engine, "protocol", 0, "bitcoin", "mint", &[json!("walletA"), json!("10")]);

        let entry = call(&mut engine, "walletA", 0, "bitcoin", "payProtocolFees", &[json!("walletA"), json!("4")]);
        assert!(entry.error_message().unwrap().contains("only protocol wallet"));

        let entry = call(&mut engine, "protocol", 0, "bitcoin", "payProtocolFees", &[json!("walletA"), json!("4")]);
        assert_eq!(entry.events()[0].kind, "PROTOCOL FEES");
        assert_eq!(
            engine.query("bitcoin", "balanceOf", &[json!("protocol")]).unwrap(),
            json!("4")
        );

        // only bitcoin exposes protocol fees
        let entry = call(&mut engine, "protocol", 0, "proto", "payProtocolFees", &[json!("walletA"), json!("1")]);
        assert!(entry.error_message().unwrap().contains("not callable"));
    }
}
