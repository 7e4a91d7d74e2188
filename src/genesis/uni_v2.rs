//! Uniswap-V2 style factory and pair.
//!
//! These exercise the redeploy path: the factory instantiates one
//! `uniV2Pair` per token pair under `dep:<factory>-LP-<token0>/<token1>` and
//! initializes it in the same call. Pricing and liquidity math are not
//! modelled; a pair tracks its tokens, reserves and LP-token ledger.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::json;

use super::lrc20::Ledger;
use super::token_helper::TokenHelper;
use crate::contracts::{parse_args, CallContext, Contract, ContractError, ContractResult};
use crate::types::{Amount, ContractId, Value};

/// Activation block of the AMM contracts
pub const UNI_V2_ACTIVE_ON: u64 = 100;

/// Template the factory instantiates for each pair
pub const PAIR_TEMPLATE: &str = "uniV2Pair";

/// Pair registry and fee settings
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UniV2Factory {
    fee_to: String,
    fee_to_setter: String,
    default_mint_fee: Amount,
    default_swap_fee: Amount,
    /// Per-pair overrides of the default fees, keyed by logical pair name
    mint_fees: BTreeMap<String, Amount>,
    swap_fees: BTreeMap<String, Amount>,
    /// token -> token -> logical pair name, stored in both directions
    get_pair: BTreeMap<String, BTreeMap<String, String>>,
    all_pairs: Vec<String>,
}

impl UniV2Factory {
    /// Logical name of the pair for `token0`/`token1`
    #[must_use]
    pub fn pair(&self, token0: &str, token1: &str) -> Option<&str> {
        self.get_pair
            .get(token0)
            .and_then(|pairs| pairs.get(token1))
            .map(String::as_str)
    }

    fn initialize(&mut self, ctx: &CallContext<'_>) -> ContractResult<Value> {
        let (fee_to_setter, default_mint_fee, default_swap_fee): (String, Amount, Amount) =
            parse_args(ctx.args, "init")?;
        self.fee_to_setter = fee_to_setter;
        self.default_mint_fee = default_mint_fee;
        self.default_swap_fee = default_swap_fee;
        Ok(Value::Null)
    }

    fn create_pair(&mut self, mut ctx: CallContext<'_>) -> ContractResult<Value> {
        let (token_a, token_b): (String, String) = parse_args(ctx.args, "createPair")?;
        if token_a == token_b {
            return Err(ContractError::execution("UniswapV2: IDENTICAL_ADDRESSES"));
        }
        let (token0, token1) = if token_a < token_b {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };
        if token0.is_empty() {
            return Err(ContractError::execution("UniswapV2: ZERO_ADDRESS"));
        }
        if self.pair(&token0, &token1).is_some() {
            return Err(ContractError::execution("UniswapV2: PAIR_EXISTS"));
        }

        let pair = format!("{}-LP-{token0}/{token1}", ctx.metadata.current_contract);
        ctx.ecosystem
            .redeploy_contract(PAIR_TEMPLATE, &pair)?
            .call("initialize", &[json!(token0), json!(token1)])?;

        self.get_pair
            .entry(token0.clone())
            .or_default()
            .insert(token1.clone(), pair.clone());
        self.get_pair
            .entry(token1.clone())
            .or_default()
            .insert(token0.clone(), pair.clone());
        self.all_pairs.push(pair.clone());

        ctx.event_logger.log(
            "PairCreated",
            format!("Pair created: {token0}-{token1}, Address: {pair}"),
        );
        Ok(json!(pair))
    }

    /// Logical name of a pair created by this factory, accepting either form
    fn known_pair(&self, pair: &str) -> ContractResult<String> {
        let name = ContractId::from(pair).logical_name().to_string();
        if self.all_pairs.contains(&name) {
            Ok(name)
        } else {
            Err(ContractError::execution("UniswapV2: PAIR_NOT_EXISTS"))
        }
    }

    fn ensure_fee_to_setter(&self, ctx: &CallContext<'_>) -> ContractResult<()> {
        if ctx.metadata.sender == self.fee_to_setter {
            Ok(())
        } else {
            Err(ContractError::execution("UniswapV2: FORBIDDEN"))
        }
    }

    fn swap_fee(&self, ctx: &CallContext<'_>) -> ContractResult<Value> {
        let (pair,): (String,) = parse_args(ctx.args, "getSwapFee")?;
        let name = self.known_pair(&pair)?;
        let fee = self.swap_fees.get(&name).copied().unwrap_or(self.default_swap_fee);
        Ok(json!(fee))
    }

    fn set_pair_fee(&mut self, ctx: &CallContext<'_>, swap: bool) -> ContractResult<Value> {
        let function = if swap { "setSwapFee" } else { "setMintFee" };
        let (pair, fee): (String, Amount) = parse_args(ctx.args, function)?;
        self.ensure_fee_to_setter(ctx)?;
        let name = self.known_pair(&pair)?;
        if swap {
            self.swap_fees.insert(name, fee);
        } else {
            self.mint_fees.insert(name, fee);
        }
        Ok(Value::Null)
    }

    fn set_default_fee(&mut self, ctx: &CallContext<'_>, swap: bool) -> ContractResult<Value> {
        let function = if swap { "setDefaultSwapFee" } else { "setDefaultMintFee" };
        let (fee,): (Amount,) = parse_args(ctx.args, function)?;
        self.ensure_fee_to_setter(ctx)?;
        if swap {
            self.default_swap_fee = fee;
        } else {
            self.default_mint_fee = fee;
        }
        Ok(Value::Null)
    }

    fn set_fee_to(&mut self, ctx: &CallContext<'_>, setter: bool) -> ContractResult<Value> {
        let function = if setter { "setFeeToSetter" } else { "setFeeTo" };
        let (address,): (String,) = parse_args(ctx.args, function)?;
        self.ensure_fee_to_setter(ctx)?;
        if setter {
            self.fee_to_setter = address;
        } else {
            self.fee_to = address;
        }
        Ok(Value::Null)
    }
}

impl Contract for UniV2Factory {
    fn template(&self) -> &'static str {
        "uniV2Factory"
    }

    fn active_on(&self) -> u64 {
        UNI_V2_ACTIVE_ON
    }

    fn operations(&self) -> &'static [&'static str] {
        &[
            "initialize",
            "allPairsLength",
            "createPair",
            "getPairAddress",
            "getPairs",
            "getSwapFee",
            "setFeeTo",
            "setFeeToSetter",
            "setMintFee",
            "setSwapFee",
            "setDefaultMintFee",
            "setDefaultSwapFee",
        ]
    }

    fn invoke(&mut self, operation: &str, ctx: CallContext<'_>) -> ContractResult<Value> {
        match operation {
            "initialize" => self.initialize(&ctx),
            "allPairsLength" => Ok(json!(self.all_pairs.len())),
            "createPair" => self.create_pair(ctx),
            "getPairAddress" => {
                let (token0, token1): (String, String) = parse_args(ctx.args, "getPairAddress")?;
                Ok(self
                    .pair(&token0, &token1)
                    .map_or(Value::Null, |pair| json!(ContractId::deployed(pair))))
            }
            "getPairs" => Ok(json!(self.get_pair)),
            "setFeeTo" => self.set_fee_to(&ctx, false),
            "setFeeToSetter" => self.set_fee_to(&ctx, true),
            "getSwapFee" => self.swap_fee(&ctx),
            "setMintFee" => self.set_pair_fee(&ctx, false),
            "setSwapFee" => self.set_pair_fee(&ctx, true),
            "setDefaultMintFee" => self.set_default_fee(&ctx, false),
            "setDefaultSwapFee" => self.set_default_fee(&ctx, true),
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

/// One token pair with its LP token
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UniV2Pair {
    factory: String,
    token0: String,
    token1: String,
    reserve0: Amount,
    reserve1: Amount,
    #[serde(flatten)]
    ledger: Ledger,
}

impl UniV2Pair {
    fn initialize(&mut self, ctx: &CallContext<'_>) -> ContractResult<Value> {
        let (token0, token1): (String, String) = parse_args(ctx.args, "init")?;
        if !self.factory.is_empty() {
            return Err(ContractError::execution("UniswapV2: ALREADY_INITIALIZED"));
        }
        self.factory = ctx.metadata.sender.clone();
        self.token0 = token0;
        self.token1 = token1;

        ctx.event_logger.log(
            "INIT",
            format!(
                "Initialized pair with token0: {}, token1: {}, and initial supply: {}",
                self.token0,
                self.token1,
                self.ledger.total_supply()
            ),
        );
        Ok(Value::Null)
    }

    /// Set reserves to the pair's current token balances
    fn sync(&mut self, mut ctx: CallContext<'_>) -> ContractResult<Value> {
        if self.factory.is_empty() {
            return Err(ContractError::execution("UniswapV2: NOT_INITIALIZED"));
        }
        let me = ctx.metadata.current_contract.to_string();
        let reserve0 = TokenHelper::new(self.token0.as_str()).balance_of(&mut ctx.ecosystem, &me)?;
        let reserve1 = TokenHelper::new(self.token1.as_str()).balance_of(&mut ctx.ecosystem, &me)?;
        self.reserve0 = reserve0;
        self.reserve1 = reserve1;

        ctx.event_logger
            .log("SYNC", format!("reserve0: {reserve0}, reserve1: {reserve1}"));
        Ok(json!([reserve0, reserve1]))
    }
}

impl Contract for UniV2Pair {
    fn template(&self) -> &'static str {
        PAIR_TEMPLATE
    }

    fn active_on(&self) -> u64 {
        UNI_V2_ACTIVE_ON
    }

    fn operations(&self) -> &'static [&'static str] {
        &[
            "initialize",
            "getToken0",
            "getToken1",
            "getFactory",
            "getReserves",
            "sync",
            "transfer",
            "transferFrom",
            "approve",
            "totalSupply",
            "balanceOf",
            "allowance",
        ]
    }

    fn invoke(&mut self, operation: &str, ctx: CallContext<'_>) -> ContractResult<Value> {
        if let Some(result) = self.ledger.dispatch(operation, &ctx) {
            return result;
        }
        match operation {
            "initialize" => self.initialize(&ctx),
            "getToken0" => Ok(json!(self.token0)),
            "getToken1" => Ok(json!(self.token1)),
            "getFactory" => Ok(json!(self.factory)),
            "getReserves" => Ok(json!([self.reserve0, self.reserve1])),
            "sync" => self.sync(ctx),
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
    use crate::contracts::processor::Engine;
    use crate::contracts::state::{Atomicity, ExecutionPolicy};
    use crate::contracts::transaction::{ContractCall, Inscription};
    use crate::genesis::config::EngineConfig;
    use crate::genesis::testing::{call, engine};
    use crate::types::Envelope;

    const PAIR: &str = "dep:uniV2Factory-LP-proto/pusd";

    #[test]
    fn test_factory_inactive_before_block_100() {
        let mut engine = engine();
        let entry = call(&mut engine, "walletA", 99, "uniV2Factory", "createPair", &[json!("proto"), json!("pusd")]);
        assert!(entry.error_message().unwrap().contains("not active yet"));
        assert!(engine.deployed().is_empty());
    }

    #[test]
    fn test_create_pair_validation() {
        let mut engine = engine();
        let entry = call(&mut engine, "walletA", 100, "uniV2Factory", "createPair", &[json!("proto"), json!("proto")]);
        assert_eq!(
            entry.error_message(),
            Some("execution failed: UniswapV2: IDENTICAL_ADDRESSES")
        );
        let entry = call(&mut engine, "walletA", 100, "uniV2Factory", "createPair", &[json!(""), json!("proto")]);
        assert_eq!(
            entry.error_message(),
            Some("execution failed: UniswapV2: ZERO_ADDRESS")
        );
    }

    #[test]
    fn test_pair_lookup_and_queries() {
        let mut engine = engine();
        let entry = call(&mut engine, "walletA", 100, "uniV2Factory", "createPair", &[json!("proto"), json!("pusd")]);
        assert!(entry.is_success());

        assert_eq!(
            engine
                .query("uniV2Factory", "getPairAddress", &[json!("pusd"), json!("proto")])
                .unwrap(),
            json!(PAIR)
        );
        assert_eq!(
            engine
                .query("uniV2Factory", "getPairAddress", &[json!("bitcoin"), json!("proto")])
                .unwrap(),
            Value::Null
        );
        assert_eq!(engine.query("uniV2Factory", "allPairsLength", &[]).unwrap(), json!(1));
        assert_eq!(engine.query(PAIR, "getToken1", &[]).unwrap(), json!("pusd"));
        assert_eq!(engine.query(PAIR, "getReserves", &[]).unwrap(), json!(["0", "0"]));

        // the template itself was never registered
        assert!(engine.state_of("uniV2Pair").is_none());
    }

    #[test]
    fn test_pair_initializes_once() {
        let mut engine = engine();
        call(&mut engine, "walletA", 100, "uniV2Factory", "createPair", &[json!("proto"), json!("pusd")]);
        let entry = call(&mut engine, "walletA", 100, PAIR, "initialize", &[json!("x"), json!("y")]);
        assert!(entry.error_message().unwrap().contains("ALREADY_INITIALIZED"));
    }

    #[test]
    fn test_sync_reads_token_balances() {
        let mut engine = engine();
        call(&mut engine, "walletA", 100, "proto", "mint", &[json!("1000")]);
        call(&mut engine, "walletB", 100, "pusd", "mint", &[json!("500")]);
        call(&mut engine, "walletA", 100, "uniV2Factory", "createPair", &[json!("proto"), json!("pusd")]);
        call(&mut engine, "walletA", 100, "proto", "transfer", &[json!(PAIR), json!("30")]);
        call(&mut engine, "walletB", 100, "pusd", "transfer", &[json!(PAIR), json!("20")]);

        let entry = call(&mut engine, "anyone", 100, PAIR, "sync", &[]);
        assert!(entry.is_success(), "{entry:?}");
        assert_eq!(entry.events()[0].message, "reserve0: 30, reserve1: 20");
        assert_eq!(engine.query(PAIR, "getReserves", &[]).unwrap(), json!(["30", "20"]));
    }

    #[test]
    fn test_pair_fees_override_defaults() {
        let mut engine = engine();
        call(&mut engine, "walletA", 100, "uniV2Factory", "initialize", &[json!("walletA"), json!("3"), json!("30")]);

        let entry = call(&mut engine, "walletA", 100, "uniV2Factory", "setSwapFee", &[json!(PAIR), json!("10")]);
        assert_eq!(entry.error_message(), Some("execution failed: UniswapV2: PAIR_NOT_EXISTS"));

        call(&mut engine, "walletA", 100, "uniV2Factory", "createPair", &[json!("proto"), json!("pusd")]);
        assert_eq!(engine.query("uniV2Factory", "getSwapFee", &[json!(PAIR)]).unwrap(), json!("30"));

        let entry = call(&mut engine, "walletB", 100, "uniV2Factory", "setSwapFee", &[json!(PAIR), json!("10")]);
        assert_eq!(entry.error_message(), Some("execution failed: UniswapV2: FORBIDDEN"));

        assert!(call(&mut engine, "walletA", 100, "uniV2Factory", "setSwapFee", &[json!(PAIR), json!("10")]).is_success());
        assert!(call(&mut engine, "walletA", 100, "uniV2Factory", "setMintFee", &[json!("uniV2Factory-LP-proto/pusd"), json!("2")]).is_success());
        assert!(call(&mut engine, "walletA", 100, "uniV2Factory", "setDefaultSwapFee", &[json!("25")]).is_success());
        assert!(call(&mut engine, "walletA", 100, "uniV2Factory", "setDefaultMintFee", &[json!("1")]).is_success());

        assert_eq!(engine.query("uniV2Factory", "getSwapFee", &[json!(PAIR)]).unwrap(), json!("10"));
        let state = engine.state_of("uniV2Factory").unwrap();
        assert_eq!(state["mintFees"]["uniV2Factory-LP-proto/pusd"], "2");
        assert_eq!(state["defaultSwapFee"], "25");
        assert_eq!(state["defaultMintFee"], "1");
    }

    #[test]
    fn test_fee_setter_permissions() {
        let mut engine = engine();
        call(&mut engine, "walletA", 100, "uniV2Factory", "initialize", &[json!("walletA"), json!("3"), json!("30")]);

        let entry = call(&mut engine, "walletB", 100, "uniV2Factory", "setFeeTo", &[json!("walletB")]);
        assert_eq!(entry.error_message(), Some("execution failed: UniswapV2: FORBIDDEN"));

        let entry = call(&mut engine, "walletA", 100, "uniV2Factory", "setFeeToSetter", &[json!("walletB")]);
        assert!(entry.is_success());
        let entry = call(&mut engine, "walletB", 100, "uniV2Factory", "setFeeTo", &[json!("walletB")]);
        assert!(entry.is_success());

        let state = engine.state_of("uniV2Factory").unwrap();
        assert_eq!(state["feeTo"], "walletB");
        assert_eq!(state["defaultSwapFee"], "30");
    }

    #[test]
    fn test_redeployed_pair_survives_only_in_narrow_mode() {
        // first call deploys the pair, second call fails the batch
        let batch = Inscription::multi(vec![
            ContractCall::new("uniV2Factory", "createPair", vec![json!("proto"), json!("pusd")]),
            ContractCall::new("uniV2Factory", "createPair", vec![json!("pusd"), json!("pusd")]),
        ]);
        let envelope = Envelope::new("walletA", 100);

        let mut narrow = engine();
        assert!(!narrow.process(&batch, &envelope).is_success());
        assert_eq!(narrow.query("uniV2Factory", "allPairsLength", &[]).unwrap(), json!(0));
        assert!(narrow.state_of(PAIR).is_some());

        let config = EngineConfig {
            atomicity: Atomicity::CallTree,
            ..EngineConfig::default()
        };
        let mut wide = Engine::from_config(&config).unwrap();
        assert_eq!(
            wide.policy(),
            ExecutionPolicy {
                atomicity: Atomicity::CallTree,
                ..ExecutionPolicy::default()
            }
        );
        assert!(!wide.process(&batch, &envelope).is_success());
        assert!(wide.state_of(PAIR).is_none());
        assert!(wide.deployed().is_empty());
    }
}
