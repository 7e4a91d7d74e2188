//! Shared engine handle for async hosts.
//!
//! Submissions take the write lock, so inscriptions are still processed one
//! at a time in the order the lock is acquired. Queries and log reads share
//! the read lock.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use super::processor::Engine;
use super::transaction::Inscription;
use super::tx_log::TransactionLogEntry;
use super::ContractResult;
use crate::types::{Envelope, Value};

/// Cloneable, thread-safe access to one [`Engine`]
#[derive(Clone)]
pub struct EngineHandle {
    engine: Arc<RwLock<Engine>>,
}

impl EngineHandle {
    /// Wrap an engine
    #[must_use]
    pub fn new(engine: Engine) -> Self {
        Self {
            engine: Arc::new(RwLock::new(engine)),
        }
    }

    /// Process an inscription and return its log entry
    pub async fn submit(&self, inscription: Inscription, envelope: Envelope) -> TransactionLogEntry {
        let mut engine = self.engine.write().await;
        debug!(origin = %envelope.sender, block = envelope.block_number, "Submitting inscription");
        engine.process(&inscription, &envelope).clone()
    }

    /// Process a wire-format inscription and return its log entry
    pub async fn submit_json(&self, raw: String, envelope: Envelope) -> TransactionLogEntry {
        let mut engine = self.engine.write().await;
        engine.process_json(&raw, &envelope).clone()
    }

    /// Read-only query
    ///
    /// # Errors
    /// See [`Engine::query`]
    pub async fn query(
        &self,
        contract: &str,
        function: &str,
        args: Vec<Value>,
    ) -> ContractResult<Value> {
        self.engine.read().await.query(contract, function, &args)
    }

    /// Serialized state of a contract
    pub async fn state_of(&self, contract: &str) -> Option<Value> {
        self.engine.read().await.state_of(contract)
    }

    /// Copy of the transaction log
    pub async fn logs(&self) -> Vec<TransactionLogEntry> {
        self.engine.read().await.transaction_log().read_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genesis::config::EngineConfig;
    use serde_json::json;

    fn handle() -> EngineHandle {
        EngineHandle::new(Engine::from_config(&EngineConfig::default()).unwrap())
    }

    #[tokio::test]
    async fn test_concurrent_submissions_are_serialized() {
        let handle = handle();
        let mut tasks = Vec::new();
        for i in 0..8u64 {
            let handle = handle.clone();
            tasks.push(tokio::spawn(async move {
                handle
                    .submit(
                        Inscription::call("bitcoin", "mint", vec![json!("walletA"), json!("5")]),
                        Envelope::new("protocol", i),
                    )
                    .await
            }));
        }
        for task in tasks {
            assert!(task.await.unwrap().is_success());
        }

        assert_eq!(handle.logs().await.len(), 8);
        assert_eq!(
            handle
                .query("bitcoin", "balanceOf", vec![json!("walletA")])
                .await
                .unwrap(),
            json!("40")
        );
    }

    #[test]
    fn test_submit_json_blocking() {
        let handle = handle();
        let entry = tokio_test::block_on(handle.submit_json(
            r#"{"p":"lam","op":"call","contract":"proto","function":"mint","args":["10"]}"#.to_string(),
            Envelope::new("walletA", 0),
        ));
        assert!(entry.is_success());

        let state = tokio_test::block_on(handle.state_of("proto")).unwrap();
        assert_eq!(state["totalSupply"], "10");
    }
}
