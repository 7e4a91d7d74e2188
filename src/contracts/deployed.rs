//! Mapping of redeployed instances to the templates they were built from.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{ContractError, ContractResult};
use crate::types::ContractId;

/// One redeployed instance
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployedContract {
    /// Name requested by the deploying contract
    pub logical_name: String,
    /// Template the instance was built from
    pub template: String,
    /// Registry id (`dep:<logical name>`)
    pub id: ContractId,
    /// Block at which the instance was created
    pub block_number: u64,
}

/// Logical name → template mapping, retained for the engine's lifetime
#[derive(Clone, Debug, Default)]
pub struct DeployedContracts {
    by_id: BTreeMap<ContractId, DeployedContract>,
}

impl DeployedContracts {
    /// Create an empty mapping
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new instance
    ///
    /// # Errors
    /// Returns `NameTaken` if the id is already mapped
    pub fn record(&mut self, entry: DeployedContract) -> ContractResult<()> {
        if self.by_id.contains_key(&entry.id) {
            return Err(ContractError::NameTaken(entry.logical_name));
        }
        self.by_id.insert(entry.id.clone(), entry);
        Ok(())
    }

    /// Check if an id is mapped
    #[must_use]
    pub fn contains(&self, id: &ContractId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Look up an instance
    #[must_use]
    pub fn get(&self, id: &ContractId) -> Option<&DeployedContract> {
        self.by_id.get(id)
    }

    /// Template of an instance
    #[must_use]
    pub fn template_of(&self, id: &ContractId) -> Option<&str> {
        self.by_id.get(id).map(|entry| entry.template.as_str())
    }

    /// All instances in id order
    pub fn iter(&self) -> impl Iterator<Item = &DeployedContract> {
        self.by_id.values()
    }

    /// Number of instances
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub(crate) fn remove(&mut self, id: &ContractId) {
        self.by_id.remove(id);
    }
}
