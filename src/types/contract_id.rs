//! Contract identities.
//!
//! Genesis contracts live under plain names (`bitcoin`, `uniV2Factory`).
//! Instances created at runtime through a redeploy live under
//! `dep:<logical name>` and are exempt from activation gating.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Reserved prefix of every redeployed contract instance
pub const DEPLOY_PREFIX: &str = "dep:";

/// Unique key of a contract in the registry
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractId(String);

impl ContractId {
    /// Wrap a raw contract name
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Id of a redeployed instance with the given logical name
    #[must_use]
    pub fn deployed(logical_name: &str) -> Self {
        Self(format!("{DEPLOY_PREFIX}{logical_name}"))
    }

    /// Get the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether this id carries the redeployed-instance prefix
    #[must_use]
    pub fn is_deployed_instance(&self) -> bool {
        self.0.starts_with(DEPLOY_PREFIX)
    }

    /// Name without the redeployed-instance prefix
    #[must_use]
    pub fn logical_name(&self) -> &str {
        self.0.strip_prefix(DEPLOY_PREFIX).unwrap_or(&self.0)
    }
}

impl fmt::Debug for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContractId({})", self.0)
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ContractId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ContractId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ContractId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ContractId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl PartialEq<str> for ContractId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ContractId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deployed_prefix() {
        let id = ContractId::deployed("pair-a-b");
        assert_eq!(id.as_str(), "dep:pair-a-b");
        assert!(id.is_deployed_instance());
        assert_eq!(id.logical_name(), "pair-a-b");
    }

    #[test]
    fn test_genesis_id() {
        let id = ContractId::from("bitcoin");
        assert!(!id.is_deployed_instance());
        assert_eq!(id.logical_name(), "bitcoin");
        assert_eq!(id, "bitcoin");
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = ContractId::deployed("x");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"dep:x\"");
    }
}
