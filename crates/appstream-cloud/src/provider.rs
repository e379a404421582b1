//! Cloud provider trait definition

use crate::action::{ApplyResult, Plan, ResourceKind};
use crate::error::Result;
use crate::state::ProviderState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Cloud provider abstraction trait
///
/// A provider turns a declared [`ResourceSet`] into a [`Plan`] against the
/// remote service and applies it.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Returns the provider name (e.g., "aws")
    fn name(&self) -> &str;

    /// Returns the provider display name for UI
    fn display_name(&self) -> &str;

    /// Check if the provider is properly configured and authenticated
    async fn check_auth(&self) -> Result<AuthStatus>;

    /// Read the remote state of the given resources
    async fn get_state(&self, managed: &ResourceSet) -> Result<ProviderState>;

    /// Calculate the diff between desired and current state
    async fn plan(&self, desired: &ResourceSet) -> Result<Plan>;

    /// Apply the planned actions
    async fn apply(&self, plan: &Plan) -> Result<ApplyResult>;

    /// Destroy a specific resource
    async fn destroy(&self, resource: &ResourceConfig) -> Result<()>;

    /// Destroy every resource in `managed`
    async fn destroy_all(&self, managed: &ResourceSet) -> Result<ApplyResult>;
}

/// Authentication status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStatus {
    pub authenticated: bool,

    /// Account/region information if available
    pub account_info: Option<String>,

    pub error: Option<String>,
}

impl AuthStatus {
    pub fn ok(account_info: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            account_info: Some(account_info.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            account_info: None,
            error: Some(error.into()),
        }
    }
}

/// Set of resources to be managed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceSet {
    /// Resources indexed by "kind:id"
    pub resources: HashMap<String, ResourceConfig>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, resource: ResourceConfig) {
        self.resources.insert(resource.key(), resource);
    }

    pub fn get(&self, kind: ResourceKind, id: &str) -> Option<&ResourceConfig> {
        self.resources.get(&format!("{}:{}", kind, id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceConfig> {
        self.resources.values()
    }

    pub fn by_kind(&self, kind: ResourceKind) -> Vec<&ResourceConfig> {
        let mut resources: Vec<&ResourceConfig> =
            self.resources.values().filter(|r| r.kind == kind).collect();
        resources.sort_by(|a, b| a.id.cmp(&b.id));
        resources
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Configuration for a declared resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub kind: ResourceKind,

    /// Resource name
    pub id: String,

    /// Provider name
    pub provider: String,

    /// Resource-specific configuration
    pub config: serde_json::Value,
}

impl ResourceConfig {
    pub fn new(
        kind: ResourceKind,
        id: impl Into<String>,
        provider: impl Into<String>,
        config: serde_json::Value,
    ) -> Self {
        Self {
            kind,
            id: id.into(),
            provider: provider.into(),
            config,
        }
    }

    /// Get the full resource key (kind:id)
    pub fn key(&self) -> String {
        format!("{}:{}", self.kind, self.id)
    }

    /// Get a configuration value as a specific type
    pub fn get_config<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.config
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Deserialize the whole configuration
    pub fn parse_config<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.config.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_set_keys_by_kind() {
        let mut set = ResourceSet::new();
        set.add(ResourceConfig::new(
            ResourceKind::Fleet,
            "analysts",
            "aws",
            serde_json::json!({"instance_type": "stream.standard.small"}),
        ));
        set.add(ResourceConfig::new(
            ResourceKind::Stack,
            "analysts",
            "aws",
            serde_json::json!({}),
        ));

        assert_eq!(set.len(), 2);
        let fleet = set.get(ResourceKind::Fleet, "analysts").unwrap();
        assert_eq!(fleet.key(), "fleet:analysts");
        assert_eq!(
            fleet.get_config::<String>("instance_type").as_deref(),
            Some("stream.standard.small")
        );
        assert_eq!(set.by_kind(ResourceKind::Stack).len(), 1);
    }
}
