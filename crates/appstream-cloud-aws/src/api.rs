//! AppStream API capability
//!
//! The subset of the AppStream 2.0 API the resource mappers need. The
//! production implementation is [`crate::sdk::SdkAppStream`]; tests use the
//! in-memory mock from `test_utils`.

use appstream_cloud::{FleetState, Result, TagDiff, Tags};
use appstream_core::{
    DomainJoinInfo, FleetConfig, StackConfig, StorageConnectorConfig, UserSettings, VpcConfig,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A fleet as reported by `DescribeFleets`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetDescription {
    pub name: String,
    pub arn: Option<String>,
    pub state: FleetState,
    pub instance_type: String,
    pub image_arn: Option<String>,
    pub fleet_type: Option<String>,
    pub desired_instances: Option<i32>,
    pub description: Option<String>,
    pub display_name: Option<String>,
    pub disconnect_timeout: Option<i32>,
    pub max_user_duration: Option<i32>,
    pub enable_default_internet_access: Option<bool>,
    pub vpc: Option<VpcConfig>,
    pub domain: Option<DomainJoinInfo>,
}

/// A stack as reported by `DescribeStacks`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StackDescription {
    pub name: String,
    pub arn: Option<String>,
    pub description: Option<String>,
    pub display_name: Option<String>,
    pub feedback_url: Option<String>,
    pub redirect_url: Option<String>,
    pub storage_connectors: Vec<StorageConnectorConfig>,
    pub user_settings: UserSettings,
}

/// Attributes to change with `UpdateFleet`; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FleetUpdate {
    pub name: String,
    pub instance_type: Option<String>,
    pub image_arn: Option<String>,
    pub desired_instances: Option<i32>,
    pub description: Option<String>,
    pub display_name: Option<String>,
    pub disconnect_timeout: Option<i32>,
    pub max_user_duration: Option<i32>,
    pub enable_default_internet_access: Option<bool>,
    pub vpc: Option<VpcConfig>,
    pub domain: Option<DomainJoinInfo>,
}

impl FleetUpdate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Names of the attributes this update changes
    pub fn changed_fields(&self) -> Vec<String> {
        let fields = [
            ("instance_type", self.instance_type.is_some()),
            ("image_arn", self.image_arn.is_some()),
            ("desired_instances", self.desired_instances.is_some()),
            ("description", self.description.is_some()),
            ("display_name", self.display_name.is_some()),
            ("disconnect_timeout", self.disconnect_timeout.is_some()),
            ("max_user_duration", self.max_user_duration.is_some()),
            (
                "enable_default_internet_access",
                self.enable_default_internet_access.is_some(),
            ),
            ("vpc", self.vpc.is_some()),
            ("domain", self.domain.is_some()),
        ];
        fields
            .into_iter()
            .filter(|(_, changed)| *changed)
            .map(|(name, _)| name.to_string())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.changed_fields().is_empty()
    }
}

/// Attributes to change with `UpdateStack`; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StackUpdate {
    pub name: String,
    pub description: Option<String>,
    pub display_name: Option<String>,
    pub feedback_url: Option<String>,
    pub redirect_url: Option<String>,
    pub storage_connectors: Option<Vec<StorageConnectorConfig>>,
    pub user_settings: Option<UserSettings>,
}

impl StackUpdate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn changed_fields(&self) -> Vec<String> {
        let fields = [
            ("description", self.description.is_some()),
            ("display_name", self.display_name.is_some()),
            ("feedback_url", self.feedback_url.is_some()),
            ("redirect_url", self.redirect_url.is_some()),
            ("storage_connectors", self.storage_connectors.is_some()),
            ("user_settings", self.user_settings.is_some()),
        ];
        fields
            .into_iter()
            .filter(|(_, changed)| *changed)
            .map(|(name, _)| name.to_string())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.changed_fields().is_empty()
    }
}

/// AppStream operations used by the fleet and stack mappers
///
/// Operations on a missing resource fail with `CloudError::ResourceNotFound`,
/// except the `describe_*` calls which return `Ok(None)`.
#[async_trait]
pub trait AppStreamApi: Send + Sync {
    /// Region the client talks to, if known
    fn region(&self) -> Option<&str>;

    async fn list_fleets(&self) -> Result<Vec<FleetDescription>>;

    async fn describe_fleet(&self, name: &str) -> Result<Option<FleetDescription>>;

    async fn create_fleet(&self, fleet: &FleetConfig) -> Result<FleetDescription>;

    async fn update_fleet(&self, update: &FleetUpdate) -> Result<()>;

    async fn start_fleet(&self, name: &str) -> Result<()>;

    async fn stop_fleet(&self, name: &str) -> Result<()>;

    async fn delete_fleet(&self, name: &str) -> Result<()>;

    async fn associate_fleet(&self, fleet: &str, stack: &str) -> Result<()>;

    async fn disassociate_fleet(&self, fleet: &str, stack: &str) -> Result<()>;

    /// Names of the stacks a fleet is associated with
    async fn list_associated_stacks(&self, fleet: &str) -> Result<Vec<String>>;

    async fn describe_stack(&self, name: &str) -> Result<Option<StackDescription>>;

    async fn create_stack(&self, stack: &StackConfig) -> Result<StackDescription>;

    async fn update_stack(&self, update: &StackUpdate) -> Result<()>;

    async fn delete_stack(&self, name: &str) -> Result<()>;

    async fn list_tags(&self, arn: &str) -> Result<Tags>;

    async fn tag_resource(&self, arn: &str, tags: &Tags) -> Result<()>;

    async fn untag_resource(&self, arn: &str, keys: &[String]) -> Result<()>;
}

/// Push a tag diff to `arn`: untag removed keys first, then tag the rest
pub async fn sync_tags(api: &dyn AppStreamApi, arn: &str, diff: &TagDiff) -> Result<()> {
    if !diff.remove.is_empty() {
        tracing::debug!("Untagging {}: {:?}", arn, diff.remove);
        api.untag_resource(arn, &diff.remove).await?;
    }
    if !diff.upsert.is_empty() {
        tracing::debug!("Tagging {} with {} tags", arn, diff.upsert.len());
        api.tag_resource(arn, &diff.upsert).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fleet_update_changed_fields() {
        let mut update = FleetUpdate::new("analysts");
        assert!(update.is_empty());

        update.instance_type = Some("stream.standard.large".to_string());
        update.disconnect_timeout = Some(600);
        assert_eq!(
            update.changed_fields(),
            vec!["instance_type".to_string(), "disconnect_timeout".to_string()]
        );
    }

    #[test]
    fn test_stack_update_changed_fields() {
        let mut update = StackUpdate::new("analysts");
        update.redirect_url = Some("https://example.com".to_string());
        assert_eq!(update.changed_fields(), vec!["redirect_url".to_string()]);
    }
}
