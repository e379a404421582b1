//! [`AppStreamApi`] backed by `aws-sdk-appstream`

use crate::api::{AppStreamApi, FleetDescription, FleetUpdate, StackDescription, StackUpdate};
use crate::error::AwsError;
use appstream_cloud::{FleetState, Result, Tags};
use appstream_core::{
    DomainJoinInfo, FleetConfig, StackConfig, StorageConnectorConfig, UserSettings, VpcConfig,
};
use async_trait::async_trait;
use aws_sdk_appstream::Client;
use aws_sdk_appstream::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_appstream::types as sdk;
use std::collections::HashMap;

const NOT_FOUND_CODE: &str = "ResourceNotFoundException";
const ALREADY_EXISTS_CODE: &str = "ResourceAlreadyExistsException";

/// AppStream client built from the standard AWS credential chain
pub struct SdkAppStream {
    client: Client,
    region: Option<String>,
}

impl SdkAppStream {
    /// Load credentials and region from the environment
    ///
    /// `region` overrides whatever the profile / environment resolves to.
    pub async fn from_env(region: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_sdk_appstream::config::Region::new(region.to_string()));
        }
        let config = loader.load().await;
        Self::from_conf(&config)
    }

    pub fn from_conf(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(config),
            region: config.region().map(|r| r.to_string()),
        }
    }
}

fn sdk_error<E>(operation: &str, err: E) -> AwsError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    AwsError::Sdk {
        operation: operation.to_string(),
        message: DisplayErrorContext(err).to_string(),
    }
}

fn is_not_found<E: ProvideErrorMetadata>(err: &E) -> bool {
    err.code() == Some(NOT_FOUND_CODE)
}

/// Map an SDK error, turning `ResourceNotFoundException` into `NotFound(name)`
fn call_error<E>(operation: &str, name: &str, err: E) -> AwsError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    if is_not_found(&err) {
        AwsError::NotFound(name.to_string())
    } else {
        sdk_error(operation, err)
    }
}

/// Map a create error, turning `ResourceAlreadyExistsException` into
/// `AlreadyExists(name)`
fn create_error<E>(operation: &str, name: &str, err: E) -> AwsError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    if err.code() == Some(ALREADY_EXISTS_CODE) {
        AwsError::AlreadyExists(name.to_string())
    } else {
        sdk_error(operation, err)
    }
}

fn fleet_from_sdk(fleet: &sdk::Fleet) -> FleetDescription {
    FleetDescription {
        name: fleet.name().unwrap_or_default().to_string(),
        arn: fleet.arn().map(str::to_string),
        state: fleet
            .state()
            .map(|s| FleetState::parse(s.as_str()))
            .unwrap_or_default(),
        instance_type: fleet.instance_type().unwrap_or_default().to_string(),
        image_arn: fleet.image_arn().map(str::to_string),
        fleet_type: fleet.fleet_type().map(|t| t.as_str().to_string()),
        desired_instances: fleet.compute_capacity_status().and_then(|c| c.desired()),
        description: fleet.description().map(str::to_string),
        display_name: fleet.display_name().map(str::to_string),
        disconnect_timeout: fleet.disconnect_timeout_in_seconds(),
        max_user_duration: fleet.max_user_duration_in_seconds(),
        enable_default_internet_access: fleet.enable_default_internet_access(),
        vpc: fleet.vpc_config().map(|v| VpcConfig {
            subnet_ids: v.subnet_ids().to_vec(),
            security_group_ids: v.security_group_ids().to_vec(),
        }),
        domain: fleet.domain_join_info().map(|d| DomainJoinInfo {
            directory_name: d.directory_name().map(str::to_string),
            organizational_unit: d
                .organizational_unit_distinguished_name()
                .map(str::to_string),
        }),
    }
}

fn stack_from_sdk(stack: &sdk::Stack) -> StackDescription {
    let mut user_settings = UserSettings::default();
    for setting in stack.user_settings() {
        let (Some(action), Some(permission)) = (setting.action(), setting.permission()) else {
            continue;
        };
        let permission = Some(permission.as_str().to_string());
        match action.as_str() {
            "FILE_DOWNLOAD" => user_settings.file_download = permission,
            "FILE_UPLOAD" => user_settings.file_upload = permission,
            "CLIPBOARD_COPY_FROM_LOCAL_DEVICE" => user_settings.copy_from_local = permission,
            "CLIPBOARD_COPY_TO_LOCAL_DEVICE" => user_settings.copy_to_local = permission,
            "PRINTING_TO_LOCAL_DEVICE" => user_settings.allow_local_device_printing = permission,
            _ => {}
        }
    }

    StackDescription {
        name: stack.name().unwrap_or_default().to_string(),
        arn: stack.arn().map(str::to_string),
        description: stack.description().map(str::to_string),
        display_name: stack.display_name().map(str::to_string),
        feedback_url: stack.feedback_url().map(str::to_string),
        redirect_url: stack.redirect_url().map(str::to_string),
        storage_connectors: stack
            .storage_connectors()
            .iter()
            .filter_map(|c| {
                c.connector_type()
                    .map(|t| StorageConnectorConfig {
                        connector_type: t.as_str().to_string(),
                        resource_identifier: c.resource_identifier().map(str::to_string),
                    })
            })
            .collect(),
        user_settings,
    }
}

fn compute_capacity(desired: i32) -> sdk::ComputeCapacity {
    sdk::ComputeCapacity::builder()
        .desired_instances(desired)
        .build()
}

fn vpc_to_sdk(vpc: &VpcConfig) -> sdk::VpcConfig {
    sdk::VpcConfig::builder()
        .set_subnet_ids(Some(vpc.subnet_ids.clone()))
        .set_security_group_ids(Some(vpc.security_group_ids.clone()))
        .build()
}

fn domain_to_sdk(domain: &DomainJoinInfo) -> sdk::DomainJoinInfo {
    sdk::DomainJoinInfo::builder()
        .set_directory_name(domain.directory_name.clone())
        .set_organizational_unit_distinguished_name(domain.organizational_unit.clone())
        .build()
}

fn connectors_to_sdk(connectors: &[StorageConnectorConfig]) -> Vec<sdk::StorageConnector> {
    connectors
        .iter()
        .map(|c| {
            sdk::StorageConnector::builder()
                .connector_type(sdk::StorageConnectorType::from(c.connector_type.as_str()))
                .set_resource_identifier(c.resource_identifier.clone())
                .build()
        })
        .collect()
}

fn settings_to_sdk(settings: &UserSettings) -> Vec<sdk::UserSetting> {
    settings
        .actions()
        .into_iter()
        .map(|(action, permission)| {
            sdk::UserSetting::builder()
                .action(sdk::Action::from(action))
                .permission(sdk::Permission::from(permission))
                .build()
        })
        .collect()
}

/// `Some(items)` unless empty, so an undeclared list is left untouched
fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    (!items.is_empty()).then_some(items)
}

#[async_trait]
impl AppStreamApi for SdkAppStream {
    fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    async fn list_fleets(&self) -> Result<Vec<FleetDescription>> {
        let mut fleets = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let output = self
                .client
                .describe_fleets()
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| sdk_error("DescribeFleets", e))?;
            fleets.extend(output.fleets().iter().map(fleet_from_sdk));
            match output.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }
        Ok(fleets)
    }

    async fn describe_fleet(&self, name: &str) -> Result<Option<FleetDescription>> {
        let output = match self.client.describe_fleets().names(name).send().await {
            Ok(output) => output,
            Err(e) if is_not_found(&e) => return Ok(None),
            Err(e) => return Err(sdk_error("DescribeFleets", e).into()),
        };
        Ok(output
            .fleets()
            .iter()
            .find(|f| f.name() == Some(name))
            .map(fleet_from_sdk))
    }

    async fn create_fleet(&self, fleet: &FleetConfig) -> Result<FleetDescription> {
        let output = self
            .client
            .create_fleet()
            .name(&fleet.name)
            .instance_type(&fleet.instance_type)
            .image_arn(&fleet.image_arn)
            .set_fleet_type(fleet.fleet_type.as_deref().map(sdk::FleetType::from))
            .compute_capacity(compute_capacity(fleet.desired_instances))
            .set_description(fleet.description.clone())
            .set_display_name(fleet.display_name.clone())
            .set_disconnect_timeout_in_seconds(fleet.disconnect_timeout)
            .set_max_user_duration_in_seconds(fleet.max_user_duration)
            .set_enable_default_internet_access(fleet.enable_default_internet_access)
            .set_vpc_config(fleet.vpc.as_ref().map(vpc_to_sdk))
            .set_domain_join_info(fleet.domain.as_ref().map(domain_to_sdk))
            .send()
            .await
            .map_err(|e| create_error("CreateFleet", &fleet.name, e))?;

        output
            .fleet()
            .map(fleet_from_sdk)
            .ok_or_else(|| AwsError::IncompleteResponse(format!("CreateFleet {}", fleet.name)).into())
    }

    async fn update_fleet(&self, update: &FleetUpdate) -> Result<()> {
        self.client
            .update_fleet()
            .name(&update.name)
            .set_instance_type(update.instance_type.clone())
            .set_image_arn(update.image_arn.clone())
            .set_compute_capacity(update.desired_instances.map(compute_capacity))
            .set_description(update.description.clone())
            .set_display_name(update.display_name.clone())
            .set_disconnect_timeout_in_seconds(update.disconnect_timeout)
            .set_max_user_duration_in_seconds(update.max_user_duration)
            .set_enable_default_internet_access(update.enable_default_internet_access)
            .set_vpc_config(update.vpc.as_ref().map(vpc_to_sdk))
            .set_domain_join_info(update.domain.as_ref().map(domain_to_sdk))
            .send()
            .await
            .map_err(|e| call_error("UpdateFleet", &update.name, e))?;
        Ok(())
    }

    async fn start_fleet(&self, name: &str) -> Result<()> {
        self.client
            .start_fleet()
            .name(name)
            .send()
            .await
            .map_err(|e| call_error("StartFleet", name, e))?;
        Ok(())
    }

    async fn stop_fleet(&self, name: &str) -> Result<()> {
        self.client
            .stop_fleet()
            .name(name)
            .send()
            .await
            .map_err(|e| call_error("StopFleet", name, e))?;
        Ok(())
    }

    async fn delete_fleet(&self, name: &str) -> Result<()> {
        self.client
            .delete_fleet()
            .name(name)
            .send()
            .await
            .map_err(|e| call_error("DeleteFleet", name, e))?;
        Ok(())
    }

    async fn associate_fleet(&self, fleet: &str, stack: &str) -> Result<()> {
        self.client
            .associate_fleet()
            .fleet_name(fleet)
            .stack_name(stack)
            .send()
            .await
            .map_err(|e| sdk_error("AssociateFleet", e))?;
        Ok(())
    }

    async fn disassociate_fleet(&self, fleet: &str, stack: &str) -> Result<()> {
        self.client
            .disassociate_fleet()
            .fleet_name(fleet)
            .stack_name(stack)
            .send()
            .await
            .map_err(|e| sdk_error("DisassociateFleet", e))?;
        Ok(())
    }

    async fn list_associated_stacks(&self, fleet: &str) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let output = self
                .client
                .list_associated_stacks()
                .fleet_name(fleet)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| call_error("ListAssociatedStacks", fleet, e))?;
            names.extend(output.names().iter().cloned());
            match output.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }
        Ok(names)
    }

    async fn describe_stack(&self, name: &str) -> Result<Option<StackDescription>> {
        let output = match self.client.describe_stacks().names(name).send().await {
            Ok(output) => output,
            Err(e) if is_not_found(&e) => return Ok(None),
            Err(e) => return Err(sdk_error("DescribeStacks", e).into()),
        };
        Ok(output
            .stacks()
            .iter()
            .find(|s| s.name() == Some(name))
            .map(stack_from_sdk))
    }

    async fn create_stack(&self, stack: &StackConfig) -> Result<StackDescription> {
        let connectors = connectors_to_sdk(&stack.storage_connectors);
        let settings = settings_to_sdk(&stack.user_settings);

        let output = self
            .client
            .create_stack()
            .name(&stack.name)
            .set_description(stack.description.clone())
            .set_display_name(stack.display_name.clone())
            .set_feedback_url(stack.feedback_url.clone())
            .set_redirect_url(stack.redirect_url.clone())
            .set_storage_connectors(non_empty(connectors))
            .set_user_settings(non_empty(settings))
            .send()
            .await
            .map_err(|e| create_error("CreateStack", &stack.name, e))?;

        output
            .stack()
            .map(stack_from_sdk)
            .ok_or_else(|| AwsError::IncompleteResponse(format!("CreateStack {}", stack.name)).into())
    }

    async fn update_stack(&self, update: &StackUpdate) -> Result<()> {
        let connectors = update.storage_connectors.as_deref().map(connectors_to_sdk);
        let settings = update.user_settings.as_ref().map(settings_to_sdk);

        self.client
            .update_stack()
            .name(&update.name)
            .set_description(update.description.clone())
            .set_display_name(update.display_name.clone())
            .set_feedback_url(update.feedback_url.clone())
            .set_redirect_url(update.redirect_url.clone())
            .set_storage_connectors(connectors)
            .set_user_settings(settings)
            .send()
            .await
            .map_err(|e| call_error("UpdateStack", &update.name, e))?;
        Ok(())
    }

    async fn delete_stack(&self, name: &str) -> Result<()> {
        self.client
            .delete_stack()
            .name(name)
            .send()
            .await
            .map_err(|e| call_error("DeleteStack", name, e))?;
        Ok(())
    }

    async fn list_tags(&self, arn: &str) -> Result<Tags> {
        let output = self
            .client
            .list_tags_for_resource()
            .resource_arn(arn)
            .send()
            .await
            .map_err(|e| call_error("ListTagsForResource", arn, e))?;
        Ok(output
            .tags()
            .map(|tags| tags.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect())
            .unwrap_or_default())
    }

    async fn tag_resource(&self, arn: &str, tags: &Tags) -> Result<()> {
        let tags: HashMap<String, String> = tags
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        self.client
            .tag_resource()
            .resource_arn(arn)
            .set_tags(Some(tags))
            .send()
            .await
            .map_err(|e| call_error("TagResource", arn, e))?;
        Ok(())
    }

    async fn untag_resource(&self, arn: &str, keys: &[String]) -> Result<()> {
        self.client
            .untag_resource()
            .resource_arn(arn)
            .set_tag_keys(Some(keys.to_vec()))
            .send()
            .await
            .map_err(|e| call_error("UntagResource", arn, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fleet_from_sdk_maps_state_and_capacity() {
        let fleet = sdk::Fleet::builder()
            .name("analysts")
            .arn("arn:aws:appstream:us-east-1:123456789012:fleet/analysts")
            .instance_type("stream.standard.small")
            .state(sdk::FleetState::Running)
            .compute_capacity_status(
                sdk::ComputeCapacityStatus::builder()
                    .desired(2)
                    .build(),
            )
            .build();

        let description = fleet_from_sdk(&fleet);

        assert_eq!(description.name, "analysts");
        assert_eq!(description.state, FleetState::Running);
        assert_eq!(description.desired_instances, Some(2));
        assert!(description.vpc.is_none());
    }

    #[test]
    fn test_domain_join_info_survives_sdk_round_trip() {
        let domain = DomainJoinInfo {
            directory_name: Some("corp.example.com".to_string()),
            organizational_unit: Some("OU=AppStream,DC=corp,DC=example,DC=com".to_string()),
        };
        let fleet = sdk::Fleet::builder()
            .name("analysts")
            .domain_join_info(domain_to_sdk(&domain))
            .build();

        assert_eq!(fleet_from_sdk(&fleet).domain, Some(domain));
    }

    #[test]
    fn test_domain_without_directory_stays_unset() {
        let sdk_domain = domain_to_sdk(&DomainJoinInfo::default());
        assert_eq!(sdk_domain.directory_name(), None);
    }

    #[test]
    fn test_stack_from_sdk_maps_user_settings() {
        let stack = sdk::Stack::builder()
            .name("analysts")
            .user_settings(
                sdk::UserSetting::builder()
                    .action(sdk::Action::FileDownload)
                    .permission(sdk::Permission::Disabled)
                    .build(),
            )
            .storage_connectors(
                sdk::StorageConnector::builder()
                    .connector_type(sdk::StorageConnectorType::Homefolders)
                    .build(),
            )
            .build();

        let description = stack_from_sdk(&stack);

        assert_eq!(description.user_settings.file_download.as_deref(), Some("DISABLED"));
        assert_eq!(description.storage_connectors[0].connector_type, "HOMEFOLDERS");
    }

    #[test]
    fn test_settings_to_sdk_skips_undeclared_actions() {
        let settings = UserSettings {
            file_upload: Some("ENABLED".to_string()),
            ..Default::default()
        };
        let sdk_settings = settings_to_sdk(&settings);
        assert_eq!(sdk_settings.len(), 1);
    }
}
