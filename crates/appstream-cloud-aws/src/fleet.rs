//! Fleet resource mapper
//!
//! Sequences the AppStream calls behind create / read / update / delete of a
//! declared fleet. Lifecycle changes go through the convergence driver.

use crate::api::{AppStreamApi, FleetDescription, FleetUpdate, sync_tags};
use crate::control::FleetControl;
use appstream_cloud::{
    CloudError, ConvergeOptions, Convergence, DesiredState, FleetState, Result, TagDiff, Tags,
    await_state, converge,
};
use appstream_core::{FleetConfig, VpcConfig};

/// A fleet with its associations and tags
#[derive(Debug, Clone, PartialEq)]
pub struct FleetRecord {
    pub fleet: FleetDescription,
    pub stacks: Vec<String>,
    pub tags: Tags,
}

/// Everything that differs between a declared fleet and the remote one
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FleetChanges {
    pub update: FleetUpdate,
    pub tags: TagDiff,
    /// Stacks to disassociate before associating the declared one
    pub disassociate: Vec<String>,
    pub associate: Option<String>,
    /// Lifecycle state to converge to
    pub target: Option<FleetState>,
}

impl FleetChanges {
    pub fn changed_fields(&self) -> Vec<String> {
        let mut fields = self.update.changed_fields();
        if !self.tags.is_empty() {
            fields.push("tags".to_string());
        }
        if self.associate.is_some() || !self.disassociate.is_empty() {
            fields.push("stack".to_string());
        }
        if self.target.is_some() {
            fields.push("state".to_string());
        }
        fields
    }

    pub fn is_empty(&self) -> bool {
        self.changed_fields().is_empty()
    }
}

/// Compare a declared fleet with its remote counterpart
///
/// Optional attributes that are not declared are left as they are remotely.
pub fn diff_fleet(config: &FleetConfig, remote: &FleetRecord) -> FleetChanges {
    let fleet = &remote.fleet;
    let mut update = FleetUpdate::new(&config.name);

    if config.instance_type != fleet.instance_type {
        update.instance_type = Some(config.instance_type.clone());
    }
    if fleet.image_arn.as_deref() != Some(config.image_arn.as_str()) {
        update.image_arn = Some(config.image_arn.clone());
    }
    if fleet.desired_instances != Some(config.desired_instances) {
        update.desired_instances = Some(config.desired_instances);
    }
    update.description = changed(&config.description, &fleet.description);
    update.display_name = changed(&config.display_name, &fleet.display_name);
    update.disconnect_timeout = changed(&config.disconnect_timeout, &fleet.disconnect_timeout);
    update.max_user_duration = changed(&config.max_user_duration, &fleet.max_user_duration);
    update.enable_default_internet_access = changed(
        &config.enable_default_internet_access,
        &fleet.enable_default_internet_access,
    );
    if let Some(vpc) = &config.vpc
        && !same_vpc(vpc, fleet.vpc.as_ref())
    {
        update.vpc = Some(vpc.clone());
    }
    update.domain = changed(&config.domain, &fleet.domain);

    let declared_tags = Tags::from(config.tags.clone());
    let tags = TagDiff::between(&remote.tags, &declared_tags);

    let (disassociate, associate) = match &config.stack_name {
        Some(stack) if !remote.stacks.contains(stack) => (
            remote.stacks.iter().filter(|s| *s != stack).cloned().collect(),
            Some(stack.clone()),
        ),
        _ => (Vec::new(), None),
    };

    let target = config
        .state
        .as_deref()
        .map(FleetState::parse)
        .filter(|target| *target != fleet.state);

    FleetChanges {
        update,
        tags,
        disassociate,
        associate,
        target,
    }
}

fn changed<T: Clone + PartialEq>(declared: &Option<T>, remote: &Option<T>) -> Option<T> {
    match declared {
        Some(value) if remote.as_ref() != Some(value) => Some(value.clone()),
        _ => None,
    }
}

fn same_vpc(declared: &VpcConfig, remote: Option<&VpcConfig>) -> bool {
    let sorted = |ids: &[String]| {
        let mut ids = ids.to_vec();
        ids.sort();
        ids
    };
    remote.is_some_and(|remote| {
        sorted(&declared.subnet_ids) == sorted(&remote.subnet_ids)
            && sorted(&declared.security_group_ids) == sorted(&remote.security_group_ids)
    })
}

/// Fleet CRUD against an [`AppStreamApi`]
pub struct FleetMapper<'a> {
    api: &'a dyn AppStreamApi,
    options: &'a ConvergeOptions,
}

impl<'a> FleetMapper<'a> {
    pub fn new(api: &'a dyn AppStreamApi, options: &'a ConvergeOptions) -> Self {
        Self { api, options }
    }

    /// Read a fleet with its associated stacks and tags; `None` if missing
    pub async fn read(&self, name: &str) -> Result<Option<FleetRecord>> {
        let Some(fleet) = self.api.describe_fleet(name).await? else {
            return Ok(None);
        };
        let stacks = self.api.list_associated_stacks(name).await?;
        let tags = match &fleet.arn {
            Some(arn) => self.api.list_tags(arn).await?.ignore_aws(),
            None => Tags::new(),
        };
        Ok(Some(FleetRecord {
            fleet,
            stacks,
            tags,
        }))
    }

    /// Create → tag → associate
    ///
    /// Returns the declared lifecycle state still to be reached; a new fleet
    /// is always STOPPED.
    pub async fn create(&self, config: &FleetConfig) -> Result<Option<FleetState>> {
        let target = declared_target(config)?;

        tracing::info!("Creating fleet: {}", config.name);
        let created = self.api.create_fleet(config).await?;

        let tags = Tags::from(config.tags.clone()).ignore_aws();
        if !tags.is_empty() {
            let arn = self.arn_of(&created).await?;
            sync_tags(self.api, &arn, &TagDiff::between(&Tags::new(), &tags)).await?;
        }

        if let Some(stack) = &config.stack_name {
            tracing::info!("Associating fleet {} with stack {}", config.name, stack);
            self.api.associate_fleet(&config.name, stack).await?;
        }

        Ok(target.filter(|target| *target != FleetState::Stopped))
    }

    /// Bring an existing fleet's attributes, tags and stack association in
    /// line with `config`
    ///
    /// Returns the lifecycle state still to be reached, if it differs.
    pub async fn update(&self, config: &FleetConfig) -> Result<Option<FleetState>> {
        let record = self
            .read(&config.name)
            .await?
            .ok_or_else(|| CloudError::ResourceNotFound(config.name.clone()))?;
        let changes = diff_fleet(config, &record);
        if changes.is_empty() {
            tracing::debug!("Fleet {} is up to date", config.name);
            return Ok(None);
        }

        if !changes.update.is_empty() {
            tracing::info!(
                "Updating fleet {}: {}",
                config.name,
                changes.update.changed_fields().join(", ")
            );
            self.api.update_fleet(&changes.update).await?;
        }

        if !changes.tags.is_empty() {
            let arn = self.arn_of(&record.fleet).await?;
            sync_tags(self.api, &arn, &changes.tags).await?;
        }

        for stack in &changes.disassociate {
            tracing::info!("Disassociating fleet {} from stack {}", config.name, stack);
            self.api.disassociate_fleet(&config.name, stack).await?;
        }
        if let Some(stack) = &changes.associate {
            tracing::info!("Associating fleet {} with stack {}", config.name, stack);
            self.api.associate_fleet(&config.name, stack).await?;
        }

        Ok(changes.target)
    }

    /// Stop if running (or wait out a stop in progress), disassociate every
    /// stack, delete
    ///
    /// Returns `false` when the fleet did not exist.
    pub async fn delete(&self, name: &str) -> Result<bool> {
        let Some(record) = self.read(name).await? else {
            tracing::debug!("Fleet {} does not exist, nothing to delete", name);
            return Ok(false);
        };

        match record.fleet.state {
            state if state.is_up() => {
                self.converge_to(name, FleetState::Stopped).await?;
            }
            FleetState::Stopping => {
                let control = FleetControl::new(self.api);
                await_state(&control, name, FleetState::Stopped, self.options).await?;
            }
            _ => {}
        }

        for stack in &record.stacks {
            tracing::info!("Disassociating fleet {} from stack {}", name, stack);
            self.api.disassociate_fleet(name, stack).await?;
        }

        tracing::info!("Deleting fleet: {}", name);
        self.api.delete_fleet(name).await?;
        Ok(true)
    }

    /// Drive the fleet's lifecycle state to `target`
    pub async fn converge_to(&self, name: &str, target: FleetState) -> Result<Convergence> {
        let control = FleetControl::new(self.api);
        converge(&control, name, target, self.options).await
    }

    async fn arn_of(&self, fleet: &FleetDescription) -> Result<String> {
        if let Some(arn) = &fleet.arn {
            return Ok(arn.clone());
        }
        self.api
            .describe_fleet(&fleet.name)
            .await?
            .and_then(|f| f.arn)
            .ok_or_else(|| CloudError::ApiError(format!("fleet {} has no ARN", fleet.name)))
    }
}

/// Declared lifecycle target, rejected up front when it can never be reached
/// from a freshly created (stopped) fleet
fn declared_target(config: &FleetConfig) -> Result<Option<FleetState>> {
    match config.state.as_deref() {
        Some(state) => Ok(Some(
            DesiredState::parse(&config.name, state)?.as_fleet_state(),
        )),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        MockAppStream, fleet_config, fleet_description, stack_description,
    };
    use std::time::Duration;

    fn options() -> ConvergeOptions {
        ConvergeOptions::new().with_poll_interval(Duration::from_secs(5))
    }

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_runs_steps_in_order() {
        let api = MockAppStream::new().with_stack(stack_description("analysts"));
        let options = options();
        let mapper = FleetMapper::new(&api, &options);

        let mut config = fleet_config("analysts");
        config.stack_name = Some("analysts".to_string());
        config.state = Some("RUNNING".to_string());
        config.tags.insert("team".to_string(), "data".to_string());

        let target = mapper.create(&config).await.unwrap();
        assert_eq!(target, Some(FleetState::Running));
        mapper.converge_to("analysts", FleetState::Running).await.unwrap();
        let record = mapper.read("analysts").await.unwrap().unwrap();

        assert_eq!(
            api.calls(),
            vec![
                "CreateFleet analysts",
                "TagResource analysts",
                "AssociateFleet analysts analysts",
                "StartFleet analysts",
            ]
        );
        assert_eq!(record.fleet.state, FleetState::Running);
        assert_eq!(record.stacks, vec!["analysts"]);
        assert_eq!(record.tags.get("team"), Some("data"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_without_state_leaves_fleet_stopped() {
        let api = MockAppStream::new();
        let options = options();
        let mapper = FleetMapper::new(&api, &options);

        let target = mapper.create(&fleet_config("batch")).await.unwrap();

        assert_eq!(target, None);
        assert_eq!(api.calls(), vec!["CreateFleet batch"]);
        assert_eq!(api.fleet("batch").unwrap().state, FleetState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_rejects_unsupported_state_before_any_call() {
        let api = MockAppStream::new();
        let options = options();
        let mapper = FleetMapper::new(&api, &options);

        let mut config = fleet_config("analysts");
        config.state = Some("STOPPING".to_string());

        let err = mapper.create(&config).await.unwrap_err();

        assert!(matches!(err, CloudError::UnsupportedState { .. }));
        assert!(api.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_applies_attributes_tags_association_then_state() {
        let api = MockAppStream::new()
            .with_stack(stack_description("old"))
            .with_stack(stack_description("new"))
            .with_fleet(fleet_description("analysts", FleetState::Stopped))
            .with_fleet_tags("analysts", tags(&[("team", "data"), ("legacy", "x")]))
            .with_association("analysts", "old");
        let options = options();
        let mapper = FleetMapper::new(&api, &options);

        let mut config = fleet_config("analysts");
        config.instance_type = "stream.standard.large".to_string();
        config.stack_name = Some("new".to_string());
        config.state = Some("RUNNING".to_string());
        config.tags.insert("team".to_string(), "ops".to_string());

        let target = mapper.update(&config).await.unwrap();
        assert_eq!(target, Some(FleetState::Running));
        mapper.converge_to("analysts", FleetState::Running).await.unwrap();
        let record = mapper.read("analysts").await.unwrap().unwrap();

        assert_eq!(
            api.calls(),
            vec![
                "UpdateFleet analysts",
                "UntagResource analysts",
                "TagResource analysts",
                "DisassociateFleet analysts old",
                "AssociateFleet analysts new",
                "StartFleet analysts",
            ]
        );
        assert_eq!(record.fleet.instance_type, "stream.standard.large");
        assert_eq!(record.fleet.state, FleetState::Running);
        assert_eq!(record.stacks, vec!["new"]);
        assert_eq!(record.tags, tags(&[("team", "ops")]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_without_changes_makes_no_calls() {
        let api = MockAppStream::new().with_fleet(fleet_description("analysts", FleetState::Running));
        let options = options();
        let mapper = FleetMapper::new(&api, &options);

        let mut config = fleet_config("analysts");
        config.state = Some("running".to_string());

        assert_eq!(mapper.update(&config).await.unwrap(), None);
        assert!(api.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_rejects_unsupported_state_after_attributes() {
        let api = MockAppStream::new().with_fleet(fleet_description("analysts", FleetState::Stopped));
        let options = options();
        let mapper = FleetMapper::new(&api, &options);

        let mut config = fleet_config("analysts");
        config.description = Some("Analysts".to_string());
        config.state = Some("STARTING".to_string());

        let target = mapper.update(&config).await.unwrap();
        assert_eq!(target, Some(FleetState::Starting));
        let err = mapper
            .converge_to("analysts", FleetState::Starting)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CloudError::UnsupportedState {
                state: FleetState::Starting,
                ..
            }
        ));
        assert_eq!(api.calls(), vec!["UpdateFleet analysts"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_missing_fleet_is_not_found() {
        let api = MockAppStream::new();
        let options = options();
        let mapper = FleetMapper::new(&api, &options);

        let err = mapper.update(&fleet_config("ghost")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_stops_running_fleet_first() {
        let api = MockAppStream::new()
            .with_stack(stack_description("analysts"))
            .with_fleet(fleet_description("analysts", FleetState::Running))
            .with_association("analysts", "analysts");
        let options = options();
        let mapper = FleetMapper::new(&api, &options);

        assert!(mapper.delete("analysts").await.unwrap());

        assert_eq!(
            api.calls(),
            vec![
                "StopFleet analysts",
                "DisassociateFleet analysts analysts",
                "DeleteFleet analysts",
            ]
        );
        assert!(api.fleet("analysts").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_waits_for_stopping_fleet() {
        let api = MockAppStream::new()
            .with_stack(stack_description("analysts"))
            .with_fleet(fleet_description("analysts", FleetState::Stopping))
            .with_association("analysts", "analysts");
        let options = options();
        let mapper = FleetMapper::new(&api, &options);

        assert!(mapper.delete("analysts").await.unwrap());

        assert_eq!(
            api.calls(),
            vec!["DisassociateFleet analysts analysts", "DeleteFleet analysts"]
        );
        assert!(api.fleet("analysts").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_missing_fleet_is_noop() {
        let api = MockAppStream::new();
        let options = options();
        let mapper = FleetMapper::new(&api, &options);

        assert!(!mapper.delete("ghost").await.unwrap());
        assert!(api.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_start_surfaces_as_transition_rejected() {
        let api = MockAppStream::new()
            .with_fleet(fleet_description("analysts", FleetState::Stopped))
            .fail_on("StartFleet", "LimitExceededException");
        let options = options();
        let mapper = FleetMapper::new(&api, &options);

        let err = mapper
            .converge_to("analysts", FleetState::Running)
            .await
            .unwrap_err();

        assert!(matches!(err, CloudError::TransitionRejected { .. }));
        assert!(err.to_string().contains("LimitExceededException"));
    }

    #[test]
    fn test_diff_ignores_vpc_id_order_and_undeclared_fields() {
        let mut remote = fleet_description("analysts", FleetState::Running);
        remote.description = Some("set remotely".to_string());
        remote.vpc = Some(VpcConfig {
            subnet_ids: vec!["subnet-2".to_string(), "subnet-1".to_string()],
            security_group_ids: vec!["sg-1".to_string()],
        });
        let record = FleetRecord {
            fleet: remote,
            stacks: vec![],
            tags: Tags::new(),
        };

        let mut config = fleet_config("analysts");
        config.vpc = Some(VpcConfig {
            subnet_ids: vec!["subnet-1".to_string(), "subnet-2".to_string()],
            security_group_ids: vec!["sg-1".to_string()],
        });

        assert!(diff_fleet(&config, &record).is_empty());
    }

    #[test]
    fn test_diff_lists_changed_fields() {
        let record = FleetRecord {
            fleet: fleet_description("analysts", FleetState::Stopped),
            stacks: vec![],
            tags: Tags::new(),
        };
        let mut config = fleet_config("analysts");
        config.desired_instances = 3;
        config.stack_name = Some("analysts".to_string());
        config.state = Some("RUNNING".to_string());

        assert_eq!(
            diff_fleet(&config, &record).changed_fields(),
            vec!["desired_instances", "stack", "state"]
        );
    }
}
