//! AppStream provider implementation

use crate::api::AppStreamApi;
use crate::control::FleetControl;
use crate::fleet::{FleetMapper, FleetRecord, diff_fleet};
use crate::stack::{StackMapper, StackRecord, diff_stack};
use appstream_cloud::{
    Action, ActionType, ApplyResult, AuthStatus, CloudError, CloudProvider, ConvergeOptions,
    Convergence, DesiredState, FleetState, Plan, ProviderState, ResourceConfig, ResourceKind,
    ResourceSet, ResourceState, ResourceStatus, Result, converge_all,
};
use appstream_core::{DEFAULT_PROVIDER, FleetConfig, Project, ProviderConfig, StackConfig};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// First-pass outcome of one plan action
enum Applied {
    Done(String),
    /// Attributes and associations are in place; lifecycle state still owed
    Converging { message: String, target: FleetState },
}

/// AWS AppStream 2.0 provider
pub struct AppStreamProvider {
    api: Arc<dyn AppStreamApi>,
    options: ConvergeOptions,
}

impl AppStreamProvider {
    pub fn new(api: Arc<dyn AppStreamApi>, options: ConvergeOptions) -> Self {
        Self { api, options }
    }

    pub fn options(&self) -> &ConvergeOptions {
        &self.options
    }

    fn fleets(&self) -> FleetMapper<'_> {
        FleetMapper::new(self.api.as_ref(), &self.options)
    }

    fn stacks(&self) -> StackMapper<'_> {
        StackMapper::new(self.api.as_ref())
    }

    /// Start or stop a single fleet and wait for it to settle
    pub async fn set_fleet_state(&self, name: &str, state: DesiredState) -> Result<Convergence> {
        self.fleets().converge_to(name, state.as_fleet_state()).await
    }

    async fn plan_stack(&self, resource: &ResourceConfig) -> Result<Action> {
        let config: StackConfig = resource.parse_config()?;
        let action = match self.stacks().read(&config.name).await? {
            None => Action::new(ActionType::Create, ResourceKind::Stack, &config.name),
            Some(record) => {
                let changes = diff_stack(&config, &record);
                if changes.is_empty() {
                    Action::new(ActionType::NoOp, ResourceKind::Stack, &config.name)
                } else {
                    Action::new(ActionType::Update, ResourceKind::Stack, &config.name)
                        .with_changes(changes.changed_fields())
                }
            }
        };
        Ok(action.with_config(resource.config.clone()))
    }

    async fn plan_fleet(&self, resource: &ResourceConfig) -> Result<Action> {
        let config: FleetConfig = resource.parse_config()?;
        let action = match self.fleets().read(&config.name).await? {
            None => Action::new(ActionType::Create, ResourceKind::Fleet, &config.name),
            Some(record) => {
                let changes = diff_fleet(&config, &record);
                if changes.is_empty() {
                    Action::new(ActionType::NoOp, ResourceKind::Fleet, &config.name)
                } else {
                    Action::new(ActionType::Update, ResourceKind::Fleet, &config.name)
                        .with_changes(changes.changed_fields())
                }
            }
        };
        Ok(action.with_config(resource.config.clone()))
    }

    async fn apply_action(&self, action: &Action) -> Result<Applied> {
        let config = || {
            action.config.clone().ok_or_else(|| {
                CloudError::InvalidConfig(format!("action {} carries no configuration", action.id))
            })
        };

        match (action.action_type, action.kind) {
            (ActionType::NoOp, _) => Ok(Applied::Done(format!(
                "{} {} is up to date",
                action.kind, action.resource_id
            ))),
            (ActionType::Create, ResourceKind::Stack) => {
                let config: StackConfig = serde_json::from_value(config()?)?;
                let record = self.stacks().create(&config).await?;
                Ok(Applied::Done(format!("Created stack {}", record.stack.name)))
            }
            (ActionType::Update, ResourceKind::Stack) => {
                let config: StackConfig = serde_json::from_value(config()?)?;
                let record = self.stacks().update(&config).await?;
                Ok(Applied::Done(format!("Updated stack {}", record.stack.name)))
            }
            (ActionType::Create, ResourceKind::Fleet) => {
                let config: FleetConfig = serde_json::from_value(config()?)?;
                let target = self.fleets().create(&config).await?;
                Ok(fleet_applied(format!("Created fleet {}", config.name), target))
            }
            (ActionType::Update, ResourceKind::Fleet) => {
                let config: FleetConfig = serde_json::from_value(config()?)?;
                let target = self.fleets().update(&config).await?;
                Ok(fleet_applied(format!("Updated fleet {}", config.name), target))
            }
            (ActionType::Delete, kind) => {
                self.delete(kind, &action.resource_id).await?;
                Ok(Applied::Done(format!("Deleted {} {}", kind, action.resource_id)))
            }
        }
    }

    async fn delete(&self, kind: ResourceKind, name: &str) -> Result<bool> {
        match kind {
            ResourceKind::Fleet => self.fleets().delete(name).await,
            ResourceKind::Stack => self.stacks().delete(name).await,
        }
    }
}

fn fleet_applied(message: String, target: Option<FleetState>) -> Applied {
    match target {
        Some(target) => Applied::Converging { message, target },
        None => Applied::Done(message),
    }
}

fn cancelled(description: &str) -> CloudError {
    CloudError::Cancelled(format!("{} skipped", description))
}

fn fleet_state(record: &FleetRecord) -> ResourceState {
    let fleet = &record.fleet;
    let mut state = ResourceState::new(&fleet.name, ResourceKind::Fleet)
        .with_status(ResourceStatus::from(fleet.state))
        .with_attribute("instance_type", serde_json::json!(fleet.instance_type))
        .with_attribute("stacks", serde_json::json!(record.stacks));
    if let Some(arn) = &fleet.arn {
        state = state.with_arn(arn);
    }
    if let Some(desired) = fleet.desired_instances {
        state.set_attribute("desired_instances", serde_json::json!(desired));
    }
    if let Some(image) = &fleet.image_arn {
        state.set_attribute("image_arn", serde_json::json!(image));
    }
    state
}

fn stack_state(record: &StackRecord) -> ResourceState {
    let mut state =
        ResourceState::new(&record.stack.name, ResourceKind::Stack).with_status(ResourceStatus::Active);
    if let Some(arn) = &record.stack.arn {
        state = state.with_arn(arn);
    }
    state
}

#[async_trait]
impl CloudProvider for AppStreamProvider {
    fn name(&self) -> &str {
        DEFAULT_PROVIDER
    }

    fn display_name(&self) -> &str {
        "AWS AppStream 2.0"
    }

    async fn check_auth(&self) -> Result<AuthStatus> {
        match self.api.list_fleets().await {
            Ok(fleets) => Ok(AuthStatus::ok(format!(
                "region {} ({} fleets visible)",
                self.api.region().unwrap_or("default"),
                fleets.len()
            ))),
            Err(e) => Ok(AuthStatus::failed(e.to_string())),
        }
    }

    async fn get_state(&self, managed: &ResourceSet) -> Result<ProviderState> {
        let mut state = ProviderState::new();

        for resource in managed.by_kind(ResourceKind::Stack) {
            if let Some(record) = self.stacks().read(&resource.id).await? {
                state.add(stack_state(&record));
            }
        }
        for resource in managed.by_kind(ResourceKind::Fleet) {
            if let Some(record) = self.fleets().read(&resource.id).await? {
                state.add(fleet_state(&record));
            }
        }

        Ok(state)
    }

    async fn plan(&self, desired: &ResourceSet) -> Result<Plan> {
        let mut actions = Vec::new();
        for resource in desired.by_kind(ResourceKind::Stack) {
            actions.push(self.plan_stack(resource).await?);
        }
        for resource in desired.by_kind(ResourceKind::Fleet) {
            actions.push(self.plan_fleet(resource).await?);
        }
        Ok(Plan::new(actions))
    }

    async fn apply(&self, plan: &Plan) -> Result<ApplyResult> {
        let mut result = ApplyResult::new();
        let start = Instant::now();

        // Attributes and associations first, one action at a time
        let mut converging = Vec::new();
        for action in &plan.actions {
            if self.options.cancel.is_cancelled() {
                let err = cancelled(&action.description);
                tracing::warn!("{}", err);
                result.add_failure(action.id.clone(), err.to_string());
                continue;
            }
            match self.apply_action(action).await {
                Ok(Applied::Done(message)) => {
                    tracing::info!("{}", message);
                    result.add_success(action.id.clone(), message);
                }
                Ok(Applied::Converging { message, target }) => {
                    tracing::info!("{}", message);
                    converging.push((action, message, target));
                }
                Err(e) => {
                    tracing::error!("{} failed: {}", action.description, e);
                    result.add_failure(action.id.clone(), e.to_string());
                }
            }
        }

        // Then every pending lifecycle change concurrently
        if !converging.is_empty() {
            let targets: Vec<_> = converging
                .iter()
                .map(|(action, _, target)| (action.resource_id.clone(), *target))
                .collect();
            let control = FleetControl::new(self.api.as_ref());
            let outcomes = converge_all(&control, &targets, &self.options).await;
            for ((action, message, _), outcome) in converging.into_iter().zip(outcomes) {
                match outcome {
                    Ok(convergence) => {
                        let message = format!("{} ({})", message, convergence.state);
                        tracing::info!("{}", message);
                        result.add_success(action.id.clone(), message);
                    }
                    Err(e) => {
                        tracing::error!("{} failed: {}", action.description, e);
                        result.add_failure(action.id.clone(), e.to_string());
                    }
                }
            }
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }

    async fn destroy(&self, resource: &ResourceConfig) -> Result<()> {
        if !self.delete(resource.kind, &resource.id).await? {
            tracing::warn!("{} {} was already gone", resource.kind, resource.id);
        }
        Ok(())
    }

    async fn destroy_all(&self, managed: &ResourceSet) -> Result<ApplyResult> {
        let mut result = ApplyResult::new();
        let start = Instant::now();

        let targets = managed
            .by_kind(ResourceKind::Fleet)
            .into_iter()
            .chain(managed.by_kind(ResourceKind::Stack));
        for resource in targets {
            let action = Action::new(ActionType::Delete, resource.kind, &resource.id);
            if self.options.cancel.is_cancelled() {
                let err = cancelled(&action.description);
                tracing::warn!("{}", err);
                result.add_failure(action.id, err.to_string());
                continue;
            }
            match self.delete(resource.kind, &resource.id).await {
                Ok(true) => result.add_success(
                    action.id,
                    format!("Deleted {} {}", resource.kind, resource.id),
                ),
                Ok(false) => result.add_success(
                    action.id,
                    format!("{} {} was already gone", resource.kind, resource.id),
                ),
                Err(e) => result.add_failure(action.id, e.to_string()),
            }
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }
}

/// Declared stacks and fleets of a project as provider resources
pub fn resources_from_project(project: &Project) -> Result<ResourceSet> {
    let provider = project.provider();
    let mut set = ResourceSet::new();
    for stack in project.stacks.values() {
        set.add(ResourceConfig::new(
            ResourceKind::Stack,
            &stack.name,
            &provider.name,
            serde_json::to_value(stack)?,
        ));
    }
    for fleet in project.fleets.values() {
        set.add(ResourceConfig::new(
            ResourceKind::Fleet,
            &fleet.name,
            &provider.name,
            serde_json::to_value(fleet)?,
        ));
    }
    Ok(set)
}

/// Convergence tuning from a `provider` block; unset values keep the defaults
pub fn converge_options(provider: &ProviderConfig) -> ConvergeOptions {
    let mut options = ConvergeOptions::new();
    if let Some(secs) = provider.poll_interval {
        options = options.with_poll_interval(Duration::from_secs(secs));
    }
    if let Some(attempts) = provider.max_attempts {
        options = options.with_max_attempts(attempts);
    }
    if let Some(secs) = provider.converge_timeout {
        options = options.with_timeout(Some(Duration::from_secs(secs)));
    }
    if let Some(retries) = provider.observation_retries {
        options = options.with_observation_retries(retries);
    }
    options
}
