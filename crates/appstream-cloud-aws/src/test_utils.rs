//! In-memory [`AppStreamApi`] for tests
//!
//! Fleets move through STARTING / STOPPING like the real service: after a
//! start or stop request they report the transitional state for
//! `transition_polls` describe calls before settling.

use crate::api::{AppStreamApi, FleetDescription, FleetUpdate, StackDescription, StackUpdate};
use appstream_cloud::{CloudError, FleetState, Result, Tags};
use appstream_core::{FleetConfig, StackConfig};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

const MOCK_ARN_PREFIX: &str = "arn:aws:appstream:mock-1:000000000000";

struct MockFleet {
    description: FleetDescription,
    stacks: Vec<String>,
    tags: Tags,
    /// Target state and describe calls left before reaching it
    pending: Option<(FleetState, u32)>,
}

struct MockStack {
    description: StackDescription,
    tags: Tags,
}

/// Mock AppStream backend
pub struct MockAppStream {
    fleets: Mutex<BTreeMap<String, MockFleet>>,
    stacks: Mutex<BTreeMap<String, MockStack>>,
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<String, String>>,
    describe_calls: Mutex<u32>,
    transition_polls: u32,
}

impl Default for MockAppStream {
    fn default() -> Self {
        Self {
            fleets: Mutex::new(BTreeMap::new()),
            stacks: Mutex::new(BTreeMap::new()),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            describe_calls: Mutex::new(0),
            transition_polls: 2,
        }
    }
}

pub fn fleet_arn(name: &str) -> String {
    format!("{}:fleet/{}", MOCK_ARN_PREFIX, name)
}

pub fn stack_arn(name: &str) -> String {
    format!("{}:stack/{}", MOCK_ARN_PREFIX, name)
}

/// A declared fleet with the fields every test needs
pub fn fleet_config(name: &str) -> FleetConfig {
    FleetConfig::new(
        name,
        "stream.standard.small",
        "arn:aws:appstream:mock-1::image/Base",
    )
}

/// A remote fleet matching [`fleet_config`]
pub fn fleet_description(name: &str, state: FleetState) -> FleetDescription {
    FleetDescription {
        name: name.to_string(),
        arn: Some(fleet_arn(name)),
        state,
        instance_type: "stream.standard.small".to_string(),
        image_arn: Some("arn:aws:appstream:mock-1::image/Base".to_string()),
        desired_instances: Some(1),
        ..Default::default()
    }
}

/// A remote stack with no optional attributes set
pub fn stack_description(name: &str) -> StackDescription {
    StackDescription {
        name: name.to_string(),
        arn: Some(stack_arn(name)),
        ..Default::default()
    }
}

impl MockAppStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Describe calls a fleet stays in STARTING / STOPPING
    pub fn with_transition_polls(mut self, polls: u32) -> Self {
        self.transition_polls = polls;
        self
    }

    /// Seed a fleet; STARTING / STOPPING fleets settle like a real transition
    pub fn with_fleet(self, description: FleetDescription) -> Self {
        let pending = match description.state {
            FleetState::Starting => Some((FleetState::Running, self.transition_polls)),
            FleetState::Stopping => Some((FleetState::Stopped, self.transition_polls)),
            _ => None,
        };
        self.fleets.lock().unwrap().insert(
            description.name.clone(),
            MockFleet {
                description,
                stacks: Vec::new(),
                tags: Tags::new(),
                pending,
            },
        );
        self
    }

    pub fn with_stack(self, description: StackDescription) -> Self {
        self.stacks.lock().unwrap().insert(
            description.name.clone(),
            MockStack {
                description,
                tags: Tags::new(),
            },
        );
        self
    }

    pub fn with_fleet_tags(self, fleet: &str, tags: Tags) -> Self {
        if let Some(f) = self.fleets.lock().unwrap().get_mut(fleet) {
            f.tags = tags;
        }
        self
    }

    pub fn with_association(self, fleet: &str, stack: &str) -> Self {
        if let Some(f) = self.fleets.lock().unwrap().get_mut(fleet) {
            f.stacks.push(stack.to_string());
        }
        self
    }

    /// Make `operation` (e.g. "StartFleet") fail with `message`
    pub fn fail_on(self, operation: &str, message: &str) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(operation.to_string(), message.to_string());
        self
    }

    /// Mutating calls in the order they were made, e.g. "StartFleet analysts"
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn describe_calls(&self) -> u32 {
        *self.describe_calls.lock().unwrap()
    }

    pub fn fleet(&self, name: &str) -> Option<FleetDescription> {
        self.fleets
            .lock()
            .unwrap()
            .get(name)
            .map(|f| f.description.clone())
    }

    pub fn fleet_tags(&self, name: &str) -> Tags {
        self.fleets
            .lock()
            .unwrap()
            .get(name)
            .map(|f| f.tags.clone())
            .unwrap_or_default()
    }

    pub fn associations(&self, fleet: &str) -> Vec<String> {
        self.fleets
            .lock()
            .unwrap()
            .get(fleet)
            .map(|f| f.stacks.clone())
            .unwrap_or_default()
    }

    pub fn stack(&self, name: &str) -> Option<StackDescription> {
        self.stacks
            .lock()
            .unwrap()
            .get(name)
            .map(|s| s.description.clone())
    }

    pub fn stack_tags(&self, name: &str) -> Tags {
        self.stacks
            .lock()
            .unwrap()
            .get(name)
            .map(|s| s.tags.clone())
            .unwrap_or_default()
    }

    fn record(&self, operation: &str, target: &str) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", operation, target));
        match self.failures.lock().unwrap().get(operation) {
            Some(message) => Err(CloudError::ApiError(message.clone())),
            None => Ok(()),
        }
    }

    fn begin_transition(&self, name: &str, via: FleetState, target: FleetState) -> Result<()> {
        let mut fleets = self.fleets.lock().unwrap();
        let fleet = fleets
            .get_mut(name)
            .ok_or_else(|| CloudError::ResourceNotFound(name.to_string()))?;
        fleet.description.state = via;
        fleet.pending = Some((target, self.transition_polls));
        Ok(())
    }

    fn with_tags_by_arn<T>(&self, arn: &str, f: impl FnOnce(&mut Tags) -> T) -> Result<T> {
        let mut fleets = self.fleets.lock().unwrap();
        if let Some(fleet) = fleets
            .values_mut()
            .find(|x| x.description.arn.as_deref() == Some(arn))
        {
            return Ok(f(&mut fleet.tags));
        }
        let mut stacks = self.stacks.lock().unwrap();
        if let Some(stack) = stacks
            .values_mut()
            .find(|x| x.description.arn.as_deref() == Some(arn))
        {
            return Ok(f(&mut stack.tags));
        }
        Err(CloudError::ResourceNotFound(arn.to_string()))
    }
}

fn resource_name(arn: &str) -> &str {
    arn.rsplit('/').next().unwrap_or(arn)
}

#[async_trait]
impl AppStreamApi for MockAppStream {
    fn region(&self) -> Option<&str> {
        Some("mock-1")
    }

    async fn list_fleets(&self) -> Result<Vec<FleetDescription>> {
        Ok(self
            .fleets
            .lock()
            .unwrap()
            .values()
            .map(|f| f.description.clone())
            .collect())
    }

    async fn describe_fleet(&self, name: &str) -> Result<Option<FleetDescription>> {
        *self.describe_calls.lock().unwrap() += 1;
        if let Some(message) = self.failures.lock().unwrap().get("DescribeFleets") {
            return Err(CloudError::ApiError(message.clone()));
        }

        let mut fleets = self.fleets.lock().unwrap();
        let Some(fleet) = fleets.get_mut(name) else {
            return Ok(None);
        };
        if let Some((target, remaining)) = fleet.pending {
            if remaining == 0 {
                fleet.description.state = target;
                fleet.pending = None;
            } else {
                fleet.pending = Some((target, remaining - 1));
            }
        }
        Ok(Some(fleet.description.clone()))
    }

    async fn create_fleet(&self, config: &FleetConfig) -> Result<FleetDescription> {
        self.record("CreateFleet", &config.name)?;
        let mut fleets = self.fleets.lock().unwrap();
        if fleets.contains_key(&config.name) {
            return Err(CloudError::ResourceAlreadyExists(config.name.clone()));
        }
        let description = FleetDescription {
            name: config.name.clone(),
            arn: Some(fleet_arn(&config.name)),
            state: FleetState::Stopped,
            instance_type: config.instance_type.clone(),
            image_arn: Some(config.image_arn.clone()),
            fleet_type: config.fleet_type.clone(),
            desired_instances: Some(config.desired_instances),
            description: config.description.clone(),
            display_name: config.display_name.clone(),
            disconnect_timeout: config.disconnect_timeout,
            max_user_duration: config.max_user_duration,
            enable_default_internet_access: config.enable_default_internet_access,
            vpc: config.vpc.clone(),
            domain: config.domain.clone(),
        };
        fleets.insert(
            config.name.clone(),
            MockFleet {
                description: description.clone(),
                stacks: Vec::new(),
                tags: Tags::new(),
                pending: None,
            },
        );
        Ok(description)
    }

    async fn update_fleet(&self, update: &FleetUpdate) -> Result<()> {
        self.record("UpdateFleet", &update.name)?;
        let mut fleets = self.fleets.lock().unwrap();
        let fleet = fleets
            .get_mut(&update.name)
            .ok_or_else(|| CloudError::ResourceNotFound(update.name.clone()))?;
        let d = &mut fleet.description;
        if let Some(v) = &update.instance_type {
            d.instance_type = v.clone();
        }
        if let Some(v) = &update.image_arn {
            d.image_arn = Some(v.clone());
        }
        if let Some(v) = update.desired_instances {
            d.desired_instances = Some(v);
        }
        if let Some(v) = &update.description {
            d.description = Some(v.clone());
        }
        if let Some(v) = &update.display_name {
            d.display_name = Some(v.clone());
        }
        if let Some(v) = update.disconnect_timeout {
            d.disconnect_timeout = Some(v);
        }
        if let Some(v) = update.max_user_duration {
            d.max_user_duration = Some(v);
        }
        if let Some(v) = update.enable_default_internet_access {
            d.enable_default_internet_access = Some(v);
        }
        if let Some(v) = &update.vpc {
            d.vpc = Some(v.clone());
        }
        if let Some(v) = &update.domain {
            d.domain = Some(v.clone());
        }
        Ok(())
    }

    async fn start_fleet(&self, name: &str) -> Result<()> {
        self.record("StartFleet", name)?;
        self.begin_transition(name, FleetState::Starting, FleetState::Running)
    }

    async fn stop_fleet(&self, name: &str) -> Result<()> {
        self.record("StopFleet", name)?;
        self.begin_transition(name, FleetState::Stopping, FleetState::Stopped)
    }

    async fn delete_fleet(&self, name: &str) -> Result<()> {
        self.record("DeleteFleet", name)?;
        let mut fleets = self.fleets.lock().unwrap();
        let fleet = fleets
            .get(name)
            .ok_or_else(|| CloudError::ResourceNotFound(name.to_string()))?;
        if fleet.description.state != FleetState::Stopped {
            return Err(CloudError::ApiError(format!(
                "fleet {} is {}, stop it before deleting",
                name, fleet.description.state
            )));
        }
        if !fleet.stacks.is_empty() {
            return Err(CloudError::ApiError(format!(
                "fleet {} is still associated with {:?}",
                name, fleet.stacks
            )));
        }
        fleets.remove(name);
        Ok(())
    }

    async fn associate_fleet(&self, fleet: &str, stack: &str) -> Result<()> {
        self.record("AssociateFleet", &format!("{} {}", fleet, stack))?;
        if !self.stacks.lock().unwrap().contains_key(stack) {
            return Err(CloudError::ResourceNotFound(stack.to_string()));
        }
        let mut fleets = self.fleets.lock().unwrap();
        let f = fleets
            .get_mut(fleet)
            .ok_or_else(|| CloudError::ResourceNotFound(fleet.to_string()))?;
        if !f.stacks.iter().any(|s| s == stack) {
            f.stacks.push(stack.to_string());
        }
        Ok(())
    }

    async fn disassociate_fleet(&self, fleet: &str, stack: &str) -> Result<()> {
        self.record("DisassociateFleet", &format!("{} {}", fleet, stack))?;
        let mut fleets = self.fleets.lock().unwrap();
        let f = fleets
            .get_mut(fleet)
            .ok_or_else(|| CloudError::ResourceNotFound(fleet.to_string()))?;
        f.stacks.retain(|s| s != stack);
        Ok(())
    }

    async fn list_associated_stacks(&self, fleet: &str) -> Result<Vec<String>> {
        Ok(self.associations(fleet))
    }

    async fn describe_stack(&self, name: &str) -> Result<Option<StackDescription>> {
        Ok(self.stack(name))
    }

    async fn create_stack(&self, config: &StackConfig) -> Result<StackDescription> {
        self.record("CreateStack", &config.name)?;
        let mut stacks = self.stacks.lock().unwrap();
        if stacks.contains_key(&config.name) {
            return Err(CloudError::ResourceAlreadyExists(config.name.clone()));
        }
        let description = StackDescription {
            name: config.name.clone(),
            arn: Some(stack_arn(&config.name)),
            description: config.description.clone(),
            display_name: config.display_name.clone(),
            feedback_url: config.feedback_url.clone(),
            redirect_url: config.redirect_url.clone(),
            storage_connectors: config.storage_connectors.clone(),
            user_settings: config.user_settings.clone(),
        };
        stacks.insert(
            config.name.clone(),
            MockStack {
                description: description.clone(),
                tags: Tags::new(),
            },
        );
        Ok(description)
    }

    async fn update_stack(&self, update: &StackUpdate) -> Result<()> {
        self.record("UpdateStack", &update.name)?;
        let mut stacks = self.stacks.lock().unwrap();
        let stack = stacks
            .get_mut(&update.name)
            .ok_or_else(|| CloudError::ResourceNotFound(update.name.clone()))?;
        let d = &mut stack.description;
        if let Some(v) = &update.description {
            d.description = Some(v.clone());
        }
        if let Some(v) = &update.display_name {
            d.display_name = Some(v.clone());
        }
        if let Some(v) = &update.feedback_url {
            d.feedback_url = Some(v.clone());
        }
        if let Some(v) = &update.redirect_url {
            d.redirect_url = Some(v.clone());
        }
        if let Some(v) = &update.storage_connectors {
            d.storage_connectors = v.clone();
        }
        if let Some(v) = &update.user_settings {
            d.user_settings = v.clone();
        }
        Ok(())
    }

    async fn delete_stack(&self, name: &str) -> Result<()> {
        self.record("DeleteStack", name)?;
        let in_use = self
            .fleets
            .lock()
            .unwrap()
            .values()
            .any(|f| f.stacks.iter().any(|s| s == name));
        if in_use {
            return Err(CloudError::ApiError(format!(
                "stack {} is still associated with a fleet",
                name
            )));
        }
        self.stacks
            .lock()
            .unwrap()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| CloudError::ResourceNotFound(name.to_string()))
    }

    async fn list_tags(&self, arn: &str) -> Result<Tags> {
        self.with_tags_by_arn(arn, |tags| tags.clone())
    }

    async fn tag_resource(&self, arn: &str, tags: &Tags) -> Result<()> {
        self.record("TagResource", resource_name(arn))?;
        self.with_tags_by_arn(arn, |current| {
            *current = current.merge(tags);
        })
    }

    async fn untag_resource(&self, arn: &str, keys: &[String]) -> Result<()> {
        self.record("UntagResource", resource_name(arn))?;
        self.with_tags_by_arn(arn, |current| {
            *current = current
                .iter()
                .filter(|(k, _)| !keys.contains(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
        })
    }
}
