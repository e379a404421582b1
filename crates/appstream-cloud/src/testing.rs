//! Scripted [`FleetLifecycle`] for tests
//!
//! Each fleet replays a list of observations in order; the last entry is
//! repeated once the script runs out.

use crate::converge::FleetLifecycle;
use crate::error::{CloudError, Result};
use crate::lifecycle::{FleetState, TransitionAction};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// One scripted answer to `observe`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    State(FleetState),
    Missing,
    Error(String),
}

#[derive(Default)]
pub struct ScriptedLifecycle {
    scripts: Mutex<HashMap<String, VecDeque<Observation>>>,
    observe_calls: Mutex<HashMap<String, u32>>,
    transitions: Mutex<Vec<(String, TransitionAction)>>,
    reject_with: Option<String>,
}

impl ScriptedLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, fleet: &str, observations: impl IntoIterator<Item = Observation>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(fleet.to_string(), observations.into_iter().collect());
        self
    }

    /// Make every transition request fail with `message`
    pub fn reject_transitions(mut self, message: &str) -> Self {
        self.reject_with = Some(message.to_string());
        self
    }

    pub fn observe_count(&self, fleet: &str) -> u32 {
        self.observe_calls
            .lock()
            .unwrap()
            .get(fleet)
            .copied()
            .unwrap_or(0)
    }

    /// Every transition requested, including rejected ones
    pub fn transitions(&self) -> Vec<(String, TransitionAction)> {
        self.transitions.lock().unwrap().clone()
    }
}

#[async_trait]
impl FleetLifecycle for ScriptedLifecycle {
    async fn observe(&self, fleet: &str) -> Result<Option<FleetState>> {
        *self
            .observe_calls
            .lock()
            .unwrap()
            .entry(fleet.to_string())
            .or_insert(0) += 1;

        let mut scripts = self.scripts.lock().unwrap();
        let observation = match scripts.get_mut(fleet) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };

        match observation {
            Some(Observation::State(state)) => Ok(Some(state)),
            Some(Observation::Missing) | None => Ok(None),
            Some(Observation::Error(message)) => Err(CloudError::ApiError(message)),
        }
    }

    async fn request_transition(&self, fleet: &str, action: TransitionAction) -> Result<()> {
        self.transitions
            .lock()
            .unwrap()
            .push((fleet.to_string(), action));
        match &self.reject_with {
            Some(message) => Err(CloudError::ApiError(message.clone())),
            None => Ok(()),
        }
    }
}
