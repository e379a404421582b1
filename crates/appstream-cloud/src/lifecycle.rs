//! Fleet lifecycle states and transitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state reported for a fleet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FleetState {
    Starting,
    Running,
    Stopping,
    Stopped,
    /// Any value the provider reports that is not one of the above
    #[default]
    Unknown,
}

impl FleetState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FleetState::Starting => "STARTING",
            FleetState::Running => "RUNNING",
            FleetState::Stopping => "STOPPING",
            FleetState::Stopped => "STOPPED",
            FleetState::Unknown => "UNKNOWN",
        }
    }

    /// Parse a state string, mapping unrecognized values to `Unknown`
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "STARTING" => FleetState::Starting,
            "RUNNING" => FleetState::Running,
            "STOPPING" => FleetState::Stopping,
            "STOPPED" => FleetState::Stopped,
            _ => FleetState::Unknown,
        }
    }

    /// Whether the fleet is running or on its way there
    pub fn is_up(&self) -> bool {
        matches!(self, FleetState::Running | FleetState::Starting)
    }
}

impl fmt::Display for FleetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for FleetState {
    fn from(value: &str) -> Self {
        FleetState::parse(value)
    }
}

impl std::str::FromStr for FleetState {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(FleetState::parse(value))
    }
}

/// Lifecycle target a caller may request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DesiredState {
    Running,
    Stopped,
}

impl DesiredState {
    /// Parse a declared `state` value for `resource`
    pub fn parse(resource: &str, value: &str) -> crate::error::Result<Self> {
        DesiredState::try_from(FleetState::parse(value)).map_err(|state| {
            crate::error::CloudError::UnsupportedState {
                resource: resource.to_string(),
                state,
            }
        })
    }

    /// The transition that moves a fleet toward this state
    pub fn action(&self) -> TransitionAction {
        match self {
            DesiredState::Running => TransitionAction::Start,
            DesiredState::Stopped => TransitionAction::Stop,
        }
    }

    pub fn as_fleet_state(&self) -> FleetState {
        match self {
            DesiredState::Running => FleetState::Running,
            DesiredState::Stopped => FleetState::Stopped,
        }
    }
}

impl TryFrom<FleetState> for DesiredState {
    type Error = FleetState;

    fn try_from(state: FleetState) -> Result<Self, Self::Error> {
        match state {
            FleetState::Running => Ok(DesiredState::Running),
            FleetState::Stopped => Ok(DesiredState::Stopped),
            other => Err(other),
        }
    }
}

impl fmt::Display for DesiredState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_fleet_state().fmt(f)
    }
}

/// Lifecycle action sent to the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionAction {
    Start,
    Stop,
}

impl fmt::Display for TransitionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionAction::Start => write!(f, "start"),
            TransitionAction::Stop => write!(f, "stop"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(FleetState::parse("running"), FleetState::Running);
        assert_eq!(FleetState::parse(" STOPPED "), FleetState::Stopped);
        assert_eq!(FleetState::parse("Starting"), FleetState::Starting);
    }

    #[test]
    fn test_unrecognized_state_is_unknown() {
        assert_eq!(FleetState::parse("PAUSED"), FleetState::Unknown);
        assert_eq!(FleetState::parse(""), FleetState::Unknown);
    }

    #[test]
    fn test_desired_state_only_accepts_running_and_stopped() {
        assert_eq!(
            DesiredState::try_from(FleetState::Running),
            Ok(DesiredState::Running)
        );
        assert_eq!(
            DesiredState::try_from(FleetState::Stopping),
            Err(FleetState::Stopping)
        );
    }

    #[test]
    fn test_desired_state_parse_rejects_transitional_values() {
        assert_eq!(
            DesiredState::parse("analysts", "running").unwrap(),
            DesiredState::Running
        );
        let err = DesiredState::parse("analysts", "STARTING").unwrap_err();
        assert!(matches!(
            err,
            crate::error::CloudError::UnsupportedState {
                state: FleetState::Starting,
                ..
            }
        ));
    }

    #[test]
    fn test_desired_state_action() {
        assert_eq!(DesiredState::Running.action(), TransitionAction::Start);
        assert_eq!(DesiredState::Stopped.action(), TransitionAction::Stop);
    }

    #[test]
    fn test_state_serializes_in_upper_case() {
        let json = serde_json::to_string(&FleetState::Running).unwrap();
        assert_eq!(json, "\"RUNNING\"");
    }
}
