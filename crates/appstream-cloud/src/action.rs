//! Planned actions for AppStream resources

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Kind of resource an action targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Stack,
    Fleet,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Stack => "stack",
            ResourceKind::Fleet => "fleet",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents a planned action for a resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// Unique identifier for the action (e.g. "create-fleet-analysts")
    pub id: String,

    pub action_type: ActionType,

    pub kind: ResourceKind,

    /// Resource name
    pub resource_id: String,

    /// Human readable description
    pub description: String,

    /// Attribute names that differ from the remote resource
    #[serde(default)]
    pub changes: Vec<String>,

    /// Declared configuration to apply (absent for deletes)
    #[serde(default)]
    pub config: Option<serde_json::Value>,
}

impl Action {
    pub fn new(action_type: ActionType, kind: ResourceKind, resource_id: impl Into<String>) -> Self {
        let resource_id = resource_id.into();
        Self {
            id: format!("{}-{}-{}", action_type, kind, resource_id),
            description: format!("{} {} {}", action_type, kind, resource_id),
            action_type,
            kind,
            resource_id,
            changes: Vec::new(),
            config: None,
        }
    }

    pub fn with_changes(mut self, changes: Vec<String>) -> Self {
        if !changes.is_empty() {
            self.description = format!("{} ({})", self.description, changes.join(", "));
        }
        self.changes = changes;
        self
    }

    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = Some(config);
        self
    }

    /// Execution rank: stacks are set up before fleets and torn down after them
    fn rank(&self) -> u8 {
        match (self.action_type, self.kind) {
            (ActionType::Delete, ResourceKind::Fleet) => 0,
            (ActionType::Delete, ResourceKind::Stack) => 1,
            (_, ResourceKind::Stack) => 2,
            (_, ResourceKind::Fleet) => 3,
        }
    }
}

/// Type of action to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Create,
    Update,
    Delete,
    /// No changes needed
    NoOp,
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionType::Create => write!(f, "create"),
            ActionType::Update => write!(f, "update"),
            ActionType::Delete => write!(f, "delete"),
            ActionType::NoOp => write!(f, "no-op"),
        }
    }
}

/// Result of applying actions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyResult {
    pub succeeded: Vec<ActionResult>,

    pub failed: Vec<ActionResult>,

    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl ApplyResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn add_success(&mut self, action_id: String, message: String) {
        self.succeeded.push(ActionResult {
            action_id,
            success: true,
            message,
            error: None,
        });
    }

    pub fn add_failure(&mut self, action_id: String, error: String) {
        self.failed.push(ActionResult {
            action_id,
            success: false,
            message: String::new(),
            error: Some(error),
        });
    }
}

/// Result of a single action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub action_id: String,

    pub success: bool,

    pub message: String,

    pub error: Option<String>,
}

/// Plan containing all actions to be applied, in execution order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub actions: Vec<Action>,

    pub has_changes: bool,
}

impl Plan {
    /// Build a plan; actions are sorted into execution order
    pub fn new(mut actions: Vec<Action>) -> Self {
        actions.sort_by(|a, b| match a.rank().cmp(&b.rank()) {
            Ordering::Equal => a.resource_id.cmp(&b.resource_id),
            other => other,
        });
        let has_changes = actions.iter().any(|a| a.action_type != ActionType::NoOp);
        Self {
            actions,
            has_changes,
        }
    }

    pub fn empty() -> Self {
        Self {
            actions: Vec::new(),
            has_changes: false,
        }
    }

    pub fn actions_by_type(&self, action_type: ActionType) -> Vec<&Action> {
        self.actions
            .iter()
            .filter(|a| a.action_type == action_type)
            .collect()
    }

    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            create: self.actions_by_type(ActionType::Create).len(),
            update: self.actions_by_type(ActionType::Update).len(),
            delete: self.actions_by_type(ActionType::Delete).len(),
            no_change: self.actions_by_type(ActionType::NoOp).len(),
        }
    }
}

/// Summary of planned actions
#[derive(Debug, Clone)]
pub struct PlanSummary {
    pub create: usize,
    pub update: usize,
    pub delete: usize,
    pub no_change: usize,
}

impl fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to create, {} to update, {} to delete, {} unchanged",
            self.create, self.update, self.delete, self.no_change
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_orders_stacks_before_fleets() {
        let plan = Plan::new(vec![
            Action::new(ActionType::Create, ResourceKind::Fleet, "analysts"),
            Action::new(ActionType::Create, ResourceKind::Stack, "analysts"),
            Action::new(ActionType::Delete, ResourceKind::Stack, "old"),
            Action::new(ActionType::Delete, ResourceKind::Fleet, "old"),
        ]);

        let order: Vec<(ActionType, ResourceKind)> =
            plan.actions.iter().map(|a| (a.action_type, a.kind)).collect();
        assert_eq!(
            order,
            vec![
                (ActionType::Delete, ResourceKind::Fleet),
                (ActionType::Delete, ResourceKind::Stack),
                (ActionType::Create, ResourceKind::Stack),
                (ActionType::Create, ResourceKind::Fleet),
            ]
        );
    }

    #[test]
    fn test_noop_plan_has_no_changes() {
        let plan = Plan::new(vec![Action::new(
            ActionType::NoOp,
            ResourceKind::Fleet,
            "analysts",
        )]);
        assert!(!plan.has_changes);
        assert_eq!(
            plan.summary().to_string(),
            "0 to create, 0 to update, 0 to delete, 1 unchanged"
        );
    }

    #[test]
    fn test_action_description_lists_changes() {
        let action = Action::new(ActionType::Update, ResourceKind::Fleet, "analysts")
            .with_changes(vec!["instance_type".to_string(), "tags".to_string()]);
        assert_eq!(action.id, "update-fleet-analysts");
        assert_eq!(
            action.description,
            "update fleet analysts (instance_type, tags)"
        );
    }
}
