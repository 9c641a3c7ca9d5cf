//! Choices - the player-selectable edges between nodes.

use serde::{Deserialize, Serialize};

use crate::conditions::StateCondition;
use crate::effects::StateChange;
use crate::ids::NodeId;
use crate::state::Pattern;

/// A transition from one node to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    /// Unique within the owning node.
    pub id: String,

    /// Player-facing label. Opaque to the engine.
    #[serde(default)]
    pub text: String,

    pub next_node_id: NodeId,

    /// Hidden entirely when false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_condition: Option<StateCondition>,

    /// Shown but inert when false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_condition: Option<StateCondition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consequence: Option<StateChange>,

    /// Pattern reinforced by taking this choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<Pattern>,
}

impl Choice {
    /// Create an unconditional choice leading to `next_node_id`.
    pub fn new(id: impl Into<String>, next_node_id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            text: String::new(),
            next_node_id: next_node_id.into(),
            visible_condition: None,
            enabled_condition: None,
            consequence: None,
            pattern: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn visible_when(mut self, condition: StateCondition) -> Self {
        self.visible_condition = Some(condition);
        self
    }

    pub fn enabled_when(mut self, condition: StateCondition) -> Self {
        self.enabled_condition = Some(condition);
        self
    }

    pub fn with_consequence(mut self, consequence: StateChange) -> Self {
        self.consequence = Some(consequence);
        self
    }

    pub fn with_pattern(mut self, pattern: Pattern) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// Effects produced by taking this choice, in application order:
    /// the consequence first, then the pattern reinforcement.
    pub fn effects(&self) -> Vec<StateChange> {
        let mut effects = Vec::with_capacity(2);
        if let Some(consequence) = &self.consequence {
            effects.push(consequence.clone());
        }
        if let Some(pattern) = self.pattern {
            effects.push(StateChange::new().with_pattern(pattern, 1.0));
        }
        effects
    }
}
