//! Dialogue node definitions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::Choice;
use crate::conditions::StateCondition;
use crate::effects::StateChange;
use crate::ids::NodeId;

/// One block of narrative payload. The engine never inspects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(default)]
    pub speaker: Option<String>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,

    // Renderer-specific extras
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, serde_json::Value>,
}

impl ContentBlock {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            speaker: None,
            text: text.into(),
            emotion: None,
            extra: HashMap::new(),
        }
    }

    pub fn spoken_by(mut self, speaker: impl Into<String>) -> Self {
        self.speaker = Some(speaker.into());
        self
    }
}

/// A single dialogue beat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueNode {
    pub id: NodeId,

    #[serde(default)]
    pub content: Vec<ContentBlock>,

    #[serde(default)]
    pub choices: Vec<Choice>,

    /// Must hold for the node to be entered at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_state: Option<StateCondition>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on_enter: Vec<StateChange>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on_exit: Vec<StateChange>,

    /// A designed stop even when choices exist (e.g. every exit is gated on
    /// content the player may not have unlocked yet).
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_terminal: bool,
}

impl DialogueNode {
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            content: Vec::new(),
            choices: Vec::new(),
            required_state: None,
            on_enter: Vec::new(),
            on_exit: Vec::new(),
            is_terminal: false,
        }
    }

    pub fn with_content(mut self, block: ContentBlock) -> Self {
        self.content.push(block);
        self
    }

    pub fn with_choice(mut self, choice: Choice) -> Self {
        self.choices.push(choice);
        self
    }

    pub fn requires(mut self, condition: StateCondition) -> Self {
        self.required_state = Some(condition);
        self
    }

    pub fn on_enter(mut self, effect: StateChange) -> Self {
        self.on_enter.push(effect);
        self
    }

    pub fn on_exit(mut self, effect: StateChange) -> Self {
        self.on_exit.push(effect);
        self
    }

    pub fn terminal(mut self) -> Self {
        self.is_terminal = true;
        self
    }

    /// True when reaching this node is a designed stop.
    pub fn is_designed_terminal(&self) -> bool {
        self.is_terminal || self.choices.is_empty()
    }

    pub fn choice(&self, id: &str) -> Option<&Choice> {
        self.choices.iter().find(|c| c.id == id)
    }

    /// Choices in id order, the order traversal expands them in.
    pub fn sorted_choices(&self) -> Vec<&Choice> {
        let mut choices: Vec<_> = self.choices.iter().collect();
        choices.sort_by(|a, b| a.id.cmp(&b.id));
        choices
    }
}
