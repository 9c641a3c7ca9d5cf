//! Runtime navigation - one player step at a time.
//!
//! The UI layer asks which choices to show, then hands back the id the player
//! picked. Every step goes through the same transition functions the
//! verifier uses, so a replayed path reproduces its state exactly.

use thiserror::Error;

use story_rules::{
    apply_choice, apply_on_enter, choice_availability, is_sentinel, subject_for, Choice,
    ChoiceAvailability, GameState, NodeId,
};

use crate::registry::{GraphRegistry, NodeOwner};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("node '{0}' is not defined in any graph")]
    NodeNotFound(NodeId),

    #[error("node '{0}' cannot be entered in the current state")]
    RequirementNotMet(NodeId),

    #[error("node '{node}' has no choice '{choice}'")]
    ChoiceNotFound { node: NodeId, choice: String },

    #[error("choice '{choice}' on node '{node}' is not visible")]
    ChoiceHidden { node: NodeId, choice: String },

    #[error("choice '{choice}' on node '{node}' is disabled")]
    ChoiceDisabled { node: NodeId, choice: String },

    #[error("control was deferred to '{0}' before the path ended")]
    Deferred(NodeId),
}

/// A choice as the player sees it.
#[derive(Debug, Clone, Copy)]
pub struct ChoiceView<'a> {
    pub choice: &'a Choice,
    pub enabled: bool,
}

/// The player standing on a node.
#[derive(Debug, Clone)]
pub struct Entered {
    pub owner: NodeOwner,
    pub node_id: NodeId,
    pub state: GameState,
}

/// What happened after a choice.
#[derive(Debug, Clone)]
pub enum Transition {
    Entered(Entered),
    /// The choice targeted a sentinel; the runtime takes over.
    Deferred { sentinel: NodeId, state: GameState },
}

impl Transition {
    pub fn state(&self) -> &GameState {
        match self {
            Transition::Entered(entered) => &entered.state,
            Transition::Deferred { state, .. } => state,
        }
    }
}

/// Step-by-step access to a registry for runtime consumers.
#[derive(Debug, Clone, Copy)]
pub struct Navigator<'a> {
    registry: &'a GraphRegistry,
}

impl<'a> Navigator<'a> {
    pub fn new(registry: &'a GraphRegistry) -> Self {
        Self { registry }
    }

    /// Enter a node: check its requirement and apply its `on_enter` effects.
    pub fn enter(&self, node_id: &str, state: &GameState) -> Result<Entered, NavigationError> {
        let owner = self
            .registry
            .find_owner_of_node(node_id, state)
            .ok_or_else(|| NavigationError::NodeNotFound(NodeId::from(node_id)))?;
        let node = owner
            .graph
            .node(node_id)
            .ok_or_else(|| NavigationError::NodeNotFound(NodeId::from(node_id)))?;

        let subject = subject_for(&owner.graph, state);
        if !self
            .registry
            .evaluator()
            .is_met(node.required_state.as_ref(), state, &subject)
        {
            return Err(NavigationError::RequirementNotMet(node.id.clone()));
        }

        let entered = apply_on_enter(state, node).at_node(owner.character_id.clone(), node.id.clone());
        Ok(Entered {
            node_id: node.id.clone(),
            state: entered,
            owner,
        })
    }

    /// Visible choices on the player's node in authored order, each marked
    /// enabled or not. Hidden choices are left out.
    pub fn visible_choices<'e>(&self, at: &'e Entered) -> Vec<ChoiceView<'e>> {
        let Some(node) = at.owner.graph.node(&at.node_id) else {
            return Vec::new();
        };
        let evaluator = self.registry.evaluator();
        let subject = subject_for(&at.owner.graph, &at.state);

        node.choices
            .iter()
            .filter_map(|choice| match choice_availability(&evaluator, choice, &at.state, &subject) {
                ChoiceAvailability::Hidden => None,
                ChoiceAvailability::Disabled => Some(ChoiceView {
                    choice,
                    enabled: false,
                }),
                ChoiceAvailability::Available => Some(ChoiceView {
                    choice,
                    enabled: true,
                }),
            })
            .collect()
    }

    /// Take a choice from the player's current node.
    pub fn choose(&self, at: &Entered, choice_id: &str) -> Result<Transition, NavigationError> {
        let node = at
            .owner
            .graph
            .node(&at.node_id)
            .ok_or_else(|| NavigationError::NodeNotFound(at.node_id.clone()))?;
        let choice = node
            .choice(choice_id)
            .ok_or_else(|| NavigationError::ChoiceNotFound {
                node: node.id.clone(),
                choice: choice_id.to_string(),
            })?;

        let subject = subject_for(&at.owner.graph, &at.state);
        match choice_availability(&self.registry.evaluator(), choice, &at.state, &subject) {
            ChoiceAvailability::Hidden => {
                return Err(NavigationError::ChoiceHidden {
                    node: node.id.clone(),
                    choice: choice.id.clone(),
                })
            }
            ChoiceAvailability::Disabled => {
                return Err(NavigationError::ChoiceDisabled {
                    node: node.id.clone(),
                    choice: choice.id.clone(),
                })
            }
            ChoiceAvailability::Available => {}
        }

        let next = apply_choice(&at.state, node, choice);
        if is_sentinel(choice.next_node_id.as_str()) {
            return Ok(Transition::Deferred {
                sentinel: choice.next_node_id.clone(),
                state: next,
            });
        }

        self.enter(choice.next_node_id.as_str(), &next)
            .map(Transition::Entered)
    }

    /// Enter `start` and take each choice in turn.
    pub fn replay<S: AsRef<str>>(
        &self,
        start: &str,
        state: &GameState,
        choices: &[S],
    ) -> Result<Transition, NavigationError> {
        let mut current = Transition::Entered(self.enter(start, state)?);

        for choice_id in choices {
            current = match current {
                Transition::Entered(at) => self.choose(&at, choice_id.as_ref())?,
                Transition::Deferred { sentinel, .. } => return Err(NavigationError::Deferred(sentinel)),
            };
        }

        Ok(current)
    }
}
