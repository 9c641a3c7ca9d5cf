//! Moving along an edge: which choices a player can take and what taking one does.
//!
//! Runtime navigation and offline simulation both go through these functions
//! so that a simulated path and a played path produce the same state.

use serde::{Deserialize, Serialize};

use crate::conditions::ConditionEvaluator;
use crate::effects::apply_state_changes;
use crate::graph::{Choice, DialogueGraph, DialogueNode};
use crate::ids::CharacterId;
use crate::state::GameState;

/// How a choice presents against a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceAvailability {
    /// Not shown at all.
    Hidden,
    /// Shown but cannot be taken.
    Disabled,
    Available,
}

impl ChoiceAvailability {
    pub fn is_available(&self) -> bool {
        matches!(self, ChoiceAvailability::Available)
    }
}

/// Predicate subject for a graph: its owning character, else the player's
/// current character, else the empty id (which reads as a stranger).
pub fn subject_for(graph: &DialogueGraph, state: &GameState) -> CharacterId {
    graph
        .character_id
        .clone()
        .or_else(|| state.current_character_id.clone())
        .unwrap_or_default()
}

/// Classify a choice against a state.
pub fn choice_availability(
    evaluator: &ConditionEvaluator<'_>,
    choice: &Choice,
    state: &GameState,
    subject: &CharacterId,
) -> ChoiceAvailability {
    if !evaluator.is_met(choice.visible_condition.as_ref(), state, subject) {
        ChoiceAvailability::Hidden
    } else if !evaluator.is_met(choice.enabled_condition.as_ref(), state, subject) {
        ChoiceAvailability::Disabled
    } else {
        ChoiceAvailability::Available
    }
}

/// Choices the player can actually take, in choice-id order.
pub fn available_choices<'n>(
    evaluator: &ConditionEvaluator<'_>,
    node: &'n DialogueNode,
    state: &GameState,
    subject: &CharacterId,
) -> Vec<&'n Choice> {
    node.sorted_choices()
        .into_iter()
        .filter(|choice| choice_availability(evaluator, choice, state, subject).is_available())
        .collect()
}

/// State after entering `node`: its `on_enter` effects in declared order.
pub fn apply_on_enter(state: &GameState, node: &DialogueNode) -> GameState {
    apply_state_changes(state, &node.on_enter)
}

/// State after taking `choice` out of `node`: the consequence, the pattern
/// reinforcement, then the node's `on_exit` effects.
pub fn apply_choice(state: &GameState, node: &DialogueNode, choice: &Choice) -> GameState {
    let after_choice = apply_state_changes(state, &choice.effects());
    apply_state_changes(&after_choice, &node.on_exit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::{NumericRange, StateCondition};
    use crate::effects::StateChange;
    use crate::state::Pattern;

    fn samuel() -> CharacterId {
        CharacterId::from("samuel")
    }

    #[test]
    fn test_hidden_vs_disabled() {
        let evaluator = ConditionEvaluator::default();
        let state = GameState::new();

        let hidden = Choice::new("secret", "b").visible_when(StateCondition::new().with_global_flag("never"));
        let disabled = Choice::new("locked", "b").enabled_when(StateCondition::new().with_trust(NumericRange::at_least(5)));
        let open = Choice::new("open", "b");

        assert_eq!(choice_availability(&evaluator, &hidden, &state, &samuel()), ChoiceAvailability::Hidden);
        assert_eq!(choice_availability(&evaluator, &disabled, &state, &samuel()), ChoiceAvailability::Disabled);
        assert_eq!(choice_availability(&evaluator, &open, &state, &samuel()), ChoiceAvailability::Available);
    }

    #[test]
    fn test_available_choices_sorted_and_filtered() {
        let evaluator = ConditionEvaluator::default();
        let node = DialogueNode::new("hub")
            .with_choice(Choice::new("z_leave", "end"))
            .with_choice(Choice::new("m_locked", "end").enabled_when(StateCondition::new().with_global_flag("key")))
            .with_choice(Choice::new("a_ask", "end"));

        let ids: Vec<_> = available_choices(&evaluator, &node, &GameState::new(), &samuel())
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a_ask", "z_leave"]);
    }

    #[test]
    fn test_apply_choice_order() {
        let node = DialogueNode::new("hub")
            .on_exit(StateChange::new().clearing_global_flag("in_conversation"))
            .with_choice(
                Choice::new("help", "end")
                    .with_consequence(StateChange::for_character("samuel").with_trust(2))
                    .with_pattern(Pattern::Helping),
            );
        let mut state = GameState::new();
        state.global_flags.insert("in_conversation".to_string());

        let next = apply_choice(&state, &node, &node.choices[0]);
        assert_eq!(next.trust(&samuel()), 2);
        assert_eq!(next.patterns.helping, 1.0);
        assert!(!next.has_global_flag("in_conversation"));
        assert!(state.has_global_flag("in_conversation"));
    }

    #[test]
    fn test_subject_falls_back_to_current_character() {
        let scene = DialogueGraph::new("platform_meeting", "start");
        let mut state = GameState::new();
        assert_eq!(subject_for(&scene, &state), CharacterId::default());

        state.current_character_id = Some(CharacterId::from("maya"));
        assert_eq!(subject_for(&scene, &state), CharacterId::from("maya"));

        let owned = DialogueGraph::new("samuel", "start").for_character("samuel");
        assert_eq!(subject_for(&owned, &state), samuel());
    }
}
