//! State mutation engine.
//!
//! Effects never edit a state in place. [`apply_state_change`] clones what it
//! touches and returns the successor, so exploration can branch freely from a
//! shared ancestor.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ids::CharacterId;
use crate::state::{GameState, Pattern, RelationshipStatus, TRUST_MAX, TRUST_MIN};

/// A bundle of independent, optional state operations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StateChange {
    /// Character targeted by the trust, relationship and knowledge operations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character_id: Option<CharacterId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_relationship: Option<RelationshipStatus>,

    /// Added to trust, then clamped to the trust range.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust_change: Option<i32>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub add_global_flags: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remove_global_flags: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub add_knowledge_flags: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remove_knowledge_flags: Vec<String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub pattern_changes: BTreeMap<Pattern, f64>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub set_mysteries: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub skill_changes: BTreeMap<String, f64>,
}

impl StateChange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an effect targeting a character.
    pub fn for_character(character_id: impl Into<CharacterId>) -> Self {
        Self {
            character_id: Some(character_id.into()),
            ..Self::default()
        }
    }

    pub fn with_trust(mut self, delta: i32) -> Self {
        self.trust_change = Some(delta);
        self
    }

    pub fn with_relationship(mut self, status: RelationshipStatus) -> Self {
        self.set_relationship = Some(status);
        self
    }

    pub fn with_global_flag(mut self, flag: impl Into<String>) -> Self {
        self.add_global_flags.push(flag.into());
        self
    }

    pub fn clearing_global_flag(mut self, flag: impl Into<String>) -> Self {
        self.remove_global_flags.push(flag.into());
        self
    }

    pub fn with_knowledge_flag(mut self, flag: impl Into<String>) -> Self {
        self.add_knowledge_flags.push(flag.into());
        self
    }

    pub fn clearing_knowledge_flag(mut self, flag: impl Into<String>) -> Self {
        self.remove_knowledge_flags.push(flag.into());
        self
    }

    /// Add `amount` to a pattern. Repeated calls accumulate.
    pub fn with_pattern(mut self, pattern: Pattern, amount: f64) -> Self {
        *self.pattern_changes.entry(pattern).or_default() += amount;
        self
    }

    pub fn with_mystery(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_mysteries.insert(key.into(), value.into());
        self
    }

    pub fn with_skill(mut self, skill: impl Into<String>, amount: f64) -> Self {
        *self.skill_changes.entry(skill.into()).or_default() += amount;
        self
    }

    fn touches_character(&self) -> bool {
        self.set_relationship.is_some()
            || self.trust_change.is_some()
            || !self.add_knowledge_flags.is_empty()
            || !self.remove_knowledge_flags.is_empty()
    }
}

/// Apply one effect, returning the successor state.
///
/// Operations run in a fixed order: relationship, trust, global flags (adds
/// then removes), knowledge flags (adds then removes), patterns, mysteries,
/// skills. Character operations without a `character_id` are ignored.
pub fn apply_state_change(state: &GameState, change: &StateChange) -> GameState {
    let mut next = state.clone();

    match &change.character_id {
        Some(character_id) if change.touches_character() => {
            let character = next.characters.entry(character_id.clone()).or_default();

            if let Some(status) = change.set_relationship {
                character.relationship = status;
            }

            if let Some(delta) = change.trust_change {
                character.trust = character.trust.saturating_add(delta).clamp(TRUST_MIN, TRUST_MAX);
            }

            character
                .knowledge_flags
                .extend(change.add_knowledge_flags.iter().cloned());
            for flag in &change.remove_knowledge_flags {
                character.knowledge_flags.remove(flag);
            }
        }
        None if change.touches_character() => {
            tracing::debug!(?change, "character effect without character_id ignored");
        }
        _ => {}
    }

    next.global_flags.extend(change.add_global_flags.iter().cloned());
    for flag in &change.remove_global_flags {
        next.global_flags.remove(flag);
    }

    for (pattern, amount) in &change.pattern_changes {
        next.patterns = next.patterns.incremented(*pattern, *amount);
    }

    for (key, value) in &change.set_mysteries {
        next.mysteries.insert(key.clone(), value.clone());
    }

    for (skill, amount) in &change.skill_changes {
        *next.skills.entry(skill.clone()).or_default() += amount;
    }

    next
}

/// Apply effects in declared order, each against the previous result.
pub fn apply_state_changes<'a, I>(state: &GameState, changes: I) -> GameState
where
    I: IntoIterator<Item = &'a StateChange>,
{
    changes
        .into_iter()
        .fold(state.clone(), |acc, change| apply_state_change(&acc, change))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::CharacterState;
    use proptest::prelude::*;

    fn samuel() -> CharacterId {
        CharacterId::from("samuel")
    }

    #[test]
    fn test_apply_does_not_mutate_input() {
        let mut state = GameState::new();
        state.characters.insert(
            samuel(),
            CharacterState {
                trust: 4,
                ..Default::default()
            },
        );
        state.global_flags.insert("met_samuel".to_string());
        let before = state.clone();

        let change = StateChange::for_character("samuel")
            .with_trust(3)
            .with_knowledge_flag("knows_the_platform")
            .clearing_global_flag("met_samuel")
            .with_pattern(Pattern::Patience, 1.0);
        let next = apply_state_change(&state, &change);

        assert_eq!(state, before);
        assert_eq!(state.trust(&samuel()), 4);
        assert!(state.has_global_flag("met_samuel"));
        assert_eq!(next.trust(&samuel()), 7);
        assert!(!next.has_global_flag("met_samuel"));
        assert!(next.character(&samuel()).knows("knows_the_platform"));
    }

    #[test]
    fn test_trust_clamps_at_max() {
        let mut state = GameState::new();
        state.characters.insert(
            samuel(),
            CharacterState {
                trust: 9,
                ..Default::default()
            },
        );
        let plus_one = StateChange::for_character("samuel").with_trust(1);

        state = apply_state_change(&state, &plus_one);
        assert_eq!(state.trust(&samuel()), 10);
        for _ in 0..5 {
            state = apply_state_change(&state, &plus_one);
            assert_eq!(state.trust(&samuel()), TRUST_MAX);
        }
    }

    #[test]
    fn test_trust_clamps_at_min() {
        let state = GameState::new();
        let minus_one = StateChange::for_character("samuel").with_trust(-1);

        let next = apply_state_change(&state, &minus_one);
        assert_eq!(next.trust(&samuel()), TRUST_MIN);
    }

    #[test]
    fn test_adding_flag_twice_is_idempotent() {
        let state = GameState::new();
        let add = StateChange::new().with_global_flag("met_samuel");

        let once = apply_state_change(&state, &add);
        let twice = apply_state_change(&once, &add);

        assert_eq!(once.global_flags, twice.global_flags);
        assert_eq!(twice.global_flags.len(), 1);
    }

    #[test]
    fn test_fractional_pattern_increments() {
        let state = GameState::new();
        let change = StateChange::new()
            .with_pattern(Pattern::Analytical, 0.5)
            .with_pattern(Pattern::Analytical, 0.25)
            .with_pattern(Pattern::Exploring, 2.0);

        let next = apply_state_change(&state, &change);
        assert_eq!(next.patterns.analytical, 0.75);
        assert_eq!(next.patterns.exploring, 2.0);
        assert_eq!(next.patterns.helping, 0.0);
    }

    #[test]
    fn test_relationship_mysteries_and_skills() {
        let state = GameState::new();
        let change = StateChange::for_character("samuel")
            .with_relationship(RelationshipStatus::Confidant)
            .with_mystery("letter_sender", "samuel")
            .with_skill("active_listening", 1.5);

        let next = apply_state_change(&state, &change);
        assert_eq!(next.character(&samuel()).relationship, RelationshipStatus::Confidant);
        assert_eq!(next.mysteries.get("letter_sender").map(String::as_str), Some("samuel"));
        assert_eq!(next.skill("active_listening"), 1.5);
    }

    #[test]
    fn test_character_effect_without_target_is_ignored() {
        let state = GameState::new();
        let change = StateChange::new().with_trust(5).with_global_flag("still_applies");

        let next = apply_state_change(&state, &change);
        assert!(next.characters.is_empty());
        assert!(next.has_global_flag("still_applies"));
    }

    #[test]
    fn test_effect_list_order_matters() {
        let state = GameState::new();
        let add_then_remove = [
            StateChange::new().with_global_flag("door_open"),
            StateChange::new().clearing_global_flag("door_open"),
        ];
        let remove_then_add = [
            StateChange::new().clearing_global_flag("door_open"),
            StateChange::new().with_global_flag("door_open"),
        ];

        assert!(!apply_state_changes(&state, &add_then_remove).has_global_flag("door_open"));
        assert!(apply_state_changes(&state, &remove_then_add).has_global_flag("door_open"));
    }

    #[test]
    fn test_effect_list_clamps_between_steps() {
        let state = GameState::new();
        // The first step clamps at 0, so the second lands on 2 rather than 0.
        let effects = [
            StateChange::for_character("samuel").with_trust(-3),
            StateChange::for_character("samuel").with_trust(2),
        ];

        assert_eq!(apply_state_changes(&state, &effects).trust(&samuel()), 2);
    }

    proptest! {
        #[test]
        fn prop_trust_stays_in_range(start in TRUST_MIN..=TRUST_MAX, deltas in prop::collection::vec(-20i32..20, 0..30)) {
            let mut state = GameState::new();
            state.characters.insert(samuel(), CharacterState { trust: start, ..Default::default() });

            for delta in deltas {
                state = apply_state_change(&state, &StateChange::for_character("samuel").with_trust(delta));
                prop_assert!((TRUST_MIN..=TRUST_MAX).contains(&state.trust(&samuel())));
            }
        }

        #[test]
        fn prop_apply_never_mutates_input(delta in -20i32..20, amount in 0.0f64..5.0, flag in "[a-z]{1,8}") {
            let mut state = GameState::new();
            state.global_flags.insert("met_samuel".to_string());
            let before = state.clone();

            let change = StateChange::for_character("samuel")
                .with_trust(delta)
                .with_global_flag(flag.clone())
                .clearing_global_flag("met_samuel")
                .with_pattern(Pattern::Building, amount);
            let _ = apply_state_change(&state, &change);

            prop_assert_eq!(state, before);
        }
    }
}
