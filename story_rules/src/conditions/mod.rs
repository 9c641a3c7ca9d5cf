//! State conditions - the predicates gating node entry and choice visibility.
//!
//! A condition is a conjunction of optional clauses. An omitted clause holds
//! vacuously and an omitted condition holds unconditionally. There is no OR
//! and no generic negation; the `lacks_*` clauses are the only negative form.

mod combos;
mod strictness;

pub use combos::*;
pub use strictness::guard_implies;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ids::CharacterId;
use crate::state::{GameState, Pattern, RelationshipStatus, SkillLevels};

/// Inclusive numeric bounds. A missing bound is open.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericRange<T> {
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub min: Option<T>,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub max: Option<T>,
}

impl<T> Default for NumericRange<T> {
    fn default() -> Self {
        Self { min: None, max: None }
    }
}

impl<T: PartialOrd + Copy> NumericRange<T> {
    pub fn at_least(min: T) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub fn at_most(max: T) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    pub fn between(min: T, max: T) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn contains(&self, value: T) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

/// A predicate over [`GameState`], evaluated relative to a subject character.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StateCondition {
    /// Subject's trust.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust: Option<NumericRange<i32>>,

    /// Subject's relationship must be at least this close.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<RelationshipStatus>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub has_global_flags: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lacks_global_flags: Vec<String>,

    /// Knowledge flags held by the subject.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub has_knowledge_flags: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lacks_knowledge_flags: Vec<String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub patterns: BTreeMap<Pattern, NumericRange<f64>>,

    /// Missing skills read as level 0.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub skills: BTreeMap<String, NumericRange<f64>>,

    /// Exact mystery values. A missing key never matches.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub mysteries: BTreeMap<String, String>,

    /// Every named combo must be unlocked.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub has_combos: Vec<String>,
}

impl StateCondition {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no clause is set.
    pub fn is_unconditional(&self) -> bool {
        self == &Self::default()
    }

    pub fn with_trust(mut self, range: NumericRange<i32>) -> Self {
        self.trust = Some(range);
        self
    }

    pub fn with_relationship(mut self, status: RelationshipStatus) -> Self {
        self.relationship = Some(status);
        self
    }

    pub fn with_global_flag(mut self, flag: impl Into<String>) -> Self {
        self.has_global_flags.push(flag.into());
        self
    }

    pub fn without_global_flag(mut self, flag: impl Into<String>) -> Self {
        self.lacks_global_flags.push(flag.into());
        self
    }

    pub fn with_knowledge_flag(mut self, flag: impl Into<String>) -> Self {
        self.has_knowledge_flags.push(flag.into());
        self
    }

    pub fn without_knowledge_flag(mut self, flag: impl Into<String>) -> Self {
        self.lacks_knowledge_flags.push(flag.into());
        self
    }

    pub fn with_pattern(mut self, pattern: Pattern, range: NumericRange<f64>) -> Self {
        self.patterns.insert(pattern, range);
        self
    }

    pub fn with_skill(mut self, skill: impl Into<String>, range: NumericRange<f64>) -> Self {
        self.skills.insert(skill.into(), range);
        self
    }

    pub fn with_mystery(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.mysteries.insert(key.into(), value.into());
        self
    }

    pub fn with_combo(mut self, combo: impl Into<String>) -> Self {
        self.has_combos.push(combo.into());
        self
    }
}

/// Evaluates conditions against a combo registry.
#[derive(Debug, Clone, Copy)]
pub struct ConditionEvaluator<'a> {
    combos: &'a ComboRegistry,
}

impl Default for ConditionEvaluator<'static> {
    fn default() -> Self {
        Self::new(ComboRegistry::builtin())
    }
}

impl<'a> ConditionEvaluator<'a> {
    pub fn new(combos: &'a ComboRegistry) -> Self {
        Self { combos }
    }

    pub fn combos(&self) -> &'a ComboRegistry {
        self.combos
    }

    /// Evaluate `condition` for `subject`, reading skill levels from `skills`.
    pub fn evaluate(
        &self,
        condition: Option<&StateCondition>,
        state: &GameState,
        subject: &CharacterId,
        skills: &SkillLevels,
    ) -> bool {
        let Some(condition) = condition else {
            return true;
        };

        let character = state.characters.get(subject);
        let trust = character.map(|c| c.trust).unwrap_or(crate::state::TRUST_MIN);
        let relationship = character.map(|c| c.relationship).unwrap_or_default();
        let knows = |flag: &String| character.map_or(false, |c| c.knows(flag));

        if let Some(range) = &condition.trust {
            if !range.contains(trust) {
                return false;
            }
        }

        if let Some(minimum) = condition.relationship {
            if relationship < minimum {
                return false;
            }
        }

        if !condition.has_global_flags.iter().all(|f| state.has_global_flag(f)) {
            return false;
        }
        if condition.lacks_global_flags.iter().any(|f| state.has_global_flag(f)) {
            return false;
        }

        if !condition.has_knowledge_flags.iter().all(|f| knows(f)) {
            return false;
        }
        if condition.lacks_knowledge_flags.iter().any(|f| knows(f)) {
            return false;
        }

        let patterns_hold = condition
            .patterns
            .iter()
            .all(|(pattern, range)| range.contains(state.patterns.get(*pattern)));
        if !patterns_hold {
            return false;
        }

        let skills_hold = condition.skills.iter().all(|(skill, range)| {
            range.contains(skills.get(skill).copied().unwrap_or(0.0))
        });
        if !skills_hold {
            return false;
        }

        let mysteries_hold = condition
            .mysteries
            .iter()
            .all(|(key, value)| state.mysteries.get(key) == Some(value));
        if !mysteries_hold {
            return false;
        }

        condition
            .has_combos
            .iter()
            .all(|combo| self.combos.is_unlocked(combo, &state.patterns))
    }

    /// Evaluate using the state's own skill levels.
    pub fn is_met(
        &self,
        condition: Option<&StateCondition>,
        state: &GameState,
        subject: &CharacterId,
    ) -> bool {
        self.evaluate(condition, state, subject, &state.skills)
    }
}

/// Evaluate a condition against the built-in combo set.
pub fn evaluate(
    condition: Option<&StateCondition>,
    state: &GameState,
    subject: &CharacterId,
    skills: &SkillLevels,
) -> bool {
    ConditionEvaluator::default().evaluate(condition, state, subject, skills)
}
