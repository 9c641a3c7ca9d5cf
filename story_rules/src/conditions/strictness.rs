//! Structural implication between conditions.
//!
//! Used by the guarding check: an edge guard must be at least as strict as
//! the requirement of the node it leads to. The comparison is clause by
//! clause and purely syntactic, so it may reject guards that imply the
//! requirement only through combos or pattern arithmetic.
//!
//! Trust, relationship and knowledge clauses read the predicate subject. A
//! guard evaluated against a different character than the requirement says
//! nothing about them, so callers drop those clauses first with
//! [`StateCondition::without_subject_clauses`].

use std::collections::BTreeMap;

use super::{NumericRange, StateCondition};

impl<T: PartialOrd + Copy> NumericRange<T> {
    /// True when every value inside `self` is also inside `other`.
    pub fn is_within(&self, other: &NumericRange<T>) -> bool {
        let min_ok = match (other.min, self.min) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(required), Some(own)) => own >= required,
        };
        let max_ok = match (other.max, self.max) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(required), Some(own)) => own <= required,
        };
        min_ok && max_ok
    }
}

fn ranges_within<K: Ord, T: PartialOrd + Copy>(
    own: &BTreeMap<K, NumericRange<T>>,
    required: &BTreeMap<K, NumericRange<T>>,
) -> bool {
    required
        .iter()
        .all(|(key, range)| own.get(key).map_or(false, |own| own.is_within(range)))
}

fn covers(own: &[String], required: &[String]) -> bool {
    required.iter().all(|flag| own.contains(flag))
}

impl StateCondition {
    /// Copy keeping only the clauses that read the whole state.
    pub fn without_subject_clauses(&self) -> StateCondition {
        StateCondition {
            trust: None,
            relationship: None,
            has_knowledge_flags: Vec::new(),
            lacks_knowledge_flags: Vec::new(),
            ..self.clone()
        }
    }

    /// Check that any state satisfying `self` also satisfies `required`.
    pub fn is_at_least_as_strict_as(&self, required: &StateCondition) -> bool {
        if let Some(range) = &required.trust {
            match &self.trust {
                Some(own) if own.is_within(range) => {}
                _ => return false,
            }
        }

        if let Some(minimum) = required.relationship {
            match self.relationship {
                Some(own) if own >= minimum => {}
                _ => return false,
            }
        }

        covers(&self.has_global_flags, &required.has_global_flags)
            && covers(&self.lacks_global_flags, &required.lacks_global_flags)
            && covers(&self.has_knowledge_flags, &required.has_knowledge_flags)
            && covers(&self.lacks_knowledge_flags, &required.lacks_knowledge_flags)
            && covers(&self.has_combos, &required.has_combos)
            && ranges_within(&self.patterns, &required.patterns)
            && ranges_within(&self.skills, &required.skills)
            && required
                .mysteries
                .iter()
                .all(|(key, value)| self.mysteries.get(key) == Some(value))
    }
}

/// Guard check for an optional edge condition against an optional requirement.
///
/// No requirement is always satisfied; no guard only satisfies an empty one.
pub fn guard_implies(guard: Option<&StateCondition>, required: Option<&StateCondition>) -> bool {
    match (guard, required) {
        (_, None) => true,
        (None, Some(required)) => required.is_unconditional(),
        (Some(guard), Some(required)) => guard.is_at_least_as_strict_as(required),
    }
}
