//! Behavioral pattern counters.

use serde::{Deserialize, Serialize};

/// The five behavioral patterns a player accumulates through choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    Analytical,
    Patience,
    Exploring,
    Helping,
    Building,
}

impl Pattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pattern::Analytical => "analytical",
            Pattern::Patience => "patience",
            Pattern::Exploring => "exploring",
            Pattern::Helping => "helping",
            Pattern::Building => "building",
        }
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Independently accumulated pattern counters. Never negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PatternCounters {
    #[serde(default)]
    pub analytical: f64,
    #[serde(default)]
    pub patience: f64,
    #[serde(default)]
    pub exploring: f64,
    #[serde(default)]
    pub helping: f64,
    #[serde(default)]
    pub building: f64,
}

impl PatternCounters {
    pub fn get(&self, pattern: Pattern) -> f64 {
        match pattern {
            Pattern::Analytical => self.analytical,
            Pattern::Patience => self.patience,
            Pattern::Exploring => self.exploring,
            Pattern::Helping => self.helping,
            Pattern::Building => self.building,
        }
    }

    /// Return a copy with `amount` added to `pattern`, floored at zero.
    pub fn incremented(&self, pattern: Pattern, amount: f64) -> Self {
        let mut next = *self;
        let slot = match pattern {
            Pattern::Analytical => &mut next.analytical,
            Pattern::Patience => &mut next.patience,
            Pattern::Exploring => &mut next.exploring,
            Pattern::Helping => &mut next.helping,
            Pattern::Building => &mut next.building,
        };
        *slot = (*slot + amount).max(0.0);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incremented_is_independent() {
        let counters = PatternCounters::default();
        let next = counters
            .incremented(Pattern::Helping, 1.0)
            .incremented(Pattern::Analytical, 0.5);

        assert_eq!(counters, PatternCounters::default());
        assert_eq!(next.get(Pattern::Helping), 1.0);
        assert_eq!(next.get(Pattern::Analytical), 0.5);
        assert_eq!(next.get(Pattern::Building), 0.0);
    }

    #[test]
    fn test_counters_never_negative() {
        let counters = PatternCounters::default().incremented(Pattern::Patience, -3.0);
        assert_eq!(counters.get(Pattern::Patience), 0.0);
    }

    #[test]
    fn test_pattern_serde_names() {
        let json = serde_json::to_string(&Pattern::Analytical).unwrap();
        assert_eq!(json, "\"analytical\"");
    }
}
