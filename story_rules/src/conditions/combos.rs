//! Pattern combos - named conjunctions of pattern minimums.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::state::{Pattern, PatternCounters};

/// A combo is unlocked when every listed pattern reaches its minimum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combo {
    pub name: String,
    pub requirements: BTreeMap<Pattern, f64>,
}

impl Combo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requirements: BTreeMap::new(),
        }
    }

    pub fn requiring(mut self, pattern: Pattern, minimum: f64) -> Self {
        self.requirements.insert(pattern, minimum);
        self
    }

    pub fn is_unlocked(&self, patterns: &PatternCounters) -> bool {
        self.requirements
            .iter()
            .all(|(pattern, minimum)| patterns.get(*pattern) >= *minimum)
    }
}

/// Registry of known combos, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComboRegistry {
    combos: BTreeMap<String, Combo>,
}

static BUILTIN: Lazy<ComboRegistry> = Lazy::new(|| {
    ComboRegistry::new()
        .with_combo(
            Combo::new("deep_thinker")
                .requiring(Pattern::Analytical, 5.0)
                .requiring(Pattern::Patience, 5.0),
        )
        .with_combo(
            Combo::new("caring_builder")
                .requiring(Pattern::Helping, 5.0)
                .requiring(Pattern::Building, 5.0),
        )
        .with_combo(
            Combo::new("curious_analyst")
                .requiring(Pattern::Exploring, 5.0)
                .requiring(Pattern::Analytical, 3.0),
        )
        .with_combo(
            Combo::new("patient_helper")
                .requiring(Pattern::Patience, 4.0)
                .requiring(Pattern::Helping, 4.0),
        )
});

impl ComboRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The combos every registry starts from.
    pub fn builtin() -> &'static ComboRegistry {
        &BUILTIN
    }

    /// Add a combo, replacing any combo with the same name.
    pub fn with_combo(mut self, combo: Combo) -> Self {
        self.register(combo);
        self
    }

    pub fn register(&mut self, combo: Combo) {
        self.combos.insert(combo.name.clone(), combo);
    }

    pub fn get(&self, name: &str) -> Option<&Combo> {
        self.combos.get(name)
    }

    /// Unknown combos are never unlocked.
    pub fn is_unlocked(&self, name: &str, patterns: &PatternCounters) -> bool {
        self.get(name)
            .map(|combo| combo.is_unlocked(patterns))
            .unwrap_or(false)
    }

    /// Names of every unlocked combo, in name order.
    pub fn unlocked(&self, patterns: &PatternCounters) -> Vec<&str> {
        self.combos
            .values()
            .filter(|combo| combo.is_unlocked(patterns))
            .map(|combo| combo.name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.combos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combos.is_empty()
    }
}
