//! Player state - the aggregate every predicate reads and every effect replaces.

mod patterns;

pub use patterns::*;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::ids::{CharacterId, NodeId, SessionId};

/// Lowest trust a character can hold.
pub const TRUST_MIN: i32 = 0;

/// Highest trust a character can hold.
pub const TRUST_MAX: i32 = 10;

/// Skill name -> level.
pub type SkillLevels = BTreeMap<String, f64>;

/// How well a character knows the player. Ordered from distant to close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipStatus {
    #[default]
    Stranger,
    Acquaintance,
    Confidant,
}

/// Per-character state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterState {
    /// Trust from [`TRUST_MIN`] to [`TRUST_MAX`].
    pub trust: i32,
    pub relationship: RelationshipStatus,
    #[serde(default)]
    pub knowledge_flags: BTreeSet<String>,
}

impl Default for CharacterState {
    fn default() -> Self {
        Self {
            trust: TRUST_MIN,
            relationship: RelationshipStatus::Stranger,
            knowledge_flags: BTreeSet::new(),
        }
    }
}

impl CharacterState {
    pub fn knows(&self, flag: &str) -> bool {
        self.knowledge_flags.contains(flag)
    }
}

/// The complete player state for one session.
///
/// Every transformation produces a new value; nothing in the engine edits a
/// state in place after handing it out. Sorted collections keep the
/// serialized form (and therefore the simulation fingerprint) stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GameState {
    #[serde(default)]
    pub session_id: SessionId,

    /// Character id -> relationship data.
    #[serde(default)]
    pub characters: BTreeMap<CharacterId, CharacterState>,

    #[serde(default)]
    pub global_flags: BTreeSet<String>,

    #[serde(default)]
    pub patterns: PatternCounters,

    /// Mystery key -> current value.
    #[serde(default)]
    pub mysteries: BTreeMap<String, String>,

    #[serde(default)]
    pub skills: SkillLevels,

    /// Where the player currently is. Not decision relevant.
    #[serde(default)]
    pub current_character_id: Option<CharacterId>,

    #[serde(default)]
    pub current_node_id: Option<NodeId>,
}

/// The subset of [`GameState`] that predicates can observe.
///
/// Two states with equal projections are interchangeable for traversal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionProjection<'a> {
    pub characters: &'a BTreeMap<CharacterId, CharacterState>,
    pub global_flags: &'a BTreeSet<String>,
    pub patterns: &'a PatternCounters,
    pub mysteries: &'a BTreeMap<String, String>,
    pub skills: &'a SkillLevels,
}

impl GameState {
    /// Create a fresh state with every counter zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a character's state, or the defaults for a character never met.
    pub fn character(&self, id: &CharacterId) -> CharacterState {
        self.characters.get(id).cloned().unwrap_or_default()
    }

    pub fn trust(&self, id: &CharacterId) -> i32 {
        self.characters.get(id).map(|c| c.trust).unwrap_or(TRUST_MIN)
    }

    pub fn has_global_flag(&self, flag: &str) -> bool {
        self.global_flags.contains(flag)
    }

    pub fn skill(&self, name: &str) -> f64 {
        self.skills.get(name).copied().unwrap_or(0.0)
    }

    /// Return a copy positioned at the given node.
    pub fn at_node(&self, character_id: Option<CharacterId>, node_id: NodeId) -> Self {
        Self {
            current_character_id: character_id,
            current_node_id: Some(node_id),
            ..self.clone()
        }
    }

    pub fn decision_projection(&self) -> DecisionProjection<'_> {
        DecisionProjection {
            characters: &self.characters,
            global_flags: &self.global_flags,
            patterns: &self.patterns,
            mysteries: &self.mysteries,
            skills: &self.skills,
        }
    }
}
