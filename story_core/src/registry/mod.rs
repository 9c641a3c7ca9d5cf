//! Graph Registry - composes every authored graph into one namespace.
//!
//! Each character contributes an arc: a base graph plus ordered variants
//! (e.g. a revisit graph once the arc is complete). Cross-character scenes
//! register as special graphs. A single flat node index, built lazily on
//! first lookup, maps every node id to the graph that owns it; graphs never
//! point at each other directly.

mod index;

pub use index::*;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use story_rules::{
    CharacterId, ComboRegistry, ConditionEvaluator, DialogueGraph, GameState, NodeId,
    StateChange, StateCondition,
};

/// Errors raised while composing a registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("character '{0}' is already registered")]
    DuplicateCharacter(CharacterId),

    #[error("graph '{graph}' belongs to '{found}', not '{expected}'")]
    CharacterMismatch {
        graph: String,
        expected: CharacterId,
        found: CharacterId,
    },
}

/// An alternate graph selected when its condition holds.
#[derive(Debug, Clone)]
pub struct ArcVariant {
    pub name: String,
    pub graph: Arc<DialogueGraph>,

    /// Evaluated with the arc's character as subject.
    pub when: StateCondition,

    /// Effects that make the variant's entry reachable in simulation.
    pub seed: Vec<StateChange>,
}

impl ArcVariant {
    pub fn new(name: impl Into<String>, graph: DialogueGraph) -> Self {
        Self {
            name: name.into(),
            graph: Arc::new(graph),
            when: StateCondition::default(),
            seed: Vec::new(),
        }
    }

    pub fn when(mut self, condition: StateCondition) -> Self {
        self.when = condition;
        self
    }

    pub fn seeded_with(mut self, effect: StateChange) -> Self {
        self.seed.push(effect);
        self
    }
}

/// A character's base graph and its variants, checked top to bottom.
#[derive(Debug, Clone)]
pub struct CharacterArc {
    pub character_id: CharacterId,
    pub base: Arc<DialogueGraph>,
    pub base_seed: Vec<StateChange>,
    pub variants: Vec<ArcVariant>,
}

impl CharacterArc {
    pub fn new(character_id: impl Into<CharacterId>, base: DialogueGraph) -> Self {
        Self {
            character_id: character_id.into(),
            base: Arc::new(base),
            base_seed: Vec::new(),
            variants: Vec::new(),
        }
    }

    pub fn with_variant(mut self, variant: ArcVariant) -> Self {
        self.variants.push(variant);
        self
    }

    pub fn seeded_with(mut self, effect: StateChange) -> Self {
        self.base_seed.push(effect);
        self
    }

    /// Base first, then variants in declaration order.
    pub fn graphs(&self) -> impl Iterator<Item = &Arc<DialogueGraph>> {
        std::iter::once(&self.base).chain(self.variants.iter().map(|v| &v.graph))
    }
}

/// A cross-character scene with no single owning arc.
#[derive(Debug, Clone)]
pub struct SpecialGraph {
    pub graph: Arc<DialogueGraph>,
    pub seed: Vec<StateChange>,
}

/// An out-of-band jump into a graph and, optionally, back out of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interrupt {
    pub id: String,
    pub entry_node_id: NodeId,
    #[serde(default)]
    pub exit_node_id: Option<NodeId>,
    #[serde(default)]
    pub character_id: Option<CharacterId>,
}

/// The graph that owns a node under the current state.
#[derive(Debug, Clone)]
pub struct NodeOwner {
    pub character_id: Option<CharacterId>,
    pub graph: Arc<DialogueGraph>,
}

/// Result of a lookup that may have fallen back to the safe entry.
#[derive(Debug, Clone)]
pub struct NodeLocation {
    pub owner: NodeOwner,
    pub node_id: NodeId,
    pub fell_back: bool,
}

/// A registered graph as seen by whole-registry passes.
#[derive(Debug, Clone, Copy)]
pub struct RegisteredGraph<'a> {
    pub slot: GraphSlot,
    pub graph: &'a Arc<DialogueGraph>,
    pub character_id: Option<&'a CharacterId>,
    /// Variant name; `None` for base and special graphs.
    pub variant: Option<&'a str>,
    pub seed: &'a [StateChange],
}

/// All graphs, resolution rules and the lazily built node index.
#[derive(Debug, Default)]
pub struct GraphRegistry {
    arcs: Vec<CharacterArc>,
    arc_by_character: HashMap<CharacterId, usize>,
    specials: Vec<SpecialGraph>,
    /// Registration order across arcs and specials.
    order: Vec<GraphSlot>,
    interrupts: Vec<Interrupt>,
    combos: ComboRegistry,
    safe_entry: Option<NodeId>,
    index: OnceCell<NodeIndex>,
}

impl GraphRegistry {
    /// Create an empty registry using the built-in combos.
    pub fn new() -> Self {
        Self {
            combos: ComboRegistry::builtin().clone(),
            ..Self::default()
        }
    }

    /// Register a character arc. Graph ownership is checked against the arc.
    pub fn register_arc(&mut self, arc: CharacterArc) -> Result<(), RegistryError> {
        if self.arc_by_character.contains_key(&arc.character_id) {
            return Err(RegistryError::DuplicateCharacter(arc.character_id));
        }
        for graph in arc.graphs() {
            if let Some(found) = &graph.character_id {
                if found != &arc.character_id {
                    return Err(RegistryError::CharacterMismatch {
                        graph: graph.id.to_string(),
                        expected: arc.character_id.clone(),
                        found: found.clone(),
                    });
                }
            }
        }

        let position = self.arcs.len();
        self.order.push(GraphSlot::Arc {
            arc: position,
            variant: None,
        });
        for variant in 0..arc.variants.len() {
            self.order.push(GraphSlot::Arc {
                arc: position,
                variant: Some(variant),
            });
        }
        self.arc_by_character.insert(arc.character_id.clone(), position);
        self.arcs.push(arc);
        self.index = OnceCell::new();
        Ok(())
    }

    pub fn register_special(&mut self, graph: DialogueGraph, seed: Vec<StateChange>) {
        self.order.push(GraphSlot::Special(self.specials.len()));
        self.specials.push(SpecialGraph {
            graph: Arc::new(graph),
            seed,
        });
        self.index = OnceCell::new();
    }

    pub fn register_interrupt(&mut self, interrupt: Interrupt) {
        self.interrupts.push(interrupt);
    }

    pub fn set_combos(&mut self, combos: ComboRegistry) {
        self.combos = combos;
    }

    /// Node used when a lookup misses entirely.
    pub fn set_safe_entry(&mut self, node_id: impl Into<NodeId>) {
        self.safe_entry = Some(node_id.into());
    }

    pub fn safe_entry(&self) -> Option<&NodeId> {
        self.safe_entry.as_ref()
    }

    pub fn combos(&self) -> &ComboRegistry {
        &self.combos
    }

    pub fn evaluator(&self) -> ConditionEvaluator<'_> {
        ConditionEvaluator::new(&self.combos)
    }

    pub fn interrupts(&self) -> &[Interrupt] {
        &self.interrupts
    }

    pub fn arc(&self, character_id: &str) -> Option<&CharacterArc> {
        self.arc_by_character
            .get(character_id)
            .map(|position| &self.arcs[*position])
    }

    pub fn arcs(&self) -> &[CharacterArc] {
        &self.arcs
    }

    pub fn specials(&self) -> &[SpecialGraph] {
        &self.specials
    }

    /// Pick the graph a character exposes under `state`.
    ///
    /// Variants are tried in order; the first whose condition holds wins,
    /// otherwise the base graph is returned.
    pub fn resolve_graph(&self, character_id: &str, state: &GameState) -> Option<Arc<DialogueGraph>> {
        self.arc(character_id)
            .map(|arc| self.resolve_for_arc(arc, state).clone())
    }

    fn resolve_for_arc<'a>(&self, arc: &'a CharacterArc, state: &GameState) -> &'a Arc<DialogueGraph> {
        let evaluator = self.evaluator();
        arc.variants
            .iter()
            .find(|variant| evaluator.is_met(Some(&variant.when), state, &arc.character_id))
            .map(|variant| &variant.graph)
            .unwrap_or(&arc.base)
    }

    fn index(&self) -> &NodeIndex {
        self.index.get_or_init(|| {
            let index = NodeIndex::build(
                self.registered_graphs()
                    .into_iter()
                    .map(|registered| (registered.slot, registered.graph.as_ref())),
            );
            tracing::debug!(
                nodes = index.len(),
                collisions = index.collisions().len(),
                "built node index"
            );
            index
        })
    }

    fn graph_at(&self, slot: GraphSlot) -> &Arc<DialogueGraph> {
        match slot {
            GraphSlot::Arc { arc, variant: None } => &self.arcs[arc].base,
            GraphSlot::Arc {
                arc,
                variant: Some(variant),
            } => &self.arcs[arc].variants[variant].graph,
            GraphSlot::Special(special) => &self.specials[special].graph,
        }
    }

    /// Find the graph that owns `node_id` under `state`.
    ///
    /// Prefers the character's state-selected variant; when that variant lacks
    /// the node, falls back to whichever registered graph claimed it first
    /// (a sibling variant or a special scene).
    pub fn find_owner_of_node(&self, node_id: &str, state: &GameState) -> Option<NodeOwner> {
        let slot = self.index().owner(node_id)?;

        if let GraphSlot::Arc { arc, .. } = slot {
            let arc = &self.arcs[arc];
            let resolved = self.resolve_for_arc(arc, state);
            let graph = if resolved.contains(node_id) {
                resolved
            } else {
                self.graph_at(slot)
            };
            return Some(NodeOwner {
                character_id: Some(arc.character_id.clone()),
                graph: graph.clone(),
            });
        }

        let graph = self.graph_at(slot);
        Some(NodeOwner {
            character_id: graph.character_id.clone(),
            graph: graph.clone(),
        })
    }

    /// Like [`find_owner_of_node`](Self::find_owner_of_node), but a miss
    /// lands on the safe entry node instead.
    pub fn find_owner_or_safe_entry(&self, node_id: &str, state: &GameState) -> Option<NodeLocation> {
        if let Some(owner) = self.find_owner_of_node(node_id, state) {
            return Some(NodeLocation {
                owner,
                node_id: NodeId::from(node_id),
                fell_back: false,
            });
        }

        let safe_entry = self.safe_entry.as_ref()?;
        tracing::warn!(
            node_id,
            safe_entry = %safe_entry,
            "node not found in any graph, falling back to safe entry"
        );
        self.find_owner_of_node(safe_entry, state)
            .map(|owner| NodeLocation {
                owner,
                node_id: safe_entry.clone(),
                fell_back: true,
            })
    }

    /// True when any registered graph defines `node_id`.
    pub fn contains_node(&self, node_id: &str) -> bool {
        self.index().contains(node_id)
    }

    pub fn collisions(&self) -> &[NodeIdCollision] {
        self.index().collisions()
    }

    /// Every graph in registration order.
    pub fn registered_graphs(&self) -> Vec<RegisteredGraph<'_>> {
        self.order
            .iter()
            .map(|slot| match *slot {
                GraphSlot::Arc { arc, variant } => {
                    let owner = &self.arcs[arc];
                    let (graph, name, seed) = match variant {
                        None => (&owner.base, None, owner.base_seed.as_slice()),
                        Some(v) => {
                            let variant = &owner.variants[v];
                            (&variant.graph, Some(variant.name.as_str()), variant.seed.as_slice())
                        }
                    };
                    RegisteredGraph {
                        slot: *slot,
                        graph,
                        character_id: Some(&owner.character_id),
                        variant: name,
                        seed,
                    }
                }
                GraphSlot::Special(special) => {
                    let special_graph = &self.specials[special];
                    RegisteredGraph {
                        slot: *slot,
                        graph: &special_graph.graph,
                        character_id: special_graph.graph.character_id.as_ref(),
                        variant: None,
                        seed: special_graph.seed.as_slice(),
                    }
                }
            })
            .collect()
    }

    pub fn graph_count(&self) -> usize {
        self.order.len()
    }
}
