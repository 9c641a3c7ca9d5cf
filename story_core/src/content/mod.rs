//! Content loading - the boundary between authored files and the registry.
//!
//! A content directory holds a `manifest.toml` that composes graph files
//! (JSON, or TOML for hand-written scenes) into character arcs, special
//! scenes and interrupts.
//!
//! ```toml
//! safe_entry = "samuel_intro"
//!
//! [[characters]]
//! id = "samuel"
//! graph = "graphs/samuel.json"
//!
//! [[characters.variants]]
//! name = "revisit"
//! graph = "graphs/samuel_revisit.json"
//! when = { has_global_flags = ["samuel_arc_complete"] }
//! seed = [{ add_global_flags = ["samuel_arc_complete"] }]
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use story_rules::{
    CharacterId, Combo, ComboRegistry, DialogueGraph, NodeId, StateChange, StateCondition,
};

use crate::registry::{ArcVariant, CharacterArc, GraphRegistry, Interrupt, RegistryError};

pub const MANIFEST_FILE: &str = "manifest.toml";

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed JSON in {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed TOML in {path}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unsupported graph file {0}, expected .json or .toml")]
    UnsupportedFormat(PathBuf),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

fn default_true() -> bool {
    true
}

/// Top-level composition of a content directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    /// Node used when a lookup misses.
    #[serde(default)]
    pub safe_entry: Option<NodeId>,

    #[serde(default)]
    pub characters: Vec<CharacterEntry>,

    #[serde(default)]
    pub specials: Vec<SpecialEntry>,

    #[serde(default)]
    pub interrupts: Vec<Interrupt>,

    /// Extra combos, added to (or replacing) the built-in ones by name.
    #[serde(default)]
    pub combos: Vec<Combo>,

    /// Start from the built-in combos. Disable to use only `combos`.
    #[serde(default = "default_true")]
    pub builtin_combos: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterEntry {
    pub id: CharacterId,
    pub graph: PathBuf,
    #[serde(default)]
    pub seed: Vec<StateChange>,
    #[serde(default)]
    pub variants: Vec<VariantEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantEntry {
    pub name: String,
    pub graph: PathBuf,
    #[serde(default)]
    pub when: StateCondition,
    #[serde(default)]
    pub seed: Vec<StateChange>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialEntry {
    pub graph: PathBuf,
    #[serde(default)]
    pub seed: Vec<StateChange>,
}

fn read(path: &Path) -> Result<String, ContentError> {
    fs::read_to_string(path).map_err(|source| ContentError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ContentError> {
    toml::from_str(&read(path)?).map_err(|source| ContentError::Toml {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_manifest(path: &Path) -> Result<Manifest, ContentError> {
    parse_toml(path)
}

/// Load one graph file, choosing the parser by extension.
pub fn load_graph(path: &Path) -> Result<DialogueGraph, ContentError> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&read(path)?).map_err(|source| ContentError::Json {
            path: path.to_path_buf(),
            source,
        }),
        Some("toml") => parse_toml(path),
        _ => Err(ContentError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Load a graph that belongs to `character_id`; an unset owner is filled in.
fn load_character_graph(path: &Path, character_id: &CharacterId) -> Result<DialogueGraph, ContentError> {
    let mut graph = load_graph(path)?;
    if graph.character_id.is_none() {
        graph.character_id = Some(character_id.clone());
    }
    Ok(graph)
}

impl Manifest {
    /// Load every referenced graph (paths relative to `base_dir`) and compose
    /// the registry.
    pub fn into_registry(self, base_dir: &Path) -> Result<GraphRegistry, ContentError> {
        let mut registry = GraphRegistry::new();

        let mut combos = if self.builtin_combos {
            ComboRegistry::builtin().clone()
        } else {
            ComboRegistry::new()
        };
        for combo in self.combos {
            combos.register(combo);
        }
        registry.set_combos(combos);

        for character in self.characters {
            let base = load_character_graph(&base_dir.join(&character.graph), &character.id)?;
            let mut arc = CharacterArc::new(character.id.clone(), base);
            arc.base_seed = character.seed;

            for variant in character.variants {
                let graph = load_character_graph(&base_dir.join(&variant.graph), &character.id)?;
                let mut entry = ArcVariant::new(variant.name, graph).when(variant.when);
                entry.seed = variant.seed;
                arc = arc.with_variant(entry);
            }

            tracing::debug!(
                character = %character.id,
                variants = arc.variants.len(),
                "loaded character arc"
            );
            registry.register_arc(arc)?;
        }

        for special in self.specials {
            let graph = load_graph(&base_dir.join(&special.graph))?;
            tracing::debug!(graph = %graph.id, "loaded special graph");
            registry.register_special(graph, special.seed);
        }

        for interrupt in self.interrupts {
            registry.register_interrupt(interrupt);
        }

        if let Some(safe_entry) = self.safe_entry {
            registry.set_safe_entry(safe_entry);
        }

        Ok(registry)
    }
}

/// Load `<dir>/manifest.toml` and everything it references.
pub fn load_registry(dir: &Path) -> Result<GraphRegistry, ContentError> {
    let manifest = load_manifest(&dir.join(MANIFEST_FILE))?;
    let registry = manifest.into_registry(dir)?;
    tracing::info!(
        dir = %dir.display(),
        graphs = registry.graph_count(),
        interrupts = registry.interrupts().len(),
        "content loaded"
    );
    Ok(registry)
}
