//! Dialogue graph model.
//!
//! A graph is an authored artifact: a set of nodes keyed by id plus a start
//! node. Nothing here changes at runtime; nodes are only visited.

mod choice;
mod node;

pub use choice::*;
pub use node::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ids::{CharacterId, GraphId, NodeId};

/// Target id meaning "a simulation is pending"; resolved outside the graph.
pub const SIMULATION_PENDING: &str = "__SIMULATION_PENDING__";

/// Target id meaning "travel is pending"; resolved outside the graph.
pub const TRAVEL_PENDING: &str = "__TRAVEL_PENDING__";

/// Virtual node ids that defer control to the runtime.
pub const SENTINEL_NODE_IDS: [&str; 2] = [SIMULATION_PENDING, TRAVEL_PENDING];

/// Check whether an id is one of the deferred-transfer sentinels.
pub fn is_sentinel(node_id: &str) -> bool {
    SENTINEL_NODE_IDS.contains(&node_id)
}

/// A character's dialogue graph (or one variant of it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueGraph {
    pub id: GraphId,

    /// Owning character; `None` for cross-character scenes.
    #[serde(default)]
    pub character_id: Option<CharacterId>,

    pub start_node_id: NodeId,

    /// Nodes keyed by id. Authored files may list them as an array.
    #[serde(with = "node_list")]
    nodes: BTreeMap<NodeId, DialogueNode>,
}

impl DialogueGraph {
    pub fn new(id: impl Into<GraphId>, start_node_id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            character_id: None,
            start_node_id: start_node_id.into(),
            nodes: BTreeMap::new(),
        }
    }

    pub fn for_character(mut self, character_id: impl Into<CharacterId>) -> Self {
        self.character_id = Some(character_id.into());
        self
    }

    /// Add a node. A node with an id already present replaces it.
    pub fn with_node(mut self, node: DialogueNode) -> Self {
        self.nodes.insert(node.id.clone(), node);
        self
    }

    pub fn node(&self, id: &str) -> Option<&DialogueNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn start_node(&self) -> Option<&DialogueNode> {
        self.nodes.get(&self.start_node_id)
    }

    /// Iterate nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &DialogueNode> {
        self.nodes.values()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|n| n.choices.len()).sum()
    }
}

/// Serialize the node map as an id-ordered array, which is how graphs are
/// authored on disk.
mod node_list {
    use super::{DialogueNode, NodeId};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S>(nodes: &BTreeMap<NodeId, DialogueNode>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let list: Vec<&DialogueNode> = nodes.values().collect();
        list.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<NodeId, DialogueNode>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let list = Vec::<DialogueNode>::deserialize(deserializer)?;
        let mut nodes = BTreeMap::new();
        for node in list {
            if nodes.contains_key(&node.id) {
                return Err(serde::de::Error::custom(format!(
                    "duplicate node id '{}'",
                    node.id
                )));
            }
            nodes.insert(node.id.clone(), node);
        }
        Ok(nodes)
    }
}
