//! Flat node index over every registered graph.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use story_rules::{GraphId, NodeId};

/// Position of a graph inside the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphSlot {
    /// A character arc; `variant` is `None` for the base graph.
    Arc { arc: usize, variant: Option<usize> },
    Special(usize),
}

/// A node id claimed by more than one graph. The first claimant keeps it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeIdCollision {
    pub node_id: NodeId,
    pub kept_graph: GraphId,
    pub ignored_graph: GraphId,
}

/// Node id -> owning graph slot.
#[derive(Debug, Default)]
pub struct NodeIndex {
    owners: HashMap<NodeId, (GraphSlot, GraphId)>,
    collisions: Vec<NodeIdCollision>,
}

impl NodeIndex {
    /// Build from graphs in registration order.
    pub fn build<'a, I>(graphs: I) -> Self
    where
        I: IntoIterator<Item = (GraphSlot, &'a story_rules::DialogueGraph)>,
    {
        let mut index = Self::default();

        for (slot, graph) in graphs {
            for node_id in graph.node_ids() {
                match index.owners.get(node_id) {
                    Some((_, kept_graph)) => {
                        tracing::warn!(
                            node_id = %node_id,
                            kept = %kept_graph,
                            ignored = %graph.id,
                            "node id claimed by more than one graph"
                        );
                        index.collisions.push(NodeIdCollision {
                            node_id: node_id.clone(),
                            kept_graph: kept_graph.clone(),
                            ignored_graph: graph.id.clone(),
                        });
                    }
                    None => {
                        index
                            .owners
                            .insert(node_id.clone(), (slot, graph.id.clone()));
                    }
                }
            }
        }

        index
    }

    pub fn owner(&self, node_id: &str) -> Option<GraphSlot> {
        self.owners.get(node_id).map(|(slot, _)| *slot)
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.owners.contains_key(node_id)
    }

    pub fn collisions(&self) -> &[NodeIdCollision] {
        &self.collisions
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use story_rules::{DialogueGraph, DialogueNode};

    #[test]
    fn test_first_claimant_wins() {
        let base = DialogueGraph::new("samuel", "intro")
            .with_node(DialogueNode::new("intro"))
            .with_node(DialogueNode::new("shared"));
        let revisit = DialogueGraph::new("samuel_revisit", "welcome_back")
            .with_node(DialogueNode::new("welcome_back"))
            .with_node(DialogueNode::new("shared"));

        let base_slot = GraphSlot::Arc { arc: 0, variant: None };
        let revisit_slot = GraphSlot::Arc { arc: 0, variant: Some(0) };
        let index = NodeIndex::build([(base_slot, &base), (revisit_slot, &revisit)]);

        assert_eq!(index.len(), 3);
        assert_eq!(index.owner("shared"), Some(base_slot));
        assert_eq!(index.owner("welcome_back"), Some(revisit_slot));
        assert_eq!(index.owner("missing"), None);

        assert_eq!(index.collisions().len(), 1);
        assert_eq!(index.collisions()[0].kept_graph, GraphId::from("samuel"));
        assert_eq!(index.collisions()[0].ignored_graph, GraphId::from("samuel_revisit"));
    }
}
