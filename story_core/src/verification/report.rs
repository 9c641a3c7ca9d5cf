//! Verification report types.
//!
//! Every gating finding exposes a stable key; the baseline stores only keys,
//! so a finding survives unrelated content edits as long as its location does.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use story_rules::{CharacterId, GraphId, NodeId};

use crate::registry::NodeIdCollision;

/// A finding that can fail the build when it is new.
pub trait Violation {
    fn key(&self) -> String;
}

/// One step of an example path: the node reached and the choice taken from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStep {
    pub node_id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice_id: Option<String>,
}

/// Where a dangling reference was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReferenceSource {
    Choice {
        graph_id: GraphId,
        node_id: NodeId,
        choice_id: String,
    },
    StartNode {
        graph_id: GraphId,
    },
    InterruptEntry {
        interrupt_id: String,
    },
    InterruptExit {
        interrupt_id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokenReference {
    pub source: ReferenceSource,
    pub target: NodeId,
}

impl Violation for BrokenReference {
    fn key(&self) -> String {
        match &self.source {
            ReferenceSource::Choice {
                graph_id,
                node_id,
                choice_id,
            } => format!("broken:{graph_id}:{node_id}:{choice_id}->{}", self.target),
            ReferenceSource::StartNode { graph_id } => {
                format!("broken:start:{graph_id}->{}", self.target)
            }
            ReferenceSource::InterruptEntry { interrupt_id } => {
                format!("broken:interrupt:{interrupt_id}:entry->{}", self.target)
            }
            ReferenceSource::InterruptExit { interrupt_id } => {
                format!("broken:interrupt:{interrupt_id}:exit->{}", self.target)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateChoice {
    pub graph_id: GraphId,
    pub node_id: NodeId,
    pub choice_id: String,
}

impl Violation for DuplicateChoice {
    fn key(&self) -> String {
        format!("duplicate_choice:{}:{}:{}", self.graph_id, self.node_id, self.choice_id)
    }
}

/// A node with choices of which none can be taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deadlock {
    pub graph_id: GraphId,
    pub node_id: NodeId,
    pub trace: Vec<TraceStep>,
}

impl Violation for Deadlock {
    fn key(&self) -> String {
        format!("deadlock:{}:{}", self.graph_id, self.node_id)
    }
}

/// A node reached in a state its own requirement rejects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementMismatch {
    pub graph_id: GraphId,
    pub node_id: NodeId,
    pub trace: Vec<TraceStep>,
}

impl Violation for RequirementMismatch {
    fn key(&self) -> String {
        format!("mismatch:{}:{}", self.graph_id, self.node_id)
    }
}

/// Which ceiling cut exploration short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruncationReason {
    PathSteps,
    NodeStates,
    GraphExpansions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruncatedGraph {
    pub graph_id: GraphId,
    pub reasons: BTreeSet<TruncationReason>,
}

impl Violation for TruncatedGraph {
    fn key(&self) -> String {
        format!("truncated:{}", self.graph_id)
    }
}

/// An edge into a node whose visibility guard does not imply the node's requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnguardedEdge {
    pub graph_id: GraphId,
    pub node_id: NodeId,
    pub from_graph_id: GraphId,
    pub from_node_id: NodeId,
    pub choice_id: String,
}

impl Violation for UnguardedEdge {
    fn key(&self) -> String {
        format!(
            "unguarded:{}:{}<-{}:{}:{}",
            self.graph_id, self.node_id, self.from_graph_id, self.from_node_id, self.choice_id
        )
    }
}

/// Per-graph counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub graph_id: GraphId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_id: Option<CharacterId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    pub node_count: usize,
    pub edge_count: usize,
    pub reachable_nodes: usize,
    /// Nodes not reached from this graph's start; often entered from elsewhere.
    pub unreached_nodes: Vec<NodeId>,
    pub states_explored: usize,
    pub expansions: usize,
    pub cross_graph_exits: usize,
    pub deferred_exits: usize,
    /// Choices pointing nowhere; listed under broken references.
    pub broken_exits: usize,
    pub truncated: bool,
}

/// Everything one verification run found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub graphs_scanned: usize,
    pub node_count: usize,
    pub edge_count: usize,
    pub reachable_node_count: usize,
    pub states_explored: usize,
    pub graphs: Vec<GraphSummary>,
    pub broken_references: Vec<BrokenReference>,
    pub duplicate_choices: Vec<DuplicateChoice>,
    pub deadlocks: Vec<Deadlock>,
    pub requirement_mismatches: Vec<RequirementMismatch>,
    pub truncated_graphs: Vec<TruncatedGraph>,
    pub unguarded_edges: Vec<UnguardedEdge>,

    /// Reported, never gating.
    pub node_id_collisions: Vec<NodeIdCollision>,
}

fn keys_of<V: Violation>(items: &[V]) -> impl Iterator<Item = String> + '_ {
    items.iter().map(Violation::key)
}

impl VerificationReport {
    /// Keys of every gating finding.
    pub fn violation_keys(&self) -> BTreeSet<String> {
        keys_of(&self.broken_references)
            .chain(keys_of(&self.duplicate_choices))
            .chain(keys_of(&self.deadlocks))
            .chain(keys_of(&self.requirement_mismatches))
            .chain(keys_of(&self.truncated_graphs))
            .chain(keys_of(&self.unguarded_edges))
            .collect()
    }

    pub fn violation_count(&self) -> usize {
        self.broken_references.len()
            + self.duplicate_choices.len()
            + self.deadlocks.len()
            + self.requirement_mismatches.len()
            + self.truncated_graphs.len()
            + self.unguarded_edges.len()
    }

    pub fn is_clean(&self) -> bool {
        self.violation_count() == 0
    }

    /// Pretty JSON. Field and list order is fixed, so equal runs give equal bytes.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
