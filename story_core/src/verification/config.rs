//! Exploration ceilings.

use serde::{Deserialize, Serialize};

/// Configuration for the bounded traversal.
///
/// Every ceiling degrades to a "truncated" mark on the graph's report entry;
/// none of them aborts the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Longest path (in choices taken) explored from a graph's start node.
    pub max_steps_per_path: usize,

    /// Distinct states kept per node before further arrivals are dropped.
    pub max_states_per_node: usize,

    /// Queue items processed per graph before exploration stops.
    pub max_expansions_per_graph: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_steps_per_path: 200,
            max_states_per_node: 64,
            max_expansions_per_graph: 50_000,
        }
    }
}
