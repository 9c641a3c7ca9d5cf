//! Bounded, state-aware exploration of one graph.
//!
//! Breadth-first from the start node. Each queue item carries the state the
//! player would have on arrival, so a node is checked once per distinct
//! decision-relevant state rather than once per path.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use story_rules::{
    apply_choice, apply_on_enter, apply_state_changes, available_choices, is_sentinel,
    subject_for, GameState, NodeId,
};

use super::config::SimulationConfig;
use super::fingerprint::{fingerprint, StateFingerprint};
use super::report::{
    Deadlock, GraphSummary, RequirementMismatch, TraceStep, TruncatedGraph, TruncationReason,
};
use crate::registry::{GraphRegistry, RegisteredGraph};

/// Findings for a single graph.
#[derive(Debug, Clone)]
pub struct GraphExploration {
    pub summary: GraphSummary,
    pub deadlocks: Vec<Deadlock>,
    pub requirement_mismatches: Vec<RequirementMismatch>,
    pub truncated: Option<TruncatedGraph>,
}

#[derive(Debug)]
struct QueueItem {
    node_id: NodeId,
    state: GameState,
    path: Vec<TraceStep>,
    steps: usize,
}

impl QueueItem {
    /// The path that led here, ending on this node.
    fn trace(&self) -> Vec<TraceStep> {
        let mut trace = self.path.clone();
        trace.push(TraceStep {
            node_id: self.node_id.clone(),
            choice_id: None,
        });
        trace
    }
}

/// State a graph's exploration starts from: a fresh state with the graph's
/// seed effects applied and its character made current.
pub fn seeded_state(registered: &RegisteredGraph<'_>) -> GameState {
    let mut state = apply_state_changes(&GameState::new(), registered.seed);
    state.current_character_id = registered.character_id.cloned();
    state
}

/// Explore one registered graph under the configured ceilings.
pub fn explore(
    registry: &GraphRegistry,
    registered: &RegisteredGraph<'_>,
    config: &SimulationConfig,
) -> GraphExploration {
    let graph = registered.graph.as_ref();
    let evaluator = registry.evaluator();
    let initial = seeded_state(registered);
    let subject = subject_for(graph, &initial);

    let mut queue = VecDeque::new();
    let mut seen: HashSet<(NodeId, StateFingerprint)> = HashSet::new();
    let mut states_per_node: HashMap<NodeId, usize> = HashMap::new();
    let mut reached: BTreeSet<NodeId> = BTreeSet::new();
    let mut deadlocks: BTreeMap<NodeId, Deadlock> = BTreeMap::new();
    let mut mismatches: BTreeMap<NodeId, RequirementMismatch> = BTreeMap::new();
    let mut reasons: BTreeSet<TruncationReason> = BTreeSet::new();

    let mut expansions = 0usize;
    let mut cross_graph_exits = 0usize;
    let mut deferred_exits = 0usize;
    let mut broken_exits = 0usize;

    if graph.start_node().is_some() {
        seen.insert((graph.start_node_id.clone(), fingerprint(&initial)));
        states_per_node.insert(graph.start_node_id.clone(), 1);
        queue.push_back(QueueItem {
            node_id: graph.start_node_id.clone(),
            state: initial,
            path: Vec::new(),
            steps: 0,
        });
    }

    while let Some(item) = queue.pop_front() {
        if expansions >= config.max_expansions_per_graph {
            reasons.insert(TruncationReason::GraphExpansions);
            tracing::debug!(
                graph = %graph.id,
                expansions,
                pending = queue.len() + 1,
                "expansion ceiling reached"
            );
            break;
        }
        expansions += 1;

        if item.steps > config.max_steps_per_path {
            reasons.insert(TruncationReason::PathSteps);
            tracing::debug!(graph = %graph.id, node = %item.node_id, "path too long, branch abandoned");
            continue;
        }

        let Some(node) = graph.node(&item.node_id) else {
            continue;
        };
        reached.insert(node.id.clone());

        if !evaluator.is_met(node.required_state.as_ref(), &item.state, &subject) {
            mismatches
                .entry(node.id.clone())
                .or_insert_with(|| RequirementMismatch {
                    graph_id: graph.id.clone(),
                    node_id: node.id.clone(),
                    trace: item.trace(),
                });
            continue;
        }

        let state = apply_on_enter(&item.state, node);
        let choices = available_choices(&evaluator, node, &state, &subject);

        if choices.is_empty() {
            if !node.choices.is_empty() && !node.is_terminal {
                deadlocks.entry(node.id.clone()).or_insert_with(|| Deadlock {
                    graph_id: graph.id.clone(),
                    node_id: node.id.clone(),
                    trace: item.trace(),
                });
            }
            continue;
        }

        for choice in choices {
            let target = &choice.next_node_id;

            if is_sentinel(target.as_str()) {
                deferred_exits += 1;
                continue;
            }
            if !graph.contains(target.as_str()) {
                if registry.contains_node(target.as_str()) {
                    cross_graph_exits += 1;
                } else {
                    broken_exits += 1;
                }
                continue;
            }

            let next = apply_choice(&state, node, choice);
            let key = (target.clone(), fingerprint(&next));
            if seen.contains(&key) {
                continue;
            }

            let known_states = states_per_node.entry(target.clone()).or_default();
            if *known_states >= config.max_states_per_node {
                reasons.insert(TruncationReason::NodeStates);
                tracing::debug!(graph = %graph.id, node = %target, "state ceiling reached for node");
                continue;
            }
            *known_states += 1;
            seen.insert(key);

            let mut path = item.path.clone();
            path.push(TraceStep {
                node_id: node.id.clone(),
                choice_id: Some(choice.id.clone()),
            });
            queue.push_back(QueueItem {
                node_id: target.clone(),
                state: next,
                path,
                steps: item.steps + 1,
            });
        }
    }

    let unreached_nodes: Vec<NodeId> = graph
        .node_ids()
        .filter(|id| !reached.contains(*id))
        .cloned()
        .collect();

    let truncated = (!reasons.is_empty()).then(|| TruncatedGraph {
        graph_id: graph.id.clone(),
        reasons,
    });

    GraphExploration {
        summary: GraphSummary {
            graph_id: graph.id.clone(),
            character_id: registered.character_id.cloned(),
            variant: registered.variant.map(str::to_string),
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            reachable_nodes: reached.len(),
            unreached_nodes,
            states_explored: seen.len(),
            expansions,
            cross_graph_exits,
            deferred_exits,
            broken_exits,
            truncated: truncated.is_some(),
        },
        deadlocks: deadlocks.into_values().collect(),
        requirement_mismatches: mismatches.into_values().collect(),
        truncated,
    }
}
