//! Checks that need no simulation: dangling ids and unguarded edges.

use std::collections::{BTreeMap, HashSet};

use story_rules::{guard_implies, is_sentinel, Choice, DialogueGraph, NodeId};

use super::report::{BrokenReference, DuplicateChoice, ReferenceSource, UnguardedEdge};
use crate::registry::GraphRegistry;

fn resolves(registry: &GraphRegistry, node_id: &str) -> bool {
    is_sentinel(node_id) || registry.contains_node(node_id)
}

/// Start nodes missing from their graph, choice targets missing from every
/// graph, and interrupt entry/exit ids that resolve nowhere.
pub fn broken_references(registry: &GraphRegistry) -> Vec<BrokenReference> {
    let mut broken = Vec::new();

    for registered in registry.registered_graphs() {
        let graph = registered.graph;
        if graph.start_node().is_none() {
            broken.push(BrokenReference {
                source: ReferenceSource::StartNode {
                    graph_id: graph.id.clone(),
                },
                target: graph.start_node_id.clone(),
            });
        }

        for node in graph.nodes() {
            for choice in &node.choices {
                if !resolves(registry, &choice.next_node_id) {
                    broken.push(BrokenReference {
                        source: ReferenceSource::Choice {
                            graph_id: graph.id.clone(),
                            node_id: node.id.clone(),
                            choice_id: choice.id.clone(),
                        },
                        target: choice.next_node_id.clone(),
                    });
                }
            }
        }
    }

    for interrupt in registry.interrupts() {
        if !resolves(registry, &interrupt.entry_node_id) {
            broken.push(BrokenReference {
                source: ReferenceSource::InterruptEntry {
                    interrupt_id: interrupt.id.clone(),
                },
                target: interrupt.entry_node_id.clone(),
            });
        }
        if let Some(exit) = &interrupt.exit_node_id {
            if !resolves(registry, exit) {
                broken.push(BrokenReference {
                    source: ReferenceSource::InterruptExit {
                        interrupt_id: interrupt.id.clone(),
                    },
                    target: exit.clone(),
                });
            }
        }
    }

    broken
}

/// Choice ids repeated within one node. Each repeat is reported once.
pub fn duplicate_choices(registry: &GraphRegistry) -> Vec<DuplicateChoice> {
    let mut duplicates = Vec::new();

    for registered in registry.registered_graphs() {
        let graph = registered.graph;
        for node in graph.nodes() {
            let mut seen = HashSet::new();
            let mut reported = HashSet::new();
            for choice in &node.choices {
                if !seen.insert(choice.id.as_str()) && reported.insert(choice.id.as_str()) {
                    duplicates.push(DuplicateChoice {
                        graph_id: graph.id.clone(),
                        node_id: node.id.clone(),
                        choice_id: choice.id.clone(),
                    });
                }
            }
        }
    }

    duplicates
}

struct IncomingEdge<'a> {
    from_graph: &'a DialogueGraph,
    from_node_id: &'a NodeId,
    choice: &'a Choice,
}

/// Whether a guard on an edge out of `from` reads the same character as a
/// requirement inside `to`. An unowned target reads the player's current
/// character, which on arrival is still the source's.
fn shares_subject(from: &DialogueGraph, to: &DialogueGraph) -> bool {
    match (&from.character_id, &to.character_id) {
        (_, None) => true,
        (Some(from), Some(to)) => from == to,
        (None, Some(_)) => false,
    }
}

/// Edges into a gated node whose visibility guard is weaker than the gate.
///
/// The check is syntactic: a guard passes only when it repeats (or tightens)
/// every clause of the node's requirement. Edges from every graph count,
/// since any graph may jump into any node. When the edge leaves a graph
/// whose subject differs from the target's, its trust, relationship and
/// knowledge clauses read the wrong character and are not counted.
pub fn unguarded_edges(registry: &GraphRegistry) -> Vec<UnguardedEdge> {
    let graphs = registry.registered_graphs();

    let mut incoming: BTreeMap<&NodeId, Vec<IncomingEdge<'_>>> = BTreeMap::new();
    for registered in &graphs {
        for node in registered.graph.nodes() {
            for choice in &node.choices {
                incoming
                    .entry(&choice.next_node_id)
                    .or_default()
                    .push(IncomingEdge {
                        from_graph: registered.graph,
                        from_node_id: &node.id,
                        choice,
                    });
            }
        }
    }

    let mut unguarded = Vec::new();
    for registered in &graphs {
        for node in registered.graph.nodes() {
            let Some(required) = node.required_state.as_ref() else {
                continue;
            };
            let Some(edges) = incoming.get(&node.id) else {
                continue;
            };

            for edge in edges {
                let foreign;
                let guard = match edge.choice.visible_condition.as_ref() {
                    Some(guard) if !shares_subject(edge.from_graph, registered.graph) => {
                        foreign = guard.without_subject_clauses();
                        Some(&foreign)
                    }
                    guard => guard,
                };
                if !guard_implies(guard, Some(required)) {
                    unguarded.push(UnguardedEdge {
                        graph_id: registered.graph.id.clone(),
                        node_id: node.id.clone(),
                        from_graph_id: edge.from_graph.id.clone(),
                        from_node_id: edge.from_node_id.clone(),
                        choice_id: edge.choice.id.clone(),
                    });
                }
            }
        }
    }

    unguarded
}
