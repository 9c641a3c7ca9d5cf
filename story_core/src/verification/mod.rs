//! # Narrative Verification
//!
//! Offline soundness checks over every registered graph: a bounded,
//! state-aware traversal per graph (deadlocks, requirement mismatches,
//! truncation) plus static passes (dangling references, duplicate choice
//! ids, unguarded edges into gated nodes).
//!
//! Findings are data. Whether they fail a build is decided by comparing the
//! report against a [`Baseline`].

mod baseline;
mod config;
mod fingerprint;
mod report;
mod static_checks;
mod traversal;

pub use baseline::*;
pub use config::*;
pub use fingerprint::*;
pub use report::*;
pub use static_checks::*;
pub use traversal::*;

use crate::registry::GraphRegistry;

/// Runs every check against one registry.
#[derive(Debug, Clone, Copy)]
pub struct Verifier<'a> {
    registry: &'a GraphRegistry,
    config: &'a SimulationConfig,
}

impl<'a> Verifier<'a> {
    pub fn new(registry: &'a GraphRegistry, config: &'a SimulationConfig) -> Self {
        Self { registry, config }
    }

    pub fn run(&self) -> VerificationReport {
        let mut report = VerificationReport::default();

        for registered in self.registry.registered_graphs() {
            let exploration = explore(self.registry, &registered, self.config);
            let summary = &exploration.summary;
            tracing::info!(
                graph = %summary.graph_id,
                nodes = summary.node_count,
                reachable = summary.reachable_nodes,
                states = summary.states_explored,
                deadlocks = exploration.deadlocks.len(),
                mismatches = exploration.requirement_mismatches.len(),
                truncated = summary.truncated,
                "graph verified"
            );

            report.node_count += summary.node_count;
            report.edge_count += summary.edge_count;
            report.reachable_node_count += summary.reachable_nodes;
            report.states_explored += summary.states_explored;

            report.graphs.push(exploration.summary);
            report.deadlocks.extend(exploration.deadlocks);
            report
                .requirement_mismatches
                .extend(exploration.requirement_mismatches);
            report.truncated_graphs.extend(exploration.truncated);
        }

        report.graphs_scanned = report.graphs.len();
        report.broken_references = broken_references(self.registry);
        report.duplicate_choices = duplicate_choices(self.registry);
        report.unguarded_edges = unguarded_edges(self.registry);
        report.node_id_collisions = self.registry.collisions().to_vec();

        sort_report(&mut report);
        report
    }
}

fn sort_report(report: &mut VerificationReport) {
    report.graphs.sort_by(|a, b| a.graph_id.cmp(&b.graph_id));
    report.broken_references.sort_by_cached_key(Violation::key);
    report.duplicate_choices.sort_by_cached_key(Violation::key);
    report.deadlocks.sort_by_cached_key(Violation::key);
    report.requirement_mismatches.sort_by_cached_key(Violation::key);
    report.truncated_graphs.sort_by_cached_key(Violation::key);
    report.unguarded_edges.sort_by_cached_key(Violation::key);
    report.node_id_collisions.sort_by(|a, b| {
        (&a.node_id, &a.kept_graph, &a.ignored_graph).cmp(&(&b.node_id, &b.kept_graph, &b.ignored_graph))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CharacterArc;
    use story_rules::{Choice, DialogueGraph, DialogueNode, StateCondition, TRAVEL_PENDING};

    fn registry() -> GraphRegistry {
        let samuel = DialogueGraph::new("samuel", "samuel_intro")
            .for_character("samuel")
            .with_node(
                DialogueNode::new("samuel_intro")
                    .with_choice(Choice::new("visit_maya", "maya_intro"))
                    .with_choice(Choice::new("leave", TRAVEL_PENDING)),
            );
        let maya = DialogueGraph::new("maya", "maya_intro")
            .for_character("maya")
            .with_node(DialogueNode::new("maya_intro").with_choice(
                Choice::new("stuck", "maya_intro").visible_when(StateCondition::new().with_global_flag("never")),
            ));

        let mut registry = GraphRegistry::new();
        registry.register_arc(CharacterArc::new("samuel", samuel)).unwrap();
        registry.register_arc(CharacterArc::new("maya", maya)).unwrap();
        registry
    }

    #[test]
    fn test_run_collects_and_sorts() {
        let registry = registry();
        let config = SimulationConfig::default();
        let report = Verifier::new(&registry, &config).run();

        assert_eq!(report.graphs_scanned, 2);
        assert_eq!(report.graphs[0].graph_id.as_str(), "maya");
        assert_eq!(report.node_count, 2);
        assert_eq!(report.edge_count, 3);

        let samuel = &report.graphs[1];
        assert_eq!(samuel.cross_graph_exits, 1);
        assert_eq!(samuel.deferred_exits, 1);

        let keys: Vec<_> = report.violation_keys().into_iter().collect();
        assert_eq!(keys, vec!["deadlock:maya:maya_intro".to_string()]);
    }

    #[test]
    fn test_run_is_deterministic() {
        let registry = registry();
        let config = SimulationConfig::default();

        let first = Verifier::new(&registry, &config).run().to_json().unwrap();
        let second = Verifier::new(&registry, &config).run().to_json().unwrap();
        assert_eq!(first, second);
    }
}
