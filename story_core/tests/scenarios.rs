//! End-to-end verification scenarios over small hand-built registries.

use story_core::{
    ArcVariant, Baseline, CharacterArc, GraphRegistry, NavigationError, Navigator,
    SimulationConfig, Transition, Verifier,
};
use story_rules::{
    apply_state_change, Choice, DialogueGraph, DialogueNode, GameState, NodeId, NumericRange,
    Pattern, StateChange, StateCondition, TRAVEL_PENDING,
};

fn single_arc(graph: DialogueGraph) -> GraphRegistry {
    let character = graph.character_id.clone().unwrap_or_else(|| "maya".into());
    let mut registry = GraphRegistry::new();
    registry.register_arc(CharacterArc::new(character, graph)).unwrap();
    registry
}

/// A -> B, where B's only choice is gated on a flag nothing sets.
fn deadlocked_graph() -> DialogueGraph {
    DialogueGraph::new("maya", "a")
        .for_character("maya")
        .with_node(DialogueNode::new("a").with_choice(Choice::new("to_b", "b")))
        .with_node(DialogueNode::new("b").with_choice(
            Choice::new("to_c", "c").enabled_when(StateCondition::new().with_global_flag("unobtainable")),
        ))
        .with_node(DialogueNode::new("c"))
}

fn gated_graph(guarded: bool) -> DialogueGraph {
    let requirement = StateCondition::new().with_trust(NumericRange::at_least(5));
    let mut ask = Choice::new("ask", "secret").with_pattern(Pattern::Exploring);
    if guarded {
        ask = ask.visible_when(requirement.clone());
    }

    DialogueGraph::new("samuel", "intro")
        .for_character("samuel")
        .with_node(
            DialogueNode::new("intro")
                .with_choice(ask)
                .with_choice(Choice::new("leave", TRAVEL_PENDING)),
        )
        .with_node(
            DialogueNode::new("secret")
                .requires(requirement)
                .with_choice(Choice::new("leave", TRAVEL_PENDING)),
        )
}

#[test]
fn test_deadlock_scenario() {
    let registry = single_arc(deadlocked_graph());
    let config = SimulationConfig::default();
    let report = Verifier::new(&registry, &config).run();

    assert_eq!(report.deadlocks.len(), 1);
    assert_eq!(report.deadlocks[0].node_id.as_str(), "b");
    assert!(report.requirement_mismatches.is_empty());
    assert!(report.broken_references.is_empty());
    assert_eq!(report.graphs[0].unreached_nodes.len(), 1);
}

#[test]
fn test_unguarded_scenario() {
    let config = SimulationConfig::default();

    let open = single_arc(gated_graph(false));
    let report = Verifier::new(&open, &config).run();
    assert_eq!(report.unguarded_edges.len(), 1);
    assert_eq!(report.unguarded_edges[0].node_id.as_str(), "secret");
    // Simulation reaches the node with trust 0 as well.
    assert_eq!(report.requirement_mismatches.len(), 1);

    let guarded = single_arc(gated_graph(true));
    let report = Verifier::new(&guarded, &config).run();
    assert!(report.unguarded_edges.is_empty());
    assert!(report.requirement_mismatches.is_empty());
    assert!(report.is_clean());
}

#[test]
fn test_baseline_ratchet() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("verification-baseline.json");
    let config = SimulationConfig::default();

    let registry = single_arc(deadlocked_graph());
    let first = Verifier::new(&registry, &config).run();
    Baseline::from_report(&first).save(&path).unwrap();

    let second = Verifier::new(&registry, &config).run();
    let diff = Baseline::load(&path).unwrap().diff(&second);
    assert!(!diff.has_regressions());
    assert_eq!(diff.known.len(), 1);

    // A new defect elsewhere is caught.
    let mut registry = single_arc(deadlocked_graph());
    registry
        .register_arc(CharacterArc::new("samuel", gated_graph(false)))
        .unwrap();
    let third = Verifier::new(&registry, &config).run();
    let diff = Baseline::load(&path).unwrap().diff(&third);
    assert!(diff.has_regressions());
    assert!(diff.new.contains("unguarded:samuel:secret<-samuel:intro:ask"));
}

#[test]
fn test_reports_are_byte_identical() {
    let build = || {
        let mut registry = single_arc(deadlocked_graph());
        registry
            .register_arc(CharacterArc::new("samuel", gated_graph(false)))
            .unwrap();
        registry
    };
    let config = SimulationConfig::default();

    let first = Verifier::new(&build(), &config).run().to_json().unwrap();
    let second = Verifier::new(&build(), &config).run().to_json().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_registry_fallback_across_variants() {
    let base = DialogueGraph::new("samuel", "samuel_intro")
        .for_character("samuel")
        .with_node(
            DialogueNode::new("samuel_intro").with_choice(
                Choice::new("finish", "samuel_outro")
                    .with_consequence(StateChange::new().with_global_flag("samuel_arc_complete")),
            ),
        )
        .with_node(DialogueNode::new("samuel_outro"));
    let revisit = DialogueGraph::new("samuel_revisit", "samuel_welcome_back")
        .for_character("samuel")
        .with_node(DialogueNode::new("samuel_welcome_back"));

    let mut registry = GraphRegistry::new();
    registry
        .register_arc(
            CharacterArc::new("samuel", base).with_variant(
                ArcVariant::new("revisit", revisit)
                    .when(StateCondition::new().with_global_flag("samuel_arc_complete")),
            ),
        )
        .unwrap();

    // Finishing the arc flips the resolved variant, but the outro still lives
    // in the base graph and must be found there.
    let navigator = Navigator::new(&registry);
    let transition = navigator
        .replay("samuel_intro", &GameState::new(), &["finish"])
        .unwrap();
    let Transition::Entered(at) = transition else {
        panic!("expected to enter samuel_outro");
    };
    assert_eq!(at.owner.graph.id.as_str(), "samuel");
    assert_eq!(
        registry.resolve_graph("samuel", &at.state).unwrap().id.as_str(),
        "samuel_revisit"
    );
}

#[test]
fn test_guard_on_another_characters_trust() {
    let trusted = StateCondition::new().with_trust(NumericRange::at_least(5));
    let maya = DialogueGraph::new("maya", "maya_intro")
        .for_character("maya")
        .with_node(DialogueNode::new("maya_intro").with_choice(
            Choice::new("go_samuel", "samuel_secret").visible_when(trusted.clone()),
        ));
    let samuel = DialogueGraph::new("samuel", "samuel_intro")
        .for_character("samuel")
        .with_node(
            DialogueNode::new("samuel_intro").with_choice(Choice::new("leave", TRAVEL_PENDING)),
        )
        .with_node(
            DialogueNode::new("samuel_secret")
                .requires(trusted)
                .with_choice(Choice::new("leave", TRAVEL_PENDING)),
        );

    let mut registry = GraphRegistry::new();
    registry.register_arc(CharacterArc::new("maya", maya)).unwrap();
    registry.register_arc(CharacterArc::new("samuel", samuel)).unwrap();

    // Maya's trust opens the edge, but the node checks samuel's.
    let state = apply_state_change(&GameState::new(), &StateChange::for_character("maya").with_trust(6));
    let err = Navigator::new(&registry)
        .replay("maya_intro", &state, &["go_samuel"])
        .unwrap_err();
    assert_eq!(err, NavigationError::RequirementNotMet(NodeId::from("samuel_secret")));

    let report = Verifier::new(&registry, &SimulationConfig::default()).run();
    assert!(report
        .violation_keys()
        .contains("unguarded:samuel:samuel_secret<-maya:maya_intro:go_samuel"));
}
