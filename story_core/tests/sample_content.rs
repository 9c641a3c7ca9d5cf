//! The bundled `content/` directory must load and verify clean.

use std::path::PathBuf;

use story_core::{load_registry, Baseline, Navigator, SimulationConfig, Transition, Verifier};
use story_rules::{GameState, RelationshipStatus, TRAVEL_PENDING};

fn content_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../content")
}

#[test]
fn test_sample_content_is_clean() {
    let registry = load_registry(&content_dir()).unwrap();
    let config = SimulationConfig::default();
    let report = Verifier::new(&registry, &config).run();

    assert_eq!(report.graphs_scanned, 4);
    assert!(report.node_id_collisions.is_empty());
    assert!(report.is_clean(), "unexpected violations: {:?}", report.violation_keys());

    let baseline = Baseline::load(&content_dir().join("verification-baseline.json")).unwrap();
    assert!(!baseline.diff(&report).has_regressions());
}

#[test]
fn test_sample_samuel_path() {
    let registry = load_registry(&content_dir()).unwrap();
    let navigator = Navigator::new(&registry);

    let transition = navigator
        .replay(
            "samuel_intro",
            &GameState::new(),
            &["sit_quietly", "continue", "ask_secret", "thank", "travel"],
        )
        .unwrap();
    let Transition::Deferred { sentinel, state } = transition else {
        panic!("expected the path to end on a travel sentinel");
    };

    assert_eq!(sentinel.as_str(), TRAVEL_PENDING);
    let samuel = "samuel".into();
    assert_eq!(state.trust(&samuel), 3);
    assert_eq!(state.character(&samuel).relationship, RelationshipStatus::Confidant);
    assert!(state.has_global_flag("samuel_arc_complete"));
    assert_eq!(state.mysteries.get("night_line").map(String::as_str), Some("beyond_last_station"));

    let revisit = registry.resolve_graph("samuel", &state).unwrap();
    assert_eq!(revisit.id.as_str(), "samuel_revisit");
}
