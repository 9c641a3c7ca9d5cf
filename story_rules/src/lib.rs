//! # Story Rules
//!
//! The rules crate for dialogue graphs: the authored graph model, the player
//! state aggregate, and the two pure functions everything else is built on.
//! This crate performs no I/O and holds no process-wide mutable state.
//!
//! - **graph**: nodes, choices, sentinel targets
//! - **state**: per-character trust and knowledge, global flags, patterns
//! - **conditions**: predicate evaluation and combo registry
//! - **effects**: immutable state mutation
//! - **transitions**: choice availability and the effects of moving along an edge

pub mod conditions;
pub mod effects;
pub mod graph;
pub mod ids;
pub mod state;
pub mod transitions;

pub use conditions::*;
pub use effects::*;
pub use graph::*;
pub use ids::*;
pub use state::*;
pub use transitions::*;
