//! # Story Core
//!
//! Everything built on top of `story_rules`: composing authored graphs into
//! one registry, stepping a player through it, and verifying offline that the
//! whole content set is sound.
//!
//! ## Core Components
//!
//! - **registry**: character arcs, variants, special scenes and the flat node index
//! - **navigation**: one player step at a time, for runtime consumers
//! - **content**: loading graphs and the manifest from disk
//! - **verification**: bounded traversal, static checks, report and baseline ratchet
//!
//! ## Design Philosophy
//!
//! - **State-Driven**: which graph, node and choice a player sees depends only on the current state
//! - **Findings as Data**: content defects end up in a report, never in a panic
//! - **Deterministic**: identical content yields byte-identical reports

pub mod content;
pub mod navigation;
pub mod registry;
pub mod verification;

pub use content::*;
pub use navigation::*;
pub use registry::*;
pub use verification::*;
