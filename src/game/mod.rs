//! Move Replay Simulator
//!
//! All game simulation code. 100% deterministic.
//!
//! ## Module Structure
//!
//! - `moves`: Timestamped move records
//! - `rules`: `GameRules`/`GameSim` capability traits + rule set registry
//! - `stacker`: The built-in Glyph Stacker rule set
//! - `replay`: Deterministic replay producing canonical outcomes

pub mod moves;
pub mod replay;
pub mod rules;
pub mod stacker;

// Re-export key types
pub use moves::{MoveKind, MoveRecord};
pub use replay::{replay, ReplayError, ReplayOutcome};
pub use rules::{CanonicalStats, GameId, GameRules, GameSim, IllegalMoveReason, RulesRegistry};
pub use stacker::GlyphStacker;
