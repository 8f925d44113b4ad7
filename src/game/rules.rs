//! Game Rule Capability Interface
//!
//! Rule sets are modeled as a capability pair: `GameRules` builds a fresh
//! simulation from a seed, `GameSim` applies recorded moves to it. Variants
//! are selected by `GameId` through a registry that is read-only after
//! initialization, so concurrent replays share it freely.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::hash::StateHasher;
use crate::game::moves::MoveRecord;
use crate::game::stacker::GlyphStacker;

/// Identifies a rule set variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GameId(pub u16);

impl GameId {
    /// The built-in Glyph Stacker rule set.
    pub const GLYPH_STACKER: GameId = GameId(1);
}

/// Canonical derived statistics for a completed replay.
///
/// Claimed stats are compared field-for-field against these.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalStats {
    /// Moves successfully applied.
    pub moves_applied: u32,
    /// Total rows cleared.
    pub lines_cleared: u32,
    /// Bombs spent.
    pub bombs_used: u32,
    /// Longest consecutive-clear streak.
    pub max_combo: u32,
}

/// Why a move was structurally invalid for the current state.
///
/// These are rule violations, never clamped or coerced: the session that
/// produced them is rejected outright.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum IllegalMoveReason {
    /// Column index is outside the well.
    #[error("column {0} is out of bounds")]
    ColumnOutOfBounds(u8),

    /// Bomb move with no bomb in reserve.
    #[error("no bomb available")]
    NoBombAvailable,

    /// Move recorded after the game already ended.
    #[error("game is already over")]
    GameOver,
}

/// A rule set: constructs seeded simulations.
pub trait GameRules: Send + Sync {
    /// The identifier this rule set is registered under.
    fn game_id(&self) -> GameId;

    /// Start a fresh simulation for the given session seed.
    fn start(&self, seed: u64) -> Box<dyn GameSim>;
}

/// A running simulation: the deterministic move-application contract.
pub trait GameSim {
    /// Apply one move. Structurally invalid moves are errors, never clamped.
    fn apply_move(&mut self, mv: &MoveRecord) -> Result<(), IllegalMoveReason>;

    /// Has the game reached a terminal state?
    fn is_terminal(&self) -> bool;

    /// Current canonical score.
    fn score(&self) -> u64;

    /// Current canonical stats.
    fn stats(&self) -> CanonicalStats;

    /// Feed the full simulated state into a hasher (for trace hashing).
    fn write_state(&self, hasher: &mut StateHasher);
}

/// Registry of rule sets keyed by `GameId`.
///
/// Built once at startup; read-only afterwards.
pub struct RulesRegistry {
    rules: BTreeMap<GameId, Arc<dyn GameRules>>,
}

impl RulesRegistry {
    /// Registry with all built-in rule sets.
    pub fn builtin() -> Self {
        let mut rules: BTreeMap<GameId, Arc<dyn GameRules>> = BTreeMap::new();
        rules.insert(GameId::GLYPH_STACKER, Arc::new(GlyphStacker::default()));
        Self { rules }
    }

    /// Look up a rule set.
    pub fn get(&self, game_id: GameId) -> Option<Arc<dyn GameRules>> {
        self.rules.get(&game_id).cloned()
    }
}

impl Default for RulesRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
