//! Deterministic Replay
//!
//! Re-executes a recorded move stream against a seeded simulation and
//! produces the canonical outcome. Identical inputs always yield an
//! identical outcome: no I/O, no wall clock, no floating point, and every
//! random draw derives from the session seed.
//!
//! The replay hash commits to the full deterministic trace (each applied
//! move plus the post-move state hash), so a disputed session can be
//! audited move by move without re-running anything but this function.

use serde::{Deserialize, Serialize};

use crate::core::hash::{StateHash, StateHasher};
use crate::game::moves::MoveRecord;
use crate::game::rules::{CanonicalStats, GameRules, IllegalMoveReason};

/// Canonical outcome of replaying one session.
///
/// Derived, never mutated; produced once per session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayOutcome {
    /// Score derived by the simulator.
    pub canonical_score: u64,
    /// Stats derived by the simulator.
    pub canonical_stats: CanonicalStats,
    /// Content hash of the full deterministic trace.
    pub replay_hash: StateHash,
}

/// Replay failures.
///
/// `NonMonotonicTimestamp` is input malformation (caught before any game
/// rule runs); `IllegalMove` is a rule violation. The validator maps both
/// to hard rejects but records them distinctly in logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    /// A move's timestamp was earlier than its predecessor's.
    #[error("move stream timestamp regressed at index {index}")]
    NonMonotonicTimestamp {
        /// Index of the offending move.
        index: usize,
    },

    /// A move was structurally invalid for the simulated state.
    #[error("illegal move at index {index}: {reason}")]
    IllegalMove {
        /// Index of the offending move.
        index: usize,
        /// What the rule set rejected.
        reason: IllegalMoveReason,
    },
}

/// Replay a move stream and derive the canonical outcome.
///
/// Pure function of `(seed, moves, rules)`. An empty stream is a valid
/// session with score 0.
pub fn replay(
    seed: u64,
    moves: &[MoveRecord],
    rules: &dyn GameRules,
) -> Result<ReplayOutcome, ReplayError> {
    let mut sim = rules.start(seed);

    let mut trace = StateHasher::for_replay_trace();
    trace.update_u16(rules.game_id().0);
    trace.update_u64(seed);

    let mut last_ms = 0u64;
    for (index, mv) in moves.iter().enumerate() {
        if mv.at_ms < last_ms {
            return Err(ReplayError::NonMonotonicTimestamp { index });
        }
        last_ms = mv.at_ms;

        sim.apply_move(mv)
            .map_err(|reason| ReplayError::IllegalMove { index, reason })?;

        mv.write_hash(&mut trace);
        let mut state = StateHasher::for_game_state();
        sim.write_state(&mut state);
        trace.update_hash(&state.finalize());
    }

    Ok(ReplayOutcome {
        canonical_score: sim.score(),
        canonical_stats: sim.stats(),
        replay_hash: trace.finalize(),
    })
}
