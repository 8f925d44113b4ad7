//! Recorded Move Streams
//!
//! A session submits an ordered stream of timestamped moves. The stream is
//! the only client-provided input to the simulator; everything else derives
//! from the session seed. Timestamps are client-relative milliseconds and
//! must be monotonically non-decreasing - a regression is a malformed-input
//! error caught before any game rule runs.

use serde::{Deserialize, Serialize};

use crate::core::hash::StateHasher;

/// A single move in a recorded stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// Milliseconds since session start. Monotonically non-decreasing.
    pub at_ms: u64,
    /// The action taken.
    pub kind: MoveKind,
}

impl MoveRecord {
    /// Create a move record.
    pub const fn new(at_ms: u64, kind: MoveKind) -> Self {
        Self { at_ms, kind }
    }

    /// Feed this move into a trace hasher.
    ///
    /// Layout: at_ms (u64 LE), kind tag (u8), column (u8, 0xFF when absent).
    pub fn write_hash(&self, hasher: &mut StateHasher) {
        hasher.update_u64(self.at_ms);
        match self.kind {
            MoveKind::Drop { column } => {
                hasher.update_u8(0);
                hasher.update_u8(column);
            }
            MoveKind::Bomb { column } => {
                hasher.update_u8(1);
                hasher.update_u8(column);
            }
            MoveKind::Wait => {
                hasher.update_u8(2);
                hasher.update_u8(0xFF);
            }
        }
    }
}

/// The actions a player can record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveKind {
    /// Drop the next seeded piece into a column.
    Drop {
        /// Target column index.
        column: u8,
    },
    /// Spend a bomb to empty a column. Requires a bomb in reserve.
    Bomb {
        /// Target column index.
        column: u8,
    },
    /// Skip a beat; advances the piece RNG without placing anything.
    Wait,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_hash_distinguishes_kinds() {
        let hash_of = |mv: MoveRecord| {
            let mut h = StateHasher::new(b"test");
            mv.write_hash(&mut h);
            h.finalize()
        };

        let drop = hash_of(MoveRecord::new(10, MoveKind::Drop { column: 2 }));
        let bomb = hash_of(MoveRecord::new(10, MoveKind::Bomb { column: 2 }));
        let wait = hash_of(MoveRecord::new(10, MoveKind::Wait));

        assert_ne!(drop, bomb);
        assert_ne!(drop, wait);
        assert_ne!(bomb, wait);
    }

    #[test]
    fn test_move_hash_includes_timestamp() {
        let hash_of = |mv: MoveRecord| {
            let mut h = StateHasher::new(b"test");
            mv.write_hash(&mut h);
            h.finalize()
        };

        let a = hash_of(MoveRecord::new(10, MoveKind::Wait));
        let b = hash_of(MoveRecord::new(11, MoveKind::Wait));
        assert_ne!(a, b);
    }
}
