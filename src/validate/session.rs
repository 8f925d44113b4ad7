//! Session and Verdict Definitions
//!
//! Submitted sessions are immutable; verdicts are written exactly once.
//! Identifiers implement `Ord` so every map and sort in the pipeline is
//! deterministic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::game::moves::MoveRecord;
use crate::game::rules::{CanonicalStats, GameId};

/// Unique wallet identifier (UUID as bytes).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct WalletId(pub [u8; 16]);

impl WalletId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Create from UUID string.
    pub fn from_uuid_str(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s).ok().map(|u| Self(*u.as_bytes()))
    }

    /// Convert to UUID string.
    pub fn to_uuid_string(&self) -> String {
        uuid::Uuid::from_bytes(self.0).to_string()
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

/// Unique session identifier (UUID as bytes).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct SessionId(pub [u8; 16]);

impl SessionId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Generate a fresh random id.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().into_bytes())
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

/// A submitted game session. Immutable once submitted; owned by the
/// validator pipeline until a verdict is recorded.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameSession {
    /// Unique session id.
    pub session_id: SessionId,
    /// Submitting wallet.
    pub wallet_id: WalletId,
    /// Which rule set the session was played under.
    pub game_id: GameId,
    /// Seed the client was issued for this session.
    pub seed: u64,
    /// Ordered, timestamped move stream.
    pub moves: Vec<MoveRecord>,
    /// Score the client claims to have achieved.
    pub claimed_score: u64,
    /// Stats the client claims.
    pub claimed_stats: CanonicalStats,
    /// Server-side submission time.
    pub submitted_at: DateTime<Utc>,
}

impl GameSession {
    /// Duration covered by the move stream, in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.moves.last().map(|m| m.at_ms).unwrap_or(0)
    }
}

/// One verdict per session, set exactly once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationVerdict {
    /// Canonical replay matched the claim; session counts for the period.
    Accepted,
    /// Claimed score differed from the canonical score. Hard reject.
    RejectedScoreMismatch,
    /// Replay hit an illegal move or a malformed stream. Hard reject.
    RejectedIllegalMove,
    /// Move rate exceeded the hard cap. Hard reject.
    RejectedRateLimit,
    /// Heuristics flagged the session; held for operator adjudication.
    Suspicious,
}

impl ValidationVerdict {
    /// Does this verdict admit the session into the leaderboard?
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationVerdict::Accepted)
    }

    /// Hard verdicts are final; only `Suspicious` may be adjudicated later.
    pub fn is_final(&self) -> bool {
        !matches!(self, ValidationVerdict::Suspicious)
    }
}

/// Policy-level heuristics applied on top of the exact replay checks.
///
/// Soft limits yield `Suspicious` (heuristics can false-positive); the hard
/// move-rate cap yields `RejectedRateLimit` because no human input device
/// reaches it.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ValidationPolicy {
    /// Moves per second above which a session is flagged `Suspicious`.
    pub soft_max_moves_per_sec: u32,
    /// Moves per second above which a session is hard-rejected.
    pub hard_max_moves_per_sec: u32,
    /// Sessions longer than this are flagged `Suspicious`.
    pub max_session_duration_ms: u64,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            soft_max_moves_per_sec: 10,
            hard_max_moves_per_sec: 50,
            max_session_duration_ms: 30 * 60 * 1000, // 30 minutes
        }
    }
}
