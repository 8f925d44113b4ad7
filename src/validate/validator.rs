//! Verdict Algorithm
//!
//! Runs the deterministic replay and classifies the session. Replay and
//! score checks are exact, so their failures are hard rejects; policy
//! heuristics can false-positive, so their failures are `Suspicious` and go
//! to operator adjudication instead.

use tracing::{debug, warn};

use crate::game::replay::{replay, ReplayError, ReplayOutcome};
use crate::game::rules::GameRules;
use crate::validate::session::{GameSession, ValidationPolicy, ValidationVerdict};

/// Outcome of validating one session.
#[derive(Clone, Copy, Debug)]
pub struct Validation {
    /// The verdict.
    pub verdict: ValidationVerdict,
    /// Canonical outcome, present whenever the replay itself succeeded.
    pub outcome: Option<ReplayOutcome>,
}

/// Validate a session against its rule set and policy.
///
/// `duplicate_seed` is true when another session from the same wallet with
/// the same seed was seen earlier; the store tracks that (this function is
/// otherwise pure).
pub fn validate(
    session: &GameSession,
    rules: &dyn GameRules,
    policy: &ValidationPolicy,
    duplicate_seed: bool,
) -> Validation {
    // 1. Deterministic replay. Malformed streams and rule violations are
    //    both hard rejects, logged distinctly for the audit trail.
    let outcome = match replay(session.seed, &session.moves, rules) {
        Ok(outcome) => outcome,
        Err(err @ ReplayError::NonMonotonicTimestamp { .. }) => {
            warn!(
                session = %uuid::Uuid::from_bytes(session.session_id.0),
                %err,
                "malformed move stream"
            );
            return Validation {
                verdict: ValidationVerdict::RejectedIllegalMove,
                outcome: None,
            };
        }
        Err(err @ ReplayError::IllegalMove { .. }) => {
            warn!(
                session = %uuid::Uuid::from_bytes(session.session_id.0),
                %err,
                "illegal move during replay"
            );
            return Validation {
                verdict: ValidationVerdict::RejectedIllegalMove,
                outcome: None,
            };
        }
    };

    // 2. Hard move-rate cap. Exact, so a hard reject rather than Suspicious.
    let rate = moves_per_sec(session);
    if rate > u64::from(policy.hard_max_moves_per_sec) {
        warn!(
            session = %uuid::Uuid::from_bytes(session.session_id.0),
            rate,
            cap = policy.hard_max_moves_per_sec,
            "move rate above hard cap"
        );
        return Validation {
            verdict: ValidationVerdict::RejectedRateLimit,
            outcome: Some(outcome),
        };
    }

    // 3. Exact claim comparison. No tolerance: a single point off is a
    //    reject. Zero-move sessions with a nonzero claim land here because
    //    the canonical score of an empty stream is 0.
    if session.claimed_score != outcome.canonical_score
        || session.claimed_stats != outcome.canonical_stats
    {
        warn!(
            session = %uuid::Uuid::from_bytes(session.session_id.0),
            claimed = session.claimed_score,
            canonical = outcome.canonical_score,
            "claimed outcome mismatch"
        );
        return Validation {
            verdict: ValidationVerdict::RejectedScoreMismatch,
            outcome: Some(outcome),
        };
    }

    // 4. Soft heuristics: flag, never auto-reject.
    let mut suspicious = None;
    if rate > u64::from(policy.soft_max_moves_per_sec) {
        suspicious = Some("move rate above soft limit");
    } else if session.duration_ms() > policy.max_session_duration_ms {
        suspicious = Some("session duration above limit");
    } else if duplicate_seed {
        suspicious = Some("duplicate (wallet, seed) pair");
    }

    if let Some(reason) = suspicious {
        warn!(
            session = %uuid::Uuid::from_bytes(session.session_id.0),
            reason,
            "session flagged for review"
        );
        return Validation {
            verdict: ValidationVerdict::Suspicious,
            outcome: Some(outcome),
        };
    }

    debug!(
        session = %uuid::Uuid::from_bytes(session.session_id.0),
        score = outcome.canonical_score,
        "session accepted"
    );
    Validation {
        verdict: ValidationVerdict::Accepted,
        outcome: Some(outcome),
    }
}

/// Whole moves per second over the stream's covered duration.
fn moves_per_sec(session: &GameSession) -> u64 {
    rate_per_sec(session.moves.len() as u64, session.duration_ms())
}

/// The rate quotient, kept in u64 end to end. A narrowing cast here would
/// wrap for pathologically dense streams and let them slip under the caps.
///
/// A multi-move stream squeezed into zero milliseconds reads as one move
/// per millisecond, which always exceeds any sane cap.
fn rate_per_sec(move_count: u64, duration_ms: u64) -> u64 {
    if move_count <= 1 {
        return 0;
    }
    move_count.saturating_mul(1000) / duration_ms.max(1)
}
