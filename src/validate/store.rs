//! Verdict Store and Submission Pipeline
//!
//! Validation is embarrassingly parallel across sessions; the only shared
//! state is this append-only, write-once verdict store. A second submission
//! of the same session id is a no-op that returns the stored verdict, which
//! makes retried requests idempotent.

use std::collections::BTreeMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::game::replay::ReplayOutcome;
use crate::game::rules::RulesRegistry;
use crate::validate::session::{
    GameSession, SessionId, ValidationPolicy, ValidationVerdict, WalletId,
};
use crate::validate::validator::validate;

/// The verdict recorded for one session (1:1 with the sessions table).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct VerdictRecord {
    /// Session this verdict belongs to.
    pub session_id: SessionId,
    /// The verdict, written once (Suspicious may later be adjudicated).
    pub verdict: ValidationVerdict,
    /// Canonical outcome, when the replay itself succeeded.
    pub outcome: Option<ReplayOutcome>,
}

/// Pipeline errors.
#[derive(Clone, Debug, thiserror::Error)]
pub enum PipelineError {
    /// The session referenced an unregistered rule set.
    #[error("unknown game id {0}")]
    UnknownGame(u16),

    /// Adjudication targeted a session with no stored verdict.
    #[error("no verdict recorded for session")]
    UnknownSession,

    /// Adjudication targeted a verdict that is already final.
    #[error("verdict is final and cannot be adjudicated")]
    VerdictFinal,

    /// Adjudication tried to resolve to a non-final verdict.
    #[error("adjudication must resolve to a final verdict")]
    NotAResolution,
}

/// Concurrent session-validation pipeline.
///
/// Safe to call from many tasks at once: the rules registry is read-only
/// and both maps are guarded. Verdicts are write-once.
pub struct SessionPipeline {
    registry: RulesRegistry,
    policy: ValidationPolicy,
    verdicts: RwLock<BTreeMap<SessionId, VerdictRecord>>,
    /// First session seen per (wallet, seed); later ones are duplicates.
    seen_seeds: RwLock<BTreeMap<(WalletId, u64), SessionId>>,
}

impl SessionPipeline {
    /// Create a pipeline with the built-in rules and the given policy.
    pub fn new(policy: ValidationPolicy) -> Self {
        Self {
            registry: RulesRegistry::builtin(),
            policy,
            verdicts: RwLock::new(BTreeMap::new()),
            seen_seeds: RwLock::new(BTreeMap::new()),
        }
    }

    /// Validate a session and record its verdict.
    ///
    /// Idempotent: if a verdict already exists for this session id it is
    /// returned unchanged, no matter what the resubmission contains.
    pub fn submit(&self, session: &GameSession) -> Result<VerdictRecord, PipelineError> {
        if let Some(existing) = self.verdict(&session.session_id) {
            return Ok(existing);
        }

        let rules = self
            .registry
            .get(session.game_id)
            .ok_or(PipelineError::UnknownGame(session.game_id.0))?;

        let duplicate_seed = {
            let mut seen = self
                .seen_seeds
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let key = (session.wallet_id, session.seed);
            match seen.get(&key) {
                Some(first) => *first != session.session_id,
                None => {
                    seen.insert(key, session.session_id);
                    false
                }
            }
        };

        let validation = validate(session, rules.as_ref(), &self.policy, duplicate_seed);
        let record = VerdictRecord {
            session_id: session.session_id,
            verdict: validation.verdict,
            outcome: validation.outcome,
        };

        let mut verdicts = self
            .verdicts
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // A concurrent submit may have won the race; the first write stands.
        let stored = *verdicts.entry(session.session_id).or_insert(record);
        info!(
            session = %uuid::Uuid::from_bytes(stored.session_id.0),
            verdict = ?stored.verdict,
            "verdict recorded"
        );
        Ok(stored)
    }

    /// Look up the stored verdict for a session.
    pub fn verdict(&self, session_id: &SessionId) -> Option<VerdictRecord> {
        self.verdicts
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(session_id)
            .copied()
    }

    /// Operator resolution of a `Suspicious` verdict.
    ///
    /// Only `Suspicious` is reversible; the resolution itself must be a
    /// final verdict (`Accepted` or one of the rejects).
    pub fn adjudicate(
        &self,
        session_id: &SessionId,
        resolution: ValidationVerdict,
    ) -> Result<VerdictRecord, PipelineError> {
        if !resolution.is_final() {
            return Err(PipelineError::NotAResolution);
        }

        let mut verdicts = self
            .verdicts
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let record = verdicts
            .get_mut(session_id)
            .ok_or(PipelineError::UnknownSession)?;
        if record.verdict.is_final() {
            return Err(PipelineError::VerdictFinal);
        }

        record.verdict = resolution;
        info!(
            session = %uuid::Uuid::from_bytes(session_id.0),
            verdict = ?resolution,
            "suspicious session adjudicated"
        );
        Ok(*record)
    }
}

impl Default for SessionPipeline {
    fn default() -> Self {
        Self::new(ValidationPolicy::default())
    }
}
