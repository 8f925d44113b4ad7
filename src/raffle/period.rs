//! Period Lifecycle
//!
//! A period moves `Open -> Closed -> Drawn`, or `Open -> Closed ->
//! Undrawn` when randomness cannot be obtained. Closing is the pivot:
//! it freezes the accepted set, ranks it, allocates tickets, publishes
//! the Merkle commitment, and runs the draw, all under the period's own
//! mutex so at most one close executes at a time. `Drawn` and `Undrawn`
//! are terminal; a second close of a settled period returns the stored
//! snapshot unchanged.
//!
//! Settled snapshots are published through a write-once cell next to the
//! mutex, so status and artifact reads never wait on an in-flight close.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};

use crate::raffle::commitment::{self, InclusionProof, MerkleCommitment};
use crate::raffle::draw::{select_winners, RaffleDraw};
use crate::raffle::leaderboard::{
    close_period as rank_period, AcceptedSession, LeaderboardEntry, PeriodId, TierBreakTable,
};
use crate::raffle::tickets::{allocate, total_tickets, TicketAllocation, TierPolicy};
use crate::raffle::vrf::VrfCoordinator;
use crate::validate::session::WalletId;

/// Where a period is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PeriodStatus {
    /// Accepting sessions.
    Open,
    /// Frozen; ranked, allocated, and committed.
    Closed,
    /// Terminal: winners selected and published.
    Drawn,
    /// Terminal: randomness could not be obtained. Never auto-retried;
    /// resolving it is a manual operation against a fresh period.
    Undrawn,
}

/// Engine failures.
#[derive(Debug, thiserror::Error)]
pub enum RaffleError {
    /// No such period.
    #[error("unknown period {0}")]
    UnknownPeriod(PeriodId),

    /// Another caller is closing this period right now.
    #[error("close already in progress for period {0}")]
    CloseInProgress(PeriodId),

    /// Submission arrived after the period froze.
    #[error("period {0} is no longer open")]
    PeriodClosed(PeriodId),

    /// Archive encode/decode failed.
    #[error("archive error: {0}")]
    Archive(String),
}

/// The settled, publishable view of a period. Everything an auditor
/// needs to re-verify the draw is in here (plus the oracle public key).
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct PeriodSnapshot {
    /// The period.
    pub period_id: PeriodId,
    /// `Closed`, `Drawn`, or `Undrawn`; never `Open`.
    pub status: PeriodStatus,
    /// Final ranking.
    pub leaderboard: Vec<LeaderboardEntry>,
    /// Ticket table in rank order.
    pub allocations: Vec<TicketAllocation>,
    /// Commitment over the ticket table.
    pub commitment: MerkleCommitment,
    /// The draw, when one happened.
    pub draw: Option<RaffleDraw>,
}

impl PeriodSnapshot {
    /// Serialize for cold storage.
    pub fn to_bytes(&self) -> Result<Vec<u8>, RaffleError> {
        bincode::serialize(self).map_err(|e| RaffleError::Archive(e.to_string()))
    }

    /// Restore from cold storage.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RaffleError> {
        bincode::deserialize(bytes).map_err(|e| RaffleError::Archive(e.to_string()))
    }
}

/// Period-level knobs.
#[derive(Clone, Debug)]
pub struct PeriodConfig {
    /// Rank-to-tier mapping.
    pub breaks: TierBreakTable,
    /// Tier-to-ticket mapping.
    pub tickets: TierPolicy,
    /// Winners per draw (capped by wallets holding tickets).
    pub prize_slots: usize,
}

impl Default for PeriodConfig {
    fn default() -> Self {
        Self {
            breaks: TierBreakTable::default(),
            tickets: TierPolicy::default(),
            prize_slots: 3,
        }
    }
}

struct PeriodRecord {
    status: PeriodStatus,
    accepted: Vec<AcceptedSession>,
}

/// One period's storage: the mutable record behind its mutex, and the
/// settled snapshot published once so readers never touch the mutex.
struct PeriodSlot {
    record: Mutex<PeriodRecord>,
    settled: OnceLock<Arc<PeriodSnapshot>>,
}

/// Owns period records and drives the close/draw pipeline.
///
/// The outer map is under an async `RwLock`; each period has its own
/// `Mutex` so closing one period never blocks submissions to another.
/// Reads of settled artifacts bypass the per-period mutex entirely.
pub struct RaffleEngine {
    periods: RwLock<BTreeMap<PeriodId, Arc<PeriodSlot>>>,
    coordinator: VrfCoordinator,
    config: PeriodConfig,
}

impl RaffleEngine {
    /// Build an engine over a VRF coordinator.
    pub fn new(coordinator: VrfCoordinator, config: PeriodConfig) -> Self {
        Self {
            periods: RwLock::new(BTreeMap::new()),
            coordinator,
            config,
        }
    }

    /// Open a period. Reopening an existing period is a no-op.
    pub async fn open_period(&self, period_id: PeriodId) {
        let mut periods = self.periods.write().await;
        periods.entry(period_id).or_insert_with(|| {
            info!(period_id, "period opened");
            Arc::new(PeriodSlot {
                record: Mutex::new(PeriodRecord {
                    status: PeriodStatus::Open,
                    accepted: Vec::new(),
                }),
                settled: OnceLock::new(),
            })
        });
    }

    async fn slot(&self, period_id: PeriodId) -> Result<Arc<PeriodSlot>, RaffleError> {
        self.periods
            .read()
            .await
            .get(&period_id)
            .cloned()
            .ok_or(RaffleError::UnknownPeriod(period_id))
    }

    /// Record an accepted session into an open period.
    pub async fn record_accepted(
        &self,
        period_id: PeriodId,
        session: AcceptedSession,
    ) -> Result<(), RaffleError> {
        let slot = self.slot(period_id).await?;
        let mut record = slot.record.lock().await;
        if record.status != PeriodStatus::Open {
            return Err(RaffleError::PeriodClosed(period_id));
        }
        record.accepted.push(session);
        Ok(())
    }

    /// Close a period: rank, allocate, commit, draw.
    ///
    /// Idempotent: closing an already-settled period returns the stored
    /// snapshot. A concurrent close is rejected with `CloseInProgress`
    /// rather than queued. VRF exhaustion settles the period `Undrawn`;
    /// the snapshot (leaderboard, tickets, commitment) still stands.
    pub async fn close_period(
        &self,
        period_id: PeriodId,
    ) -> Result<Arc<PeriodSnapshot>, RaffleError> {
        let slot = self.slot(period_id).await?;
        if let Some(snapshot) = slot.settled.get() {
            info!(period_id, status = ?snapshot.status, "close is a no-op, period already settled");
            return Ok(snapshot.clone());
        }

        let mut record = slot
            .record
            .try_lock()
            .map_err(|_| RaffleError::CloseInProgress(period_id))?;
        // A concurrent close may have settled between the check and the lock.
        if let Some(snapshot) = slot.settled.get() {
            return Ok(snapshot.clone());
        }

        record.status = PeriodStatus::Closed;
        let leaderboard = rank_period(period_id, &record.accepted, &self.config.breaks);
        let allocations = allocate(&leaderboard, &self.config.tickets);
        let commitment = commitment::commit(period_id, &allocations);
        let total = total_tickets(&allocations);
        info!(
            period_id,
            entries = leaderboard.len(),
            total_tickets = total,
            root = %hex::encode(commitment.root),
            "period closed and committed"
        );

        if total == 0 {
            warn!(period_id, "no tickets allocated, period has no raffle");
            let snapshot = Arc::new(PeriodSnapshot {
                period_id,
                status: PeriodStatus::Closed,
                leaderboard,
                allocations,
                commitment,
                draw: None,
            });
            let _ = slot.settled.set(snapshot.clone());
            return Ok(snapshot);
        }

        // The record mutex is held across the oracle call, so a period
        // never has more than one randomness request outstanding.
        let snapshot = match self
            .coordinator
            .request_randomness(period_id, &commitment.root)
            .await
        {
            Ok(vrf) => {
                let draw = select_winners(&commitment, &allocations, &vrf, self.config.prize_slots);
                record.status = PeriodStatus::Drawn;
                PeriodSnapshot {
                    period_id,
                    status: PeriodStatus::Drawn,
                    leaderboard,
                    allocations,
                    commitment,
                    draw: Some(draw),
                }
            }
            Err(err) => {
                error!(period_id, %err, "randomness unavailable, period settles undrawn");
                record.status = PeriodStatus::Undrawn;
                PeriodSnapshot {
                    period_id,
                    status: PeriodStatus::Undrawn,
                    leaderboard,
                    allocations,
                    commitment,
                    draw: None,
                }
            }
        };

        let snapshot = Arc::new(snapshot);
        let _ = slot.settled.set(snapshot.clone());
        Ok(snapshot)
    }

    /// Current lifecycle status of a period.
    ///
    /// `Open` until a close completes; settled statuses read from the
    /// published snapshot, never the per-period mutex, so this answers
    /// immediately even while a close is in flight.
    pub async fn period_status(&self, period_id: PeriodId) -> Result<PeriodStatus, RaffleError> {
        let slot = self.slot(period_id).await?;
        Ok(slot
            .settled
            .get()
            .map(|snapshot| snapshot.status)
            .unwrap_or(PeriodStatus::Open))
    }

    /// The stored snapshot of a settled period, if any. Lock-free with
    /// respect to the period record.
    pub async fn snapshot(
        &self,
        period_id: PeriodId,
    ) -> Result<Option<Arc<PeriodSnapshot>>, RaffleError> {
        let slot = self.slot(period_id).await?;
        Ok(slot.settled.get().cloned())
    }

    /// Inclusion proof for a wallet's ticket range in a settled period.
    pub async fn prove_inclusion(
        &self,
        period_id: PeriodId,
        wallet_id: WalletId,
    ) -> Result<Option<InclusionProof>, RaffleError> {
        let snapshot = self.snapshot(period_id).await?;
        Ok(snapshot.and_then(|s| commitment::prove(&s.allocations, wallet_id)))
    }
}
