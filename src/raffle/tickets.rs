//! Ticket Allocation
//!
//! Maps ranked leaderboard entries to contiguous ticket-index ranges.
//! Processing in rank order with a cumulative cursor makes "which ticket
//! index belongs to which wallet" a pure function of the entry list and
//! the tier policy: anyone holding the published leaderboard and policy
//! can reproduce the whole table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::raffle::leaderboard::{LeaderboardEntry, PeriodId, Tier};
use crate::validate::session::WalletId;

/// Tier to ticket-count mapping. Configuration, not computation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TierPolicy {
    counts: BTreeMap<Tier, u64>,
}

impl TierPolicy {
    /// Build a policy from explicit (tier, tickets) pairs.
    pub fn new(counts: impl IntoIterator<Item = (Tier, u64)>) -> Self {
        Self {
            counts: counts.into_iter().collect(),
        }
    }

    /// Tickets for a tier. Unranked (`None`) entries always get zero.
    pub fn tickets_for(&self, tier: Option<Tier>) -> u64 {
        tier.and_then(|t| self.counts.get(&t).copied()).unwrap_or(0)
    }
}

impl Default for TierPolicy {
    fn default() -> Self {
        Self::new([(Tier::Gold, 10), (Tier::Silver, 5), (Tier::Bronze, 1)])
    }
}

/// A wallet's slice of the ticket space: the half-open interval
/// `[range_start, range_end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketAllocation {
    /// The wallet.
    pub wallet_id: WalletId,
    /// Period this allocation belongs to.
    pub period_id: PeriodId,
    /// Number of tickets (range length; zero is valid and unreachable).
    pub ticket_count: u64,
    /// First ticket index, inclusive.
    pub range_start: u64,
    /// One past the last ticket index.
    pub range_end: u64,
}

impl TicketAllocation {
    /// Does this range contain the ticket index?
    pub fn contains(&self, ticket: u64) -> bool {
        ticket >= self.range_start && ticket < self.range_end
    }
}

/// Allocate ticket ranges in rank order.
///
/// Ranges partition `[0, total)` contiguously: disjoint, gapless, in rank
/// order. Zero-ticket tiers produce zero-length ranges.
pub fn allocate(entries: &[LeaderboardEntry], policy: &TierPolicy) -> Vec<TicketAllocation> {
    let mut cursor = 0u64;
    entries
        .iter()
        .map(|entry| {
            let count = policy.tickets_for(entry.tier);
            let allocation = TicketAllocation {
                wallet_id: entry.wallet_id,
                period_id: entry.period_id,
                ticket_count: count,
                range_start: cursor,
                range_end: cursor + count,
            };
            cursor += count;
            allocation
        })
        .collect()
}

/// Total tickets across an allocation table.
pub fn total_tickets(allocations: &[TicketAllocation]) -> u64 {
    allocations.last().map(|a| a.range_end).unwrap_or(0)
}

/// Wallet owning a ticket index, via the range partition.
pub fn wallet_for_ticket(allocations: &[TicketAllocation], ticket: u64) -> Option<WalletId> {
    // Ranges are sorted by construction; zero-length ranges never match.
    allocations
        .iter()
        .find(|a| a.contains(ticket))
        .map(|a| a.wallet_id)
}
