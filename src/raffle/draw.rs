//! Winner Selection
//!
//! Expands one verified VRF seed into a sequence of ticket indices and
//! maps each index to its owning wallet. Pure function of published
//! inputs: anyone holding the ticket table and the VRF output can rerun
//! the draw and reproduce the winner list exactly, in order.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::core::hash::{StateHash, StateHasher};
use crate::raffle::commitment::MerkleCommitment;
use crate::raffle::leaderboard::PeriodId;
use crate::raffle::tickets::{total_tickets, wallet_for_ticket, TicketAllocation};
use crate::raffle::vrf::VrfOutput;
use crate::validate::session::WalletId;

/// Domain separator for expanding the seed into ticket indices.
const DRAW_EXPAND_DOMAIN: &[u8] = b"FAIRDRAW_DRAW_EXPAND_V1";

/// The published result of one period's raffle.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct RaffleDraw {
    /// Period the draw belongs to.
    pub period_id: PeriodId,
    /// Verified VRF seed the indices were expanded from.
    pub vrf_seed: StateHash,
    /// VRF proof, republished so auditors need not fetch it separately.
    pub vrf_proof: Vec<u8>,
    /// Winning wallets in selection order.
    pub winners: Vec<WalletId>,
    /// Wall-clock audit timestamp; not part of the deterministic output.
    pub drawn_at: DateTime<Utc>,
}

/// Expand the seed into the `draw_index`-th ticket index.
fn ticket_index(seed: &StateHash, draw_index: u32, total: u64) -> u64 {
    let mut hasher = StateHasher::new(DRAW_EXPAND_DOMAIN);
    hasher.update_hash(seed);
    hasher.update_u32(draw_index);
    let digest = hasher.finalize();

    let mut word = [0u8; 8];
    word.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(word) % total
}

/// Draw winners for a committed period.
///
/// Walks draw indices 0, 1, 2, ... mapping each to a ticket and its
/// wallet; a wallet already selected is skipped and the index advances.
/// Stops after `min(prize_slots, wallets holding >= 1 ticket)` winners,
/// so a small period simply awards fewer prizes.
pub fn select_winners(
    commitment: &MerkleCommitment,
    allocations: &[TicketAllocation],
    vrf: &VrfOutput,
    prize_slots: usize,
) -> RaffleDraw {
    let total = total_tickets(allocations);
    let eligible = allocations.iter().filter(|a| a.ticket_count > 0).count();
    let target = prize_slots.min(eligible);

    let mut winners = Vec::with_capacity(target);
    let mut chosen: BTreeSet<WalletId> = BTreeSet::new();
    let mut draw_index: u32 = 0;

    while winners.len() < target {
        let ticket = ticket_index(&vrf.seed, draw_index, total);
        draw_index += 1;

        // Ranges partition [0, total), so every drawn index resolves; the
        // if-let keeps the loop total without a panic path.
        if let Some(wallet) = wallet_for_ticket(allocations, ticket) {
            if chosen.insert(wallet) {
                winners.push(wallet);
            }
        }
    }

    info!(
        period_id = commitment.period_id,
        winners = winners.len(),
        total_tickets = total,
        "raffle drawn"
    );

    RaffleDraw {
        period_id: commitment.period_id,
        vrf_seed: vrf.seed,
        vrf_proof: vrf.proof.clone(),
        winners,
        drawn_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raffle::commitment::commit;
    use crate::raffle::tickets::{allocate, TierPolicy};
    use crate::raffle::leaderboard::{close_period, AcceptedSession, TierBreakTable};
    use crate::validate::session::SessionId;
    use crate::raffle::vrf::{vrf_alpha, VrfKeypair};

    fn wallet(n: u8) -> WalletId {
        WalletId([n; 16])
    }

    fn fixture(scores: &[(u8, u64)]) -> (MerkleCommitment, Vec<TicketAllocation>) {
        let accepted: Vec<AcceptedSession> = scores
            .iter()
            .map(|&(w, score)| AcceptedSession {
                session_id: SessionId([w; 16]),
                wallet_id: wallet(w),
                score,
                submitted_at: Utc::now(),
            })
            .collect();
        let entries = close_period(1, &accepted, &TierBreakTable::default());
        let allocations = allocate(&entries, &TierPolicy::default());
        let commitment = commit(1, &allocations);
        (commitment, allocations)
    }

    fn seed_for(commitment: &MerkleCommitment) -> VrfOutput {
        VrfKeypair::from_seed_bytes([3; 32]).prove(&vrf_alpha(1, &commitment.root))
    }

    #[test]
    fn test_draw_is_deterministic() {
        let (commitment, allocations) =
            fixture(&[(1, 500), (2, 400), (3, 300), (4, 200)]);
        let vrf = seed_for(&commitment);

        let a = select_winners(&commitment, &allocations, &vrf, 2);
        let b = select_winners(&commitment, &allocations, &vrf, 2);
        assert_eq!(a.winners, b.winners);
        assert_eq!(a.winners.len(), 2);
    }

    #[test]
    fn test_no_duplicate_winners() {
        let (commitment, allocations) =
            fixture(&[(1, 500), (2, 400), (3, 300), (4, 200), (5, 100)]);
        let vrf = seed_for(&commitment);

        let draw = select_winners(&commitment, &allocations, &vrf, 5);
        let unique: BTreeSet<_> = draw.winners.iter().collect();
        assert_eq!(unique.len(), draw.winners.len());
        assert_eq!(draw.winners.len(), 5);
    }

    #[test]
    fn test_prize_slots_capped_by_eligible_wallets() {
        let (commitment, allocations) = fixture(&[(1, 500), (2, 400)]);
        let vrf = seed_for(&commitment);

        let draw = select_winners(&commitment, &allocations, &vrf, 10);
        assert_eq!(draw.winners.len(), 2);
    }

    #[test]
    fn test_different_seeds_can_differ() {
        let (commitment, allocations) =
            fixture(&[(1, 500), (2, 400), (3, 300), (4, 200), (5, 100), (6, 50)]);
        let a = seed_for(&commitment);
        let b = VrfKeypair::from_seed_bytes([4; 32]).prove(&vrf_alpha(1, &commitment.root));

        let draw_a = select_winners(&commitment, &allocations, &a, 1);
        let draw_b = select_winners(&commitment, &allocations, &b, 1);
        // Single winners from distinct seeds over six wallets; equality
        // here would be a (possible but unlikely) collision, so assert
        // only the structural facts.
        assert_eq!(draw_a.winners.len(), 1);
        assert_eq!(draw_b.winners.len(), 1);
    }

    #[test]
    fn test_zero_ticket_entries_never_win() {
        // 25 ranked wallets; ranks past the tier cutoff hold zero-length
        // ranges, which the draw walks over without selecting or diverging.
        let scores: Vec<(u8, u64)> = (1..=25u8).map(|w| (w, 1000 - w as u64)).collect();
        let (commitment, allocations) = fixture(&scores);
        let vrf = seed_for(&commitment);

        let eligible: Vec<WalletId> = allocations
            .iter()
            .filter(|a| a.ticket_count > 0)
            .map(|a| a.wallet_id)
            .collect();
        let draw = select_winners(&commitment, &allocations, &vrf, 25);

        assert_eq!(draw.winners.len(), eligible.len());
        for winner in &draw.winners {
            assert!(eligible.contains(winner));
        }
    }

    #[test]
    fn test_winners_hold_tickets() {
        let (commitment, allocations) =
            fixture(&[(1, 500), (2, 400), (3, 300), (4, 200)]);
        let vrf = seed_for(&commitment);

        let draw = select_winners(&commitment, &allocations, &vrf, 3);
        for winner in &draw.winners {
            let holds = allocations
                .iter()
                .any(|a| a.wallet_id == *winner && a.ticket_count > 0);
            assert!(holds);
        }
    }
}
