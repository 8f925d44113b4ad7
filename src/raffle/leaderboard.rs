//! Leaderboard Aggregation
//!
//! Ranks accepted sessions at period close. The three-key order
//! (score desc, submitted_at asc, wallet asc) is a strict total order, so
//! ranks 1..N are a permutation with no gaps and no surviving ties, and
//! every downstream artifact (ticket ranges, leaf order) is reproducible
//! from the published entry list alone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validate::session::{SessionId, WalletId};

/// Period identifier, passed explicitly through every call.
pub type PeriodId = u64;

/// Prize tier, assigned from rank via the break table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    /// Top of the board.
    Gold,
    /// Upper ranks.
    Silver,
    /// Remaining qualified ranks.
    Bronze,
}

/// Maps rank bands to tiers. Ranks past the last band are unranked
/// (no tier, zero tickets).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TierBreakTable {
    /// Ascending (inclusive) upper rank bound per tier.
    bands: Vec<(Tier, u32)>,
}

impl TierBreakTable {
    /// Build a table from ascending (tier, max_rank) bands.
    pub fn new(bands: Vec<(Tier, u32)>) -> Self {
        Self { bands }
    }

    /// Tier for a 1-based rank, or None past the qualification cutoff.
    pub fn tier_for(&self, rank: u32) -> Option<Tier> {
        self.bands
            .iter()
            .find(|(_, max_rank)| rank <= *max_rank)
            .map(|(tier, _)| *tier)
    }
}

impl Default for TierBreakTable {
    fn default() -> Self {
        Self::new(vec![(Tier::Gold, 1), (Tier::Silver, 5), (Tier::Bronze, 20)])
    }
}

/// An accepted session distilled to the fields ranking needs.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct AcceptedSession {
    /// The session.
    pub session_id: SessionId,
    /// Submitting wallet.
    pub wallet_id: WalletId,
    /// Canonical (validated) score.
    pub score: u64,
    /// Server-side submission time, the first tie-break key.
    pub submitted_at: DateTime<Utc>,
}

/// One row of the closed-period leaderboard. Rank and tier are derived.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// The wallet.
    pub wallet_id: WalletId,
    /// Period this entry belongs to.
    pub period_id: PeriodId,
    /// Best canonical score for the wallet this period.
    pub score: u64,
    /// Submission time of the counted session.
    pub submitted_at: DateTime<Utc>,
    /// 1-based rank, gapless.
    pub rank: u32,
    /// Tier, or None past the qualification cutoff.
    pub tier: Option<Tier>,
}

/// Rank accepted sessions into leaderboard entries.
///
/// A wallet appears at most once: only its best session counts, chosen by
/// the same three-key order used for ranking. The rest stay archived with
/// their own verdicts elsewhere; they simply do not rank.
pub fn close_period(
    period_id: PeriodId,
    accepted: &[AcceptedSession],
    breaks: &TierBreakTable,
) -> Vec<LeaderboardEntry> {
    // Best session per wallet.
    let mut best: std::collections::BTreeMap<WalletId, AcceptedSession> =
        std::collections::BTreeMap::new();
    for session in accepted {
        match best.get(&session.wallet_id) {
            Some(current) if !beats(session, current) => {}
            _ => {
                best.insert(session.wallet_id, *session);
            }
        }
    }

    // Strict total order: score desc, submitted_at asc, wallet asc.
    let mut ranked: Vec<AcceptedSession> = best.into_values().collect();
    ranked.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(a.submitted_at.cmp(&b.submitted_at))
            .then(a.wallet_id.cmp(&b.wallet_id))
    });

    ranked
        .into_iter()
        .enumerate()
        .map(|(i, session)| {
            let rank = (i + 1) as u32;
            LeaderboardEntry {
                wallet_id: session.wallet_id,
                period_id,
                score: session.score,
                submitted_at: session.submitted_at,
                rank,
                tier: breaks.tier_for(rank),
            }
        })
        .collect()
}

/// Does `a` beat `b` for the same wallet? Same order as ranking, with the
/// session id as the final key since the wallet is shared.
fn beats(a: &AcceptedSession, b: &AcceptedSession) -> bool {
    if a.score != b.score {
        return a.score > b.score;
    }
    if a.submitted_at != b.submitted_at {
        return a.submitted_at < b.submitted_at;
    }
    a.session_id < b.session_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn session(wallet: u8, score: u64, secs: i64) -> AcceptedSession {
        AcceptedSession {
            session_id: SessionId::new([wallet; 16]),
            wallet_id: WalletId::new([wallet; 16]),
            score,
            submitted_at: at(secs),
        }
    }

    #[test]
    fn test_ranks_are_gapless_permutation() {
        let accepted: Vec<AcceptedSession> =
            (1..=9u8).map(|w| session(w, (w as u64) * 10, 0)).collect();
        let entries = close_period(1, &accepted, &TierBreakTable::default());

        assert_eq!(entries.len(), 9);
        for (i, entry) in entries.iter().enumerate() {
            assert_eq!(entry.rank, (i + 1) as u32);
        }
        // Descending scores.
        assert!(entries.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_tie_broken_by_submission_time() {
        // Two wallets at 300, one submitted earlier; third at 100.
        let accepted = vec![
            session(1, 300, 50),
            session(2, 300, 10),
            session(3, 100, 0),
        ];
        let entries = close_period(1, &accepted, &TierBreakTable::default());

        assert_eq!(entries[0].wallet_id, WalletId::new([2; 16]));
        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[1].wallet_id, WalletId::new([1; 16]));
        assert_eq!(entries[1].rank, 2);
        assert_eq!(entries[2].rank, 3);
    }

    #[test]
    fn test_tie_broken_by_wallet_when_times_equal() {
        let accepted = vec![session(2, 300, 10), session(1, 300, 10)];
        let entries = close_period(1, &accepted, &TierBreakTable::default());

        assert_eq!(entries[0].wallet_id, WalletId::new([1; 16]));
        assert_eq!(entries[1].wallet_id, WalletId::new([2; 16]));
    }

    #[test]
    fn test_wallet_counts_once_with_best_session() {
        let accepted = vec![
            session(1, 100, 0),
            AcceptedSession {
                session_id: SessionId::new([99; 16]),
                wallet_id: WalletId::new([1; 16]),
                score: 250,
                submitted_at: at(60),
            },
            session(2, 200, 0),
        ];
        let entries = close_period(1, &accepted, &TierBreakTable::default());

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].wallet_id, WalletId::new([1; 16]));
        assert_eq!(entries[0].score, 250);
    }

    #[test]
    fn test_tier_assignment() {
        let accepted: Vec<AcceptedSession> = (1..=25u8)
            .map(|w| session(w, 1000 - w as u64, 0))
            .collect();
        let entries = close_period(1, &accepted, &TierBreakTable::default());

        assert_eq!(entries[0].tier, Some(Tier::Gold));
        assert_eq!(entries[1].tier, Some(Tier::Silver));
        assert_eq!(entries[4].tier, Some(Tier::Silver));
        assert_eq!(entries[5].tier, Some(Tier::Bronze));
        assert_eq!(entries[19].tier, Some(Tier::Bronze));
        // Past the cutoff: unranked tier.
        assert_eq!(entries[20].tier, None);
        assert_eq!(entries[24].tier, None);
        // But still ranked, gaplessly.
        assert_eq!(entries[24].rank, 25);
    }

    #[test]
    fn test_empty_period() {
        let entries = close_period(1, &[], &TierBreakTable::default());
        assert!(entries.is_empty());
    }
}
