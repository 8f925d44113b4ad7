//! Raffle Pipeline
//!
//! Everything downstream of validation: ranking accepted sessions,
//! turning tiers into ticket ranges, committing the ticket table to a
//! Merkle root, obtaining verifiable randomness, selecting winners, and
//! driving the period lifecycle that ties the stages together.

pub mod commitment;
pub mod draw;
pub mod leaderboard;
pub mod period;
pub mod tickets;
pub mod vrf;

pub use commitment::{commit, prove, verify_inclusion, InclusionProof, MerkleCommitment};
pub use draw::{select_winners, RaffleDraw};
pub use leaderboard::{
    close_period, AcceptedSession, LeaderboardEntry, PeriodId, Tier, TierBreakTable,
};
pub use period::{PeriodConfig, PeriodSnapshot, PeriodStatus, RaffleEngine, RaffleError};
pub use tickets::{allocate, total_tickets, wallet_for_ticket, TicketAllocation, TierPolicy};
pub use vrf::{
    verify as verify_vrf, vrf_alpha, LocalVrfOracle, VrfCoordinator, VrfError, VrfKeypair,
    VrfOracle, VrfOutput, VrfRetryConfig,
};
