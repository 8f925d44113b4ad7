//! # FairDraw Engine
//!
//! Server-side fair-play validation and verifiable raffle settlement for
//! skill-based game competitions.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      FAIRDRAW ENGINE                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/             - Deterministic primitives                │
//! │  ├── rng.rs        - Deterministic Xorshift128+ PRNG         │
//! │  └── hash.rs       - Domain-separated SHA-256 hashing        │
//! │                                                              │
//! │  game/             - Replay simulation (deterministic)       │
//! │  ├── moves.rs      - Canonical move records                  │
//! │  ├── rules.rs      - Game rules trait and registry           │
//! │  ├── stacker.rs    - Glyph Stacker reference rules           │
//! │  └── replay.rs     - Move-stream replay to canonical score   │
//! │                                                              │
//! │  validate/         - Session validation                      │
//! │  ├── session.rs    - Sessions, verdicts, policy              │
//! │  ├── validator.rs  - Replay-backed verdict derivation        │
//! │  └── store.rs      - Write-once verdict pipeline             │
//! │                                                              │
//! │  proof/            - Merkle commitments                      │
//! │  └── merkle.rs     - Binary Merkle tree and proofs           │
//! │                                                              │
//! │  raffle/           - Period settlement                       │
//! │  ├── leaderboard.rs- Ranking and tier assignment             │
//! │  ├── tickets.rs    - Tier-weighted ticket ranges             │
//! │  ├── commitment.rs - Ticket-table Merkle commitment          │
//! │  ├── vrf.rs        - Verifiable randomness                   │
//! │  ├── draw.rs       - Seed expansion and winner selection     │
//! │  └── period.rs     - Period lifecycle and engine             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/`, `game/`, `proof/`, and the pure stages of `raffle/` are
//! **100% deterministic**:
//! - No floating-point arithmetic in validation or settlement
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No wall-clock reads inside replay or the draw
//! - All replay randomness from seeded Xorshift128+
//!
//! Given the same seed and move stream, replay produces an identical
//! canonical score and replay hash on any platform; given the same
//! ticket table and VRF output, the draw produces an identical winner
//! list. Auditors re-run both from published data.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod proof;
pub mod raffle;
pub mod validate;

// Re-export commonly used types
pub use crate::core::hash::{StateHash, StateHasher};
pub use crate::core::rng::DeterministicRng;
pub use crate::game::replay::{replay, ReplayError, ReplayOutcome};
pub use crate::game::rules::{GameId, GameRules, RulesRegistry};
pub use crate::raffle::{PeriodId, PeriodSnapshot, PeriodStatus, RaffleEngine};
pub use crate::validate::session::{GameSession, SessionId, ValidationVerdict, WalletId};
pub use crate::validate::store::SessionPipeline;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
