//! Commitment Proof Primitives
//!
//! The Merkle tree that backs period commitments. Higher-level commitment
//! and proof flows live in `raffle::commitment`.

pub mod merkle;

// Re-export key types
pub use merkle::{MerkleProof, MerkleTree};
