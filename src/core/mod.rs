//! Core deterministic primitives.
//!
//! All types in this module are designed for perfect cross-platform
//! determinism. They underpin both replay validation and the published
//! audit artifacts.

pub mod hash;
pub mod rng;

// Re-export core types
pub use hash::{hash_bytes, hash_with_domain, StateHash, StateHasher};
pub use rng::DeterministicRng;
