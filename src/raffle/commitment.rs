//! Period Commitment
//!
//! Commits to the finalized ticket table before randomness is requested.
//! Leaves are the canonical little-endian serialization of
//! `(wallet_id, range_start, range_end)` in rank order; leaf order is part
//! of the commitment. Any later change to an allocation produces a
//! different root and invalidates every prior proof.

use serde::{Deserialize, Serialize};

use crate::core::hash::StateHash;
use crate::proof::merkle::{MerkleProof, MerkleTree};
use crate::raffle::leaderboard::PeriodId;
use crate::raffle::tickets::TicketAllocation;
use crate::validate::session::WalletId;

/// The published commitment for one period. Immutable once created.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MerkleCommitment {
    /// Committed period.
    pub period_id: PeriodId,
    /// Merkle root over the allocation leaves.
    pub root: StateHash,
    /// Leaf order (wallet per leaf index), part of the commitment.
    pub leaf_order: Vec<WalletId>,
}

/// Inclusion proof for one wallet's allocation leaf.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InclusionProof {
    /// The wallet the leaf belongs to.
    pub wallet_id: WalletId,
    /// Canonical leaf bytes (reproducible from the published allocation).
    pub leaf: Vec<u8>,
    /// Sibling path to the root.
    pub path: MerkleProof,
}

/// Canonical leaf bytes: wallet (16) ++ range_start (u64 LE) ++
/// range_end (u64 LE). Fixed layout; never serde.
pub fn leaf_bytes(allocation: &TicketAllocation) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(32);
    bytes.extend_from_slice(allocation.wallet_id.as_bytes());
    bytes.extend_from_slice(&allocation.range_start.to_le_bytes());
    bytes.extend_from_slice(&allocation.range_end.to_le_bytes());
    bytes
}

/// Build the commitment over a finalized allocation table.
pub fn commit(period_id: PeriodId, allocations: &[TicketAllocation]) -> MerkleCommitment {
    let mut tree = build_tree(allocations);
    MerkleCommitment {
        period_id,
        root: tree.root(),
        leaf_order: allocations.iter().map(|a| a.wallet_id).collect(),
    }
}

/// Generate the inclusion proof for one wallet.
///
/// Rebuilds the tree from the allocation list, so the proof is a pure
/// function of published data. Returns None for wallets with no leaf.
pub fn prove(allocations: &[TicketAllocation], wallet_id: WalletId) -> Option<InclusionProof> {
    let index = allocations.iter().position(|a| a.wallet_id == wallet_id)?;
    let mut tree = build_tree(allocations);
    let path = tree.generate_proof(index)?;
    Some(InclusionProof {
        wallet_id,
        leaf: leaf_bytes(&allocations[index]),
        path,
    })
}

/// Verify an inclusion proof against a published root.
///
/// Needs nothing but the proof and the root; callable by any third party.
pub fn verify_inclusion(root: &StateHash, proof: &InclusionProof) -> bool {
    MerkleTree::verify_proof(root, &proof.path, &proof.leaf)
}

fn build_tree(allocations: &[TicketAllocation]) -> MerkleTree {
    let leaves: Vec<Vec<u8>> = allocations.iter().map(leaf_bytes).collect();
    MerkleTree::from_leaves(&leaves)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allocations(n: u8) -> Vec<TicketAllocation> {
        let mut cursor = 0u64;
        (0..n)
            .map(|i| {
                let count = (i as u64 % 4) + 1;
                let a = TicketAllocation {
                    wallet_id: WalletId::new([i + 1; 16]),
                    period_id: 1,
                    ticket_count: count,
                    range_start: cursor,
                    range_end: cursor + count,
                };
                cursor += count;
                a
            })
            .collect()
    }

    #[test]
    fn test_commit_determinism() {
        let table = allocations(7);
        let a = commit(1, &table);
        let b = commit(1, &table);
        assert_eq!(a.root, b.root);
        assert_eq!(a.leaf_order, b.leaf_order);
    }

    #[test]
    fn test_every_leaf_provable() {
        let table = allocations(7);
        let commitment = commit(1, &table);

        for allocation in &table {
            let proof = prove(&table, allocation.wallet_id).unwrap();
            assert!(verify_inclusion(&commitment.root, &proof));
        }
    }

    #[test]
    fn test_altered_allocation_changes_root() {
        let table = allocations(7);
        let commitment = commit(1, &table);

        let mut tampered = table.clone();
        tampered[3].range_end += 1;
        let tampered_commitment = commit(1, &tampered);

        assert_ne!(commitment.root, tampered_commitment.root);

        // A proof from the tampered table fails against the real root.
        let proof = prove(&tampered, tampered[3].wallet_id).unwrap();
        assert!(!verify_inclusion(&commitment.root, &proof));
    }

    #[test]
    fn test_leaf_order_matters() {
        let table = allocations(4);
        let mut reordered = table.clone();
        reordered.swap(0, 1);

        assert_ne!(commit(1, &table).root, commit(1, &reordered).root);
    }

    #[test]
    fn test_unknown_wallet_has_no_proof() {
        let table = allocations(4);
        assert!(prove(&table, WalletId::new([99; 16])).is_none());
    }
}
