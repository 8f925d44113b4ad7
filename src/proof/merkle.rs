//! Merkle Tree Commitments
//!
//! Binary Merkle tree using SHA-256 for committing to the finalized ticket
//! table. Leaf, node, and padding hashes are domain-separated so no input
//! can be reinterpreted across roles.
//!
//! Padding rule (fixed, part of the audit contract): the leaf level is
//! padded to the next power of two with the domain-separated empty-leaf
//! hash. Third-party verifiers must apply the same rule.

use sha2::{Digest, Sha256};

use crate::core::hash::StateHash;

/// Domain separator for Merkle tree leaf nodes.
const MERKLE_LEAF_DOMAIN: &[u8] = b"FAIRDRAW_MERKLE_LEAF_V1";

/// Domain separator for Merkle tree internal nodes.
const MERKLE_NODE_DOMAIN: &[u8] = b"FAIRDRAW_MERKLE_NODE_V1";

/// Empty hash for padding (hash of empty domain).
fn empty_hash() -> StateHash {
    let mut hasher = Sha256::new();
    hasher.update(b"FAIRDRAW_MERKLE_EMPTY_V1");
    hasher.finalize().into()
}

/// Binary Merkle tree for commitment generation.
///
/// Supports building from leaves, computing the root, and generating and
/// verifying inclusion proofs.
#[derive(Clone, Debug, Default)]
pub struct MerkleTree {
    /// Leaf hashes (level 0, before padding)
    leaves: Vec<StateHash>,
    /// All tree levels (padded leaves at index 0, root at last index)
    levels: Vec<Vec<StateHash>>,
}

impl MerkleTree {
    /// Create an empty Merkle tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a Merkle tree from leaf data.
    ///
    /// Each item is hashed with domain separation to form leaves.
    pub fn from_leaves<T: AsRef<[u8]>>(data: &[T]) -> Self {
        let mut tree = Self::new();
        for item in data {
            tree.add_leaf(item.as_ref());
        }
        tree.build();
        tree
    }

    /// Add a leaf (raw data will be hashed).
    pub fn add_leaf(&mut self, data: &[u8]) {
        let leaf_hash = hash_leaf(data);
        self.leaves.push(leaf_hash);
        // Clear computed levels since tree changed
        self.levels.clear();
    }

    /// Build the tree (compute all internal nodes).
    fn build(&mut self) {
        if self.leaves.is_empty() {
            self.levels.clear();
            return;
        }

        self.levels.clear();

        // Level 0 is the leaves, padded to a power of two with the
        // empty-leaf hash.
        let mut current_level = self.leaves.clone();
        let target_size = current_level.len().next_power_of_two();
        while current_level.len() < target_size {
            current_level.push(empty_hash());
        }

        self.levels.push(current_level.clone());

        // Build up to root
        while current_level.len() > 1 {
            let mut next_level = Vec::with_capacity(current_level.len() / 2);

            for chunk in current_level.chunks(2) {
                let left = &chunk[0];
                let right = if chunk.len() > 1 { &chunk[1] } else { left };
                next_level.push(hash_nodes(left, right));
            }

            self.levels.push(next_level.clone());
            current_level = next_level;
        }
    }

    /// Compute and return the root hash.
    ///
    /// Returns the empty hash for an empty tree.
    pub fn root(&mut self) -> StateHash {
        if self.leaves.is_empty() {
            return empty_hash();
        }

        if self.levels.is_empty() {
            self.build();
        }

        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or_else(empty_hash)
    }

    /// Number of leaves in the tree (before padding).
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Generate a Merkle inclusion proof for a leaf at the given index.
    ///
    /// Returns None if index is out of bounds.
    pub fn generate_proof(&mut self, index: usize) -> Option<MerkleProof> {
        if index >= self.leaves.len() {
            return None;
        }

        if self.levels.is_empty() {
            self.build();
        }

        let mut siblings = Vec::new();
        let mut current_index = index;

        // Walk up the tree, collecting sibling hashes
        for level in &self.levels[..self.levels.len().saturating_sub(1)] {
            let sibling_index = if current_index % 2 == 0 {
                current_index + 1
            } else {
                current_index - 1
            };

            if sibling_index < level.len() {
                let is_right = current_index % 2 == 0;
                siblings.push((level[sibling_index], is_right));
            }

            current_index /= 2;
        }

        Some(MerkleProof {
            leaf_index: index,
            siblings,
        })
    }

    /// Verify a Merkle proof against a root hash.
    pub fn verify_proof(root: &StateHash, proof: &MerkleProof, leaf_data: &[u8]) -> bool {
        let mut current_hash = hash_leaf(leaf_data);

        for (sibling, is_right) in &proof.siblings {
            current_hash = if *is_right {
                hash_nodes(&current_hash, sibling)
            } else {
                hash_nodes(sibling, &current_hash)
            };
        }

        current_hash == *root
    }
}

/// Merkle inclusion proof.
///
/// Contains the sibling path from a leaf to the root.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct MerkleProof {
    /// Index of the leaf this proof is for.
    pub leaf_index: usize,
    /// Sibling hashes along the path (hash, is_right_sibling).
    pub siblings: Vec<(StateHash, bool)>,
}

/// Hash leaf data with domain separation.
fn hash_leaf(data: &[u8]) -> StateHash {
    let mut hasher = Sha256::new();
    hasher.update(MERKLE_LEAF_DOMAIN);
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash two child nodes with domain separation.
fn hash_nodes(left: &StateHash, right: &StateHash) -> StateHash {
    let mut hasher = Sha256::new();
    hasher.update(MERKLE_NODE_DOMAIN);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_tree() {
        let mut tree = MerkleTree::new();
        assert_eq!(tree.root(), empty_hash());
    }

    #[test]
    fn test_single_leaf() {
        let mut tree = MerkleTree::new();
        tree.add_leaf(b"hello");
        let root = tree.root();

        let mut tree2 = MerkleTree::new();
        tree2.add_leaf(b"hello");
        assert_eq!(root, tree2.root());
    }

    #[test]
    fn test_merkle_root_determinism() {
        let leaves = vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec(), b"d".to_vec()];

        let mut tree1 = MerkleTree::from_leaves(&leaves);
        let mut tree2 = MerkleTree::from_leaves(&leaves);

        assert_eq!(tree1.root(), tree2.root());
    }

    #[test]
    fn test_different_leaves_different_root() {
        let mut tree1 = MerkleTree::from_leaves(&[b"a", b"b"]);
        let mut tree2 = MerkleTree::from_leaves(&[b"a", b"c"]);

        assert_ne!(tree1.root(), tree2.root());
    }

    #[test]
    fn test_merkle_proof_verification() {
        let leaves: Vec<&[u8]> = vec![b"leaf1", b"leaf2", b"leaf3", b"leaf4"];
        let mut tree = MerkleTree::from_leaves(&leaves);
        let root = tree.root();

        for (i, leaf) in leaves.iter().enumerate() {
            let proof = tree.generate_proof(i).unwrap();
            assert!(MerkleTree::verify_proof(&root, &proof, leaf));
        }
    }

    #[test]
    fn test_invalid_proof_fails() {
        let leaves: Vec<&[u8]> = vec![b"leaf1", b"leaf2", b"leaf3", b"leaf4"];
        let mut tree = MerkleTree::from_leaves(&leaves);
        let root = tree.root();

        let proof = tree.generate_proof(0).unwrap();
        assert!(!MerkleTree::verify_proof(&root, &proof, b"wrong_data"));
    }

    #[test]
    fn test_proof_out_of_bounds() {
        let mut tree = MerkleTree::from_leaves(&[b"a", b"b"]);
        tree.root();
        assert!(tree.generate_proof(10).is_none());
    }

    #[test]
    fn test_odd_number_of_leaves() {
        // Non-power-of-2 leaf counts are padded with the empty-leaf hash.
        let leaves: Vec<&[u8]> = vec![b"a", b"b", b"c"];
        let mut tree = MerkleTree::from_leaves(&leaves);
        let root = tree.root();

        let proof = tree.generate_proof(2).unwrap();
        assert!(MerkleTree::verify_proof(&root, &proof, b"c"));
    }

    #[test]
    fn test_padding_leaf_is_not_provable_as_data() {
        // The padding hash uses its own domain, so no real leaf data can
        // collide with it.
        let mut tree = MerkleTree::from_leaves(&[b"a", b"b", b"c"]);
        let root = tree.root();
        let proof = tree.generate_proof(2).unwrap();
        assert!(!MerkleTree::verify_proof(&root, &proof, b""));
    }

    proptest! {
        #[test]
        fn prop_all_leaves_provable(count in 1usize..64) {
            let leaves: Vec<Vec<u8>> = (0..count)
                .map(|i| format!("leaf_{i}").into_bytes())
                .collect();

            let mut tree = MerkleTree::from_leaves(&leaves);
            let root = tree.root();

            for (i, leaf) in leaves.iter().enumerate() {
                let proof = tree.generate_proof(i).unwrap();
                prop_assert!(MerkleTree::verify_proof(&root, &proof, leaf));
            }
        }

        #[test]
        fn prop_altered_leaf_changes_root(count in 2usize..64, victim in 0usize..64) {
            let victim = victim % count;
            let leaves: Vec<Vec<u8>> = (0..count)
                .map(|i| format!("leaf_{i}").into_bytes())
                .collect();
            let mut altered = leaves.clone();
            altered[victim] = b"tampered".to_vec();

            let mut tree1 = MerkleTree::from_leaves(&leaves);
            let mut tree2 = MerkleTree::from_leaves(&altered);
            prop_assert_ne!(tree1.root(), tree2.root());
        }
    }
}
