//! Complete binary Merkle tree with heap-ordered node storage.
//!
//! Nodes are addressed by their heap number: the root is `1`, the children
//! of node `k` are `2k` and `2k + 1`, the leaves of a tree of height `h` are
//! `2^h .. 2^(h+1)`. The node number is passed to the leaf and merge hooks
//! because hash-based signature schemes mix it into every node hash.

pub mod merkle_tree;

pub use merkle_tree::{APath, GenLeaf, MergeNodes, MerkleTree};
