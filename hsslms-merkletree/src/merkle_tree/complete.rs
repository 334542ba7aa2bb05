use std::fmt;

use rayon::prelude::*;

use super::*;

/// Complete Merkle tree, all nodes retained.
///
/// The node array is heap-ordered with slot `0` unused, so node `k` lives at
/// index `k` and the invariants `nodes[k] = merge(k, nodes[2k], nodes[2k+1])`
/// read off directly.
#[derive(Clone)]
pub struct MerkleTree<H> {
    height: Height,

    /// Heap-linearized full binary tree; `nodes[0]` is a filler value.
    nodes: Vec<H>,
}

impl<H> MerkleTree<H>
where
    H: Clone + Default + Send + Sync,
{
    /// Generate the tree of the given `height`.
    ///
    /// Leaves are computed as one parallel map (they dominate the cost);
    /// interior nodes are built bottom-up, one parallel map per level.
    pub fn gen<G, M>(g: &G, m: &M, height: Height) -> Self
    where
        G: GenLeaf<H>,
        M: MergeNodes<H>,
    {
        let leaves = 1usize << height;
        let mut nodes = vec![H::default(); 2 * leaves];

        let leaf_hashes: Vec<H> = (0..leaves)
            .into_par_iter()
            .map(|i| g.gen_leaf(i as Idx))
            .collect();
        for (slot, h) in nodes[leaves..].iter_mut().zip(leaf_hashes) {
            *slot = h;
        }

        for d in (0..height).rev() {
            let lo = 1usize << d;
            let level: Vec<H> = (lo..2 * lo)
                .into_par_iter()
                .map(|k| m.merge_nodes(k as NodeNum, &nodes[2 * k], &nodes[2 * k + 1]))
                .collect();
            for (k, h) in (lo..).zip(level) {
                nodes[k] = h;
            }
        }

        Self { height, nodes }
    }

    pub fn height(&self) -> Height {
        self.height
    }

    pub fn root(&self) -> &H {
        &self.nodes[1]
    }

    pub fn node(&self, num: NodeNum) -> &H {
        &self.nodes[num as usize]
    }

    /// Authentication path for leaf `skn`: the sibling `nodes[r ^ 1]` at each
    /// level on the way up.
    pub fn apath(&self, skn: Idx) -> APath<H> {
        debug_assert!(skn < leaf_count(self.height));
        let mut ap = APath::new(self.height);
        ap.skn = skn;
        let mut r = leaf_count(self.height) + skn;
        for _ in 0..self.height {
            ap.push(self.nodes[(r ^ 1) as usize].clone());
            r >>= 1;
        }
        ap
    }

    /// Serialize as a tuple; the filler slot is not part of it.
    pub fn store(&self) -> (Height, Vec<H>) {
        (self.height, self.nodes[1..].to_vec())
    }

    /// Try to deserialize from a tuple.
    pub fn load(height: Height, nodes: Vec<H>) -> Option<Self> {
        if nodes.len() != node_count(height) {
            return None;
        }
        let mut all = Vec::with_capacity(nodes.len() + 1);
        all.push(H::default());
        all.extend(nodes);
        Some(Self { height, nodes: all })
    }
}

impl<H> PartialEq for MerkleTree<H>
where
    H: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.height == other.height && self.nodes[1..] == other.nodes[1..]
    }
}

impl<H> Eq for MerkleTree<H> where H: Eq {}

impl<H> fmt::Debug for MerkleTree<H>
where
    H: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}:{:?}>", self.height, &self.nodes[1..])
    }
}
