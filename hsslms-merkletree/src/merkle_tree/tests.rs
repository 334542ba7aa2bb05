use super::*;

fn check_height<G, M>(height: Height, g: &G, m: &M)
where
    G: GenLeaf<u64>,
    M: MergeNodes<u64>,
{
    let mt = MerkleTree::gen(g, m, height);

    let (store_height, store_nodes) = mt.store();
    let loaded = MerkleTree::load(store_height, store_nodes);
    assert!(loaded.is_some() && loaded.unwrap() == mt);

    for skn in 0..leaf_count(height) {
        let apath = mt.apath(skn);
        assert_eq!(apath.skn(), skn);
        assert_eq!(apath.nodes().len(), height);
        let leaf = g.gen_leaf(skn);
        let apk = apath.fold(m, &leaf);
        assert_eq!(apk, *mt.root());
    }
}

fn check_heights<G, M>(max_height: Height, g: G, m: M)
where
    G: GenLeaf<u64>,
    M: MergeNodes<u64>,
{
    let mt0 = MerkleTree::gen(&g, &m, 0);
    assert_eq!(*mt0.root(), g.gen_leaf(0));

    let mt2 = MerkleTree::gen(&g, &m, 2);
    assert_eq!(
        *mt2.root(),
        m.merge_nodes(
            1,
            &m.merge_nodes(2, &g.gen_leaf(0), &g.gen_leaf(1)),
            &m.merge_nodes(3, &g.gen_leaf(2), &g.gen_leaf(3))
        )
    );

    for height in 0..=max_height {
        check_height(height, &g, &m);
    }
}

#[test]
fn commutative() {
    check_heights(5, |idx: Idx| 1u64 << idx, |_: NodeNum, h0: &u64, h1: &u64| h0 | h1);
}

#[test]
fn non_commutative() {
    check_heights(5, |idx: Idx| 1u64 << idx, |_: NodeNum, h0: &u64, h1: &u64| {
        (h0 * 3 + h1) ^ 11
    });
}

#[test]
fn node_number_aware() {
    // Mixing the heap number into the merge must still fold correctly.
    check_heights(5, |idx: Idx| u64::from(idx) + 1, |num: NodeNum, h0: &u64, h1: &u64| {
        h0.wrapping_mul(31) ^ h1.wrapping_mul(17) ^ u64::from(num)
    });
}

#[test]
fn load_rejects_wrong_node_count() {
    let mt = MerkleTree::gen(&|idx: Idx| u64::from(idx), &|_: NodeNum, a: &u64, b: &u64| a + b, 3);
    let (height, mut nodes) = mt.store();
    nodes.pop();
    assert!(MerkleTree::<u64>::load(height, nodes).is_none());
}
