//! Leighton-Micali signatures: a Merkle tree over `2^h` one-time keys
//! (RFC 8554 section 5).

use rand::{CryptoRng, RngCore};

use hsslms_core::error::{Error, Result};
use hsslms_core::hash::Hasher;
use hsslms_core::params::{LmotsAlgorithm, LmotsParams, LmsAlgorithm, LmsParams};
use hsslms_core::utils::{D_INTR, D_LEAF};
use hsslms_core::{Identifier, IDENTIFIER_LEN};
use hsslms_merkletree::merkle_tree::{leaf_count, GenLeaf, Height, Idx, MergeNodes, NodeNum};
use hsslms_merkletree::{APath, MerkleTree};

use super::lmots;

/// Interior node hash: `H(I || u32(num) || D_INTR || left || right)`.
pub(crate) struct NodeHasher {
    m: usize,
    id: Identifier,
}

impl NodeHasher {
    pub(crate) fn new(m: usize, id: Identifier) -> Self {
        Self { m, id }
    }
}

impl MergeNodes<Vec<u8>> for NodeHasher {
    fn merge_nodes(&self, num: NodeNum, left: &Vec<u8>, right: &Vec<u8>) -> Vec<u8> {
        let mut h = Hasher::init(self.m);
        h.update(&self.id);
        h.update(&num.to_be_bytes());
        h.update(&D_INTR);
        h.update(left);
        h.update(right);
        h.done()
    }
}

/// Leaf hash: `H(I || u32(2^h + j) || D_LEAF || K_j)`. Deriving `K_j` runs
/// all Winternitz chains of the `j`-th one-time key and dominates key
/// generation, which is why leaves are generated on the worker pool.
struct LeafGen<'a> {
    m: usize,
    height: Height,
    id: Identifier,
    ots_keys: &'a [lmots::PrivateKey],
}

impl GenLeaf<Vec<u8>> for LeafGen<'_> {
    fn gen_leaf(&self, idx: Idx) -> Vec<u8> {
        let k = self.ots_keys[idx as usize].public_key();
        let num = leaf_count(self.height) + idx;
        let mut h = Hasher::init(self.m);
        h.update(&self.id);
        h.update(&num.to_be_bytes());
        h.update(&D_LEAF);
        h.update(k.k());
        h.done()
    }
}

/// LMS private key: `2^h` eagerly generated one-time keys, the full node
/// array and the leaf cursor `q`.
pub struct PrivateKey {
    algo: LmsAlgorithm,
    ots_algo: LmotsAlgorithm,
    id: Identifier,
    ots_keys: Vec<lmots::PrivateKey>,
    tree: MerkleTree<Vec<u8>>,
    q: u32,
}

impl PrivateKey {
    /// Generate a key pair under a fresh 16-byte identifier `I`.
    ///
    /// One-time seeds are drawn serially from `rng`; the tree build runs on
    /// the current rayon pool.
    pub fn generate<R>(algo: LmsAlgorithm, ots_algo: LmotsAlgorithm, rng: &mut R) -> Self
    where
        R: CryptoRng + RngCore,
    {
        let mut id = [0u8; IDENTIFIER_LEN];
        rng.fill_bytes(&mut id);
        let LmsParams { m, h } = algo.params();
        let ots_keys: Vec<_> = (0..algo.leaf_count())
            .map(|q| lmots::PrivateKey::generate(ots_algo, id, q, rng))
            .collect();
        let leaf_gen = LeafGen {
            m,
            height: h,
            id,
            ots_keys: &ots_keys,
        };
        let tree = MerkleTree::gen(&leaf_gen, &NodeHasher::new(m, id), h);
        Self {
            algo,
            ots_algo,
            id,
            ots_keys,
            tree,
            q: 0,
        }
    }

    pub fn algorithm(&self) -> LmsAlgorithm {
        self.algo
    }

    pub fn ots_algorithm(&self) -> LmotsAlgorithm {
        self.ots_algo
    }

    pub fn identifier(&self) -> &Identifier {
        &self.id
    }

    /// Leaf cursor: index of the next one-time key to use.
    pub fn q(&self) -> u32 {
        self.q
    }

    /// One-time keys left before the key is exhausted.
    pub fn available_signatures(&self) -> u32 {
        self.algo.leaf_count() - self.q
    }

    /// Sign `message` with the current leaf and advance the cursor
    /// (RFC 8554 algorithm 5). Fails with [`Error::Exhausted`] once all
    /// `2^h` leaves are spent.
    pub fn sign<R>(&mut self, message: &[u8], rng: &mut R) -> Result<Vec<u8>>
    where
        R: CryptoRng + RngCore,
    {
        if self.q >= self.algo.leaf_count() {
            return Err(Error::Exhausted);
        }
        let ots_sig = self.ots_keys[self.q as usize].sign(message, rng)?;
        let LmsParams { m, h } = self.algo.params();

        let mut sig = Vec::with_capacity(12 + ots_sig.len() - 4 + m * h);
        sig.extend_from_slice(&self.q.to_be_bytes());
        sig.extend_from_slice(&ots_sig);
        sig.extend_from_slice(&self.algo.typecode().to_be_bytes());
        for node in self.tree.apath(self.q).nodes() {
            sig.extend_from_slice(node);
        }
        self.q += 1;
        Ok(sig)
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            algo: self.algo,
            ots_algo: self.ots_algo,
            id: self.id,
            t1: self.tree.root().clone(),
        }
    }

    /// Tree nodes in heap order, for serialization.
    pub fn store_tree(&self) -> (Height, Vec<Vec<u8>>) {
        self.tree.store()
    }

    pub fn ots_keys(&self) -> &[lmots::PrivateKey] {
        &self.ots_keys
    }

    /// Rebuild a key from stored parts, validating counts and bounds.
    pub fn from_parts(
        algo: LmsAlgorithm,
        ots_algo: LmotsAlgorithm,
        id: Identifier,
        ots_keys: Vec<lmots::PrivateKey>,
        tree_nodes: Vec<Vec<u8>>,
        q: u32,
    ) -> Result<Self> {
        let LmsParams { m, h } = algo.params();
        if ots_keys.len() != algo.leaf_count() as usize {
            return Err(Error::BadKeyFile("one-time key count does not match height"));
        }
        for (j, key) in ots_keys.iter().enumerate() {
            if key.algorithm() != ots_algo || key.identifier() != &id || key.q() != j as u32 {
                return Err(Error::BadKeyFile("inconsistent one-time key position"));
            }
        }
        if q > algo.leaf_count() {
            return Err(Error::BadKeyFile("leaf cursor out of range"));
        }
        if tree_nodes.iter().any(|node| node.len() != m) {
            return Err(Error::BadKeyFile("tree node has the wrong hash size"));
        }
        let tree = MerkleTree::load(h, tree_nodes)
            .ok_or(Error::BadKeyFile("tree node count does not match height"))?;
        Ok(Self {
            algo,
            ots_algo,
            id,
            ots_keys,
            tree,
            q,
        })
    }
}

/// LMS public key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    algo: LmsAlgorithm,
    ots_algo: LmotsAlgorithm,
    id: Identifier,
    t1: Vec<u8>,
}

impl PublicKey {
    /// Parse `u32(type) || u32(otstype) || I || T1`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 8 {
            return Err(Error::Invalid);
        }
        let code = u32::from_be_bytes(bytes[..4].try_into().unwrap());
        let algo = LmsAlgorithm::from_typecode(code).ok_or(Error::Invalid)?;
        if bytes.len() != algo.public_key_len() {
            return Err(Error::Invalid);
        }
        let ots_code = u32::from_be_bytes(bytes[4..8].try_into().unwrap());
        let ots_algo = LmotsAlgorithm::from_typecode(ots_code).ok_or(Error::Invalid)?;
        let mut id = [0u8; IDENTIFIER_LEN];
        id.copy_from_slice(&bytes[8..24]);
        Ok(Self {
            algo,
            ots_algo,
            id,
            t1: bytes[24..].to_vec(),
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.algo.public_key_len());
        out.extend_from_slice(&self.algo.typecode().to_be_bytes());
        out.extend_from_slice(&self.ots_algo.typecode().to_be_bytes());
        out.extend_from_slice(&self.id);
        out.extend_from_slice(&self.t1);
        out
    }

    pub fn algorithm(&self) -> LmsAlgorithm {
        self.algo
    }

    pub fn ots_algorithm(&self) -> LmotsAlgorithm {
        self.ots_algo
    }

    pub fn identifier(&self) -> &Identifier {
        &self.id
    }

    pub fn root(&self) -> &[u8] {
        &self.t1
    }

    /// Verify `signature` over `message` against this key (RFC 8554
    /// algorithms 6a/6b).
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        let tc = self.candidate_root(message, signature)?;
        if tc == self.t1 {
            Ok(())
        } else {
            Err(Error::Invalid)
        }
    }

    /// Recompute the candidate root from the one-time signature and the
    /// authentication path.
    fn candidate_root(&self, message: &[u8], signature: &[u8]) -> Result<Vec<u8>> {
        if signature.len() < 8 {
            return Err(Error::Invalid);
        }
        let q = u32::from_be_bytes(signature[..4].try_into().unwrap());
        let ots_code = u32::from_be_bytes(signature[4..8].try_into().unwrap());
        if ots_code != self.ots_algo.typecode() {
            return Err(Error::Invalid);
        }
        let LmotsParams { n, p, .. } = self.ots_algo.params();
        let ots_sig_len = self.ots_algo.signature_len();
        if signature.len() < 12 + n * (p + 1) {
            return Err(Error::Invalid);
        }
        let ots_sig = &signature[4..4 + ots_sig_len];
        let code = u32::from_be_bytes(
            signature[4 + ots_sig_len..8 + ots_sig_len].try_into().unwrap(),
        );
        if code != self.algo.typecode() {
            return Err(Error::Invalid);
        }
        let LmsParams { m, h } = self.algo.params();
        if q >= self.algo.leaf_count() || signature.len() != 12 + n * (p + 1) + m * h {
            return Err(Error::Invalid);
        }
        let path_bytes = &signature[8 + ots_sig_len..];

        let kc = lmots::candidate_public_key(self.ots_algo, &self.id, q, message, ots_sig)?;
        let num = leaf_count(h) + q;
        let mut leaf = Hasher::init(m);
        leaf.update(&self.id);
        leaf.update(&num.to_be_bytes());
        leaf.update(&D_LEAF);
        leaf.update(&kc);

        let path = path_bytes.chunks_exact(m).map(|c| c.to_vec()).collect();
        let apath = APath::from_nodes(q, path);
        Ok(apath.fold(&NodeHasher::new(m, self.id), &leaf.done()))
    }

    /// Length of the LMS signature at the head of `signature`, computed from
    /// its prefix fields alone.
    pub fn signature_len(signature: &[u8]) -> Result<usize> {
        if signature.len() < 8 {
            return Err(Error::Invalid);
        }
        let ots_code = u32::from_be_bytes(signature[4..8].try_into().unwrap());
        let ots_algo = LmotsAlgorithm::from_typecode(ots_code).ok_or(Error::Invalid)?;
        let LmotsParams { n, p, .. } = ots_algo.params();
        let off = 8 + n * (p + 1);
        if signature.len() < off + 4 {
            return Err(Error::Invalid);
        }
        let code = u32::from_be_bytes(signature[off..off + 4].try_into().unwrap());
        let algo = LmsAlgorithm::from_typecode(code).ok_or(Error::Invalid)?;
        let LmsParams { m, h } = algo.params();
        Ok(12 + n * (p + 1) + m * h)
    }

    /// Length of the LMS public key at the head of `bytes`, from its
    /// typecode.
    pub fn public_key_len(bytes: &[u8]) -> Result<usize> {
        if bytes.len() < 4 {
            return Err(Error::Invalid);
        }
        let code = u32::from_be_bytes(bytes[..4].try_into().unwrap());
        let algo = LmsAlgorithm::from_typecode(code).ok_or(Error::Invalid)?;
        Ok(algo.public_key_len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const LMS: LmsAlgorithm = LmsAlgorithm::LmsSha256M32H5;
    const OTS: LmotsAlgorithm = LmotsAlgorithm::LmotsSha256N32W8;

    #[test]
    fn sign_verify_every_leaf() {
        let mut rng = StdRng::seed_from_u64(23);
        let mut sk = PrivateKey::generate(LMS, OTS, &mut rng);
        let pk = sk.public_key();
        for i in 0..LMS.leaf_count() {
            assert_eq!(sk.q(), i);
            let sig = sk.sign(b"merkle message", &mut rng).unwrap();
            pk.verify(b"merkle message", &sig).unwrap();
            // Leaf index is carried in the first four bytes.
            assert_eq!(u32::from_be_bytes(sig[..4].try_into().unwrap()), i);
        }
        assert_eq!(sk.available_signatures(), 0);
        assert!(matches!(
            sk.sign(b"one too many", &mut rng),
            Err(Error::Exhausted)
        ));
    }

    #[test]
    fn tampered_signature_and_message_are_invalid() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut sk = PrivateKey::generate(LMS, OTS, &mut rng);
        let pk = sk.public_key();
        let sig = sk.sign(b"payload", &mut rng).unwrap();

        assert!(matches!(pk.verify(b"payload!", &sig), Err(Error::Invalid)));

        // Flip one bit in the authentication path.
        let mut bad = sig.clone();
        let last = bad.len() - 1;
        bad[last] ^= 0x80;
        assert!(matches!(pk.verify(b"payload", &bad), Err(Error::Invalid)));

        // Truncations of every prefix length must be rejected, not panic;
        // 1130 lands between the one-time signature and the type field.
        for cut in [0, 4, 7, 8, 40, 1130, sig.len() - 1] {
            assert!(matches!(pk.verify(b"payload", &sig[..cut]), Err(Error::Invalid)));
        }
    }

    #[test]
    fn public_key_bytes_round_trip() {
        let mut rng = StdRng::seed_from_u64(2);
        let sk = PrivateKey::generate(LmsAlgorithm::LmsSha256M24H5, LmotsAlgorithm::LmotsSha256N24W8, &mut rng);
        let pk = sk.public_key();
        let bytes = pk.to_bytes();
        assert_eq!(bytes.len(), 24 + 24);
        assert_eq!(PublicKey::from_bytes(&bytes).unwrap(), pk);
        assert_eq!(PublicKey::public_key_len(&bytes).unwrap(), bytes.len());

        assert!(matches!(PublicKey::from_bytes(&bytes[..23]), Err(Error::Invalid)));
        let mut unknown = bytes;
        unknown[3] = 0xff;
        assert!(matches!(PublicKey::from_bytes(&unknown), Err(Error::Invalid)));
    }

    #[test]
    fn signature_len_matches_emitted_signature() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut sk = PrivateKey::generate(LMS, OTS, &mut rng);
        let sig = sk.sign(b"sized", &mut rng).unwrap();
        assert_eq!(PublicKey::signature_len(&sig).unwrap(), sig.len());
        assert!(matches!(PublicKey::signature_len(&sig[..6]), Err(Error::Invalid)));
    }

    #[test]
    fn store_and_rebuild() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut sk = PrivateKey::generate(LMS, OTS, &mut rng);
        sk.sign(b"advance", &mut rng).unwrap();

        let (height, nodes) = sk.store_tree();
        let ots: Vec<_> = sk
            .ots_keys()
            .iter()
            .map(|k| {
                lmots::PrivateKey::from_parts(
                    k.algorithm(),
                    *k.identifier(),
                    k.q(),
                    k.seeds().to_vec(),
                    k.is_used(),
                )
                .unwrap()
            })
            .collect();
        assert_eq!(height, 5);
        let rebuilt =
            PrivateKey::from_parts(LMS, OTS, *sk.identifier(), ots, nodes, sk.q()).unwrap();
        assert_eq!(rebuilt.q(), 1);
        assert_eq!(rebuilt.public_key(), sk.public_key());

        // Continue signing from the rebuilt key.
        let mut rebuilt = rebuilt;
        let sig = rebuilt.sign(b"continued", &mut rng).unwrap();
        sk.public_key().verify(b"continued", &sig).unwrap();
        assert_eq!(u32::from_be_bytes(sig[..4].try_into().unwrap()), 1);
    }
}
