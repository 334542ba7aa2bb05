//! Hierarchical signature system: a stack of LMS trees where each level
//! signs the public key of the level below (RFC 8554 section 6).

use rand::{CryptoRng, RngCore};

use hsslms_core::error::{Error, Result};
use hsslms_core::params::{LmotsAlgorithm, LmsAlgorithm};

use super::lms;

/// Maximum number of levels.
pub const MAX_LEVELS: usize = 8;

fn saturating_product<I>(factors: I) -> u64
where
    I: Iterator<Item = u64>,
{
    factors.fold(1, u64::saturating_mul)
}

/// Run `op` on a dedicated rayon pool of `num_cores` threads, or on the
/// current pool when no core count is given (or the pool cannot be built).
fn with_pool<T: Send>(num_cores: Option<usize>, op: impl FnOnce() -> T + Send) -> T {
    let pool = num_cores.and_then(|c| {
        rayon::ThreadPoolBuilder::new()
            .num_threads(c)
            .build()
            .ok()
    });
    match pool {
        Some(pool) => pool.install(op),
        None => op(),
    }
}

/// HSS private key.
///
/// A single-writer resource: signing mutates the per-level leaf cursors, so
/// the borrow checker serializes all access through `&mut self`. No two
/// processes may operate on a persisted copy of the same key.
pub struct PrivateKey {
    lms_algos: Vec<LmsAlgorithm>,
    ots_algo: LmotsAlgorithm,
    keys: Vec<lms::PrivateKey>,
    pubs: Vec<lms::PublicKey>,

    /// `sigs[i]` is the level-`i` signature over `pubs[i + 1]`'s bytes.
    sigs: Vec<Vec<u8>>,
}

impl PrivateKey {
    /// Generate a key with one LMS tree per entry of `lms_algos`, top first.
    /// Every non-root level costs its parent one leaf up front for the
    /// intra-level signature.
    pub fn generate<R>(
        lms_algos: &[LmsAlgorithm],
        ots_algo: LmotsAlgorithm,
        rng: &mut R,
        num_cores: Option<usize>,
    ) -> Result<Self>
    where
        R: CryptoRng + RngCore + Send,
    {
        if lms_algos.is_empty() || lms_algos.len() > MAX_LEVELS {
            return Err(Error::UnsupportedLevels(lms_algos.len()));
        }
        with_pool(num_cores, move || {
            let mut keys = vec![lms::PrivateKey::generate(lms_algos[0], ots_algo, rng)];
            let mut pubs = vec![keys[0].public_key()];
            let mut sigs = Vec::with_capacity(lms_algos.len() - 1);
            for i in 1..lms_algos.len() {
                let key = lms::PrivateKey::generate(lms_algos[i], ots_algo, rng);
                pubs.push(key.public_key());
                keys.push(key);
                let child_pub = pubs[i].to_bytes();
                sigs.push(keys[i - 1].sign(&child_pub, rng)?);
            }
            Ok(Self {
                lms_algos: lms_algos.to_vec(),
                ots_algo,
                keys,
                pubs,
                sigs,
            })
        })
    }

    pub fn levels(&self) -> usize {
        self.keys.len()
    }

    pub fn lms_algorithms(&self) -> &[LmsAlgorithm] {
        &self.lms_algos
    }

    pub fn ots_algorithm(&self) -> LmotsAlgorithm {
        self.ots_algo
    }

    /// Signatures left across the whole hierarchy: the product of the
    /// per-level remainders, saturating at `u64::MAX` (three height-25
    /// levels alone hold 2^75 signatures).
    pub fn available_signatures(&self) -> u64 {
        saturating_product(
            self.keys
                .iter()
                .map(|k| u64::from(k.available_signatures())),
        )
    }

    /// Sign `message` (RFC 8554 algorithm 8).
    ///
    /// When the leaf-level tree is exhausted, every level below the deepest
    /// one with budget is rebuilt transparently, each rebuild costing its
    /// parent one leaf. Fails with [`Error::Exhausted`] once the root tree
    /// itself has no leaves left.
    pub fn sign<R>(&mut self, message: &[u8], rng: &mut R) -> Result<Vec<u8>>
    where
        R: CryptoRng + RngCore,
    {
        let l = self.keys.len();
        let mut d = l;
        while self.keys[d - 1].available_signatures() == 0 {
            d -= 1;
            if d == 0 {
                return Err(Error::Exhausted);
            }
        }
        for i in d..l {
            self.keys[i] = lms::PrivateKey::generate(self.lms_algos[i], self.ots_algo, rng);
            self.pubs[i] = self.keys[i].public_key();
            let child_pub = self.pubs[i].to_bytes();
            self.sigs[i - 1] = self.keys[i - 1].sign(&child_pub, rng)?;
        }
        let final_sig = self.keys[l - 1].sign(message, rng)?;

        let mut out = Vec::new();
        out.extend_from_slice(&(l as u32 - 1).to_be_bytes());
        for i in 0..l - 1 {
            out.extend_from_slice(&self.sigs[i]);
            out.extend_from_slice(&self.pubs[i + 1].to_bytes());
        }
        out.extend_from_slice(&final_sig);
        Ok(out)
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            levels: self.keys.len() as u32,
            root: self.pubs[0].clone(),
        }
    }

    pub fn keys(&self) -> &[lms::PrivateKey] {
        &self.keys
    }

    pub fn intra_signatures(&self) -> &[Vec<u8>] {
        &self.sigs
    }

    /// Rebuild a key from stored parts. Public keys are recomputed from the
    /// tree roots; counts and per-level parameter sets are validated.
    pub fn from_parts(
        lms_algos: Vec<LmsAlgorithm>,
        ots_algo: LmotsAlgorithm,
        keys: Vec<lms::PrivateKey>,
        sigs: Vec<Vec<u8>>,
    ) -> Result<Self> {
        if lms_algos.is_empty() || lms_algos.len() > MAX_LEVELS {
            return Err(Error::BadKeyFile("level count out of range"));
        }
        if keys.len() != lms_algos.len() || sigs.len() + 1 != lms_algos.len() {
            return Err(Error::BadKeyFile("level count mismatch"));
        }
        for (key, algo) in keys.iter().zip(&lms_algos) {
            if key.algorithm() != *algo || key.ots_algorithm() != ots_algo {
                return Err(Error::BadKeyFile("per-level parameter set mismatch"));
            }
        }
        let pubs = keys.iter().map(|k| k.public_key()).collect();
        Ok(Self {
            lms_algos,
            ots_algo,
            keys,
            pubs,
            sigs,
        })
    }
}

/// HSS public key: the level count and the root tree's public key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    levels: u32,
    root: lms::PublicKey,
}

impl PublicKey {
    /// Parse `u32(L) || LMS public key`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 4 {
            return Err(Error::Invalid);
        }
        let levels = u32::from_be_bytes(bytes[..4].try_into().unwrap());
        if levels == 0 || levels > MAX_LEVELS as u32 {
            return Err(Error::Invalid);
        }
        Ok(Self {
            levels,
            root: lms::PublicKey::from_bytes(&bytes[4..])?,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.root.algorithm().public_key_len());
        out.extend_from_slice(&self.levels.to_be_bytes());
        out.extend_from_slice(&self.root.to_bytes());
        out
    }

    pub fn levels(&self) -> u32 {
        self.levels
    }

    pub fn root(&self) -> &lms::PublicKey {
        &self.root
    }

    /// Verify `signature` over `message`: walk the chain of signed public
    /// keys down from the root, then check the final signature over the
    /// message itself.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        if signature.len() < 4 {
            return Err(Error::Invalid);
        }
        let nspk = u32::from_be_bytes(signature[..4].try_into().unwrap());
        if nspk != self.levels - 1 {
            return Err(Error::Invalid);
        }
        let mut rest = &signature[4..];
        let mut key = self.root.clone();
        for _ in 0..nspk {
            let sig_len = lms::PublicKey::signature_len(rest)?;
            if rest.len() < sig_len {
                return Err(Error::Invalid);
            }
            let (sig_i, tail) = rest.split_at(sig_len);
            let pub_len = lms::PublicKey::public_key_len(tail)?;
            if tail.len() < pub_len {
                return Err(Error::Invalid);
            }
            let (pub_i, tail) = tail.split_at(pub_len);
            key.verify(pub_i, sig_i)?;
            key = lms::PublicKey::from_bytes(pub_i)?;
            rest = tail;
        }
        key.verify(message, rest)
    }
}
