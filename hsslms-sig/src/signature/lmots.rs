//! Leighton-Micali one-time signatures (RFC 8554 section 4).
//!
//! A private key is `p` random `n`-byte chain seeds under a fixed
//! `(I, q)` position; it signs at most once. The public key `K` is the hash
//! of all fully-iterated chains.

use rand::{CryptoRng, RngCore};
use zeroize::Zeroize;

use hsslms_core::error::{Error, Result};
use hsslms_core::hash::Hasher;
use hsslms_core::params::{LmotsAlgorithm, LmotsParams};
use hsslms_core::utils::{checksum, coef, D_MESG, D_PBLC};
use hsslms_core::{Identifier, IDENTIFIER_LEN};

/// Iterate the Winternitz chain at position `(I, q, i)` from step `from` up
/// to (excluding) step `to`, starting from `start`.
fn chain(
    algo: LmotsAlgorithm,
    id: &Identifier,
    q: u32,
    i: u16,
    from: usize,
    to: usize,
    start: &[u8],
) -> Vec<u8> {
    let n = algo.params().n;
    let mut value = start.to_vec();
    for j in from..to {
        let mut h = Hasher::init(n);
        h.update(id);
        h.update(&q.to_be_bytes());
        h.update(&i.to_be_bytes());
        h.update(&[j as u8]);
        h.update(&value);
        value = h.done();
    }
    value
}

/// `Q = H(I || u32(q) || D_MESG || C || message)`, followed by its checksum:
/// the byte string whose `w`-bit coefficients select the chain lengths.
fn message_coefficients(
    algo: LmotsAlgorithm,
    id: &Identifier,
    q: u32,
    c: &[u8],
    message: &[u8],
) -> Vec<u8> {
    let LmotsParams { n, w, ls, .. } = algo.params();
    let mut h = Hasher::init(n);
    h.update(id);
    h.update(&q.to_be_bytes());
    h.update(&D_MESG);
    h.update(c);
    h.update(message);
    let mut qa = h.done();
    let cksm = checksum(&qa, w, ls);
    qa.extend_from_slice(&cksm.to_be_bytes());
    qa
}

/// Recompute the candidate public key `Kc` from a message and a signature
/// (RFC 8554 algorithm 4b). Structural mismatches surface as
/// [`Error::Invalid`]; comparing `Kc` against `K` is up to the caller.
pub(crate) fn candidate_public_key(
    algo: LmotsAlgorithm,
    id: &Identifier,
    q: u32,
    message: &[u8],
    signature: &[u8],
) -> Result<Vec<u8>> {
    if signature.len() < 4 {
        return Err(Error::Invalid);
    }
    let sigtype = u32::from_be_bytes(signature[..4].try_into().unwrap());
    if sigtype != algo.typecode() {
        return Err(Error::Invalid);
    }
    let LmotsParams { n, w, p, .. } = algo.params();
    if signature.len() != algo.signature_len() {
        return Err(Error::Invalid);
    }
    let c = &signature[4..4 + n];
    let qa = message_coefficients(algo, id, q, c, message);

    let mut outer = Hasher::init(n);
    outer.update(id);
    outer.update(&q.to_be_bytes());
    outer.update(&D_PBLC);
    for (i, y) in signature[4 + n..].chunks_exact(n).enumerate() {
        debug_assert!(i < p);
        let a = coef(&qa, i, w) as usize;
        let z = chain(algo, id, q, i as u16, a, (1 << w) - 1, y);
        outer.update(&z);
    }
    Ok(outer.done())
}

/// LM-OTS private key.
pub struct PrivateKey {
    algo: LmotsAlgorithm,
    id: Identifier,
    q: u32,

    /// `p` chain seeds of `n` bytes each, flat.
    x: Vec<u8>,

    /// Monotone; a key that has signed never signs again.
    used: bool,
}

impl PrivateKey {
    /// Draw a fresh one-time key for leaf `q` of the key pair `I`.
    pub fn generate<R>(algo: LmotsAlgorithm, id: Identifier, q: u32, rng: &mut R) -> Self
    where
        R: CryptoRng + RngCore,
    {
        let LmotsParams { n, p, .. } = algo.params();
        let mut x = vec![0u8; n * p];
        rng.fill_bytes(&mut x);
        Self {
            algo,
            id,
            q,
            x,
            used: false,
        }
    }

    pub fn algorithm(&self) -> LmotsAlgorithm {
        self.algo
    }

    pub fn identifier(&self) -> &Identifier {
        &self.id
    }

    pub fn q(&self) -> u32 {
        self.q
    }

    pub fn is_used(&self) -> bool {
        self.used
    }

    /// Sign `message` (RFC 8554 algorithm 3). Fails with
    /// [`Error::OtsKeyUsed`] on any second call.
    pub fn sign<R>(&mut self, message: &[u8], rng: &mut R) -> Result<Vec<u8>>
    where
        R: CryptoRng + RngCore,
    {
        if self.used {
            return Err(Error::OtsKeyUsed);
        }
        let LmotsParams { n, w, .. } = self.algo.params();
        let mut c = vec![0u8; n];
        rng.fill_bytes(&mut c);
        let qa = message_coefficients(self.algo, &self.id, self.q, &c, message);

        let mut sig = Vec::with_capacity(self.algo.signature_len());
        sig.extend_from_slice(&self.algo.typecode().to_be_bytes());
        sig.extend_from_slice(&c);
        for (i, xi) in self.x.chunks_exact(n).enumerate() {
            let a = coef(&qa, i, w) as usize;
            sig.extend_from_slice(&chain(self.algo, &self.id, self.q, i as u16, 0, a, xi));
        }
        self.used = true;
        Ok(sig)
    }

    /// Derive the public key by running every chain to its end (RFC 8554
    /// algorithm 1).
    pub fn public_key(&self) -> PublicKey {
        let LmotsParams { n, w, .. } = self.algo.params();
        let mut outer = Hasher::init(n);
        outer.update(&self.id);
        outer.update(&self.q.to_be_bytes());
        outer.update(&D_PBLC);
        for (i, xi) in self.x.chunks_exact(n).enumerate() {
            let z = chain(self.algo, &self.id, self.q, i as u16, 0, (1 << w) - 1, xi);
            outer.update(&z);
        }
        PublicKey {
            algo: self.algo,
            id: self.id,
            q: self.q,
            k: outer.done(),
        }
    }

    /// Chain seed buffer, for serialization.
    pub fn seeds(&self) -> &[u8] {
        &self.x
    }

    /// Rebuild a key from stored parts, validating the seed-buffer size.
    pub fn from_parts(
        algo: LmotsAlgorithm,
        id: Identifier,
        q: u32,
        x: Vec<u8>,
        used: bool,
    ) -> Result<Self> {
        let LmotsParams { n, p, .. } = algo.params();
        if x.len() != n * p {
            return Err(Error::BadKeyFile("one-time seed buffer has the wrong size"));
        }
        Ok(Self {
            algo,
            id,
            q,
            x,
            used,
        })
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.x.zeroize();
    }
}

/// LM-OTS public key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    algo: LmotsAlgorithm,
    id: Identifier,
    q: u32,
    k: Vec<u8>,
}

impl PublicKey {
    /// Parse `u32(type) || I || u32(q) || K`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 4 {
            return Err(Error::Invalid);
        }
        let code = u32::from_be_bytes(bytes[..4].try_into().unwrap());
        let algo = LmotsAlgorithm::from_typecode(code).ok_or(Error::Invalid)?;
        if bytes.len() != algo.public_key_len() {
            return Err(Error::Invalid);
        }
        let mut id = [0u8; IDENTIFIER_LEN];
        id.copy_from_slice(&bytes[4..20]);
        let q = u32::from_be_bytes(bytes[20..24].try_into().unwrap());
        Ok(Self {
            algo,
            id,
            q,
            k: bytes[24..].to_vec(),
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.algo.public_key_len());
        out.extend_from_slice(&self.algo.typecode().to_be_bytes());
        out.extend_from_slice(&self.id);
        out.extend_from_slice(&self.q.to_be_bytes());
        out.extend_from_slice(&self.k);
        out
    }

    pub fn algorithm(&self) -> LmotsAlgorithm {
        self.algo
    }

    /// The chained public-key hash `K`.
    pub fn k(&self) -> &[u8] {
        &self.k
    }

    /// Verify `signature` over `message` against this key.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        let kc = candidate_public_key(self.algo, &self.id, self.q, message, signature)?;
        if kc == self.k {
            Ok(())
        } else {
            Err(Error::Invalid)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(17)
    }

    #[test]
    fn sign_verify_all_widths() {
        for algo in [
            LmotsAlgorithm::LmotsSha256N32W1,
            LmotsAlgorithm::LmotsSha256N32W2,
            LmotsAlgorithm::LmotsSha256N32W4,
            LmotsAlgorithm::LmotsSha256N32W8,
            LmotsAlgorithm::LmotsSha256N24W4,
        ] {
            let mut rng = rng();
            let mut sk = PrivateKey::generate(algo, [7u8; 16], 3, &mut rng);
            let pk = sk.public_key();
            let sig = sk.sign(b"one-time message", &mut rng).unwrap();
            assert_eq!(sig.len(), algo.signature_len());
            pk.verify(b"one-time message", &sig).unwrap();
            assert!(matches!(
                pk.verify(b"another message", &sig),
                Err(Error::Invalid)
            ));
        }
    }

    #[test]
    fn second_sign_is_refused() {
        let mut rng = rng();
        let mut sk = PrivateKey::generate(LmotsAlgorithm::LmotsSha256N32W4, [0u8; 16], 0, &mut rng);
        sk.sign(b"first", &mut rng).unwrap();
        assert!(matches!(sk.sign(b"second", &mut rng), Err(Error::OtsKeyUsed)));
    }

    #[test]
    fn tampered_signature_is_invalid() {
        let mut rng = rng();
        let mut sk = PrivateKey::generate(LmotsAlgorithm::LmotsSha256N32W2, [1u8; 16], 5, &mut rng);
        let pk = sk.public_key();
        let mut sig = sk.sign(b"msg", &mut rng).unwrap();
        let last = sig.len() - 1;
        sig[last] ^= 0x01;
        assert!(matches!(pk.verify(b"msg", &sig), Err(Error::Invalid)));
    }

    #[test]
    fn structural_checks() {
        let mut rng = rng();
        let mut sk = PrivateKey::generate(LmotsAlgorithm::LmotsSha256N32W8, [2u8; 16], 0, &mut rng);
        let pk = sk.public_key();
        let sig = sk.sign(b"msg", &mut rng).unwrap();

        // Truncated signature.
        assert!(matches!(
            pk.verify(b"msg", &sig[..sig.len() - 1]),
            Err(Error::Invalid)
        ));
        // Typecode flipped to a different known set.
        let mut wrong_type = sig.clone();
        wrong_type[3] = LmotsAlgorithm::LmotsSha256N32W4.typecode() as u8;
        assert!(matches!(pk.verify(b"msg", &wrong_type), Err(Error::Invalid)));
        // Unknown typecode.
        let mut unknown = sig;
        unknown[3] = 0xfe;
        assert!(matches!(pk.verify(b"msg", &unknown), Err(Error::Invalid)));
    }

    #[test]
    fn public_key_bytes_round_trip() {
        let mut rng = rng();
        let sk = PrivateKey::generate(LmotsAlgorithm::LmotsSha256N24W8, [9u8; 16], 11, &mut rng);
        let pk = sk.public_key();
        let bytes = pk.to_bytes();
        assert_eq!(bytes.len(), 24 + 24);
        let parsed = PublicKey::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, pk);

        assert!(matches!(
            PublicKey::from_bytes(&bytes[..bytes.len() - 1]),
            Err(Error::Invalid)
        ));
        let mut unknown = bytes;
        unknown[3] = 0;
        assert!(matches!(PublicKey::from_bytes(&unknown), Err(Error::Invalid)));
    }
}
