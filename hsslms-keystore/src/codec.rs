//! Strict binary encoding of the persisted key state.
//!
//! Every object is introduced by a one-byte type tag; all integers are
//! big-endian; every variable-length field is either length-prefixed or has
//! its size fixed by the parameter tables. Decoding refuses unknown tags,
//! short reads, trailing bytes and any structural inconsistency — nothing
//! outside this schema can be brought to life from a key file.

use hsslms_core::error::{Error, Result};
use hsslms_core::params::{LmotsAlgorithm, LmsAlgorithm, LmsParams};
use hsslms_core::IDENTIFIER_LEN;
use hsslms_sig::signature::{hss, lmots, lms};

const TAG_PERSISTENT_KEY: u8 = 0x01;
const TAG_HSS_KEY: u8 = 0x02;
const TAG_LMS_KEY: u8 = 0x03;
const TAG_OTS_KEY: u8 = 0x04;

struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.buf.len() < len {
            return Err(Error::BadKeyFile("truncated"));
        }
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    fn tag(&mut self, expected: u8) -> Result<()> {
        if self.take(1)?[0] != expected {
            return Err(Error::BadKeyFile("unexpected type tag"));
        }
        Ok(())
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn u64(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.take(8)?.try_into().unwrap()))
    }

    /// u32-length-prefixed byte string.
    fn bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.u32()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    fn finish(self) -> Result<()> {
        if self.buf.is_empty() {
            Ok(())
        } else {
            Err(Error::BadKeyFile("trailing bytes"))
        }
    }
}

fn put_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    out.extend_from_slice(bytes);
}

fn encode_ots_key(out: &mut Vec<u8>, key: &lmots::PrivateKey) {
    // Position fields (typecode, I, q) are fixed by the enclosing LMS key
    // and reimposed on decode, so only the secret state is written.
    out.push(TAG_OTS_KEY);
    out.push(u8::from(key.is_used()));
    out.extend_from_slice(key.seeds());
}

fn encode_lms_key(out: &mut Vec<u8>, key: &lms::PrivateKey) {
    out.push(TAG_LMS_KEY);
    out.extend_from_slice(&key.algorithm().typecode().to_be_bytes());
    out.extend_from_slice(&key.ots_algorithm().typecode().to_be_bytes());
    out.extend_from_slice(key.identifier());
    out.extend_from_slice(&key.q().to_be_bytes());
    for ots in key.ots_keys() {
        encode_ots_key(out, ots);
    }
    let (_, nodes) = key.store_tree();
    for node in &nodes {
        out.extend_from_slice(node);
    }
}

fn decode_lms_key(r: &mut Reader<'_>) -> Result<lms::PrivateKey> {
    r.tag(TAG_LMS_KEY)?;
    let algo = LmsAlgorithm::from_typecode(r.u32()?)
        .ok_or(Error::BadKeyFile("unknown LMS typecode"))?;
    let ots_algo = LmotsAlgorithm::from_typecode(r.u32()?)
        .ok_or(Error::BadKeyFile("unknown LM-OTS typecode"))?;
    let mut id = [0u8; IDENTIFIER_LEN];
    id.copy_from_slice(r.take(IDENTIFIER_LEN)?);
    let q = r.u32()?;

    let params = ots_algo.params();
    let seed_len = params.n * params.p;
    let mut ots_keys = Vec::with_capacity(algo.leaf_count() as usize);
    for j in 0..algo.leaf_count() {
        r.tag(TAG_OTS_KEY)?;
        let used = match r.u8()? {
            0 => false,
            1 => true,
            _ => return Err(Error::BadKeyFile("bad one-time key flag")),
        };
        let x = r.take(seed_len)?.to_vec();
        ots_keys.push(lmots::PrivateKey::from_parts(ots_algo, id, j, x, used)?);
    }

    let LmsParams { m, h } = algo.params();
    let node_count = (1usize << (h + 1)) - 1;
    let mut nodes = Vec::with_capacity(node_count);
    for _ in 0..node_count {
        nodes.push(r.take(m)?.to_vec());
    }
    lms::PrivateKey::from_parts(algo, ots_algo, id, ots_keys, nodes, q)
}

fn encode_hss_key(out: &mut Vec<u8>, key: &hss::PrivateKey) {
    out.push(TAG_HSS_KEY);
    out.push(key.levels() as u8);
    out.extend_from_slice(&key.ots_algorithm().typecode().to_be_bytes());
    for algo in key.lms_algorithms() {
        out.extend_from_slice(&algo.typecode().to_be_bytes());
    }
    for lms_key in key.keys() {
        encode_lms_key(out, lms_key);
    }
    for sig in key.intra_signatures() {
        put_bytes(out, sig);
    }
}

fn decode_hss_key(r: &mut Reader<'_>) -> Result<hss::PrivateKey> {
    r.tag(TAG_HSS_KEY)?;
    let levels = r.u8()? as usize;
    if levels == 0 || levels > hss::MAX_LEVELS {
        return Err(Error::BadKeyFile("level count out of range"));
    }
    let ots_algo = LmotsAlgorithm::from_typecode(r.u32()?)
        .ok_or(Error::BadKeyFile("unknown LM-OTS typecode"))?;
    let mut lms_algos = Vec::with_capacity(levels);
    for _ in 0..levels {
        lms_algos.push(
            LmsAlgorithm::from_typecode(r.u32()?)
                .ok_or(Error::BadKeyFile("unknown LMS typecode"))?,
        );
    }
    let mut keys = Vec::with_capacity(levels);
    for _ in 0..levels {
        keys.push(decode_lms_key(r)?);
    }
    let mut sigs = Vec::with_capacity(levels - 1);
    for _ in 1..levels {
        sigs.push(r.bytes()?);
    }
    hss::PrivateKey::from_parts(lms_algos, ots_algo, keys, sigs)
}

/// Serialize the full persistent state.
pub(crate) fn encode(key: &hss::PrivateKey, frequency: u32, sign_count: u64) -> Vec<u8> {
    let mut out = Vec::new();
    out.push(TAG_PERSISTENT_KEY);
    out.extend_from_slice(&frequency.to_be_bytes());
    out.extend_from_slice(&sign_count.to_be_bytes());
    encode_hss_key(&mut out, key);
    out
}

/// Parse the full persistent state, refusing anything off-schema.
pub(crate) fn decode(bytes: &[u8]) -> Result<(hss::PrivateKey, u32, u64)> {
    let mut r = Reader::new(bytes);
    r.tag(TAG_PERSISTENT_KEY)?;
    let frequency = r.u32()?;
    if frequency == 0 {
        return Err(Error::BadKeyFile("zero flush frequency"));
    }
    let sign_count = r.u64()?;
    let key = decode_hss_key(&mut r)?;
    r.finish()?;
    Ok((key, frequency, sign_count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn small_key() -> hss::PrivateKey {
        let mut rng = StdRng::seed_from_u64(61);
        hss::PrivateKey::generate(
            &[LmsAlgorithm::LmsSha256M32H5, LmsAlgorithm::LmsSha256M32H5],
            LmotsAlgorithm::LmotsSha256N32W8,
            &mut rng,
            None,
        )
        .unwrap()
    }

    #[test]
    fn round_trip_preserves_signing_state() {
        let mut rng = StdRng::seed_from_u64(67);
        let mut key = small_key();
        let vk = key.public_key();
        key.sign(b"advance the cursor", &mut rng).unwrap();

        let encoded = encode(&key, 4, 1);
        let (mut decoded, frequency, sign_count) = decode(&encoded).unwrap();
        assert_eq!(frequency, 4);
        assert_eq!(sign_count, 1);
        assert_eq!(decoded.public_key(), vk);
        assert_eq!(decoded.available_signatures(), key.available_signatures());

        let sig = decoded.sign(b"signed after reload", &mut rng).unwrap();
        vk.verify(b"signed after reload", &sig).unwrap();
    }

    #[test]
    fn unknown_tag_is_refused() {
        let key = small_key();
        let mut encoded = encode(&key, 1, 0);
        encoded[0] = 0x7f;
        assert!(matches!(decode(&encoded), Err(Error::BadKeyFile(_))));
    }

    #[test]
    fn truncation_and_trailing_bytes_are_refused() {
        let key = small_key();
        let encoded = encode(&key, 1, 0);
        assert!(matches!(
            decode(&encoded[..encoded.len() - 1]),
            Err(Error::BadKeyFile(_))
        ));
        let mut padded = encoded;
        padded.push(0);
        assert!(matches!(decode(&padded), Err(Error::BadKeyFile(_))));
    }

    #[test]
    fn inner_tag_corruption_is_refused() {
        let key = small_key();
        let mut encoded = encode(&key, 1, 0);
        // The HSS tag sits right after frequency and sign count.
        assert_eq!(encoded[13], TAG_HSS_KEY);
        encoded[13] = TAG_LMS_KEY;
        assert!(matches!(decode(&encoded), Err(Error::BadKeyFile(_))));
    }
}
