//! Truncating SHA-256 hasher.
//!
//! Every RFC 8554 / SP 800-208 parameter set supported here hashes with
//! SHA-256; the N24/M24 sets truncate the digest to 24 bytes (SHA-256/192).

use sha2::{Digest, Sha256};

/// Untruncated SHA-256 output size.
pub const MAX_OUTPUT_LEN: usize = 32;

/// Incremental SHA-256 with a fixed, possibly truncated output length.
#[derive(Clone)]
pub struct Hasher {
    inner: Sha256,
    out_len: usize,
}

impl Hasher {
    /// Start a hash computation producing `out_len` bytes.
    pub fn init(out_len: usize) -> Self {
        debug_assert!(out_len > 0 && out_len <= MAX_OUTPUT_LEN);
        Self {
            inner: Sha256::new(),
            out_len,
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Finish and return the (truncated) digest.
    pub fn done(self) -> Vec<u8> {
        let digest = self.inner.finalize();
        digest[..self.out_len].to_vec()
    }
}
