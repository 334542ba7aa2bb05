//! Durable storage for HSS private keys.
//!
//! The on-disk format is `header(18) || salt(16) || nonce(12) || ciphertext`
//! where the ciphertext is the strict binary encoding of the key state under
//! AES-256-GCM with a PBKDF2-derived key and the header as associated data.
//! [`PersistentPrivateKey`] layers the flush-before-release discipline and
//! the skip-ahead recovery on top, so that a crash can never lead to a leaf
//! index being signed twice.

mod codec;
mod keystore;

pub use keystore::{PersistentPrivateKey, FILE_HEADER};
