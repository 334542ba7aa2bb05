//! Core primitives shared by the hsslms crates: parameter-set tables,
//! Winternitz coefficient arithmetic, the truncating SHA-256 hasher and the
//! project-wide error type.

pub mod error;
pub mod hash;
pub mod params;
pub mod utils;

pub use error::{Error, Result};
pub use params::{LmotsAlgorithm, LmsAlgorithm};

/// 16-byte key-pair identifier `I` (RFC 8554 section 5.1).
pub type Identifier = [u8; 16];

/// Size of [`Identifier`] in bytes.
pub const IDENTIFIER_LEN: usize = 16;
