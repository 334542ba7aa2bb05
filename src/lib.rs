//! Stateful hash-based signatures after RFC 8554: the Leighton-Micali
//! one-time scheme (LM-OTS), the Merkle many-time scheme on top of it (LMS)
//! and their hierarchical composition (HSS), together with encrypted,
//! crash-safe private-key persistence.
//!
//! ## Signing with a persisted key
//! ```no_run
//! use hsslms::{LmotsAlgorithm, LmsAlgorithm, PersistentPrivateKey};
//!
//! # fn main() -> hsslms::Result<()> {
//! let mut sk = PersistentPrivateKey::generate(
//!     &[LmsAlgorithm::LmsSha256M32H10, LmsAlgorithm::LmsSha256M32H5],
//!     LmotsAlgorithm::LmotsSha256N32W4,
//!     "signing.key",
//!     b"correct horse battery staple",
//!     1,
//!     None,
//! )?;
//! sk.save()?;
//! let vk = sk.public_key();
//! let signature = sk.sign(b"release artifact")?;
//! vk.verify(b"release artifact", &signature)?;
//! # Ok(())
//! # }
//! ```
//!
//! Ephemeral (non-persisted) keys live in [`hss`], [`lms`] and [`lmots`];
//! they take the CSPRNG as an argument, which keeps tests deterministic.

pub use hsslms_core::error::{Error, Result};
pub use hsslms_core::params::{
    LmotsAlgorithm, LmotsParams, LmsAlgorithm, LmsParams,
};
pub use hsslms_core::{Identifier, IDENTIFIER_LEN};
pub use hsslms_keystore::{PersistentPrivateKey, FILE_HEADER};
pub use hsslms_sig::signature::{hss, lmots, lms};
