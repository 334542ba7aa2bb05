//! The three-layer Leighton-Micali signature engine of RFC 8554: the
//! one-time scheme ([`signature::lmots`]), the Merkle many-time scheme on
//! top of it ([`signature::lms`]) and the hierarchical composition
//! ([`signature::hss`]).

pub mod signature;

pub use signature::{hss, lmots, lms};
