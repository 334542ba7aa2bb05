//! Parameter-set tables for LM-OTS and LMS.
//!
//! The typecodes and `(n, w, p, ls)` / `(m, h)` tuples are fixed by
//! RFC 8554 section 4.1 / 5.1 and, for the N24/M24 sets, by NIST SP 800-208.
//! Unknown typecodes are rejected everywhere.

use core::fmt;
use core::str::FromStr;

use crate::error::Error;

/// Fixed LM-OTS parameters: hash length `n`, Winternitz width `w`, chain
/// count `p` and checksum left-shift `ls`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LmotsParams {
    pub n: usize,
    pub w: usize,
    pub p: usize,
    pub ls: usize,
}

/// LM-OTS parameter sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LmotsAlgorithm {
    LmotsSha256N32W1 = 1,
    LmotsSha256N32W2 = 2,
    LmotsSha256N32W4 = 3,
    LmotsSha256N32W8 = 4,
    LmotsSha256N24W1 = 5,
    LmotsSha256N24W2 = 6,
    LmotsSha256N24W4 = 7,
    LmotsSha256N24W8 = 8,
}

impl LmotsAlgorithm {
    pub const fn typecode(self) -> u32 {
        self as u32
    }

    pub fn from_typecode(code: u32) -> Option<Self> {
        use LmotsAlgorithm::*;
        match code {
            1 => Some(LmotsSha256N32W1),
            2 => Some(LmotsSha256N32W2),
            3 => Some(LmotsSha256N32W4),
            4 => Some(LmotsSha256N32W8),
            5 => Some(LmotsSha256N24W1),
            6 => Some(LmotsSha256N24W2),
            7 => Some(LmotsSha256N24W4),
            8 => Some(LmotsSha256N24W8),
            _ => None,
        }
    }

    pub const fn params(self) -> LmotsParams {
        use LmotsAlgorithm::*;
        match self {
            LmotsSha256N32W1 => LmotsParams { n: 32, w: 1, p: 265, ls: 7 },
            LmotsSha256N32W2 => LmotsParams { n: 32, w: 2, p: 133, ls: 6 },
            LmotsSha256N32W4 => LmotsParams { n: 32, w: 4, p: 67, ls: 4 },
            LmotsSha256N32W8 => LmotsParams { n: 32, w: 8, p: 34, ls: 0 },
            LmotsSha256N24W1 => LmotsParams { n: 24, w: 1, p: 200, ls: 8 },
            LmotsSha256N24W2 => LmotsParams { n: 24, w: 2, p: 101, ls: 6 },
            LmotsSha256N24W4 => LmotsParams { n: 24, w: 4, p: 51, ls: 4 },
            LmotsSha256N24W8 => LmotsParams { n: 24, w: 8, p: 26, ls: 0 },
        }
    }

    /// Serialized public key size: `u32(type) || I || u32(q) || K`.
    pub const fn public_key_len(self) -> usize {
        24 + self.params().n
    }

    /// Serialized signature size: `u32(type) || C || y[0..p]`.
    pub const fn signature_len(self) -> usize {
        let p = self.params();
        4 + p.n * (p.p + 1)
    }

    pub const fn as_str(self) -> &'static str {
        use LmotsAlgorithm::*;
        match self {
            LmotsSha256N32W1 => "LMOTS_SHA256_N32_W1",
            LmotsSha256N32W2 => "LMOTS_SHA256_N32_W2",
            LmotsSha256N32W4 => "LMOTS_SHA256_N32_W4",
            LmotsSha256N32W8 => "LMOTS_SHA256_N32_W8",
            LmotsSha256N24W1 => "LMOTS_SHA256_N24_W1",
            LmotsSha256N24W2 => "LMOTS_SHA256_N24_W2",
            LmotsSha256N24W4 => "LMOTS_SHA256_N24_W4",
            LmotsSha256N24W8 => "LMOTS_SHA256_N24_W8",
        }
    }
}

impl fmt::Display for LmotsAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LmotsAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        use LmotsAlgorithm::*;
        match s {
            "LMOTS_SHA256_N32_W1" => Ok(LmotsSha256N32W1),
            "LMOTS_SHA256_N32_W2" => Ok(LmotsSha256N32W2),
            "LMOTS_SHA256_N32_W4" => Ok(LmotsSha256N32W4),
            "LMOTS_SHA256_N32_W8" => Ok(LmotsSha256N32W8),
            "LMOTS_SHA256_N24_W1" => Ok(LmotsSha256N24W1),
            "LMOTS_SHA256_N24_W2" => Ok(LmotsSha256N24W2),
            "LMOTS_SHA256_N24_W4" => Ok(LmotsSha256N24W4),
            "LMOTS_SHA256_N24_W8" => Ok(LmotsSha256N24W8),
            _ => Err(Error::UnknownParameterSet(s.to_string())),
        }
    }
}

/// Fixed LMS parameters: hash length `m` and tree height `h`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LmsParams {
    pub m: usize,
    pub h: usize,
}

/// LMS parameter sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LmsAlgorithm {
    LmsSha256M32H5 = 5,
    LmsSha256M32H10 = 6,
    LmsSha256M32H15 = 7,
    LmsSha256M32H20 = 8,
    LmsSha256M32H25 = 9,
    LmsSha256M24H5 = 10,
    LmsSha256M24H10 = 11,
    LmsSha256M24H15 = 12,
    LmsSha256M24H20 = 13,
    LmsSha256M24H25 = 14,
}

impl LmsAlgorithm {
    pub const fn typecode(self) -> u32 {
        self as u32
    }

    pub fn from_typecode(code: u32) -> Option<Self> {
        use LmsAlgorithm::*;
        match code {
            5 => Some(LmsSha256M32H5),
            6 => Some(LmsSha256M32H10),
            7 => Some(LmsSha256M32H15),
            8 => Some(LmsSha256M32H20),
            9 => Some(LmsSha256M32H25),
            10 => Some(LmsSha256M24H5),
            11 => Some(LmsSha256M24H10),
            12 => Some(LmsSha256M24H15),
            13 => Some(LmsSha256M24H20),
            14 => Some(LmsSha256M24H25),
            _ => None,
        }
    }

    pub const fn params(self) -> LmsParams {
        use LmsAlgorithm::*;
        match self {
            LmsSha256M32H5 => LmsParams { m: 32, h: 5 },
            LmsSha256M32H10 => LmsParams { m: 32, h: 10 },
            LmsSha256M32H15 => LmsParams { m: 32, h: 15 },
            LmsSha256M32H20 => LmsParams { m: 32, h: 20 },
            LmsSha256M32H25 => LmsParams { m: 32, h: 25 },
            LmsSha256M24H5 => LmsParams { m: 24, h: 5 },
            LmsSha256M24H10 => LmsParams { m: 24, h: 10 },
            LmsSha256M24H15 => LmsParams { m: 24, h: 15 },
            LmsSha256M24H20 => LmsParams { m: 24, h: 20 },
            LmsSha256M24H25 => LmsParams { m: 24, h: 25 },
        }
    }

    /// Number of one-time keys (leaves) under this parameter set.
    pub const fn leaf_count(self) -> u32 {
        1 << self.params().h
    }

    /// Serialized public key size: `u32(type) || u32(otstype) || I || T1`.
    pub const fn public_key_len(self) -> usize {
        24 + self.params().m
    }

    pub const fn as_str(self) -> &'static str {
        use LmsAlgorithm::*;
        match self {
            LmsSha256M32H5 => "LMS_SHA256_M32_H5",
            LmsSha256M32H10 => "LMS_SHA256_M32_H10",
            LmsSha256M32H15 => "LMS_SHA256_M32_H15",
            LmsSha256M32H20 => "LMS_SHA256_M32_H20",
            LmsSha256M32H25 => "LMS_SHA256_M32_H25",
            LmsSha256M24H5 => "LMS_SHA256_M24_H5",
            LmsSha256M24H10 => "LMS_SHA256_M24_H10",
            LmsSha256M24H15 => "LMS_SHA256_M24_H15",
            LmsSha256M24H20 => "LMS_SHA256_M24_H20",
            LmsSha256M24H25 => "LMS_SHA256_M24_H25",
        }
    }
}

impl fmt::Display for LmsAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LmsAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        use LmsAlgorithm::*;
        match s {
            "LMS_SHA256_M32_H5" => Ok(LmsSha256M32H5),
            "LMS_SHA256_M32_H10" => Ok(LmsSha256M32H10),
            "LMS_SHA256_M32_H15" => Ok(LmsSha256M32H15),
            "LMS_SHA256_M32_H20" => Ok(LmsSha256M32H20),
            "LMS_SHA256_M32_H25" => Ok(LmsSha256M32H25),
            "LMS_SHA256_M24_H5" => Ok(LmsSha256M24H5),
            "LMS_SHA256_M24_H10" => Ok(LmsSha256M24H10),
            "LMS_SHA256_M24_H15" => Ok(LmsSha256M24H15),
            "LMS_SHA256_M24_H20" => Ok(LmsSha256M24H20),
            "LMS_SHA256_M24_H25" => Ok(LmsSha256M24H25),
            _ => Err(Error::UnknownParameterSet(s.to_string())),
        }
    }
}
