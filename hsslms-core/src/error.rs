use std::io;

use displaydoc::Display;

/// Project-wide error type.
///
/// [`Error::Invalid`] covers every cryptographic or structural failure of a
/// signature, public key or parsed byte string; it carries no detail on
/// purpose. All remaining variants are operational failures and carry their
/// specific message.
#[derive(Display, Debug)]
pub enum Error {
    /// Signature is invalid.
    Invalid,
    /// One-time key has already been used.
    OtsKeyUsed,
    /// Private key is exhausted.
    Exhausted,
    /// Wrong password.
    WrongPassword,
    /// Unknown parameter set: {0}.
    UnknownParameterSet(String),
    /// Unsupported number of HSS levels: {0}.
    UnsupportedLevels(usize),
    /// Malformed private-key file: {0}.
    BadKeyFile(&'static str),
    /// I/O error: {0}
    Io(io::Error),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_facing_messages() {
        // The CLI prints these verbatim.
        assert_eq!(Error::Invalid.to_string(), "Signature is invalid.");
        assert_eq!(Error::WrongPassword.to_string(), "Wrong password.");
        assert_eq!(
            Error::BadKeyFile("truncated").to_string(),
            "Malformed private-key file: truncated."
        );
    }
}
