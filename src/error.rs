//! Recoverable errors surfaced across the crate's public boundary.
//!
//! I/O failures wrap `std::io::Error` directly; the loader gets a variant
//! of its own for malformed program images so callers can tell the two
//! apart.

use std::fmt;
use std::io;

#[derive(Debug)]
pub enum LcError {
    Io(io::Error),
    /// The program image was the wrong shape for its format: an odd byte
    /// count for a binary `.obj`, or a non-hex token in a hex listing.
    MalformedImage(String),
}

impl fmt::Display for LcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LcError::Io(err) => write!(f, "{}", err),
            LcError::MalformedImage(reason) => write!(f, "malformed program image: {}", reason),
        }
    }
}

impl std::error::Error for LcError {}

impl From<io::Error> for LcError {
    fn from(err: io::Error) -> Self {
        LcError::Io(err)
    }
}

impl From<std::num::ParseIntError> for LcError {
    fn from(err: std::num::ParseIntError) -> Self {
        LcError::MalformedImage(err.to_string())
    }
}
