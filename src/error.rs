//! Error taxonomy for the bit-level codec.
//!
//! Every type here implements `Display` and `std::error::Error` by hand,
//! following the style already used by this crate rather than pulling in a
//! derive-macro crate.

use std::fmt;
use std::io;

/// A sticky I/O condition observed by the bit reader/writer.
///
/// Once either side observes one of these, it is latched: further bit
/// operations become no-ops and keep returning the same condition.
#[derive(Debug)]
pub enum BitIoError {
    /// The underlying sink/source returned an error.
    Io(io::Error),
    /// The source was exhausted while bits were still expected.
    UnexpectedEof,
}

impl fmt::Display for BitIoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BitIoError::Io(e) => write!(f, "bit stream I/O error: {e}"),
            BitIoError::UnexpectedEof => write!(f, "unexpected end of bit stream"),
        }
    }
}

impl std::error::Error for BitIoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BitIoError::Io(e) => Some(e),
            BitIoError::UnexpectedEof => None,
        }
    }
}

impl Clone for BitIoError {
    fn clone(&self) -> Self {
        match self {
            BitIoError::Io(e) => BitIoError::Io(io::Error::new(e.kind(), e.to_string())),
            BitIoError::UnexpectedEof => BitIoError::UnexpectedEof,
        }
    }
}

/// Failures that can occur while encoding a vector sequence.
#[derive(Debug)]
pub enum EncodeError {
    /// A vector whose length did not equal the encoder's `span` was passed to `put`.
    BadArity { expected: usize, got: usize },
    /// The computed new-window header collided with the reserved EOF header `(63, 63)`.
    ///
    /// Cannot happen for a legitimate IEEE-754 XOR diff; surfaced rather than
    /// panicking so that callers can treat corrupted/adversarial input as a
    /// recoverable error instead of an abort.
    ReservedEofWindow,
    /// The underlying bit writer is poisoned.
    Io(BitIoError),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::BadArity { expected, got } => {
                write!(f, "vector has {got} elements, encoder span is {expected}")
            }
            EncodeError::ReservedEofWindow => {
                write!(f, "computed window header collides with the reserved EOF marker")
            }
            EncodeError::Io(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EncodeError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<BitIoError> for EncodeError {
    fn from(e: BitIoError) -> Self {
        EncodeError::Io(e)
    }
}

/// Failures that can occur while decoding a vector sequence.
#[derive(Debug, Clone)]
pub enum DecodeError {
    /// The EOF marker was read in the middle of a vector (at a position other than 0).
    PartialVector,
    /// The underlying bit reader hit a genuine I/O error or truncation.
    Io(BitIoError),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::PartialVector => {
                write!(f, "EOF marker encountered inside a partially decoded vector")
            }
            DecodeError::Io(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Io(e) => Some(e),
            DecodeError::PartialVector => None,
        }
    }
}

impl From<BitIoError> for DecodeError {
    fn from(e: BitIoError) -> Self {
        DecodeError::Io(e)
    }
}

/// Failures surfaced by the background drain helper.
#[derive(Debug)]
pub enum DrainError {
    /// The caller requested cancellation before the stream was exhausted.
    Cancelled,
    /// Decoding failed.
    Decode(DecodeError),
}

impl fmt::Display for DrainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrainError::Cancelled => write!(f, "drain cancelled"),
            DrainError::Decode(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for DrainError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DrainError::Decode(e) => Some(e),
            DrainError::Cancelled => None,
        }
    }
}

impl From<DecodeError> for DrainError {
    fn from(e: DecodeError) -> Self {
        DrainError::Decode(e)
    }
}
