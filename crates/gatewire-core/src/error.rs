use crate::constants::MAX_BITS;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by fallible constructors and configuration entry points.
///
/// Decode failures on the wire are not `Result` errors; they are classified
/// as [`DataError`] values and delivered through the data-error handler.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Expected bit count must be 1-{max}, got {requested}", max = MAX_BITS)]
    InvalidBitCount { requested: u8 },

    #[error("Data line index must be 0 or 1, got {0}")]
    InvalidDataLine(u8),

    // Payload construction errors
    #[error("Payload of {actual} bytes cannot hold {bits} bits (needs {expected})")]
    PayloadSizeMismatch {
        bits: u8,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Classified reasons a closed frame failed to produce a message.
///
/// Every variant is delivered through the data-error handler together with
/// the raw right-aligned frame, so the embedding integration can log or
/// diagnose the rejected transmission. Failures never surface anywhere
/// else.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataError {
    /// The line was not idle-high for the whole frame: the reader attached
    /// or detached mid-transmission, or bits arrived before the first idle
    /// gap after initialization.
    #[error("Communication error")]
    Communication,

    /// More bits arrived than the receive buffer holds. The attached raw
    /// frame carries the first [`MAX_BITS`](crate::constants::MAX_BITS)
    /// bits; the surplus was discarded.
    #[error("Message size too big")]
    SizeTooBig,

    /// A fixed frame length is configured and the frame closed with a
    /// different bit count.
    #[error("Message size unexpected")]
    SizeUnexpected,

    /// Decoding is enabled and the bit count matches no known format.
    #[error("Message format not supported")]
    DecodeFailed,

    /// The frame matched a known format but its redundancy check failed:
    /// parity framing for the 26/34-bit formats, the complement nibble for
    /// the 8-bit format.
    #[error("Message verification failed")]
    VerificationFailed,
}
