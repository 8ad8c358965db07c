use crate::{
    Result,
    constants::{DEFAULT_FRAME_TIMEOUT, MAX_BITS},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// One of the two Wiegand data lines.
///
/// Both lines idle high. A short low pulse on [`Pin::Data0`] transmits a `0`
/// bit, a pulse on [`Pin::Data1`] transmits a `1` bit, and both lines held
/// low means no reader is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Pin {
    /// The D0 line.
    Data0 = 0,
    /// The D1 line.
    Data1 = 1,
}

impl Pin {
    /// Create a pin from its line index.
    ///
    /// # Errors
    /// Returns `Error::InvalidDataLine` if the index is not 0 or 1.
    #[inline]
    pub fn from_index(index: u8) -> Result<Self> {
        match index {
            0 => Ok(Pin::Data0),
            1 => Ok(Pin::Data1),
            _ => Err(Error::InvalidDataLine(index)),
        }
    }

    /// Line index of this pin, suitable for table lookups.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The bit value a pulse on this line transmits.
    #[inline]
    #[must_use]
    pub fn bit(self) -> bool {
        matches!(self, Pin::Data1)
    }

    /// The opposite data line.
    #[inline]
    #[must_use]
    pub fn other(self) -> Pin {
        match self {
            Pin::Data0 => Pin::Data1,
            Pin::Data1 => Pin::Data0,
        }
    }

    /// The line that transmits the given bit value.
    #[inline]
    #[must_use]
    pub fn for_bit(bit: bool) -> Pin {
        if bit { Pin::Data1 } else { Pin::Data0 }
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Pin::Data0 => write!(f, "D0"),
            Pin::Data1 => write!(f, "D1"),
        }
    }
}

/// Frame length handling.
///
/// With [`ExpectedBits::Any`] the wire itself delimits frames: a frame
/// closes once the line has idled longer than the frame timeout. With
/// [`ExpectedBits::Count`] the frame closes the instant the configured
/// number of bits has arrived, and frames that close at any other length
/// are rejected as [`DataError::SizeUnexpected`](crate::DataError::SizeUnexpected).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpectedBits {
    /// Accept frames of any length; close on the idle-gap timeout.
    Any,
    /// Accept only frames of exactly this many bits; close as soon as the
    /// last one lands.
    ///
    /// Build values from untrusted input with [`ExpectedBits::count`]. A
    /// hand-written count above [`MAX_BITS`] is harmless but useless: no
    /// frame can ever match it.
    Count(u8),
}

impl ExpectedBits {
    /// Create a fixed frame length with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidBitCount` if the count is 0 or exceeds
    /// [`MAX_BITS`].
    ///
    /// # Examples
    ///
    /// ```
    /// use gatewire_core::ExpectedBits;
    ///
    /// let fixed = ExpectedBits::count(26).unwrap();
    /// assert_eq!(fixed, ExpectedBits::Count(26));
    /// assert!(ExpectedBits::count(0).is_err());
    /// assert!(ExpectedBits::count(65).is_err());
    /// ```
    pub fn count(bits: u8) -> Result<Self> {
        if bits == 0 || bits > MAX_BITS {
            return Err(Error::InvalidBitCount { requested: bits });
        }
        Ok(ExpectedBits::Count(bits))
    }

    /// Returns `true` if a frame of `bits` bits satisfies this setting.
    #[inline]
    #[must_use]
    pub fn matches(self, bits: u8) -> bool {
        match self {
            ExpectedBits::Any => true,
            ExpectedBits::Count(n) => n == bits,
        }
    }

    /// The fixed count, if one is configured.
    #[inline]
    #[must_use]
    pub fn as_count(self) -> Option<u8> {
        match self {
            ExpectedBits::Any => None,
            ExpectedBits::Count(n) => Some(n),
        }
    }

    /// Returns `true` for the auto-length setting.
    #[inline]
    #[must_use]
    pub fn is_any(self) -> bool {
        matches!(self, ExpectedBits::Any)
    }
}

impl fmt::Display for ExpectedBits {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExpectedBits::Any => write!(f, "any"),
            ExpectedBits::Count(n) => write!(f, "{n}"),
        }
    }
}

/// How parity framing is handled for the 26/34-bit formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ParityMode {
    /// Verify both framing bits before delivering the payload.
    #[default]
    Enforce,
    /// Strip the framing bits without checking them.
    ///
    /// Some non-compliant 34-bit readers in the field emit framing the
    /// standard algorithm rejects. This mode lets their payloads through;
    /// it does not affect the 8-bit complement check.
    Disregard,
}

impl ParityMode {
    /// Returns `true` if framing bits are verified before delivery.
    #[inline]
    #[must_use]
    pub fn is_enforced(self) -> bool {
        matches!(self, ParityMode::Enforce)
    }
}

/// Decoder configuration.
///
/// # Examples
///
/// ```
/// use gatewire_core::{DecoderConfig, ExpectedBits};
/// use std::time::Duration;
///
/// // Auto-length, decoding enabled, default timeout.
/// let config = DecoderConfig::default();
/// assert!(config.decode_messages);
///
/// // Fixed 26-bit frames with a tighter timeout.
/// let config = DecoderConfig::new(ExpectedBits::count(26)?, true)
///     .with_frame_timeout(Duration::from_millis(10));
/// assert_eq!(config.expected_bits, ExpectedBits::Count(26));
/// # Ok::<(), gatewire_core::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Frame length handling: auto-length or a fixed bit count.
    pub expected_bits: ExpectedBits,
    /// Decode and verify the known formats (`true`) or deliver every frame
    /// raw (`false`).
    pub decode_messages: bool,
    /// Idle gap that closes a pending frame.
    ///
    /// Keep this within the documented
    /// [`MIN_FRAME_TIMEOUT`](crate::constants::MIN_FRAME_TIMEOUT)..=[`MAX_FRAME_TIMEOUT`](crate::constants::MAX_FRAME_TIMEOUT)
    /// range; shorter values split frames apart, longer values delay
    /// auto-length delivery.
    pub frame_timeout: Duration,
    /// Parity handling for the 26/34-bit formats.
    pub parity_mode: ParityMode,
}

impl DecoderConfig {
    /// Create a configuration with the default timeout and parity mode.
    #[must_use]
    pub fn new(expected_bits: ExpectedBits, decode_messages: bool) -> Self {
        Self {
            expected_bits,
            decode_messages,
            ..Self::default()
        }
    }

    /// Replace the frame timeout.
    #[must_use]
    pub fn with_frame_timeout(mut self, timeout: Duration) -> Self {
        self.frame_timeout = timeout;
        self
    }

    /// Replace the parity mode.
    #[must_use]
    pub fn with_parity_mode(mut self, mode: ParityMode) -> Self {
        self.parity_mode = mode;
        self
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            expected_bits: ExpectedBits::Any,
            decode_messages: true,
            frame_timeout: Duration::from_millis(DEFAULT_FRAME_TIMEOUT),
            parity_mode: ParityMode::Enforce,
        }
    }
}
