//! Frame storage and delivered payloads.
//!
//! [`FrameBuffer`] is the in-flight bit store a frame accumulates into while
//! pulses arrive; [`Message`] is the right-aligned payload handed to the
//! data and data-error handlers once a frame closes.
//!
//! # Bit Layout
//!
//! The buffer keeps bits in transmission order, MSB-first within each byte:
//! bit *i* lands in byte `i >> 3` under the mask `0x80 >> (i & 7)`. A
//! delivered message is right-aligned instead: the last transmitted bit is
//! the least significant bit of the last byte, and the unused high bits of
//! the first byte are zero.
//!
//! ```text
//! 26 bits in the buffer (left-aligned):   26 bits in a message (right-aligned):
//!
//! byte 0   byte 1   byte 2   byte 3      byte 0   byte 1   byte 2   byte 3
//! 76543210 76543210 76543210 76......    ......98 76543210 76543210 76543210
//! ^ bit 0                      ^ bit 25  ^ zero padding            bit 25 ^
//! ```

use crate::constants::{MAX_BITS, MAX_BYTES};
use crate::error::Error;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// In-flight bit store for a frame under reception.
///
/// Fixed capacity of [`MAX_BITS`]; [`push`](FrameBuffer::push) reports when
/// the capacity is exhausted and leaves the buffer untouched, so the bit
/// count can never exceed the capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameBuffer {
    data: [u8; MAX_BYTES],
    bits: u8,
}

impl FrameBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            data: [0; MAX_BYTES],
            bits: 0,
        }
    }

    /// Number of bits currently stored.
    #[inline]
    #[must_use]
    pub fn len(&self) -> u8 {
        self.bits
    }

    /// Returns `true` if no bits are stored.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Returns `true` once the buffer holds [`MAX_BITS`] bits.
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.bits >= MAX_BITS
    }

    /// Discard all stored bits.
    pub fn clear(&mut self) {
        self.data = [0; MAX_BYTES];
        self.bits = 0;
    }

    /// Append one bit in transmission order.
    ///
    /// Returns `false` and leaves the buffer untouched once the capacity is
    /// exhausted; the caller decides how to surface the overflow.
    pub fn push(&mut self, bit: bool) -> bool {
        if self.is_full() {
            return false;
        }
        if bit {
            self.data[(self.bits >> 3) as usize] |= 0x80 >> (self.bits & 7);
        }
        self.bits += 1;
        true
    }

    /// Read the bit at `index` (transmission order).
    ///
    /// # Panics
    /// Debug builds assert `index < len()`; release builds read the zero
    /// padding beyond the stored bits.
    #[inline]
    #[must_use]
    pub fn bit(&self, index: u8) -> bool {
        debug_assert!(index < self.bits, "bit index {index} out of {}", self.bits);
        self.data[(index >> 3) as usize] & (0x80 >> (index & 7)) != 0
    }

    /// Right-aligned copy of the bit range `[start, end)`.
    ///
    /// Used to strip framing bits on delivery: a 26-bit frame's payload is
    /// `aligned(1, 25)`.
    #[must_use]
    pub fn aligned(&self, start: u8, end: u8) -> Message {
        debug_assert!(start <= end && end <= self.bits);
        let bits = end - start;
        let mut data = [0u8; MAX_BYTES];
        if bits > 0 {
            let pad = (bits as usize).div_ceil(8) as u8 * 8 - bits;
            for i in 0..bits {
                if self.bit(start + i) {
                    let pos = pad + i;
                    data[(pos >> 3) as usize] |= 0x80 >> (pos & 7);
                }
            }
        }
        Message { data, bits }
    }

    /// Right-aligned copy of the whole buffer.
    #[must_use]
    pub fn to_message(&self) -> Message {
        self.aligned(0, self.bits)
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// A delivered payload: up to [`MAX_BYTES`] bytes plus a bit count.
///
/// Messages are right-aligned (see the module docs) so that
/// [`value`](Message::value) reads naturally as a big-endian integer and
/// byte-oriented consumers get a minimal, zero-padded slice from
/// [`as_bytes`](Message::as_bytes).
///
/// # Examples
///
/// ```
/// use gatewire_core::Message;
///
/// let message = Message::from_value(0x5, 4)?;
/// assert_eq!(message.bits(), 4);
/// assert_eq!(message.as_bytes(), &[0x05]);
/// assert_eq!(message.value(), 0x5);
/// # Ok::<(), gatewire_core::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "MessageWire")]
pub struct Message {
    data: [u8; MAX_BYTES],
    bits: u8,
}

impl Message {
    /// Create a message from right-aligned bytes.
    ///
    /// The slice length must match the byte length implied by `bits`. The
    /// unused high bits of the first byte are masked off.
    ///
    /// # Errors
    /// Returns `Error::InvalidBitCount` if `bits` is 0 or exceeds
    /// [`MAX_BITS`], or `Error::PayloadSizeMismatch` if the slice length
    /// disagrees with `bits`.
    pub fn new(bytes: &[u8], bits: u8) -> Result<Self> {
        if bits == 0 || bits > MAX_BITS {
            return Err(Error::InvalidBitCount { requested: bits });
        }
        let expected = (bits as usize).div_ceil(8);
        if bytes.len() != expected {
            return Err(Error::PayloadSizeMismatch {
                bits,
                expected,
                actual: bytes.len(),
            });
        }
        let mut data = [0u8; MAX_BYTES];
        data[..expected].copy_from_slice(bytes);
        let pad = expected as u8 * 8 - bits;
        if pad > 0 {
            data[0] &= 0xFF >> pad;
        }
        Ok(Self { data, bits })
    }

    /// Create a message from the low `bits` bits of an integer value.
    ///
    /// # Errors
    /// Returns `Error::InvalidBitCount` if `bits` is 0 or exceeds
    /// [`MAX_BITS`].
    ///
    /// # Examples
    ///
    /// ```
    /// use gatewire_core::Message;
    ///
    /// let message = Message::from_value(0x00C0_FFEE, 26)?;
    /// assert_eq!(message.as_bytes(), &[0x00, 0xC0, 0xFF, 0xEE]);
    /// # Ok::<(), gatewire_core::Error>(())
    /// ```
    pub fn from_value(value: u64, bits: u8) -> Result<Self> {
        if bits == 0 || bits > MAX_BITS {
            return Err(Error::InvalidBitCount { requested: bits });
        }
        let masked = if bits == MAX_BITS {
            value
        } else {
            value & ((1u64 << bits) - 1)
        };
        let byte_len = (bits as usize).div_ceil(8);
        let mut data = [0u8; MAX_BYTES];
        let be = masked.to_be_bytes();
        data[..byte_len].copy_from_slice(&be[8 - byte_len..]);
        Ok(Self { data, bits })
    }

    /// Number of payload bits.
    #[inline]
    #[must_use]
    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// Number of bytes needed to hold the payload bits.
    #[inline]
    #[must_use]
    pub fn byte_len(&self) -> usize {
        (self.bits as usize).div_ceil(8)
    }

    /// The right-aligned payload bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.byte_len()]
    }

    /// Read the bit at `index` (transmission order).
    #[must_use]
    pub fn bit(&self, index: u8) -> bool {
        debug_assert!(index < self.bits, "bit index {index} out of {}", self.bits);
        let pad = self.byte_len() as u8 * 8 - self.bits;
        let pos = pad + index;
        self.data[(pos >> 3) as usize] & (0x80 >> (pos & 7)) != 0
    }

    /// The payload as a big-endian integer.
    ///
    /// Always fits: messages carry at most [`MAX_BITS`] = 64 bits.
    #[must_use]
    pub fn value(&self) -> u64 {
        let mut be = [0u8; 8];
        let len = self.byte_len();
        be[8 - len..].copy_from_slice(&self.data[..len]);
        u64::from_be_bytes(be)
    }
}

/// Uppercase hex rendering of the payload bytes, e.g. `01A2B3C4`.
impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for byte in self.as_bytes() {
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

/// Serialized shape of [`Message`], validated on the way back in.
///
/// A stored message re-read with a bit count past [`MAX_BITS`] would break
/// the accessors' indexing, so deserialization runs the same bounds check
/// and padding mask as [`Message::new`].
#[derive(Deserialize)]
struct MessageWire {
    data: [u8; MAX_BYTES],
    bits: u8,
}

impl TryFrom<MessageWire> for Message {
    type Error = Error;

    fn try_from(wire: MessageWire) -> Result<Self> {
        if wire.bits > MAX_BITS {
            return Err(Error::InvalidBitCount {
                requested: wire.bits,
            });
        }
        let len = (wire.bits as usize).div_ceil(8);
        let mut data = [0u8; MAX_BYTES];
        data[..len].copy_from_slice(&wire.data[..len]);
        let pad = len as u8 * 8 - wire.bits;
        if pad > 0 {
            data[0] &= 0xFF >> pad;
        }
        Ok(Self {
            data,
            bits: wire.bits,
        })
    }
}
