//! Wire-frame encoding for simulated readers.
//!
//! This module builds the `Message` values a real reader would put on the
//! wire, including the redundancy the decoder later verifies:
//!
//! | Builder | Frame | Redundancy |
//! |---------|-------|------------|
//! | [`keypress4`] | 4 bits | none |
//! | [`keypress8`] | 8 bits | high nibble = complement of low |
//! | [`standard26`] / [`standard26_parts`] | 26 bits | leading/trailing parity |
//! | [`extended34`] | 34 bits | leading/trailing parity |
//! | [`parity_framed`] | payload + 2 bits | leading/trailing parity |
//! | [`raw`] / [`flip_bit`] | anything | caller's choice |
//!
//! Parity framing follows the usual reader convention: the first framing
//! bit makes the first half of the frame even, the last framing bit makes
//! the second half odd.
//!
//! # Examples
//!
//! ```
//! use gatewire_emulator::encoder;
//!
//! let frame = encoder::standard26_parts(0x12, 0x3456);
//! assert_eq!(frame.bits(), 26);
//!
//! // Strip the framing bits: the payload sits in the middle.
//! assert_eq!(frame.value() >> 1 & 0xFF_FFFF, 0x12_3456);
//! ```

use gatewire_core::constants::{MAX_BITS, PARITY_FRAMING_BITS};
use gatewire_core::{FrameBuffer, Message};
use thiserror::Error;

/// Errors produced when composing wire frames.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    /// The value has set bits above the field width.
    #[error("Value {value:#x} does not fit in {bits} payload bits")]
    ValueTooWide { value: u64, bits: u8 },

    /// Parity framing needs an even payload width with room for the two
    /// framing bits.
    #[error(
        "Payload width must be even and between 2 and {max} bits, got {0}",
        max = MAX_BITS - PARITY_FRAMING_BITS
    )]
    InvalidPayloadWidth(u8),

    /// Raw frames carry between 1 and [`MAX_BITS`] bits.
    #[error("Frame length must be 1-{max}, got {0}", max = MAX_BITS)]
    InvalidFrameLength(u8),

    /// The requested bit position is past the end of the frame.
    #[error("Bit position {position} is outside the {bits}-bit frame")]
    BitOutOfRange { position: u8, bits: u8 },
}

/// Build an unprotected 4-bit keypress frame.
///
/// # Errors
/// Returns `EncodeError::ValueTooWide` if `digit` exceeds a nibble.
///
/// # Examples
///
/// ```
/// use gatewire_emulator::encoder;
///
/// let frame = encoder::keypress4(0xB).unwrap();
/// assert_eq!(frame.bits(), 4);
/// assert_eq!(frame.value(), 0xB);
/// ```
pub fn keypress4(digit: u8) -> Result<Message, EncodeError> {
    if digit > 0xF {
        return Err(EncodeError::ValueTooWide {
            value: u64::from(digit),
            bits: 4,
        });
    }
    let mut frame = FrameBuffer::new();
    for i in (0..4).rev() {
        frame.push(digit >> i & 1 != 0);
    }
    Ok(frame.to_message())
}

/// Build a complement-coded 8-bit keypress frame.
///
/// The digit goes in the low nibble; the high nibble carries its bitwise
/// complement so the receiver can verify the byte.
///
/// # Errors
/// Returns `EncodeError::ValueTooWide` if `digit` exceeds a nibble.
///
/// # Examples
///
/// ```
/// use gatewire_emulator::encoder;
///
/// let frame = encoder::keypress8(0x5).unwrap();
/// assert_eq!(frame.value(), 0xA5);
/// ```
pub fn keypress8(digit: u8) -> Result<Message, EncodeError> {
    if digit > 0xF {
        return Err(EncodeError::ValueTooWide {
            value: u64::from(digit),
            bits: 4,
        });
    }
    let byte = digit | (!digit & 0xF) << 4;
    let mut frame = FrameBuffer::new();
    for i in (0..8).rev() {
        frame.push(byte >> i & 1 != 0);
    }
    Ok(frame.to_message())
}

/// Build a standard 26-bit frame around a 24-bit payload.
///
/// # Errors
/// Returns `EncodeError::ValueTooWide` if `payload` exceeds 24 bits.
pub fn standard26(payload: u32) -> Result<Message, EncodeError> {
    if payload >= 1 << 24 {
        return Err(EncodeError::ValueTooWide {
            value: u64::from(payload),
            bits: 24,
        });
    }
    Ok(framed(u64::from(payload), 24))
}

/// Build a standard 26-bit frame from its conventional parts: an 8-bit
/// facility code followed by a 16-bit card number.
///
/// # Examples
///
/// ```
/// use gatewire_emulator::encoder;
///
/// let frame = encoder::standard26_parts(0xAB, 0x1234);
/// assert_eq!(frame.value() >> 1 & 0xFF_FFFF, 0xAB_1234);
/// ```
#[must_use]
pub fn standard26_parts(facility: u8, card: u16) -> Message {
    framed(u64::from(facility) << 16 | u64::from(card), 24)
}

/// Build an extended 34-bit frame around a 32-bit payload.
#[must_use]
pub fn extended34(payload: u32) -> Message {
    framed(u64::from(payload), 32)
}

/// Wrap an arbitrary even-width payload in computed parity framing.
///
/// # Errors
/// Returns `EncodeError::InvalidPayloadWidth` if `payload_bits` is zero,
/// odd, or leaves no room for the framing bits, and
/// `EncodeError::ValueTooWide` if `payload` has bits above `payload_bits`.
pub fn parity_framed(payload: u64, payload_bits: u8) -> Result<Message, EncodeError> {
    if payload_bits == 0 || payload_bits % 2 != 0 || payload_bits > MAX_BITS - PARITY_FRAMING_BITS {
        return Err(EncodeError::InvalidPayloadWidth(payload_bits));
    }
    if payload >> payload_bits != 0 {
        return Err(EncodeError::ValueTooWide {
            value: payload,
            bits: payload_bits,
        });
    }
    Ok(framed(payload, payload_bits))
}

/// Build a frame from the low `bits` bits of `value`, without framing.
///
/// Useful for negative tests: nothing checks that the length matches a
/// known format or that any redundancy holds.
///
/// # Errors
/// Returns `EncodeError::InvalidFrameLength` if `bits` is zero or exceeds
/// [`MAX_BITS`].
pub fn raw(value: u64, bits: u8) -> Result<Message, EncodeError> {
    if bits == 0 || bits > MAX_BITS {
        return Err(EncodeError::InvalidFrameLength(bits));
    }
    let mut frame = FrameBuffer::new();
    for i in (0..bits).rev() {
        frame.push(value >> i & 1 != 0);
    }
    Ok(frame.to_message())
}

/// Copy a frame with one bit flipped, counted in transmission order.
///
/// # Errors
/// Returns `EncodeError::BitOutOfRange` if `position` is past the end of
/// the frame.
///
/// # Examples
///
/// ```
/// use gatewire_emulator::encoder;
///
/// let clean = encoder::standard26(0x00C0FFEE).unwrap();
/// let corrupted = encoder::flip_bit(&clean, 0).unwrap();
/// assert_ne!(clean.value(), corrupted.value());
/// ```
pub fn flip_bit(message: &Message, position: u8) -> Result<Message, EncodeError> {
    if position >= message.bits() {
        return Err(EncodeError::BitOutOfRange {
            position,
            bits: message.bits(),
        });
    }
    let mut frame = FrameBuffer::new();
    for i in 0..message.bits() {
        frame.push(message.bit(i) ^ (i == position));
    }
    Ok(frame.to_message())
}

/// Frame `payload_bits` bits of payload between the two parity bits. The
/// caller has already validated the width.
fn framed(payload: u64, payload_bits: u8) -> Message {
    let half = payload_bits / 2;
    let mut left = false;
    for i in half..payload_bits {
        left ^= payload >> i & 1 != 0;
    }
    let mut right = true;
    for i in 0..half {
        right ^= payload >> i & 1 != 0;
    }
    let mut frame = FrameBuffer::new();
    frame.push(left);
    for i in (0..payload_bits).rev() {
        frame.push(payload >> i & 1 != 0);
    }
    frame.push(right);
    frame.to_message()
}
