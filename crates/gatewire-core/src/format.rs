//! Frame classification and payload extraction.
//!
//! Once a frame closes cleanly, its bit count alone selects the format:
//!
//! | Bits | Format | Payload | Redundancy |
//! |------|--------|---------|------------|
//! | 4 | keypress | 4 bits | none |
//! | 8 | keypress | 4 bits | complement nibble |
//! | 26 | standard | 24 bits | parity framing |
//! | 34 | extended | 32 bits | parity framing |
//!
//! Any other count is rejected as [`DataError::DecodeFailed`]. The 8-bit
//! keypress format repeats the key nibble inverted in the high nibble; the
//! parity-framed formats carry one parity bit at each end of the payload
//! (see [`crate::parity`]).

use crate::error::DataError;
use crate::frame::{FrameBuffer, Message};
use crate::parity::ParityAccumulator;
use crate::types::ParityMode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The wire formats the decoder understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WiegandFormat {
    /// Single keypad nibble, no redundancy.
    Keypress4,
    /// Keypad nibble repeated inverted in the high nibble.
    Keypress8,
    /// 26-bit standard frame: 24-bit payload inside parity framing.
    Standard26,
    /// 34-bit extended frame: 32-bit payload inside parity framing.
    Extended34,
}

impl WiegandFormat {
    /// Select the format a closed frame of `bits` bits belongs to.
    #[must_use]
    pub fn from_bit_count(bits: u8) -> Option<Self> {
        match bits {
            4 => Some(WiegandFormat::Keypress4),
            8 => Some(WiegandFormat::Keypress8),
            26 => Some(WiegandFormat::Standard26),
            34 => Some(WiegandFormat::Extended34),
            _ => None,
        }
    }

    /// Total bits on the wire.
    #[inline]
    #[must_use]
    pub fn bits(self) -> u8 {
        match self {
            WiegandFormat::Keypress4 => 4,
            WiegandFormat::Keypress8 => 8,
            WiegandFormat::Standard26 => 26,
            WiegandFormat::Extended34 => 34,
        }
    }

    /// Bits delivered to the data handler after stripping redundancy.
    #[inline]
    #[must_use]
    pub fn payload_bits(self) -> u8 {
        match self {
            WiegandFormat::Keypress4 | WiegandFormat::Keypress8 => 4,
            WiegandFormat::Standard26 => 24,
            WiegandFormat::Extended34 => 32,
        }
    }

    /// Returns `true` for the formats wrapped in parity framing.
    #[inline]
    #[must_use]
    pub fn is_parity_framed(self) -> bool {
        matches!(self, WiegandFormat::Standard26 | WiegandFormat::Extended34)
    }

    /// Human-readable format name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            WiegandFormat::Keypress4 => "4-bit keypress",
            WiegandFormat::Keypress8 => "8-bit keypress",
            WiegandFormat::Standard26 => "26-bit standard",
            WiegandFormat::Extended34 => "34-bit extended",
        }
    }
}

impl fmt::Display for WiegandFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Validate a cleanly closed frame and extract its payload.
///
/// `parity` must be the accumulator state for exactly the bits in `frame`;
/// the decoder maintains it incrementally while the frame grows.
///
/// # Errors
///
/// - [`DataError::DecodeFailed`] if the bit count matches no format.
/// - [`DataError::VerificationFailed`] if the complement nibble or the
///   parity framing is wrong (the latter only under
///   [`ParityMode::Enforce`]).
pub fn decode_frame(
    frame: &FrameBuffer,
    parity: ParityAccumulator,
    parity_mode: ParityMode,
) -> std::result::Result<Message, DataError> {
    let Some(format) = WiegandFormat::from_bit_count(frame.len()) else {
        return Err(DataError::DecodeFailed);
    };
    match format {
        WiegandFormat::Keypress4 => Ok(frame.to_message()),
        WiegandFormat::Keypress8 => {
            let byte = frame.to_message().value() as u8;
            let value = byte & 0x0F;
            if byte == (value | ((!value & 0x0F) << 4)) {
                // the key nibble is the low half of the byte
                Ok(frame.aligned(4, 8))
            } else {
                Err(DataError::VerificationFailed)
            }
        }
        WiegandFormat::Standard26 | WiegandFormat::Extended34 => {
            if parity_mode.is_enforced() && !parity.is_valid() {
                return Err(DataError::VerificationFailed);
            }
            Ok(frame.aligned(1, frame.len() - 1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn frame_of(value: u64, bits: u8) -> (FrameBuffer, ParityAccumulator) {
        let mut frame = FrameBuffer::new();
        let mut parity = ParityAccumulator::new();
        for i in (0..bits).rev() {
            frame.push(value >> i & 1 != 0);
            parity.observe(&frame);
        }
        (frame, parity)
    }

    fn decode(value: u64, bits: u8) -> Result<Message, DataError> {
        let (frame, parity) = frame_of(value, bits);
        decode_frame(&frame, parity, ParityMode::Enforce)
    }

    #[rstest]
    #[case(4, Some(WiegandFormat::Keypress4))]
    #[case(8, Some(WiegandFormat::Keypress8))]
    #[case(26, Some(WiegandFormat::Standard26))]
    #[case(34, Some(WiegandFormat::Extended34))]
    #[case(0, None)]
    #[case(25, None)]
    #[case(27, None)]
    #[case(64, None)]
    fn test_from_bit_count(#[case] bits: u8, #[case] expected: Option<WiegandFormat>) {
        assert_eq!(WiegandFormat::from_bit_count(bits), expected);
    }

    #[rstest]
    #[case(WiegandFormat::Keypress4, 4, 4, false)]
    #[case(WiegandFormat::Keypress8, 8, 4, false)]
    #[case(WiegandFormat::Standard26, 26, 24, true)]
    #[case(WiegandFormat::Extended34, 34, 32, true)]
    fn test_format_widths(
        #[case] format: WiegandFormat,
        #[case] bits: u8,
        #[case] payload: u8,
        #[case] framed: bool,
    ) {
        assert_eq!(format.bits(), bits);
        assert_eq!(format.payload_bits(), payload);
        assert_eq!(format.is_parity_framed(), framed);
    }

    #[test]
    fn test_keypress4_passes_through() {
        for digit in 0..=0xF {
            let message = decode(digit, 4).unwrap();
            assert_eq!(message.bits(), 4);
            assert_eq!(message.value(), digit);
        }
    }

    #[test]
    fn test_keypress8_accepts_complement_coded_byte() {
        // 0xA5: low nibble 5, high nibble !5 = A
        let message = decode(0xA5, 8).unwrap();
        assert_eq!(message.bits(), 4);
        assert_eq!(message.value(), 0x5);
    }

    #[test]
    fn test_keypress8_rejects_corrupt_byte() {
        assert_eq!(decode(0xA6, 8), Err(DataError::VerificationFailed));
        assert_eq!(decode(0x55, 8), Err(DataError::VerificationFailed));
    }

    #[test]
    fn test_keypress8_every_valid_byte() {
        for value in 0..=0xFu64 {
            let byte = value | ((!value & 0xF) << 4);
            let message = decode(byte, 8).unwrap();
            assert_eq!(message.value(), value);
        }
    }

    #[test]
    fn test_standard26_strips_framing() {
        let payload: u64 = 0xC0_FFEE;
        let frame_value = frame_with_parity(payload, 24);
        let message = decode(frame_value, 26).unwrap();
        assert_eq!(message.bits(), 24);
        assert_eq!(message.value(), payload);
    }

    #[test]
    fn test_extended34_strips_framing() {
        let payload: u64 = 0xDEAD_BEEF;
        let frame_value = frame_with_parity(payload, 32);
        let message = decode(frame_value, 34).unwrap();
        assert_eq!(message.bits(), 32);
        assert_eq!(message.value(), payload);
    }

    #[test]
    fn test_parity_failure_is_verification_failed() {
        let good = frame_with_parity(0xC0_FFEE, 24);
        // flipping any single bit must break one of the halves
        let bad = good ^ (1 << 13);
        assert_eq!(decode(bad, 26), Err(DataError::VerificationFailed));
    }

    #[test]
    fn test_parity_disregard_mode_skips_verification() {
        let good = frame_with_parity(0xC0_FFEE, 24);
        let bad = good ^ (1 << 13);
        let (frame, parity) = frame_of(bad, 26);
        let message = decode_frame(&frame, parity, ParityMode::Disregard).unwrap();
        assert_eq!(message.bits(), 24);
        // framing bits still stripped; the corrupted payload comes through
        assert_eq!(message.value(), (bad >> 1) & 0xFF_FFFF);
    }

    #[test]
    fn test_unknown_length_decode_failed() {
        assert_eq!(decode(0x7F, 7), Err(DataError::DecodeFailed));
        assert_eq!(decode(0x1FF_FFFF, 25), Err(DataError::DecodeFailed));
    }

    /// Wrap a payload in computed parity framing: the first bit makes the
    /// left half even, the last bit makes the right half odd.
    fn frame_with_parity(payload: u64, payload_bits: u8) -> u64 {
        let half = payload_bits / 2;
        let mut left = false;
        for i in (half..payload_bits).rev() {
            left ^= payload >> i & 1 != 0;
        }
        let mut right = true;
        for i in 0..half {
            right ^= payload >> i & 1 != 0;
        }
        (u64::from(left) << (payload_bits + 1)) | (payload << 1) | u64::from(right)
    }
}
