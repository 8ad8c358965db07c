//! Core constants for the Wiegand decoder.
//!
//! This module defines the line-timing and capacity constants used throughout
//! the gatewire decoder. They are derived from the de-facto Wiegand reader
//! interface as implemented by badge and keypad readers in the field.
//!
//! # Line Structure
//!
//! A Wiegand reader drives two open-collector data lines, D0 and D1. Both
//! idle high; each transmitted bit is a short low pulse on exactly one line:
//!
//! ```text
//! D0 ───────┐ ┌──────────────────────┐ ┌─────────
//!           └─┘                      └─┘
//! D1 ──────────────────┐ ┌────────────────────────
//!                      └─┘
//!            0          1             0
//!           |← period →|
//! ```
//!
//! A pulse on D0 transmits a `0`, a pulse on D1 transmits a `1`. Both lines
//! held low means no reader is attached (open-collector outputs need a
//! powered driver to float high).
//!
//! # Frame Delimiting
//!
//! The wire carries no framing marks. A frame ends either when a configured
//! number of bits has arrived or when the line stays idle longer than the
//! frame timeout. The timeout is chosen well above the nominal pulse period
//! so it can only ever fire between frames.
//!
//! # Usage
//!
//! ```
//! use gatewire_core::constants::*;
//! use std::time::Duration;
//!
//! assert_eq!(MAX_BITS as usize, MAX_BYTES * 8);
//!
//! let timeout = Duration::from_millis(DEFAULT_FRAME_TIMEOUT);
//! assert!(timeout > Duration::from_micros(PULSE_PERIOD_MICROS));
//! ```

// ============================================================================
// Receive Capacity
// ============================================================================

/// Maximum number of bits a single frame can carry.
///
/// Frames that keep growing past this point latch an overflow condition and
/// surface as [`DataError::SizeTooBig`](crate::DataError::SizeTooBig) when
/// they close. The bit count itself never exceeds this value; surplus bits
/// are discarded.
///
/// # Value: 64 bits
///
/// Covers every format in circulation today (the widest common format is
/// 37 bits) with headroom for vendor extensions.
pub const MAX_BITS: u8 = 64;

/// Receive buffer capacity in bytes.
///
/// # Examples
///
/// ```
/// use gatewire_core::constants::{MAX_BITS, MAX_BYTES};
///
/// assert_eq!(MAX_BYTES, MAX_BITS as usize / 8);
/// ```
pub const MAX_BYTES: usize = (MAX_BITS as usize) / 8;

// ============================================================================
// Frame Timing
// ============================================================================

/// Default idle gap that closes a pending frame (milliseconds).
///
/// When no edge has been observed for longer than this, the pending frame is
/// considered complete. Readers space pulses roughly [`PULSE_PERIOD_MICROS`]
/// apart, so the default leaves an order-of-magnitude margin against closing
/// a frame mid-transmission.
///
/// # Value: 25ms
///
/// # Examples
///
/// ```
/// use gatewire_core::constants::DEFAULT_FRAME_TIMEOUT;
/// use std::time::Duration;
///
/// let timeout = Duration::from_millis(DEFAULT_FRAME_TIMEOUT);
/// assert_eq!(timeout.as_millis(), 25);
/// ```
pub const DEFAULT_FRAME_TIMEOUT: u64 = 25;

/// Smallest frame timeout that is safe against mid-frame closes (milliseconds).
///
/// Values below this approach the nominal pulse period; a reader with slow
/// or irregular pulse spacing would see its frames split apart.
///
/// # Value: 5ms
pub const MIN_FRAME_TIMEOUT: u64 = 5;

/// Largest frame timeout that keeps auto-length framing responsive (milliseconds).
///
/// Values above this delay delivery of auto-length frames noticeably; a
/// keypad user would perceive the lag between keypress and reaction.
///
/// # Value: 1000ms
pub const MAX_FRAME_TIMEOUT: u64 = 1000;

/// Nominal low-pulse width on a data line (microseconds).
///
/// Informational; the decoder is edge-driven and does not measure pulse
/// widths. The emulator uses this as its default pulse width.
///
/// # Value: 50µs
pub const PULSE_WIDTH_MICROS: u64 = 50;

/// Nominal spacing between consecutive pulses (microseconds).
///
/// Informational; the emulator uses this as its default pulse period, and
/// the frame-timeout bounds are justified against it.
///
/// # Value: 2000µs (2ms)
pub const PULSE_PERIOD_MICROS: u64 = 2000;

// ============================================================================
// Format Framing
// ============================================================================

/// Number of framing bits wrapped around a parity-framed payload.
///
/// The 26-bit and 34-bit formats carry one parity bit at each end of the
/// payload. Stripping both yields the 24-bit and 32-bit payloads.
///
/// # Examples
///
/// ```
/// use gatewire_core::constants::PARITY_FRAMING_BITS;
///
/// assert_eq!(26 - PARITY_FRAMING_BITS, 24);
/// assert_eq!(34 - PARITY_FRAMING_BITS, 32);
/// ```
pub const PARITY_FRAMING_BITS: u8 = 2;
