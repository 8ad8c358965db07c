//! Common test utilities for integration tests.
//!
//! This module provides the shared vocabulary of the decoder integration
//! tests:
//!
//! 1. **Line drivers** (`pulse`, `attach`, `idle_close`, `send_bits`) - Replay
//!    realistic edge timelines into a decoder with an explicit clock.
//! 2. **Capture** - Records every handler invocation in arrival order so
//!    tests can assert on both content and ordering.
//! 3. **Frame builders** (`framed26`, `framed34`) - Wrap payloads in
//!    computed parity framing for wire-exact test vectors.
//!
//! All timing goes through an explicit [`Instant`] cursor advanced by the
//! helpers, so tests are deterministic regardless of host scheduling.

use gatewire_core::{DataError, Decoder, DecoderConfig, Message, Pin};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Low time of a simulated pulse.
pub const PULSE_WIDTH: Duration = Duration::from_micros(50);

/// Spacing between consecutive simulated pulses.
pub const PULSE_GAP: Duration = Duration::from_millis(2);

/// Idle time that safely exceeds the default frame timeout.
pub const IDLE_GAP: Duration = Duration::from_millis(50);

/// One handler invocation, in arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    /// Data handler: a decoded message.
    Data(Message),
    /// Data-error handler: a classified failure and the raw frame.
    Error(DataError, Message),
    /// State-change handler: reader attached or detached.
    State(bool),
}

/// Records everything a decoder delivers through its handlers.
#[derive(Clone, Default)]
pub struct Capture {
    log: Arc<Mutex<Vec<Activity>>>,
}

impl Capture {
    /// Register all three handlers on the decoder, replacing existing ones.
    pub fn install(&self, decoder: &mut Decoder) {
        let log = Arc::clone(&self.log);
        decoder.on_data(move |message| log.lock().unwrap().push(Activity::Data(*message)));
        let log = Arc::clone(&self.log);
        decoder.on_data_error(move |kind, raw| {
            log.lock().unwrap().push(Activity::Error(kind, *raw));
        });
        let log = Arc::clone(&self.log);
        decoder.on_state_change(move |connected| {
            log.lock().unwrap().push(Activity::State(connected));
        });
    }

    /// Every handler invocation so far, in order.
    pub fn activities(&self) -> Vec<Activity> {
        self.log.lock().unwrap().clone()
    }

    /// Decoded messages only.
    pub fn data(&self) -> Vec<Message> {
        self.activities()
            .into_iter()
            .filter_map(|activity| match activity {
                Activity::Data(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    /// Classified failures only.
    pub fn errors(&self) -> Vec<(DataError, Message)> {
        self.activities()
            .into_iter()
            .filter_map(|activity| match activity {
                Activity::Error(kind, raw) => Some((kind, raw)),
                _ => None,
            })
            .collect()
    }

    /// State-change notifications only.
    pub fn states(&self) -> Vec<bool> {
        self.activities()
            .into_iter()
            .filter_map(|activity| match activity {
                Activity::State(connected) => Some(connected),
                _ => None,
            })
            .collect()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.log.lock().unwrap().clear();
    }
}

/// Pulse one line low-then-high, advancing the clock like a real reader.
pub fn pulse(decoder: &mut Decoder, now: &mut Instant, pin: Pin) {
    decoder.set_pin_at(pin, false, *now);
    *now += PULSE_WIDTH;
    decoder.set_pin_at(pin, true, *now);
    *now += PULSE_GAP;
}

/// Raise both lines: the reader attaches.
pub fn attach(decoder: &mut Decoder, now: &mut Instant) {
    decoder.set_pin_at(Pin::Data0, true, *now);
    decoder.set_pin_at(Pin::Data1, true, *now);
}

/// Drop both lines: the reader detaches.
pub fn detach(decoder: &mut Decoder, now: &mut Instant) {
    decoder.set_pin_at(Pin::Data0, false, *now);
    decoder.set_pin_at(Pin::Data1, false, *now);
}

/// Idle past the frame timeout and tick, closing whatever is pending.
pub fn idle_close(decoder: &mut Decoder, now: &mut Instant) {
    *now += IDLE_GAP;
    decoder.tick_at(*now);
}

/// Transmit the low `bits` bits of `value`, most significant first.
pub fn send_bits(decoder: &mut Decoder, now: &mut Instant, value: u64, bits: u8) {
    for i in (0..bits).rev() {
        pulse(decoder, now, Pin::for_bit(value >> i & 1 != 0));
    }
}

/// Build a decoder that is begun, attached and settled: the next frame
/// transmitted is frame-aligned and decodes cleanly.
///
/// The returned [`Capture`] was installed before the attach, so the
/// attach's state-change is its first recorded activity.
pub fn ready_decoder(config: DecoderConfig) -> (Decoder, Capture, Instant) {
    let capture = Capture::default();
    let mut now = Instant::now();
    let mut decoder = Decoder::new();
    capture.install(&mut decoder);
    decoder.begin_at(config, now);
    attach(&mut decoder, &mut now);
    idle_close(&mut decoder, &mut now);
    (decoder, capture, now)
}

/// Wrap a payload in computed parity framing.
///
/// The first framing bit makes the left half of the frame even, the last
/// makes the right half odd. `payload_bits` must be even and at most 62.
pub fn parity_framed(payload: u64, payload_bits: u8) -> u64 {
    assert!(payload_bits % 2 == 0 && payload_bits <= 62);
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

/// A valid 26-bit frame around a 24-bit payload.
pub fn framed26(payload: u32) -> u64 {
    assert!(payload < 1 << 24);
    parity_framed(u64::from(payload), 24)
}

/// A valid 34-bit frame around a 32-bit payload.
pub fn framed34(payload: u32) -> u64 {
    parity_framed(u64::from(payload), 32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatewire_core::{ExpectedBits, FrameBuffer, ParityAccumulator};

    #[test]
    fn test_framed26_satisfies_parity_scan() {
        let frame_value = framed26(0x00C0_FFEE);
        let mut frame = FrameBuffer::new();
        for i in (0..26).rev() {
            frame.push(frame_value >> i & 1 != 0);
        }
        assert!(ParityAccumulator::scan(&frame).is_valid());
    }

    #[test]
    fn test_framed34_satisfies_parity_scan() {
        let frame_value = framed34(0xDEAD_BEEF);
        let mut frame = FrameBuffer::new();
        for i in (0..34).rev() {
            frame.push(frame_value >> i & 1 != 0);
        }
        assert!(ParityAccumulator::scan(&frame).is_valid());
    }

    #[test]
    fn test_ready_decoder_records_attach_first() {
        let (decoder, capture, _now) = ready_decoder(DecoderConfig::default());
        assert!(decoder.is_ready());
        assert_eq!(capture.activities(), vec![Activity::State(true)]);
    }

    #[test]
    fn test_send_bits_accumulates_in_order() {
        let config = DecoderConfig::new(ExpectedBits::Any, false);
        let (mut decoder, capture, mut now) = ready_decoder(config);
        send_bits(&mut decoder, &mut now, 0b1011, 4);
        assert_eq!(decoder.pending_bits(), 4);
        decoder.flush_now();
        assert_eq!(capture.data()[0].value(), 0b1011);
    }
}
