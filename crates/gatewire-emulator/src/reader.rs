//! Deterministic reader timelines.
//!
//! A [`ReaderSimulator`] scripts what a physical reader does to the two
//! data lines: attach, idle, pulse out frames, detach. The script is a
//! list of [`TimedEdge`]s with offsets from the start of the replay, so
//! the same timeline can be replayed at any base instant and always
//! produces the same decode.
//!
//! Replaying only feeds pin edges; the decoder's timeout still needs a
//! tick after the final frame, which is why [`replay`](ReaderSimulator::replay)
//! returns the end instant.
//!
//! # Examples
//!
//! ```
//! use gatewire_core::{Decoder, DecoderConfig};
//! use gatewire_emulator::{ReaderSimulator, encoder};
//! use std::time::{Duration, Instant};
//!
//! let frame = encoder::standard26_parts(0x10, 0x2044);
//! let sim = ReaderSimulator::new()
//!     .attach()
//!     .idle(Duration::from_millis(50))
//!     .frame(&frame);
//!
//! let start = Instant::now();
//! let mut decoder = Decoder::new();
//! decoder.begin_at(DecoderConfig::default(), start);
//! let end = sim.replay(&mut decoder, start);
//! decoder.tick_at(end + Duration::from_millis(50));
//! ```

use gatewire_core::constants::{PULSE_PERIOD_MICROS, PULSE_WIDTH_MICROS};
use gatewire_core::{Decoder, Message, Pin};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// One scheduled level change on a data line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedEdge {
    /// Offset from the start of the replay.
    pub offset: Duration,

    /// Which data line changes.
    pub pin: Pin,

    /// The level the line settles at.
    pub level: bool,
}

/// Scripted reader: builds a timed edge timeline and replays it into a
/// decoder.
///
/// Pulses assume idle-high lines, so a timeline normally starts with
/// [`attach`](ReaderSimulator::attach) followed by enough
/// [`idle`](ReaderSimulator::idle) for the decoder to settle.
#[derive(Debug, Clone)]
pub struct ReaderSimulator {
    pulse_width: Duration,
    pulse_period: Duration,
    edges: Vec<TimedEdge>,
    cursor: Duration,
    levels: [bool; 2],
}

impl ReaderSimulator {
    /// Create a simulator with the nominal pulse timing (50 microsecond
    /// pulses every 2 milliseconds).
    #[must_use]
    pub fn new() -> Self {
        Self {
            pulse_width: Duration::from_micros(PULSE_WIDTH_MICROS),
            pulse_period: Duration::from_micros(PULSE_PERIOD_MICROS),
            edges: Vec::new(),
            cursor: Duration::ZERO,
            levels: [false; 2],
        }
    }

    /// Set how long each pulse holds the line low.
    #[must_use]
    pub fn with_pulse_width(mut self, width: Duration) -> Self {
        self.pulse_width = width;
        self
    }

    /// Set the spacing between consecutive pulses.
    #[must_use]
    pub fn with_pulse_period(mut self, period: Duration) -> Self {
        self.pulse_period = period;
        self
    }

    /// Raise both lines. Lines already high stay untouched.
    #[must_use]
    pub fn attach(mut self) -> Self {
        for pin in [Pin::Data0, Pin::Data1] {
            if !self.levels[pin.index()] {
                self.push_edge(pin, true);
            }
        }
        self
    }

    /// Drop both lines. Lines already low stay untouched.
    #[must_use]
    pub fn detach(mut self) -> Self {
        for pin in [Pin::Data0, Pin::Data1] {
            if self.levels[pin.index()] {
                self.push_edge(pin, false);
            }
        }
        self
    }

    /// Let the line rest for `duration` without any edges.
    #[must_use]
    pub fn idle(mut self, duration: Duration) -> Self {
        self.cursor += duration;
        self
    }

    /// Pulse a single bit on the line that carries it.
    #[must_use]
    pub fn bit(mut self, bit: bool) -> Self {
        self.push_pulse(Pin::for_bit(bit));
        self
    }

    /// Pulse out a whole frame in transmission order.
    #[must_use]
    pub fn frame(mut self, message: &Message) -> Self {
        for i in 0..message.bits() {
            self.push_pulse(Pin::for_bit(message.bit(i)));
        }
        self
    }

    /// The scripted edges so far.
    #[must_use]
    pub fn edges(&self) -> &[TimedEdge] {
        &self.edges
    }

    /// Total scripted time, including the rest after the last pulse.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.cursor
    }

    /// Replay the timeline into a decoder with `start` as offset zero.
    ///
    /// Returns the instant at the end of the script so the caller can
    /// tick the decoder past its frame timeout.
    pub fn replay(&self, decoder: &mut Decoder, start: Instant) -> Instant {
        for edge in &self.edges {
            decoder.set_pin_at(edge.pin, edge.level, start + edge.offset);
        }
        start + self.cursor
    }

    /// [`replay`](ReaderSimulator::replay) starting at the current instant.
    pub fn replay_now(&self, decoder: &mut Decoder) -> Instant {
        self.replay(decoder, Instant::now())
    }

    fn push_edge(&mut self, pin: Pin, level: bool) {
        self.edges.push(TimedEdge {
            offset: self.cursor,
            pin,
            level,
        });
        self.levels[pin.index()] = level;
    }

    fn push_pulse(&mut self, pin: Pin) {
        let period = self.pulse_period;
        let width = self.pulse_width;
        self.push_edge(pin, false);
        self.cursor += width;
        self.push_edge(pin, true);
        self.cursor += period.saturating_sub(width);
    }
}

impl Default for ReaderSimulator {
    fn default() -> Self {
        Self::new()
    }
}
