//! The Wiegand decoder state machine.
//!
//! [`Decoder`] is sans-IO: it owns no pins, no interrupts and no clock. The
//! embedding integration feeds it debounced pin-level transitions and
//! monotonic clock readings; it answers through three replaceable handlers.
//!
//! # Lifecycle
//!
//! ```text
//!                begin()                  both lines high
//!  Unconfigured ────────► Initialized ◄──────────────────► Connected
//!                              │                               │
//!                              │ pulses while connected        │
//!                              ▼                               │
//!                        FrameBuffer ── close ──► handlers ◄───┘
//!                                      (length reached, idle
//!                                       timeout, flush_now)
//! ```
//!
//! Frames close three ways: the configured bit count is reached, the line
//! idles past the frame timeout, or [`flush_now`](Decoder::flush_now) is
//! called. Closing classifies the frame and dispatches exactly one handler
//! call (or none: empty and uninitialized frames are discarded silently).
//!
//! # Clocking
//!
//! Every operation that consults time has an `*_at` twin taking an explicit
//! [`Instant`], for testing or replaying recorded edge streams. The plain
//! forms read [`Instant::now`]. Readings must be monotone; a regressed
//! reading counts as zero elapsed time.
//!
//! # Example
//!
//! ```
//! use gatewire_core::{Decoder, DecoderConfig, Pin};
//!
//! let mut decoder = Decoder::new();
//! decoder.on_data(|message| println!("received {message}"));
//! decoder.on_state_change(|connected| println!("reader connected: {connected}"));
//! decoder.begin(DecoderConfig::default());
//!
//! // Reader attaches: both lines rise.
//! decoder.set_pin(Pin::Data0, true);
//! decoder.set_pin(Pin::Data1, true);
//! assert!(decoder.is_ready());
//!
//! // ...pin edges and periodic ticks follow...
//! ```

use crate::error::DataError;
use crate::format;
use crate::frame::{FrameBuffer, Message};
use crate::parity::ParityAccumulator;
use crate::types::{DecoderConfig, ExpectedBits, Pin};
use std::fmt;
use std::time::Instant;

/// Handler invoked with each decoded message.
pub type DataHandler = Box<dyn FnMut(&Message) + Send>;
/// Handler invoked with each classified decode failure and the raw frame.
pub type DataErrorHandler = Box<dyn FnMut(DataError, &Message) + Send>;
/// Handler invoked when the reader attaches (`true`) or detaches (`false`).
pub type StateChangeHandler = Box<dyn FnMut(bool) + Send>;

/// Sans-IO decoder for the two-wire Wiegand reader interface.
///
/// One instance serves one reader head. The decoder is a single-owner state
/// machine (every operation takes `&mut self`); when pin edges and ticks
/// originate from different contexts, funnel them through a single consumer
/// first.
pub struct Decoder {
    config: DecoderConfig,
    initialized: bool,
    connected: bool,
    levels: [bool; 2],
    transmission_error: bool,
    overflow: bool,
    frame: FrameBuffer,
    parity: ParityAccumulator,
    last_event: Instant,
    on_data: Option<DataHandler>,
    on_data_error: Option<DataErrorHandler>,
    on_state_change: Option<StateChangeHandler>,
}

impl Decoder {
    /// Create an unconfigured decoder.
    ///
    /// Nothing is delivered until [`begin`](Decoder::begin) runs, but
    /// connection tracking is live immediately: a reader attaching before
    /// `begin` still fires the state-change handler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: DecoderConfig::default(),
            initialized: false,
            connected: false,
            levels: [false; 2],
            transmission_error: false,
            overflow: false,
            frame: FrameBuffer::new(),
            parity: ParityAccumulator::new(),
            last_event: Instant::now(),
            on_data: None,
            on_data_error: None,
            on_state_change: None,
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Start (or restart) decoding with the given configuration.
    pub fn begin(&mut self, config: DecoderConfig) {
        self.begin_at(config, Instant::now());
    }

    /// [`begin`](Decoder::begin) with an explicit clock reading.
    pub fn begin_at(&mut self, config: DecoderConfig, now: Instant) {
        self.config = config;
        self.initialized = true;
        self.frame.clear();
        self.parity.reset();
        self.overflow = false;
        // the line cannot be assumed frame-aligned until it has idled once
        self.transmission_error = true;
        self.last_event = now;
    }

    /// Stop decoding and discard in-progress state without invoking any
    /// handler. Connection tracking stays live.
    pub fn end(&mut self) {
        self.initialized = false;
        self.frame.clear();
        self.parity.reset();
        self.overflow = false;
        self.transmission_error = false;
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// Returns `true` between [`begin`](Decoder::begin) and
    /// [`end`](Decoder::end).
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Returns `true` while a reader is attached.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Returns `true` when initialized and a reader is attached.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.initialized && self.connected
    }

    /// Bits accumulated in the pending frame.
    #[must_use]
    pub fn pending_bits(&self) -> u8 {
        self.frame.len()
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Handler registration
    // ------------------------------------------------------------------

    /// Register the data handler. Replaces any previous one.
    pub fn on_data(&mut self, handler: impl FnMut(&Message) + Send + 'static) {
        self.on_data = Some(Box::new(handler));
    }

    /// Register the data-error handler. Replaces any previous one.
    pub fn on_data_error(&mut self, handler: impl FnMut(DataError, &Message) + Send + 'static) {
        self.on_data_error = Some(Box::new(handler));
    }

    /// Register the state-change handler. Replaces any previous one.
    pub fn on_state_change(&mut self, handler: impl FnMut(bool) + Send + 'static) {
        self.on_state_change = Some(Box::new(handler));
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    /// Notify the decoder of a debounced level change on a data line.
    pub fn set_pin(&mut self, pin: Pin, level: bool) {
        self.set_pin_at(pin, level, Instant::now());
    }

    /// [`set_pin`](Decoder::set_pin) with an explicit clock reading.
    pub fn set_pin_at(&mut self, pin: Pin, level: bool, now: Instant) {
        // a stale frame must close before this edge can touch it
        self.tick_at(now);

        if self.levels[pin.index()] == level {
            return;
        }
        self.last_event = now;
        self.levels[pin.index()] = level;

        match (self.levels[0], self.levels[1]) {
            (true, true) => {
                if self.connected {
                    // a completed pulse on one line carries one bit
                    self.record_bit(pin.bit());
                } else {
                    self.connected = true;
                    self.overflow = false;
                    // an attach is never frame-aligned
                    self.transmission_error = true;
                    self.notify_state(true);
                }
            }
            (false, false) => {
                if self.connected {
                    self.transmission_error = true;
                    // a truncated frame surfaces before the detach does
                    self.close_frame();
                    self.connected = false;
                    self.notify_state(false);
                }
            }
            _ => {}
        }
    }

    /// Notify a level change on D0.
    pub fn set_data0(&mut self, level: bool) {
        self.set_pin(Pin::Data0, level);
    }

    /// Notify a level change on D1.
    pub fn set_data1(&mut self, level: bool) {
        self.set_pin(Pin::Data1, level);
    }

    /// Close the pending frame if the line has idled past the frame
    /// timeout. Call this periodically; auto-length frames are only
    /// delivered from here.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// [`tick`](Decoder::tick) with an explicit clock reading.
    pub fn tick_at(&mut self, now: Instant) {
        if now.saturating_duration_since(self.last_event) > self.config.frame_timeout {
            self.close_frame();
        }
    }

    /// Close the pending frame immediately, regardless of the timeout.
    pub fn flush_now(&mut self) {
        self.close_frame();
    }

    // ------------------------------------------------------------------
    // Frame machinery
    // ------------------------------------------------------------------

    fn record_bit(&mut self, bit: bool) {
        if self.frame.push(bit) {
            if self.config.decode_messages {
                self.parity.observe(&self.frame);
            }
        } else {
            self.overflow = true;
        }
        if let ExpectedBits::Count(n) = self.config.expected_bits {
            if self.frame.len() == n {
                self.close_frame();
            }
        }
    }

    fn close_frame(&mut self) {
        self.flush_data();
        self.reset_frame();
    }

    /// Classify the pending frame and dispatch at most one handler call.
    fn flush_data(&mut self) {
        if self.frame.is_empty() || !self.initialized {
            return;
        }
        if self.overflow {
            self.notify_error(DataError::SizeTooBig);
            return;
        }
        if self.transmission_error {
            self.notify_error(DataError::Communication);
            return;
        }
        if !self.config.expected_bits.matches(self.frame.len()) {
            self.notify_error(DataError::SizeUnexpected);
            return;
        }
        if !self.config.decode_messages {
            let message = self.frame.to_message();
            self.notify_data(&message);
            return;
        }
        match format::decode_frame(&self.frame, self.parity, self.config.parity_mode) {
            Ok(message) => self.notify_data(&message),
            Err(kind) => self.notify_error(kind),
        }
    }

    fn reset_frame(&mut self) {
        self.frame.clear();
        self.parity.reset();
        self.overflow = false;
        // the next frame must start from an idle-high line
        self.transmission_error = !(self.levels[0] && self.levels[1]);
    }

    fn notify_data(&mut self, message: &Message) {
        if let Some(handler) = self.on_data.as_mut() {
            handler(message);
        }
    }

    fn notify_error(&mut self, kind: DataError) {
        let raw = self.frame.to_message();
        if let Some(handler) = self.on_data_error.as_mut() {
            handler(kind, &raw);
        }
    }

    fn notify_state(&mut self, connected: bool) {
        if let Some(handler) = self.on_state_change.as_mut() {
            handler(connected);
        }
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Decoder")
            .field("config", &self.config)
            .field("initialized", &self.initialized)
            .field("connected", &self.connected)
            .field("levels", &self.levels)
            .field("pending_bits", &self.frame.len())
            .finish_non_exhaustive()
    }
}
