//! Async reader driver.
//!
//! This module runs a [`Decoder`] on its own Tokio task and connects it to
//! the rest of the application with two bounded channels, making the task
//! the single consumer the state machine requires.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  edge()   ┌──────────────┐          ┌──────────────┐
//! │ GPIO / IRQ   │──────────►│ edge channel │─────────►│ decode task  │
//! │ glue         │ try_edge()│ (mpsc)       │          │ owns Decoder │
//! └──────────────┘           └──────────────┘          │ + tick timer │
//!                                                      └──────┬───────┘
//!                            ┌──────────────┐                 │
//!          consumer ◄────────│ event channel│◄────────────────┘
//!                            │ (mpsc)       │   timestamped ReaderEvents
//!                            └──────────────┘
//! ```
//!
//! Edges are timestamped when submitted, not when processed, so frame
//! timing survives channel latency: the decode loop drains every queued
//! edge before it consults the wall clock, and timeout checks hold off
//! while stamped edges are still in flight. A backlog is replayed on the
//! submitted timeline instead of being split by late ticks. A full event
//! channel never stalls the decode loop: the event is dropped with a
//! warning instead.
//!
//! # Examples
//!
//! ```no_run
//! use gatewire_core::Pin;
//! use gatewire_driver::{DriverConfig, ReaderDriver, ReaderEvent};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), gatewire_driver::DriverError> {
//!     let driver = ReaderDriver::new(DriverConfig::default());
//!     let (handle, mut events) = driver.start();
//!
//!     // Interrupt glue calls this with each debounced level change.
//!     handle.edge(Pin::Data0, true).await?;
//!     handle.edge(Pin::Data1, true).await?;
//!
//!     while let Some(event) = events.recv().await {
//!         match event {
//!             ReaderEvent::Message { message, .. } => println!("badge {message}"),
//!             ReaderEvent::DecodeError { kind, .. } => eprintln!("rejected: {kind}"),
//!             ReaderEvent::Connection { connected, .. } => println!("attached: {connected}"),
//!         }
//!     }
//!     Ok(())
//! }
//! ```

use chrono::{DateTime, Utc};
use gatewire_core::{DataError, Decoder, DecoderConfig, Message, Pin};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Configuration for the reader driver.
///
/// # Example
///
/// ```
/// use gatewire_core::{DecoderConfig, ExpectedBits};
/// use gatewire_driver::DriverConfig;
///
/// let config = DriverConfig {
///     decoder: DecoderConfig::new(ExpectedBits::count(26).unwrap(), true),
///     ..DriverConfig::default()
/// };
/// assert_eq!(config.edge_buffer, 256);
/// ```
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Configuration handed to the owned decoder.
    pub decoder: DecoderConfig,

    /// Capacity of the inbound edge channel.
    ///
    /// Sized for bursts: a full 64-bit frame is 128 edges.
    pub edge_buffer: usize,

    /// Capacity of the outbound event channel.
    pub event_buffer: usize,

    /// How often the task checks the frame timeout.
    ///
    /// Must stay well under the decoder's frame timeout or auto-length
    /// frames close late.
    pub tick_interval: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            decoder: DecoderConfig::default(),
            edge_buffer: 256,
            event_buffer: 64,
            tick_interval: Duration::from_millis(5),
        }
    }
}

/// Errors from submitting edges to the decode task.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    /// The decode task has stopped and the edge channel is closed.
    #[error("Reader task is not running")]
    TaskStopped,

    /// The edge channel is full.
    #[error("Edge channel is full")]
    EdgeBacklog,
}

/// Timestamped output of the decode task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReaderEvent {
    /// A frame passed validation and decoded.
    Message {
        /// The decoded payload.
        message: Message,
        /// When the frame closed.
        at: DateTime<Utc>,
    },

    /// A frame failed classification or verification.
    DecodeError {
        /// Why the frame was rejected.
        kind: DataError,
        /// The raw accumulated frame.
        raw: Message,
        /// When the frame closed.
        at: DateTime<Utc>,
    },

    /// The reader attached or detached.
    Connection {
        /// `true` on attach, `false` on detach.
        connected: bool,
        /// When the transition was seen.
        at: DateTime<Utc>,
    },
}

/// One pin edge in flight between a handle and the decode task.
#[derive(Debug, Clone, Copy)]
struct PinEdge {
    pin: Pin,
    level: bool,
    at: Instant,
}

/// Microseconds from `epoch` to `at`; a regressed reading counts as zero.
fn micros_since(epoch: Instant, at: Instant) -> u64 {
    at.saturating_duration_since(epoch).as_micros() as u64
}

/// Cloneable submission side of the driver.
///
/// Every clone feeds the same decode task. Edges submitted through one
/// handle keep their order; edges from different handles interleave in
/// arrival order.
#[derive(Debug, Clone)]
pub struct ReaderHandle {
    edge_tx: mpsc::Sender<PinEdge>,
    epoch: Instant,
    submitted: Arc<AtomicU64>,
}

impl ReaderHandle {
    /// Submit a debounced level change, waiting for channel space.
    ///
    /// The edge is timestamped now, before any queueing.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::TaskStopped` if the decode task has exited.
    pub async fn edge(&self, pin: Pin, level: bool) -> Result<(), DriverError> {
        let edge = PinEdge {
            pin,
            level,
            at: Instant::now(),
        };
        // counted before the send: an edge parked on a full channel must
        // still hold the decode task's wall-clock ticks off
        self.note_submitted(edge.at);
        self.edge_tx
            .send(edge)
            .await
            .map_err(|_| DriverError::TaskStopped)
    }

    /// Submit a debounced level change without waiting.
    ///
    /// For contexts that cannot block, like interrupt bottom halves.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::EdgeBacklog` when the channel is full and
    /// `DriverError::TaskStopped` if the decode task has exited.
    pub fn try_edge(&self, pin: Pin, level: bool) -> Result<(), DriverError> {
        let edge = PinEdge {
            pin,
            level,
            at: Instant::now(),
        };
        match self.edge_tx.try_send(edge) {
            Ok(()) => {
                self.note_submitted(edge.at);
                Ok(())
            }
            // a rejected edge never arrives, so it must not count
            Err(TrySendError::Full(_)) => Err(DriverError::EdgeBacklog),
            Err(TrySendError::Closed(_)) => Err(DriverError::TaskStopped),
        }
    }

    /// Raise the shared high-water mark of stamped edges.
    fn note_submitted(&self, at: Instant) {
        self.submitted
            .fetch_max(micros_since(self.epoch, at), Ordering::Relaxed);
    }
}

/// Receiving side of the driver: the stream of decoded events.
pub struct ReaderEvents {
    event_rx: mpsc::Receiver<ReaderEvent>,
    task: JoinHandle<()>,
}

impl ReaderEvents {
    /// Receive the next event from the decode task.
    ///
    /// Returns `None` once the task has exited (every [`ReaderHandle`]
    /// dropped) and all pending events are drained.
    pub async fn recv(&mut self) -> Option<ReaderEvent> {
        self.event_rx.recv().await
    }

    /// Stop the decode task immediately and wait for it to finish.
    ///
    /// Without calling this, the task stops on its own when every
    /// [`ReaderHandle`] is dropped, flushing the pending frame first.
    pub async fn shutdown(self) {
        self.task.abort();
        match self.task.await {
            Ok(()) => {}
            Err(err) if err.is_cancelled() => {}
            Err(err) => warn!(error = %err, "Reader task ended abnormally"),
        }
    }
}

/// Owns the driver configuration until [`start`](ReaderDriver::start)
/// hands everything to the decode task.
///
/// # Example
///
/// ```no_run
/// use gatewire_driver::{DriverConfig, ReaderDriver};
///
/// # async fn example() {
/// let driver = ReaderDriver::new(DriverConfig::default());
/// let (handle, events) = driver.start();
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ReaderDriver {
    config: DriverConfig,
}

impl ReaderDriver {
    /// Create a driver with the given configuration.
    #[must_use]
    pub fn new(config: DriverConfig) -> Self {
        Self { config }
    }

    /// The configuration the decode task will run with.
    #[must_use]
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Spawn the decode task and return both ends of it.
    ///
    /// Must be called within a Tokio runtime.
    #[must_use]
    pub fn start(self) -> (ReaderHandle, ReaderEvents) {
        // channels and timers reject zero sizes
        let edge_buffer = self.config.edge_buffer.max(1);
        let event_buffer = self.config.event_buffer.max(1);

        let (edge_tx, edge_rx) = mpsc::channel(edge_buffer);
        let (event_tx, event_rx) = mpsc::channel(event_buffer);
        let epoch = Instant::now();
        let submitted = Arc::new(AtomicU64::new(0));
        let task = tokio::spawn(decode_task(
            self.config,
            epoch,
            Arc::clone(&submitted),
            edge_rx,
            event_tx,
        ));

        (
            ReaderHandle {
                edge_tx,
                epoch,
                submitted,
            },
            ReaderEvents { event_rx, task },
        )
    }
}

impl Default for ReaderDriver {
    fn default() -> Self {
        Self::new(DriverConfig::default())
    }
}

/// The decode loop: applies edges as they arrive and checks the frame
/// timeout only once every stamped edge has been seen.
async fn decode_task(
    config: DriverConfig,
    epoch: Instant,
    submitted: Arc<AtomicU64>,
    mut edge_rx: mpsc::Receiver<PinEdge>,
    event_tx: mpsc::Sender<ReaderEvent>,
) {
    let mut decoder = Decoder::new();
    install_handlers(&mut decoder, &event_tx);
    decoder.begin(config.decoder);

    let tick_interval = config.tick_interval.max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval(tick_interval);

    info!(
        tick_interval_ms = tick_interval.as_millis() as u64,
        expected_bits = %config.decoder.expected_bits,
        decode_messages = config.decoder.decode_messages,
        "Reader decode task started"
    );

    // newest stamp handed to the decoder, in micros since `epoch`
    let mut drained = 0u64;

    loop {
        tokio::select! {
            // queued edges take precedence over the ticker
            biased;

            maybe_edge = edge_rx.recv() => match maybe_edge {
                Some(edge) => {
                    trace!(pin = %edge.pin, level = edge.level, "Edge");
                    drained = drained.max(micros_since(epoch, edge.at));
                    decoder.set_pin_at(edge.pin, edge.level, edge.at);
                }
                None => break,
            },
            _ = ticker.tick() => {
                // the frame clock follows submission time: while stamped
                // edges are still in flight, wall-clock now would read
                // the backlog as line idleness
                if submitted.load(Ordering::Relaxed) <= drained {
                    decoder.tick();
                }
            }
        }
    }

    // deliver whatever the line left behind before exiting
    decoder.flush_now();
    info!("Reader decode task stopped");
}

/// Wire the decoder's handlers to the outbound event channel.
fn install_handlers(decoder: &mut Decoder, event_tx: &mpsc::Sender<ReaderEvent>) {
    let tx = event_tx.clone();
    decoder.on_data(move |message| {
        debug!(bits = message.bits(), payload = %message, "Frame decoded");
        forward(
            &tx,
            ReaderEvent::Message {
                message: *message,
                at: Utc::now(),
            },
        );
    });

    let tx = event_tx.clone();
    decoder.on_data_error(move |kind, raw| {
        debug!(kind = %kind, bits = raw.bits(), "Frame rejected");
        forward(
            &tx,
            ReaderEvent::DecodeError {
                kind,
                raw: *raw,
                at: Utc::now(),
            },
        );
    });

    let tx = event_tx.clone();
    decoder.on_state_change(move |connected| {
        info!(connected, "Reader connection changed");
        forward(
            &tx,
            ReaderEvent::Connection {
                connected,
                at: Utc::now(),
            },
        );
    });
}

/// Push an event without ever blocking the decode loop. A full channel
/// drops the event with a warning; a closed one means the consumer is
/// gone and the event is discarded quietly.
fn forward(tx: &mpsc::Sender<ReaderEvent>, event: ReaderEvent) {
    match tx.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(event)) => {
            warn!(?event, "Event channel full, dropping event");
        }
        Err(TrySendError::Closed(_)) => {}
    }
}
