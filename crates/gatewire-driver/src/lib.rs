//! Async driver for Wiegand readers
//!
//! This crate runs a `gatewire-core` decoder on a dedicated Tokio task and
//! exposes it through channels: pin edges go in through a cloneable handle,
//! timestamped events come out the other side. The task owns the decoder
//! and its tick timer, so callers never touch the state machine directly.
//!
//! # Components
//!
//! - **ReaderDriver**: builds the task from a [`DriverConfig`]
//! - **ReaderHandle**: submission side, safe to clone into interrupt glue
//! - **ReaderEvents**: stream of [`ReaderEvent`]s plus task shutdown
//!
//! # Example
//!
//! ```no_run
//! use gatewire_core::Pin;
//! use gatewire_driver::{DriverConfig, ReaderDriver, ReaderEvent};
//!
//! # async fn example() -> Result<(), gatewire_driver::DriverError> {
//! let (handle, mut events) = ReaderDriver::new(DriverConfig::default()).start();
//!
//! handle.edge(Pin::Data0, false).await?;
//! handle.edge(Pin::Data0, true).await?;
//!
//! if let Some(ReaderEvent::Message { message, at }) = events.recv().await {
//!     println!("{at}: decoded {message}");
//! }
//! # Ok(())
//! # }
//! ```

mod driver;

pub use driver::{
    DriverConfig, DriverError, ReaderDriver, ReaderEvent, ReaderEvents, ReaderHandle,
};
