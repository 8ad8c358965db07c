//! Reader emulation for the gatewire decoder stack.
//!
//! This crate builds the wire frames a real reader would transmit and
//! replays scripted edge timelines into a decoder, for tests, benches
//! and development without hardware.

pub mod encoder;
pub mod reader;

pub use encoder::EncodeError;
pub use reader::{ReaderSimulator, TimedEdge};
