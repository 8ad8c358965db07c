pub mod constants;
pub mod decoder;
pub mod error;
pub mod format;
pub mod frame;
pub mod parity;
pub mod types;

pub use decoder::{DataErrorHandler, DataHandler, Decoder, StateChangeHandler};
pub use error::{DataError, Error, Result};
pub use format::{WiegandFormat, decode_frame};
pub use frame::{FrameBuffer, Message};
pub use parity::ParityAccumulator;
pub use types::{DecoderConfig, ExpectedBits, ParityMode, Pin};

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
