//! Wire protocol for the camctl controller link.
//!
//! Every unit exchanged over the TCP connection is a [`Frame`]:
//!
//! ```text
//! [MAGIC1=0x54][MAGIC2=0xF0][TYPE:1][LEN:u16 LE][PAYLOAD:LEN bytes]
//! ```
//!
//! Telecommand frames carry a UTF-8 JSON object decoded into a
//! [`Command`]; telemetry frames carry a JSON [`StatusReport`]; log
//! frames carry plain text.

pub mod commands;
pub mod constants;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod frame;
pub mod telemetry;

// Re-export primary types for convenience.
pub use commands::{Command, IntervalometerSetup, SequencerSetup};
pub use constants::{DEFAULT_PORT, HEADER_LEN, MAGIC1, MAGIC2, MAX_FRAME_LEN, MAX_PAYLOAD_LEN};
pub use decoder::FrameDecoder;
pub use encoder::{FrameChunks, encode_frame, encode_frames};
pub use error::{CommandError, ProtocolError};
pub use frame::{Frame, FrameType};
pub use telemetry::{FunctionKind, FunctionReport, LifecycleState, StatusReport, TimingStats};
