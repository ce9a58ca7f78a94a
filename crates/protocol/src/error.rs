//! Error types for framing and telecommand decoding.

/// Errors produced while interpreting frames.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("unknown frame type: {0}")]
    UnknownFrameType(u8),

    #[error("payload too large: {0} bytes (max 65535)")]
    PayloadTooLarge(usize),
}

/// Errors produced while decoding a telecommand payload.
///
/// Any of these means the frame is dropped; the dispatcher never sees a
/// partially populated command.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing or invalid cmd_id")]
    MissingId,

    #[error("unrecognized command: {0}")]
    UnknownCommand(u64),
}
