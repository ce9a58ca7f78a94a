use crate::error::ProtocolError;

/// Frame type identifiers carried in the third header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameType {
    Log = 1,
    Telecommand = 2,
    Telemetry = 3,
    File = 4,
}

impl FrameType {
    /// Wire value of this type.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for FrameType {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(FrameType::Log),
            2 => Ok(FrameType::Telecommand),
            3 => Ok(FrameType::Telemetry),
            4 => Ok(FrameType::File),
            other => Err(ProtocolError::UnknownFrameType(other)),
        }
    }
}

impl From<FrameType> for u8 {
    fn from(value: FrameType) -> Self {
        value.as_u8()
    }
}

/// One complete, decoded frame.
///
/// The type is kept as the raw byte so frames of types this build does
/// not know about can still be observed by a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub msg_type: u8,
    pub payload: Vec<u8>,
}

impl Frame {
    /// Creates a frame, rejecting payloads that do not fit the length field.
    pub fn new(msg_type: u8, payload: Vec<u8>) -> Result<Self, ProtocolError> {
        if payload.len() > crate::MAX_PAYLOAD_LEN {
            return Err(ProtocolError::PayloadTooLarge(payload.len()));
        }
        Ok(Self { msg_type, payload })
    }

    /// Declared payload length.
    pub fn length(&self) -> u16 {
        // Construction paths bound the payload to u16::MAX.
        self.payload.len() as u16
    }

    /// Typed view of the frame type, if known.
    pub fn frame_type(&self) -> Result<FrameType, ProtocolError> {
        FrameType::try_from(self.msg_type)
    }
}
