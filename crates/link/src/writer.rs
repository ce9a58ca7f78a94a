//! Producer handles onto the outbound queue.

use std::io;
use std::sync::Arc;

use camctl_protocol::{FrameType, encode_frames};

use crate::outbound::Outbound;

/// Encodes payloads as frames and queues them for the client.
///
/// Cheap to clone; any thread may send. Each frame is pushed under one
/// lock acquisition, so frames from concurrent producers never interleave
/// inside a frame.
#[derive(Debug, Clone)]
pub struct FrameWriter {
    outbound: Arc<Outbound>,
}

impl FrameWriter {
    pub(crate) fn new(outbound: Arc<Outbound>) -> Self {
        Self { outbound }
    }

    /// Queues `payload` as one or more frames of `frame_type`.
    ///
    /// Never blocks on the network. If the queue overflows the oldest
    /// bytes are lost.
    pub fn send(&self, frame_type: FrameType, payload: &[u8]) {
        for frame in encode_frames(frame_type.as_u8(), payload) {
            self.outbound.push(&frame);
        }
    }

    /// Serializes `value` as JSON and queues it as a `Telemetry` frame.
    pub fn send_json<T: serde::Serialize>(&self, value: &T) -> Result<(), serde_json::Error> {
        let bytes = serde_json::to_vec(value)?;
        self.send(FrameType::Telemetry, &bytes);
        Ok(())
    }

    /// Whether a client is currently attached.
    pub fn is_client_connected(&self) -> bool {
        self.outbound.is_connected()
    }
}

/// `io::Write` adapter that turns every write into `Log` frames.
///
/// Installed as a `tracing-subscriber` writer so formatted log lines
/// stream to the client. It must not log itself.
#[derive(Debug, Clone)]
pub struct LogSink {
    writer: FrameWriter,
}

impl LogSink {
    pub(crate) fn new(writer: FrameWriter) -> Self {
        Self { writer }
    }
}

impl io::Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.send(FrameType::Log, buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use camctl_protocol::FrameDecoder;

    use super::*;

    fn drain(outbound: &Outbound) -> Vec<u8> {
        outbound.set_connected(true);
        let mut out = Vec::new();
        while outbound.pending() > 0 {
            let mut buf = [0u8; 64];
            let n = outbound.wait_pop(&mut buf).unwrap();
            out.extend_from_slice(&buf[..n]);
        }
        out
    }

    #[test]
    fn send_queues_encoded_frame() {
        let outbound = Arc::new(Outbound::new(256));
        let writer = FrameWriter::new(Arc::clone(&outbound));
        writer.send(FrameType::Telemetry, b"{}");

        assert_eq!(drain(&outbound), vec![0x54, 0xF0, 3, 2, 0, b'{', b'}']);
    }

    #[test]
    fn log_sink_emits_log_frames() {
        let outbound = Arc::new(Outbound::new(256));
        let mut sink = LogSink::new(FrameWriter::new(Arc::clone(&outbound)));
        write!(sink, "camera connected").unwrap();
        sink.flush().unwrap();

        let mut frames = Vec::new();
        FrameDecoder::new().decode(&drain(&outbound), |f| frames.push(f));
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].frame_type(), Ok(FrameType::Log));
        assert_eq!(frames[0].payload, b"camera connected");
    }

    #[test]
    fn send_json_uses_telemetry_type() {
        let outbound = Arc::new(Outbound::new(256));
        let writer = FrameWriter::new(Arc::clone(&outbound));
        writer
            .send_json(&serde_json::json!({ "uptimeSecs": 3 }))
            .unwrap();

        let mut frames = Vec::new();
        FrameDecoder::new().decode(&drain(&outbound), |f| frames.push(f));
        assert_eq!(frames[0].msg_type, FrameType::Telemetry.as_u8());
        assert_eq!(frames[0].payload, br#"{"uptimeSecs":3}"#);
    }

    #[test]
    fn empty_payload_sends_nothing() {
        let outbound = Arc::new(Outbound::new(16));
        FrameWriter::new(Arc::clone(&outbound)).send(FrameType::File, b"");
        assert_eq!(outbound.pending(), 0);
    }
}
