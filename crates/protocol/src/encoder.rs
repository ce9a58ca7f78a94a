//! Frame encoder.
//!
//! Logical payloads longer than [`MAX_PAYLOAD_LEN`] are fragmented into
//! several frames of the same type; byte order is preserved across the
//! fragments.

use crate::constants::{HEADER_LEN, MAGIC1, MAGIC2, MAX_PAYLOAD_LEN};

/// Appends one frame carrying `chunk` to `out`.
///
/// `chunk` must not exceed [`MAX_PAYLOAD_LEN`]; callers fragment first.
pub fn encode_frame(msg_type: u8, chunk: &[u8], out: &mut Vec<u8>) {
    debug_assert!(chunk.len() <= MAX_PAYLOAD_LEN);
    let len = (chunk.len() as u16).to_le_bytes();

    out.reserve(HEADER_LEN + chunk.len());
    out.extend_from_slice(&[MAGIC1, MAGIC2, msg_type, len[0], len[1]]);
    out.extend_from_slice(chunk);
}

/// Splits `payload` into encoded frames of at most 65535 payload bytes.
///
/// An empty payload produces no frames.
pub fn encode_frames(msg_type: u8, payload: &[u8]) -> FrameChunks<'_> {
    FrameChunks {
        msg_type,
        chunks: payload.chunks(MAX_PAYLOAD_LEN),
    }
}

/// Iterator over the encoded frames of one logical payload.
#[derive(Debug, Clone)]
pub struct FrameChunks<'a> {
    msg_type: u8,
    chunks: std::slice::Chunks<'a, u8>,
}

impl Iterator for FrameChunks<'_> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk = self.chunks.next()?;
        let mut frame = Vec::with_capacity(HEADER_LEN + chunk.len());
        encode_frame(self.msg_type, chunk, &mut frame);
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FrameType;

    #[test]
    fn header_layout() {
        let frames: Vec<Vec<u8>> = encode_frames(FrameType::Log.as_u8(), b"hi").collect();
        assert_eq!(frames, vec![vec![0x54, 0xF0, 1, 2, 0, b'h', b'i']]);
    }

    #[test]
    fn empty_payload_produces_nothing() {
        assert_eq!(encode_frames(1, b"").count(), 0);
    }

    #[test]
    fn exact_maximum_fits_one_frame() {
        let payload = vec![7u8; MAX_PAYLOAD_LEN];
        let frames: Vec<Vec<u8>> = encode_frames(3, &payload).collect();
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][3..5], &[0xFF, 0xFF]);
    }

    #[test]
    fn oversize_payload_is_fragmented_in_order() {
        let payload: Vec<u8> = (0..MAX_PAYLOAD_LEN + 10).map(|i| (i % 256) as u8).collect();
        let frames: Vec<Vec<u8>> = encode_frames(4, &payload).collect();

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].len(), HEADER_LEN + MAX_PAYLOAD_LEN);
        assert_eq!(&frames[1][..5], &[MAGIC1, MAGIC2, 4, 10, 0]);

        let rebuilt: Vec<u8> = frames
            .iter()
            .flat_map(|f| f[HEADER_LEN..].iter().copied())
            .collect();
        assert_eq!(rebuilt, payload);
    }
}
