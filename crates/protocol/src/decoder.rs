//! Incremental frame decoder.
//!
//! The decoder is fed arbitrary chunks of the inbound byte stream and
//! hands every complete frame to a callback. It resynchronizes on the
//! magic pair, so garbage between frames is skipped silently.

use crate::constants::{MAGIC1, MAGIC2};
use crate::frame::Frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    WaitMagic1,
    WaitMagic2,
    WaitType,
    WaitLenLow,
    WaitLenHigh,
    ReceivingPayload,
}

/// Byte-stream state machine producing [`Frame`]s.
///
/// One decoder processes frames strictly sequentially. Scanning never
/// backtracks: each state consumes exactly the bytes it needs and moves
/// on, payload bytes are copied in bulk across chunk boundaries.
#[derive(Debug)]
pub struct FrameDecoder {
    state: State,
    msg_type: u8,
    len_low: u8,
    expected: usize,
    payload: Vec<u8>,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            state: State::WaitMagic1,
            msg_type: 0,
            len_low: 0,
            expected: 0,
            payload: Vec::new(),
        }
    }

    /// Feeds one chunk, invoking `on_frame` for every frame it completes.
    pub fn decode<F>(&mut self, chunk: &[u8], mut on_frame: F)
    where
        F: FnMut(Frame),
    {
        let mut i = 0;
        while i < chunk.len() {
            match self.state {
                State::WaitMagic1 => {
                    if chunk[i] == MAGIC1 {
                        self.state = State::WaitMagic2;
                    }
                    i += 1;
                }
                State::WaitMagic2 => {
                    // A mismatch is not re-inspected as a potential MAGIC1.
                    self.state = if chunk[i] == MAGIC2 {
                        State::WaitType
                    } else {
                        State::WaitMagic1
                    };
                    i += 1;
                }
                State::WaitType => {
                    self.msg_type = chunk[i];
                    self.state = State::WaitLenLow;
                    i += 1;
                }
                State::WaitLenLow => {
                    self.len_low = chunk[i];
                    self.state = State::WaitLenHigh;
                    i += 1;
                }
                State::WaitLenHigh => {
                    let len = u16::from_le_bytes([self.len_low, chunk[i]]) as usize;
                    i += 1;

                    // A new header always replaces whatever was in flight.
                    self.expected = len;
                    self.payload = Vec::with_capacity(len);

                    if len == 0 {
                        self.dispatch(&mut on_frame);
                    } else {
                        self.state = State::ReceivingPayload;
                    }
                }
                State::ReceivingPayload => {
                    let wanted = self.expected - self.payload.len();
                    let take = wanted.min(chunk.len() - i);
                    self.payload.extend_from_slice(&chunk[i..i + take]);
                    i += take;

                    if self.payload.len() == self.expected {
                        self.dispatch(&mut on_frame);
                    }
                }
            }
        }
    }

    /// Drops any partial frame and waits for the next magic pair.
    pub fn reset(&mut self) {
        self.state = State::WaitMagic1;
        self.expected = 0;
        self.payload = Vec::new();
    }

    /// Returns `true` when no frame is partially received.
    pub fn is_idle(&self) -> bool {
        self.state == State::WaitMagic1
    }

    fn dispatch<F>(&mut self, on_frame: &mut F)
    where
        F: FnMut(Frame),
    {
        let payload = std::mem::take(&mut self.payload);
        self.state = State::WaitMagic1;
        self.expected = 0;
        on_frame(Frame {
            msg_type: self.msg_type,
            payload,
        });
    }
}
