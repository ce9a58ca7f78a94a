//! Outbound byte queue shared by producers and the sender thread.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::ring::RingBuffer;

#[derive(Debug)]
struct State {
    ring: RingBuffer,
    connected: bool,
    closed: bool,
}

/// Ring buffer plus the condition the sender thread sleeps on.
///
/// Producers push complete frames; the sender wakes only when a client is
/// connected and bytes are pending. Bytes queued while disconnected stay
/// in the ring, bounded by its capacity.
#[derive(Debug)]
pub struct Outbound {
    state: Mutex<State>,
    ready: Condvar,
}

impl Outbound {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(State {
                ring: RingBuffer::new(capacity),
                connected: false,
                closed: false,
            }),
            ready: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues `bytes` and wakes the sender.
    pub fn push(&self, bytes: &[u8]) {
        self.lock().ring.put(bytes);
        self.ready.notify_all();
    }

    pub fn set_connected(&self, connected: bool) {
        self.lock().connected = connected;
        self.ready.notify_all();
    }

    pub fn is_connected(&self) -> bool {
        self.lock().connected
    }

    /// Number of bytes waiting to be sent.
    pub fn pending(&self) -> usize {
        self.lock().ring.len()
    }

    /// Blocks until a client is connected and bytes are pending, then
    /// moves up to `out.len()` bytes into `out`.
    ///
    /// Returns `None` once the queue has been closed.
    pub fn wait_pop(&self, out: &mut [u8]) -> Option<usize> {
        let mut state = self
            .ready
            .wait_while(self.lock(), |s| {
                !s.closed && !(s.connected && !s.ring.is_empty())
            })
            .unwrap_or_else(PoisonError::into_inner);

        if state.closed {
            return None;
        }
        Some(state.ring.read(out))
    }

    /// Wakes the sender for shutdown; subsequent `wait_pop` calls return `None`.
    pub fn close(&self) {
        self.lock().closed = true;
        self.ready.notify_all();
    }
}
