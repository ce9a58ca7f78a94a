/// Fixed-capacity byte ring with overwrite-on-overflow semantics.
///
/// Backed by a fixed arena and a `(head, tail)` cursor pair; `empty`
/// disambiguates `head == tail` (full vs empty). When a write does not
/// fit, the oldest unread bytes are dropped. The buffer is a best-effort
/// telemetry/log channel, not a reliable queue.
#[derive(Debug)]
pub struct RingBuffer {
    buf: Box<[u8]>,
    head: usize,
    tail: usize,
    empty: bool,
}

impl RingBuffer {
    /// Creates an empty ring buffer holding at most `capacity` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RingBuffer capacity must be > 0");
        Self {
            buf: vec![0u8; capacity].into_boxed_slice(),
            head: 0,
            tail: 0,
            empty: true,
        }
    }

    /// Appends `data`, never blocking or failing.
    ///
    /// Input longer than the capacity is truncated to its last
    /// `capacity` bytes. If the write exceeds the free space, the oldest
    /// unread bytes are overwritten.
    pub fn put(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }

        let cap = self.buf.len();
        let data = if data.len() > cap {
            &data[data.len() - cap..]
        } else {
            data
        };
        let len = data.len();
        let free = cap - self.len();

        // Head to end of arena, then wrap to the start.
        let first = len.min(cap - self.head);
        self.buf[self.head..self.head + first].copy_from_slice(&data[..first]);
        self.buf[..len - first].copy_from_slice(&data[first..]);

        self.head = (self.head + len) % cap;
        if len > free {
            // Overflow: the oldest surviving byte sits right after the newest.
            self.tail = self.head;
        }
        self.empty = false;
    }

    /// Removes up to `out.len()` bytes into `out`, returning the count.
    pub fn read(&mut self, out: &mut [u8]) -> usize {
        let available = self.len();
        let n = out.len().min(available);
        if n == 0 {
            return 0;
        }

        let cap = self.buf.len();
        let first = n.min(cap - self.tail);
        out[..first].copy_from_slice(&self.buf[self.tail..self.tail + first]);
        out[first..n].copy_from_slice(&self.buf[..n - first]);

        self.tail = (self.tail + n) % cap;
        if n == available {
            self.empty = true;
        }
        n
    }

    /// Removes and returns up to `max_len` bytes (empty when nothing is buffered).
    pub fn get(&mut self, max_len: usize) -> Vec<u8> {
        let mut out = vec![0u8; max_len.min(self.len())];
        let n = self.read(&mut out);
        out.truncate(n);
        out
    }

    /// Number of unread bytes.
    pub fn len(&self) -> usize {
        if self.empty {
            0
        } else if self.head > self.tail {
            self.head - self.tail
        } else {
            self.head + self.buf.len() - self.tail
        }
    }

    /// Whether no unread bytes remain.
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// Maximum number of bytes the buffer can hold.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Drops all unread bytes.
    pub fn clear(&mut self) {
        self.tail = self.head;
        self.empty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_under_capacity() {
        let mut rb = RingBuffer::new(8);
        rb.put(&[1, 2, 3]);

        assert_eq!(rb.len(), 3);
        assert!(!rb.is_empty());
        assert_eq!(rb.get(10), vec![1, 2, 3]);
        assert!(rb.is_empty());
    }

    #[test]
    fn get_on_empty_returns_nothing() {
        let mut rb = RingBuffer::new(4);
        assert!(rb.get(4).is_empty());
        assert_eq!(rb.read(&mut [0u8; 4]), 0);
    }

    #[test]
    fn partial_get_keeps_remainder() {
        let mut rb = RingBuffer::new(8);
        rb.put(b"abcdef");

        assert_eq!(rb.get(2), b"ab".to_vec());
        assert_eq!(rb.len(), 4);
        assert_eq!(rb.get(10), b"cdef".to_vec());
    }

    #[test]
    fn exactly_full() {
        let mut rb = RingBuffer::new(4);
        rb.put(&[1, 2, 3, 4]);

        assert_eq!(rb.len(), 4);
        assert_eq!(rb.get(4), vec![1, 2, 3, 4]);
        assert_eq!(rb.len(), 0);
    }

    #[test]
    fn wraps_around_arena_end() {
        let mut rb = RingBuffer::new(5);
        rb.put(&[1, 2, 3, 4]);
        assert_eq!(rb.get(3), vec![1, 2, 3]);

        rb.put(&[5, 6, 7]);
        assert_eq!(rb.len(), 4);
        assert_eq!(rb.get(10), vec![4, 5, 6, 7]);
    }

    #[test]
    fn overflow_drops_oldest() {
        let mut rb = RingBuffer::new(4);
        rb.put(&[1, 2, 3]);
        rb.put(&[4, 5, 6]);

        assert_eq!(rb.len(), 4);
        assert_eq!(rb.get(4), vec![3, 4, 5, 6]);
    }

    #[test]
    fn oversize_put_keeps_last_capacity_bytes() {
        let mut rb = RingBuffer::new(4);
        rb.put(&[9]);
        rb.put(&[1, 2, 3, 4, 5, 6, 7]);

        assert_eq!(rb.len(), 4);
        assert_eq!(rb.get(10), vec![4, 5, 6, 7]);
    }

    #[test]
    fn clear_resets() {
        let mut rb = RingBuffer::new(3);
        rb.put(&[1, 2]);
        rb.clear();

        assert!(rb.is_empty());
        assert_eq!(rb.len(), 0);
        assert_eq!(rb.capacity(), 3);

        rb.put(&[7]);
        assert_eq!(rb.get(3), vec![7]);
    }

    #[test]
    #[should_panic(expected = "capacity must be > 0")]
    fn zero_capacity_panics() {
        let _ = RingBuffer::new(0);
    }

    mod props {
        use std::collections::VecDeque;

        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Put(Vec<u8>),
            Get(usize),
        }

        fn arb_op() -> impl Strategy<Value = Op> {
            prop_oneof![
                prop::collection::vec(any::<u8>(), 0..40).prop_map(Op::Put),
                (0usize..40).prop_map(Op::Get),
            ]
        }

        proptest! {
            #[test]
            fn lossless_while_within_capacity(
                chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..16), 0..16),
                read_size in 1usize..32,
            ) {
                let total: usize = chunks.iter().map(Vec::len).sum();
                let mut rb = RingBuffer::new(total.max(1));

                for chunk in &chunks {
                    rb.put(chunk);
                }

                let mut out = Vec::new();
                loop {
                    let got = rb.get(read_size);
                    if got.is_empty() {
                        break;
                    }
                    out.extend(got);
                }
                prop_assert_eq!(out, chunks.concat());
            }

            #[test]
            fn oversize_put_leaves_tail_of_input(
                capacity in 1usize..32,
                data in prop::collection::vec(any::<u8>(), 0..96),
                prefill in prop::collection::vec(any::<u8>(), 0..32),
            ) {
                prop_assume!(data.len() > capacity);
                let mut rb = RingBuffer::new(capacity);
                rb.put(&prefill);
                rb.put(&data);

                prop_assert_eq!(rb.len(), capacity);
                prop_assert_eq!(rb.get(capacity), data[data.len() - capacity..].to_vec());
            }

            #[test]
            fn behaves_like_bounded_deque(
                capacity in 1usize..24,
                ops in prop::collection::vec(arb_op(), 0..64),
            ) {
                let mut rb = RingBuffer::new(capacity);
                let mut model: VecDeque<u8> = VecDeque::new();

                for op in ops {
                    match op {
                        Op::Put(data) => {
                            rb.put(&data);
                            model.extend(data);
                            while model.len() > capacity {
                                model.pop_front();
                            }
                        }
                        Op::Get(n) => {
                            let expected: Vec<u8> =
                                model.drain(..n.min(model.len())).collect();
                            prop_assert_eq!(rb.get(n), expected);
                        }
                    }

                    prop_assert!(rb.len() <= capacity);
                    prop_assert_eq!(rb.len(), model.len());
                    prop_assert_eq!(rb.is_empty(), rb.len() == 0);
                }
            }
        }
    }
}
