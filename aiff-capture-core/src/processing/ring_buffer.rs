/// Circular buffer of captured i32 samples.
///
/// Backends with callback-driven devices push into it from the audio thread
/// and drain it in fixed-size blocks from the capture loop. Wrap in
/// `parking_lot::Mutex` for cross-thread access.
///
/// Overflow behavior: drops oldest samples and counts them, so the reader can
/// report an input overflow on its next read.
#[derive(Debug)]
pub struct RingBuffer {
    buffer: Vec<i32>,
    write_index: usize,
    read_index: usize,
    available: usize,
    dropped: u64,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0; capacity.max(1)],
            write_index: 0,
            read_index: 0,
            available: 0,
            dropped: 0,
        }
    }

    /// Append samples, discarding the oldest on overflow.
    pub fn write(&mut self, samples: &[i32]) {
        if samples.is_empty() {
            return;
        }
        let capacity = self.capacity();

        let samples = if samples.len() > capacity {
            self.dropped += (samples.len() - capacity) as u64;
            &samples[samples.len() - capacity..]
        } else {
            samples
        };

        let overflow = (self.available + samples.len()).saturating_sub(capacity);
        if overflow > 0 {
            self.read_index = (self.read_index + overflow) % capacity;
            self.available -= overflow;
            self.dropped += overflow as u64;
        }

        for &sample in samples {
            self.buffer[self.write_index] = sample;
            self.write_index = (self.write_index + 1) % capacity;
        }
        self.available += samples.len();
    }

    /// Append one sample, discarding the oldest if full.
    pub fn push(&mut self, sample: i32) {
        let capacity = self.capacity();
        if self.available == capacity {
            self.read_index = (self.read_index + 1) % capacity;
            self.available -= 1;
            self.dropped += 1;
        }
        self.buffer[self.write_index] = sample;
        self.write_index = (self.write_index + 1) % capacity;
        self.available += 1;
    }

    /// Move up to `out.len()` samples into `out`. Returns how many were moved.
    pub fn read_into(&mut self, out: &mut [i32]) -> usize {
        let to_read = out.len().min(self.available);
        let capacity = self.capacity();
        for (i, slot) in out.iter_mut().take(to_read).enumerate() {
            *slot = self.buffer[(self.read_index + i) % capacity];
        }
        self.read_index = (self.read_index + to_read) % capacity;
        self.available -= to_read;
        to_read
    }

    /// Number of samples currently available for reading.
    pub fn count(&self) -> usize {
        self.available
    }

    pub fn is_empty(&self) -> bool {
        self.available == 0
    }

    /// Samples discarded since the last call, resetting the counter.
    pub fn take_dropped(&mut self) -> u64 {
        std::mem::take(&mut self.dropped)
    }

    pub fn reset(&mut self) {
        self.write_index = 0;
        self.read_index = 0;
        self.available = 0;
        self.dropped = 0;
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(buf: &mut RingBuffer, n: usize) -> Vec<i32> {
        let mut out = vec![0; n];
        let got = buf.read_into(&mut out);
        out.truncate(got);
        out
    }

    #[test]
    fn basic_write_read() {
        let mut buf = RingBuffer::new(10);
        buf.write(&[1, 2, 3]);

        assert_eq!(buf.count(), 3);
        assert_eq!(drain(&mut buf, 3), vec![1, 2, 3]);
        assert!(buf.is_empty());
    }

    #[test]
    fn partial_read_leaves_rest() {
        let mut buf = RingBuffer::new(10);
        buf.write(&[1, 2, 3, 4, 5]);

        assert_eq!(drain(&mut buf, 3), vec![1, 2, 3]);
        assert_eq!(buf.count(), 2);
        assert_eq!(drain(&mut buf, 10), vec![4, 5]);
    }

    #[test]
    fn overflow_drops_oldest_and_counts() {
        let mut buf = RingBuffer::new(4);
        buf.write(&[1, 2, 3, 4]);
        buf.write(&[5, 6]);

        assert_eq!(buf.take_dropped(), 2);
        assert_eq!(buf.take_dropped(), 0);
        assert_eq!(drain(&mut buf, 4), vec![3, 4, 5, 6]);
    }

    #[test]
    fn write_larger_than_capacity_keeps_tail() {
        let mut buf = RingBuffer::new(3);
        buf.write(&[1, 2, 3, 4, 5]);

        assert_eq!(buf.take_dropped(), 2);
        assert_eq!(drain(&mut buf, 3), vec![3, 4, 5]);
    }

    #[test]
    fn wraparound() {
        let mut buf = RingBuffer::new(4);
        buf.write(&[1, 2, 3]);
        drain(&mut buf, 2);
        buf.write(&[4, 5, 6]);

        assert_eq!(buf.count(), 4);
        assert_eq!(drain(&mut buf, 4), vec![3, 4, 5, 6]);
    }

    #[test]
    fn reset_clears_buffer() {
        let mut buf = RingBuffer::new(4);
        buf.write(&[1, 2, 3, 4, 5]);
        buf.reset();

        assert!(buf.is_empty());
        assert_eq!(buf.take_dropped(), 0);
        assert!(drain(&mut buf, 4).is_empty());
    }

    #[test]
    fn push_drops_oldest_when_full() {
        let mut buf = RingBuffer::new(3);
        for sample in 1..=5 {
            buf.push(sample);
        }
        assert_eq!(buf.take_dropped(), 2);
        assert_eq!(drain(&mut buf, 3), vec![3, 4, 5]);
    }
}
