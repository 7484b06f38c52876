//! Bounded lock-free frame queue
//!
//! Single-producer single-consumer ring between the acquisition and analysis
//! threads. A full queue refuses new frames instead of blocking acquisition.

use ringbuf::{HeapConsumer, HeapProducer, HeapRb};

use crate::frame::Frame;

/// Frame ring buffer, split into its two ends before use
pub struct FrameRingBuffer {
    producer: HeapProducer<Frame>,
    consumer: HeapConsumer<Frame>,
    capacity: usize,
}

impl FrameRingBuffer {
    /// Create a ring buffer holding up to `capacity` frames (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let rb = HeapRb::<Frame>::new(capacity);
        let (producer, consumer) = rb.split();

        Self {
            producer,
            consumer,
            capacity,
        }
    }

    /// Split into producer and consumer ends
    pub fn split(self) -> (FrameProducer, FrameConsumer) {
        (
            FrameProducer {
                producer: self.producer,
                capacity: self.capacity,
            },
            FrameConsumer {
                consumer: self.consumer,
                capacity: self.capacity,
            },
        )
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Writing end (acquisition thread)
pub struct FrameProducer {
    producer: HeapProducer<Frame>,
    capacity: usize,
}

impl FrameProducer {
    /// Queue a frame
    ///
    /// # Returns
    /// The frame back if the queue is full
    pub fn push(&mut self, frame: Frame) -> Result<(), Frame> {
        self.producer.push(frame)
    }

    pub fn free_len(&self) -> usize {
        self.producer.free_len()
    }

    pub fn is_full(&self) -> bool {
        self.producer.is_full()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Reading end (analysis thread)
pub struct FrameConsumer {
    consumer: HeapConsumer<Frame>,
    capacity: usize,
}

impl FrameConsumer {
    /// Oldest queued frame, if any
    pub fn pop(&mut self) -> Option<Frame> {
        self.consumer.pop()
    }

    pub fn len(&self) -> usize {
        self.consumer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn frame(t: f64) -> Frame {
        Frame::from_gray(t, Array2::zeros((2, 2))).unwrap()
    }

    #[test]
    fn test_frames_come_out_in_order() {
        let (mut producer, mut consumer) = FrameRingBuffer::new(4).split();
        for i in 0..3 {
            assert!(producer.push(frame(i as f64)).is_ok());
        }
        assert_eq!(consumer.len(), 3);

        let times: Vec<f64> = std::iter::from_fn(|| consumer.pop())
            .map(|f| f.timestamp())
            .collect();
        assert_eq!(times, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_full_queue_refuses_frame() {
        let (mut producer, mut consumer) = FrameRingBuffer::new(2).split();
        assert!(producer.push(frame(0.0)).is_ok());
        assert!(producer.push(frame(1.0)).is_ok());
        assert!(producer.is_full());

        let rejected = producer.push(frame(2.0)).unwrap_err();
        assert_eq!(rejected.timestamp(), 2.0);

        assert_eq!(consumer.pop().map(|f| f.timestamp()), Some(0.0));
        assert_eq!(producer.free_len(), 1);
    }

    #[test]
    fn test_empty_queue() {
        let rb = FrameRingBuffer::new(0);
        assert_eq!(rb.capacity(), 1);
        let (_producer, mut consumer) = rb.split();
        assert!(consumer.is_empty());
        assert!(consumer.pop().is_none());
    }
}
