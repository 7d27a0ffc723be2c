//! Lock-free SPSC ring buffer for interleaved samples.
//!
//! Carries audio between a device callback and the processing thread. The
//! producer never blocks: samples that do not fit are dropped and counted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ringbuf::{HeapConsumer, HeapProducer, HeapRb};

/// Create a ring holding `capacity` interleaved samples and split it into
/// its producer and consumer halves.
pub fn sample_ring(capacity: usize) -> (SampleProducer, SampleConsumer) {
    let rb = HeapRb::<f32>::new(capacity);
    let (producer, consumer) = rb.split();
    let dropped = Arc::new(AtomicU64::new(0));

    (
        SampleProducer {
            producer,
            dropped: Arc::clone(&dropped),
        },
        SampleConsumer {
            consumer,
            last_sample: 0.0,
        },
    )
}

/// Writing half, owned by the capture callback or the processing thread.
pub struct SampleProducer {
    producer: HeapProducer<f32>,
    dropped: Arc<AtomicU64>,
}

impl SampleProducer {
    /// Write samples, dropping whatever does not fit. Returns the number
    /// actually written.
    pub fn write(&mut self, samples: &[f32]) -> usize {
        let written = self.producer.push_slice(samples);
        let dropped = samples.len() - written;
        if dropped > 0 {
            self.dropped.fetch_add(dropped as u64, Ordering::Relaxed);
        }
        written
    }

    /// Shared dropped-sample counter, for overrun reporting.
    pub fn dropped_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.dropped)
    }
}

/// Reading half, owned by the processing thread or the output callback.
pub struct SampleConsumer {
    consumer: HeapConsumer<f32>,
    last_sample: f32,
}

impl SampleConsumer {
    /// Read into `buffer`, returning the number of samples read.
    pub fn read(&mut self, buffer: &mut [f32]) -> usize {
        let count = self.consumer.pop_slice(buffer);
        if count > 0 {
            self.last_sample = buffer[count - 1];
        }
        count
    }

    /// Number of samples available.
    pub fn len(&self) -> usize {
        self.consumer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumer.is_empty()
    }

    /// Last sample handed out, used to fade instead of snapping to silence
    /// on underrun.
    pub fn last_sample(&self) -> f32 {
        self.last_sample
    }
}
