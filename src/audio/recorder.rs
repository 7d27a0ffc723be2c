//! Record path: input stream → bounded block queue → WAV writer thread.
//!
//! The capture callback enqueues a copy of each block with `try_send` and
//! never blocks; when the queue is full the newest block is dropped and
//! counted, so the file stays a gapless prefix up to the first overflow.
//! The writer thread drains the queue in FIFO order and may block on file
//! I/O freely.

use std::io::{Seek, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use cpal::traits::{DeviceTrait, StreamTrait};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use super::block::AudioBlock;
use super::config::StreamConfig;
use super::error::AudioError;

/// Maximum captured blocks waiting for the writer.
pub const BLOCK_QUEUE_CAPACITY: usize = 64;

/// Producer side of the bounded capture queue.
pub struct BlockQueue {
    tx: Sender<AudioBlock>,
    dropped: Arc<AtomicU64>,
}

impl BlockQueue {
    pub fn bounded(capacity: usize) -> (Self, Receiver<AudioBlock>) {
        let (tx, rx) = bounded(capacity);
        (
            Self {
                tx,
                dropped: Arc::new(AtomicU64::new(0)),
            },
            rx,
        )
    }

    /// Enqueue without blocking. Returns false if the block was dropped
    /// (queue full) or the consumer is gone.
    pub fn push(&self, block: AudioBlock) -> bool {
        match self.tx.try_send(block) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    pub fn dropped_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.dropped)
    }
}

/// Drain blocks in FIFO order into a WAV writer until the queue closes,
/// then finalize. Returns the number of frames written.
pub fn spawn_writer<W>(
    rx: Receiver<AudioBlock>,
    mut writer: hound::WavWriter<W>,
) -> Result<JoinHandle<Result<u64, AudioError>>, AudioError>
where
    W: Write + Seek + Send + 'static,
{
    thread::Builder::new()
        .name("clearmic-writer".to_string())
        .spawn(move || {
            let mut frames = 0u64;
            for block in rx.iter() {
                for &sample in &block.samples {
                    writer.write_sample(sample)?;
                }
                frames += block.frames() as u64;
            }
            writer.finalize()?;
            Ok(frames)
        })
        .map_err(|e| AudioError::Processing(format!("failed to spawn writer thread: {e}")))
}

/// Summary of a finished recording.
#[derive(Clone, Copy, Debug)]
pub struct RecordingSummary {
    pub frames_written: u64,
    pub blocks_dropped: u64,
}

/// A running recording: input stream plus writer thread.
pub struct Recorder {
    stream: Option<cpal::Stream>,
    writer: Option<JoinHandle<Result<u64, AudioError>>>,
    dropped: Arc<AtomicU64>,
    device_name: String,
}

impl Recorder {
    /// Create the WAV file, spawn the writer thread, and start capturing.
    pub fn start(
        config: &StreamConfig,
        device: &cpal::Device,
        path: &Path,
    ) -> Result<Self, AudioError> {
        let device_name = device
            .name()
            .map_err(|e| AudioError::StreamOpen(format!("failed to get device name: {e}")))?;

        let spec = hound::WavSpec {
            channels: config.channels,
            sample_rate: config.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let wav_writer = hound::WavWriter::create(path, spec)?;

        let (queue, rx) = BlockQueue::bounded(BLOCK_QUEUE_CAPACITY);
        let dropped = queue.dropped_counter();
        let writer = spawn_writer(rx, wav_writer)?;

        let channels = config.channels;
        let mut next_index = 0u64;
        let err_name = device_name.clone();
        let stream = device
            .build_input_stream(
                &config.device_config(),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let block = AudioBlock::capture(data, channels, next_index);
                    next_index += 1;
                    queue.push(block);
                },
                move |err| {
                    log::warn!("input stream error on '{err_name}': {err}");
                },
                None,
            )
            .map_err(|e| {
                AudioError::StreamOpen(format!("failed to open input on '{device_name}': {e}"))
            })?;

        stream.play().map_err(|e| {
            AudioError::StreamOpen(format!("failed to start input on '{device_name}': {e}"))
        })?;

        Ok(Self {
            stream: Some(stream),
            writer: Some(writer),
            dropped,
            device_name,
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Stop capturing, drain the queue, and finalize the file.
    pub fn stop(mut self) -> Result<RecordingSummary, AudioError> {
        // Dropping the stream drops the callback and with it the queue
        // sender, which ends the writer's drain loop.
        if let Some(stream) = self.stream.take() {
            let _ = stream.pause();
            drop(stream);
        }

        let frames_written = match self.writer.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| AudioError::Processing("writer thread panicked".to_string()))??,
            None => 0,
        };

        let blocks_dropped = self.dropped.load(Ordering::Relaxed);
        if blocks_dropped > 0 {
            log::warn!("capture queue overflowed: {blocks_dropped} blocks dropped");
        }

        Ok(RecordingSummary {
            frames_written,
            blocks_dropped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(index: u64, value: f32) -> AudioBlock {
        AudioBlock::new(vec![value; 4], 1, index, 0)
    }

    #[test]
    fn test_push_preserves_fifo_order() {
        let (queue, rx) = BlockQueue::bounded(8);
        for i in 0..5 {
            assert!(queue.push(block(i, i as f32)));
        }
        let received: Vec<u64> = rx.try_iter().map(|b| b.index).collect();
        assert_eq!(received, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_overflow_drops_newest_and_counts() {
        let (queue, rx) = BlockQueue::bounded(4);
        for i in 0..10 {
            queue.push(block(i, 0.0));
        }
        assert_eq!(queue.dropped_counter().load(Ordering::Relaxed), 6);

        // The accepted blocks are the oldest four, still in order.
        let received: Vec<u64> = rx.try_iter().map(|b| b.index).collect();
        assert_eq!(received, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_push_after_disconnect() {
        let (queue, rx) = BlockQueue::bounded(4);
        drop(rx);
        assert!(!queue.push(block(0, 0.0)));
        // Disconnect is not an overflow.
        assert_eq!(queue.dropped_counter().load(Ordering::Relaxed), 0);
    }
}
