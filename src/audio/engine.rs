//! Duplex stream engine: input stream → DSP thread → output stream.
//!
//! The DSP thread is the only place blocks are processed, so processing is
//! strictly serialized and in capture order. Device callbacks never block:
//! the input side drops samples on overflow, the output side fades on
//! underrun, and both conditions are surfaced as log warnings while the
//! stream keeps running. Stream handles live inside the engine and are
//! released on every exit path, including drop.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use thread_priority::{set_current_thread_priority, ThreadPriority};

use super::block::AudioBlock;
use super::buffer::sample_ring;
use super::clock;
use super::config::StreamConfig;
use super::error::AudioError;
use super::input::AudioInput;
use super::output::AudioOutput;
use crate::dsp::BlockProcessor;

/// Ring capacity in blocks on each side of the DSP thread.
const RING_BLOCKS: usize = 8;

/// Stream lifecycle, stored as an atomic on the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum LifecycleState {
    Idle = 0,
    Streaming = 1,
    ShuttingDown = 2,
    Terminated = 3,
}

impl LifecycleState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LifecycleState::Idle,
            1 => LifecycleState::Streaming,
            2 => LifecycleState::ShuttingDown,
            _ => LifecycleState::Terminated,
        }
    }
}

/// Counters reported when the stream closes.
#[derive(Clone, Copy, Debug, Default)]
pub struct StreamStats {
    pub blocks_processed: u64,
    pub input_samples_dropped: u64,
    pub output_underruns: u64,
}

pub struct StreamEngine {
    state: Arc<AtomicU8>,
    dsp_thread: Option<JoinHandle<Result<u64, AudioError>>>,
    input: Option<AudioInput>,
    output: Option<AudioOutput>,
    input_dropped: Arc<AtomicU64>,
    output_underruns: Arc<AtomicU64>,
}

impl StreamEngine {
    /// Open both streams, start them, and spawn the DSP thread running
    /// `processor` once per block in capture order.
    pub fn start(
        config: &StreamConfig,
        input_device: &cpal::Device,
        output_device: &cpal::Device,
        mut processor: Box<dyn BlockProcessor>,
    ) -> Result<Self, AudioError> {
        let state = Arc::new(AtomicU8::new(LifecycleState::Idle as u8));
        let samples_per_block = config.samples_per_block();
        let ring_capacity = samples_per_block * RING_BLOCKS;

        let (input_producer, mut input_consumer) = sample_ring(ring_capacity);
        let input_dropped = input_producer.dropped_counter();
        let (mut output_producer, output_consumer) = sample_ring(ring_capacity);

        let input = AudioInput::open(input_device, config, input_producer)?;
        let output = AudioOutput::open(output_device, config, output_consumer)?;
        let output_underruns = output.underrun_counter();

        input.start()?;
        output.start()?;
        state.store(LifecycleState::Streaming as u8, Ordering::Release);

        log::info!(
            "streaming '{}' -> '{}' at {} Hz, {} channel(s), {} frames/block",
            input.device_name(),
            output.device_name(),
            config.sample_rate,
            config.channels,
            config.block_size
        );

        let thread_state = Arc::clone(&state);
        let dropped_counter = Arc::clone(&input_dropped);
        let underrun_counter = Arc::clone(&output_underruns);
        let channels = config.channels;
        let idle_wait = config.block_period() / 4;

        let dsp_thread = thread::Builder::new()
            .name("clearmic-dsp".to_string())
            .spawn(move || {
                if set_current_thread_priority(ThreadPriority::Max).is_err() {
                    log::debug!("could not raise DSP thread priority");
                }

                let mut next_index = 0u64;
                let mut seen_dropped = 0u64;
                let mut seen_underruns = 0u64;

                while LifecycleState::from_u8(thread_state.load(Ordering::Acquire))
                    == LifecycleState::Streaming
                {
                    if input_consumer.len() < samples_per_block {
                        thread::sleep(idle_wait);
                        continue;
                    }

                    let mut block = AudioBlock::new(
                        vec![0.0; samples_per_block],
                        channels,
                        next_index,
                        clock::now_micros(),
                    );
                    input_consumer.read(&mut block.samples);
                    next_index += 1;

                    if let Err(err) = processor.process(&mut block) {
                        log::error!("processing failed on block {}: {err}", block.index);
                        thread_state
                            .store(LifecycleState::ShuttingDown as u8, Ordering::Release);
                        return Err(err);
                    }

                    output_producer.write(&block.samples);

                    // Surface device status changes without stopping the stream.
                    let dropped = dropped_counter.load(Ordering::Relaxed);
                    if dropped > seen_dropped {
                        log::warn!("input overrun: {dropped} samples dropped so far");
                        seen_dropped = dropped;
                    }
                    let underruns = underrun_counter.load(Ordering::Relaxed);
                    if underruns > seen_underruns {
                        log::warn!("output underrun ({underruns} total)");
                        seen_underruns = underruns;
                    }
                }

                Ok(next_index)
            })
            .map_err(|e| AudioError::StreamOpen(format!("failed to spawn DSP thread: {e}")))?;

        Ok(Self {
            state,
            dsp_thread: Some(dsp_thread),
            input: Some(input),
            output: Some(output),
            input_dropped,
            output_underruns,
        })
    }

    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Stop streaming and release both device handles. Idempotent; returns
    /// the processor error if the DSP thread failed mid-stream.
    pub fn stop(&mut self) -> Result<StreamStats, AudioError> {
        if self.state() == LifecycleState::Terminated {
            return Ok(self.stats(0));
        }
        self.state
            .store(LifecycleState::ShuttingDown as u8, Ordering::Release);

        let thread_result = match self.dsp_thread.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| AudioError::Processing("DSP thread panicked".to_string()))?,
            None => Ok(0),
        };

        if let Some(input) = self.input.take() {
            let _ = input.pause();
        }
        if let Some(output) = self.output.take() {
            let _ = output.pause();
        }
        self.state
            .store(LifecycleState::Terminated as u8, Ordering::Release);

        let stats = self.stats(*thread_result.as_ref().unwrap_or(&0));
        log::info!(
            "stream closed after {} blocks ({} input samples dropped, {} output underruns)",
            stats.blocks_processed,
            stats.input_samples_dropped,
            stats.output_underruns
        );

        thread_result.map(|blocks| self.stats(blocks))
    }

    fn stats(&self, blocks_processed: u64) -> StreamStats {
        StreamStats {
            blocks_processed,
            input_samples_dropped: self.input_dropped.load(Ordering::Relaxed),
            output_underruns: self.output_underruns.load(Ordering::Relaxed),
        }
    }
}

impl Drop for StreamEngine {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_state_roundtrip() {
        for state in [
            LifecycleState::Idle,
            LifecycleState::Streaming,
            LifecycleState::ShuttingDown,
            LifecycleState::Terminated,
        ] {
            assert_eq!(LifecycleState::from_u8(state as u8), state);
        }
    }
}
