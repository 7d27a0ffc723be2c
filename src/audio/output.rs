//! Audio output playback using cpal.
//!
//! The playback callback pops interleaved samples from the ring consumer.
//! When not enough samples are buffered it counts an underrun and fades
//! linearly from the last delivered sample to silence instead of snapping.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::Stream;

use super::buffer::SampleConsumer;
use super::config::StreamConfig;
use super::error::AudioError;

/// Audio output stream draining a sample ring.
pub struct AudioOutput {
    stream: Stream,
    device_name: String,
    underruns: Arc<AtomicU64>,
}

impl AudioOutput {
    /// Build the output stream. The device handle is released when the
    /// returned value is dropped.
    pub fn open(
        device: &cpal::Device,
        config: &StreamConfig,
        mut consumer: SampleConsumer,
    ) -> Result<Self, AudioError> {
        let device_name = device
            .name()
            .map_err(|e| AudioError::StreamOpen(format!("failed to get device name: {e}")))?;

        let underruns = Arc::new(AtomicU64::new(0));
        let underruns_cb = Arc::clone(&underruns);

        let err_name = device_name.clone();
        let stream = device
            .build_output_stream(
                &config.device_config(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if consumer.len() >= data.len() {
                        consumer.read(data);
                    } else {
                        underruns_cb.fetch_add(1, Ordering::Relaxed);
                        let last = consumer.last_sample();
                        let len = data.len();
                        for (i, sample) in data.iter_mut().enumerate() {
                            let t = (i + 1) as f32 / len as f32;
                            *sample = last * (1.0 - t);
                        }
                    }
                },
                move |err| {
                    log::warn!("output stream error on '{err_name}': {err}");
                },
                None,
            )
            .map_err(|e| {
                AudioError::StreamOpen(format!("failed to open output on '{device_name}': {e}"))
            })?;

        Ok(Self {
            stream,
            device_name,
            underruns,
        })
    }

    pub fn start(&self) -> Result<(), AudioError> {
        self.stream.play().map_err(|e| {
            AudioError::StreamOpen(format!(
                "failed to start output on '{}': {e}",
                self.device_name
            ))
        })
    }

    pub fn pause(&self) -> Result<(), AudioError> {
        self.stream.pause().map_err(|e| {
            AudioError::StreamOpen(format!(
                "failed to pause output on '{}': {e}",
                self.device_name
            ))
        })
    }

    /// Shared underrun counter, for status reporting.
    pub fn underrun_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.underruns)
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}
