//! Audio input capture using cpal.
//!
//! The capture callback only pushes interleaved samples into the ring
//! producer; overflow drops are counted there. All processing happens on
//! the engine's DSP thread.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::Stream;

use super::buffer::SampleProducer;
use super::config::StreamConfig;
use super::error::AudioError;

/// Audio input stream feeding a sample ring.
pub struct AudioInput {
    stream: Stream,
    device_name: String,
}

impl AudioInput {
    /// Build the input stream. The device handle is released when the
    /// returned value is dropped.
    pub fn open(
        device: &cpal::Device,
        config: &StreamConfig,
        mut producer: SampleProducer,
    ) -> Result<Self, AudioError> {
        let device_name = device
            .name()
            .map_err(|e| AudioError::StreamOpen(format!("failed to get device name: {e}")))?;

        let err_name = device_name.clone();
        let stream = device
            .build_input_stream(
                &config.device_config(),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    producer.write(data);
                },
                move |err| {
                    log::warn!("input stream error on '{err_name}': {err}");
                },
                None,
            )
            .map_err(|e| {
                AudioError::StreamOpen(format!("failed to open input on '{device_name}': {e}"))
            })?;

        Ok(Self {
            stream,
            device_name,
        })
    }

    pub fn start(&self) -> Result<(), AudioError> {
        self.stream.play().map_err(|e| {
            AudioError::StreamOpen(format!(
                "failed to start input on '{}': {e}",
                self.device_name
            ))
        })
    }

    pub fn pause(&self) -> Result<(), AudioError> {
        self.stream.pause().map_err(|e| {
            AudioError::StreamOpen(format!(
                "failed to pause input on '{}': {e}",
                self.device_name
            ))
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}
