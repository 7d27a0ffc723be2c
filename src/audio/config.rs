//! Immutable stream configuration.
//!
//! Two-phase construction: the CLI layer parses flags into `StreamArgs`
//! (phase 1), then `StreamConfig::resolve` combines them with the selected
//! devices' capabilities (phase 2) and freezes the result for the stream's
//! lifetime.

use std::time::Duration;

use super::device::DeviceDescriptor;
use super::error::AudioError;
use crate::cli::StreamArgs;

/// Processing block size used when neither `--blocksize` nor `--latency`
/// pins one.
pub const DEFAULT_BLOCK_SIZE: u32 = 1024;

const MIN_BLOCK_SIZE: u32 = 64;

#[derive(Clone, Debug)]
pub struct StreamConfig {
    pub sample_rate: u32,
    /// Frames per processing block.
    pub block_size: u32,
    pub channels: u16,
    /// Whether the user pinned the device buffer size (via `--blocksize` or
    /// `--latency`); otherwise the device keeps its preferred buffering.
    fixed_device_buffer: bool,
}

impl StreamConfig {
    /// Build the final configuration from parsed flags and device
    /// capabilities.
    ///
    /// Channel count defaults to the input device's maximum; the sample rate
    /// falls back to `default_rate` and then to the input device's default.
    /// `output` is `None` for input-only streams.
    pub fn resolve(
        input: &DeviceDescriptor,
        output: Option<&DeviceDescriptor>,
        args: &StreamArgs,
        default_rate: Option<u32>,
    ) -> Result<Self, AudioError> {
        if input.max_input_channels == 0 {
            return Err(AudioError::StreamOpen(format!(
                "device '{}' has no input channels",
                input.name
            )));
        }

        let channels = args.channels.unwrap_or(input.max_input_channels);
        if channels == 0 {
            return Err(AudioError::StreamOpen(
                "channel count must be at least 1".to_string(),
            ));
        }
        if channels > input.max_input_channels {
            return Err(AudioError::StreamOpen(format!(
                "device '{}' supports at most {} input channels, {} requested",
                input.name, input.max_input_channels, channels
            )));
        }
        if let Some(out) = output {
            if out.max_output_channels == 0 {
                return Err(AudioError::StreamOpen(format!(
                    "device '{}' has no output channels",
                    out.name
                )));
            }
            if channels > out.max_output_channels {
                return Err(AudioError::StreamOpen(format!(
                    "device '{}' supports at most {} output channels, {} requested",
                    out.name, out.max_output_channels, channels
                )));
            }
        }

        let sample_rate = args
            .samplerate
            .or(default_rate)
            .unwrap_or(input.default_sample_rate);
        if sample_rate == 0 {
            return Err(AudioError::StreamOpen(format!(
                "could not determine a sample rate for device '{}'",
                input.name
            )));
        }

        let latency_frames = args
            .latency
            .map(|seconds| (seconds * sample_rate as f64).round() as u32);
        let block_size = args
            .blocksize
            .or(latency_frames)
            .unwrap_or(DEFAULT_BLOCK_SIZE)
            .max(MIN_BLOCK_SIZE);

        Ok(Self {
            sample_rate,
            block_size,
            channels,
            fixed_device_buffer: args.blocksize.is_some() || args.latency.is_some(),
        })
    }

    /// cpal configuration for either stream direction.
    pub fn device_config(&self) -> cpal::StreamConfig {
        cpal::StreamConfig {
            channels: self.channels,
            sample_rate: cpal::SampleRate(self.sample_rate),
            buffer_size: if self.fixed_device_buffer {
                cpal::BufferSize::Fixed(self.block_size)
            } else {
                cpal::BufferSize::Default
            },
        }
    }

    /// Interleaved samples per processing block.
    pub fn samples_per_block(&self) -> usize {
        self.block_size as usize * self.channels as usize
    }

    /// Wall-clock duration of one block.
    pub fn block_period(&self) -> Duration {
        Duration::from_secs_f64(self.block_size as f64 / self.sample_rate as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input_device() -> DeviceDescriptor {
        DeviceDescriptor {
            index: 0,
            name: "Test Mic".to_string(),
            max_input_channels: 2,
            max_output_channels: 0,
            default_sample_rate: 44_100,
            default_input: true,
            default_output: false,
        }
    }

    fn output_device() -> DeviceDescriptor {
        DeviceDescriptor {
            index: 1,
            name: "Test Speakers".to_string(),
            max_input_channels: 0,
            max_output_channels: 2,
            default_sample_rate: 44_100,
            default_input: false,
            default_output: true,
        }
    }

    fn args() -> StreamArgs {
        StreamArgs {
            channels: None,
            samplerate: None,
            blocksize: None,
            latency: None,
        }
    }

    #[test]
    fn test_defaults_from_device() {
        let config =
            StreamConfig::resolve(&input_device(), Some(&output_device()), &args(), None).unwrap();
        assert_eq!(config.channels, 2);
        assert_eq!(config.sample_rate, 44_100);
        assert_eq!(config.block_size, DEFAULT_BLOCK_SIZE);
        assert!(matches!(
            config.device_config().buffer_size,
            cpal::BufferSize::Default
        ));
    }

    #[test]
    fn test_variant_default_rate_wins_over_device() {
        let config = StreamConfig::resolve(&input_device(), None, &args(), Some(48_000)).unwrap();
        assert_eq!(config.sample_rate, 48_000);
    }

    #[test]
    fn test_explicit_flags() {
        let mut a = args();
        a.channels = Some(1);
        a.samplerate = Some(48_000);
        a.blocksize = Some(480);
        let config = StreamConfig::resolve(&input_device(), None, &a, None).unwrap();
        assert_eq!(config.channels, 1);
        assert_eq!(config.sample_rate, 48_000);
        assert_eq!(config.block_size, 480);
        assert_eq!(config.samples_per_block(), 480);
        assert!(matches!(
            config.device_config().buffer_size,
            cpal::BufferSize::Fixed(480)
        ));
    }

    #[test]
    fn test_latency_derives_block_size() {
        let mut a = args();
        a.samplerate = Some(48_000);
        a.latency = Some(0.02);
        let config = StreamConfig::resolve(&input_device(), None, &a, None).unwrap();
        assert_eq!(config.block_size, 960);
    }

    #[test]
    fn test_too_many_channels_rejected() {
        let mut a = args();
        a.channels = Some(4);
        let err = StreamConfig::resolve(&input_device(), None, &a, None).unwrap_err();
        assert!(matches!(err, AudioError::StreamOpen(_)));
    }

    #[test]
    fn test_output_channel_limit_rejected() {
        let mut out = output_device();
        out.max_output_channels = 1;
        let mut a = args();
        a.channels = Some(2);
        let err = StreamConfig::resolve(&input_device(), Some(&out), &a, None).unwrap_err();
        assert!(matches!(err, AudioError::StreamOpen(_)));
    }

    #[test]
    fn test_block_period() {
        let mut a = args();
        a.samplerate = Some(48_000);
        a.blocksize = Some(480);
        let config = StreamConfig::resolve(&input_device(), None, &a, None).unwrap();
        assert_eq!(config.block_period(), Duration::from_millis(10));
    }
}
