//! RNNoise denoising, live and offline.
//!
//! The model consumes exactly 480 samples (10 ms at 48 kHz) per call and
//! expects 16-bit-range amplitudes, so each channel buffers input into
//! frames and rescales around the call. Live blocks keep their exact shape;
//! the model's one-frame latency is absorbed by emitting silence until the
//! first frame is ready. The offline pass denoises a whole WAV file and
//! writes a `_denoised` sibling in 16-bit PCM.

use std::path::{Path, PathBuf};

use nnnoiseless::DenoiseState;
use rubato::{FftFixedIn, Resampler};

use super::BlockProcessor;
use crate::audio::block::AudioBlock;
use crate::audio::error::AudioError;

/// Samples per model call (10 ms at 48 kHz).
pub const DENOISE_FRAME_SIZE: usize = DenoiseState::FRAME_SIZE;

/// The only rate the model is trained for.
pub const DENOISE_SAMPLE_RATE: u32 = 48_000;

/// Scaling factor mapping [-1.0, 1.0] to the 16-bit range the model expects.
const PCM_SCALE: f32 = 32768.0;

/// Chunk size for the offline resampler.
const RESAMPLE_CHUNK: usize = 1024;

/// Single-channel denoiser with frame buffering.
pub struct ChannelDenoiser {
    state: Box<DenoiseState<'static>>,
    pending: Vec<f32>,
    ready: Vec<f32>,
}

impl std::fmt::Debug for ChannelDenoiser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelDenoiser")
            .field("pending", &self.pending.len())
            .field("ready", &self.ready.len())
            .finish_non_exhaustive()
    }
}

impl ChannelDenoiser {
    pub fn new() -> Self {
        Self {
            state: DenoiseState::new(),
            pending: Vec::with_capacity(DENOISE_FRAME_SIZE * 2),
            ready: Vec::with_capacity(DENOISE_FRAME_SIZE * 2),
        }
    }

    /// Queue input samples for processing.
    pub fn push(&mut self, samples: &[f32]) {
        self.pending.extend_from_slice(samples);
    }

    /// Run the model over every complete frame queued so far.
    pub fn process_pending(&mut self) {
        while self.pending.len() >= DENOISE_FRAME_SIZE {
            // Scale up and clamp so extreme peaks cannot wrap inside the model.
            let frame: Vec<f32> = self
                .pending
                .drain(..DENOISE_FRAME_SIZE)
                .map(|s| (s * PCM_SCALE).clamp(-32760.0, 32760.0))
                .collect();

            let mut output = [0.0f32; DENOISE_FRAME_SIZE];
            self.state.process_frame(&mut output, &frame);

            self.ready
                .extend(output.iter().map(|&s| s / PCM_SCALE));
        }
    }

    /// Denoised samples waiting to be pulled.
    pub fn available(&self) -> usize {
        self.ready.len()
    }

    /// Queued input not yet forming a complete frame.
    pub fn pending_input(&self) -> usize {
        self.pending.len()
    }

    /// Fill `out` with denoised samples, zero-leading while output is still
    /// short of a full block during warm-up.
    pub fn pull(&mut self, out: &mut [f32]) {
        let have = self.ready.len();
        let want = out.len();
        if have >= want {
            for (slot, sample) in out.iter_mut().zip(self.ready.drain(..want)) {
                *slot = sample;
            }
        } else {
            let lead = out.len() - have;
            out[..lead].fill(0.0);
            for (slot, sample) in out[lead..].iter_mut().zip(self.ready.drain(..)) {
                *slot = sample;
            }
        }
    }

    /// Take everything processed so far.
    pub fn drain_ready(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.ready)
    }

    /// Process the trailing partial frame by zero-padding it, returning only
    /// the samples that correspond to real input.
    pub fn flush(&mut self) -> Vec<f32> {
        if self.pending.is_empty() {
            return Vec::new();
        }
        let remainder = self.pending.len();
        self.pending.resize(DENOISE_FRAME_SIZE, 0.0);
        self.process_pending();
        let mut tail = self.drain_ready();
        tail.truncate(remainder);
        tail
    }
}

impl Default for ChannelDenoiser {
    fn default() -> Self {
        Self::new()
    }
}

/// Block processor denoising each channel independently, preserving the
/// block's frames-by-channels shape exactly.
#[derive(Debug)]
pub struct LiveDenoiser {
    denoisers: Vec<ChannelDenoiser>,
    scratch: Vec<f32>,
}

impl LiveDenoiser {
    pub fn new(channels: u16, sample_rate: u32) -> Result<Self, AudioError> {
        if sample_rate != DENOISE_SAMPLE_RATE {
            return Err(AudioError::StreamOpen(format!(
                "noise suppression requires a {DENOISE_SAMPLE_RATE} Hz stream, got {sample_rate} Hz"
            )));
        }
        Ok(Self {
            denoisers: (0..channels).map(|_| ChannelDenoiser::new()).collect(),
            scratch: Vec::new(),
        })
    }
}

impl BlockProcessor for LiveDenoiser {
    fn process(&mut self, block: &mut AudioBlock) -> Result<(), AudioError> {
        let channels = self.denoisers.len();
        if block.channels as usize != channels {
            return Err(AudioError::Processing(format!(
                "block has {} channels, denoiser has {channels}",
                block.channels
            )));
        }

        let frames = block.frames();
        for (ch, denoiser) in self.denoisers.iter_mut().enumerate() {
            self.scratch.clear();
            self.scratch
                .extend(block.samples.iter().skip(ch).step_by(channels));
            denoiser.push(&self.scratch);
            denoiser.process_pending();
        }

        self.scratch.resize(frames, 0.0);
        for (ch, denoiser) in self.denoisers.iter_mut().enumerate() {
            denoiser.pull(&mut self.scratch[..frames]);
            for (i, &sample) in self.scratch[..frames].iter().enumerate() {
                block.samples[i * channels + ch] = sample;
            }
        }
        Ok(())
    }
}

/// Path of the denoised sibling: `rec.wav` becomes `rec_denoised.wav`.
pub fn denoised_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{stem}_denoised.wav"))
}

/// Offline post-pass: load a WAV file, denoise each channel over its full
/// length, and write a `_denoised` sibling in 16-bit PCM. Channel count,
/// sample count, and sample rate are preserved. Files not at 48 kHz are
/// resampled through the model rate and back.
pub fn denoise_wav_file(input: &Path) -> Result<PathBuf, AudioError> {
    let mut reader = hound::WavReader::open(input)?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(AudioError::Processing(format!(
            "'{}' has no channels",
            input.display()
        )));
    }

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()?
        }
    };
    let frames = samples.len() / channels;

    let mut planes: Vec<Vec<f32>> = vec![Vec::with_capacity(frames); channels];
    for frame in samples.chunks_exact(channels) {
        for (ch, &sample) in frame.iter().enumerate() {
            planes[ch].push(sample);
        }
    }

    let denoised: Vec<Vec<f32>> = planes
        .iter()
        .map(|plane| denoise_plane_at_rate(plane, spec.sample_rate))
        .collect::<Result<_, _>>()?;

    let out_path = denoised_path(input);
    let out_spec = hound::WavSpec {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&out_path, out_spec)?;
    for i in 0..frames {
        for plane in &denoised {
            let sample = plane[i].clamp(-1.0, 1.0);
            writer.write_sample((sample * i16::MAX as f32) as i16)?;
        }
    }
    writer.finalize()?;

    Ok(out_path)
}

fn denoise_plane_at_rate(plane: &[f32], sample_rate: u32) -> Result<Vec<f32>, AudioError> {
    if sample_rate == DENOISE_SAMPLE_RATE {
        return Ok(denoise_plane(plane));
    }
    let upsampled = resample_plane(plane, sample_rate, DENOISE_SAMPLE_RATE)?;
    let denoised = denoise_plane(&upsampled);
    let mut restored = resample_plane(&denoised, DENOISE_SAMPLE_RATE, sample_rate)?;
    restored.resize(plane.len(), 0.0);
    Ok(restored)
}

/// Full-length single-channel pass, output as long as the input.
fn denoise_plane(plane: &[f32]) -> Vec<f32> {
    let mut denoiser = ChannelDenoiser::new();
    denoiser.push(plane);
    denoiser.process_pending();
    let mut out = denoiser.drain_ready();
    out.extend(denoiser.flush());
    out.resize(plane.len(), 0.0);
    out
}

/// FFT resampler over one channel, zero-padded so the tail flushes through.
fn resample_plane(plane: &[f32], from: u32, to: u32) -> Result<Vec<f32>, AudioError> {
    let mut resampler = FftFixedIn::<f64>::new(from as usize, to as usize, RESAMPLE_CHUNK, 2, 1)
        .map_err(|e| AudioError::Processing(format!("failed to create resampler: {e}")))?;

    let mut queue: Vec<f64> = plane.iter().map(|&s| s as f64).collect();
    queue.extend(std::iter::repeat(0.0).take(RESAMPLE_CHUNK * 2));

    let expected = plane.len() * to as usize / from as usize;
    let mut out = Vec::with_capacity(expected + RESAMPLE_CHUNK);
    let mut pos = 0;
    loop {
        let need = resampler.input_frames_next();
        if queue.len() - pos < need {
            break;
        }
        let chunk: Vec<f64> = queue[pos..pos + need].to_vec();
        pos += need;
        let processed = resampler
            .process(&[chunk], None)
            .map_err(|e| AudioError::Processing(format!("resampling failed: {e}")))?;
        out.extend(processed[0].iter().map(|&s| s as f32));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_buffering() {
        let mut denoiser = ChannelDenoiser::new();

        denoiser.push(&[0.0; 400]);
        denoiser.process_pending();
        assert_eq!(denoiser.available(), 0);
        assert_eq!(denoiser.pending_input(), 400);

        denoiser.push(&[0.0; 100]);
        denoiser.process_pending();
        assert_eq!(denoiser.available(), DENOISE_FRAME_SIZE);
        assert_eq!(denoiser.pending_input(), 20);
    }

    #[test]
    fn test_flush_returns_remainder_only() {
        let mut denoiser = ChannelDenoiser::new();
        denoiser.push(&[0.1; 100]);
        denoiser.process_pending();
        let tail = denoiser.flush();
        assert_eq!(tail.len(), 100);
        assert_eq!(denoiser.pending_input(), 0);
    }

    #[test]
    fn test_pull_zero_leads_during_warmup() {
        let mut denoiser = ChannelDenoiser::new();
        denoiser.push(&[0.1; 100]);
        denoiser.process_pending();

        // Nothing processed yet, so the whole pull is silence.
        let mut out = vec![1.0f32; 100];
        denoiser.pull(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_live_block_shape_preserved_mono() {
        let mut denoiser = LiveDenoiser::new(1, DENOISE_SAMPLE_RATE).unwrap();
        let mut block = AudioBlock::new(vec![0.05; 441], 1, 0, 0);
        denoiser.process(&mut block).unwrap();
        assert_eq!(block.samples.len(), 441);
        assert_eq!(block.channels, 1);
    }

    #[test]
    fn test_live_block_shape_preserved_stereo() {
        let mut denoiser = LiveDenoiser::new(2, DENOISE_SAMPLE_RATE).unwrap();
        for index in 0..4 {
            let mut block = AudioBlock::new(vec![0.05; 960], 2, index, 0);
            denoiser.process(&mut block).unwrap();
            assert_eq!(block.samples.len(), 960);
            assert_eq!(block.frames(), 480);
        }
    }

    #[test]
    fn test_rejects_wrong_sample_rate() {
        let err = LiveDenoiser::new(1, 44_100).unwrap_err();
        assert!(matches!(err, AudioError::StreamOpen(_)));
    }

    #[test]
    fn test_denoise_plane_length_preserved() {
        let out = denoise_plane(&vec![0.0; 1000]);
        assert_eq!(out.len(), 1000);
    }

    #[test]
    fn test_denoised_path_suffix() {
        assert_eq!(
            denoised_path(Path::new("/tmp/take1.wav")),
            PathBuf::from("/tmp/take1_denoised.wav")
        );
        assert_eq!(
            denoised_path(Path::new("rec.wav")),
            PathBuf::from("rec_denoised.wav")
        );
    }
}
