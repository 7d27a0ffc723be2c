//! Digital Signal Processing components

pub mod biquad;
pub mod boost;
pub mod denoise;

pub use biquad::Biquad;
pub use boost::HighFrequencyBoost;
pub use denoise::{ChannelDenoiser, LiveDenoiser, DENOISE_FRAME_SIZE, DENOISE_SAMPLE_RATE};

use crate::audio::block::AudioBlock;
use crate::audio::error::AudioError;

/// One processing step applied to each captured block, exactly once and in
/// capture order, on the engine's DSP thread.
pub trait BlockProcessor: Send {
    fn process(&mut self, block: &mut AudioBlock) -> Result<(), AudioError>;
}
