//! clearmic - live microphone capture, boost, denoise, and record tools
//!
//! Duplex chain: Input Stream → ring buffer → block processor thread → ring buffer → Output Stream
//! Record chain: Input Stream → bounded block queue → WAV writer thread → offline denoise pass

pub mod audio;
pub mod cli;
pub mod dsp;

// Re-export main types
pub use audio::block::AudioBlock;
pub use audio::config::StreamConfig;
pub use audio::device::{DeviceDescriptor, DeviceQuery, Direction};
pub use audio::engine::{LifecycleState, StreamEngine};
pub use audio::error::AudioError;
pub use audio::recorder::Recorder;
pub use dsp::boost::HighFrequencyBoost;
pub use dsp::denoise::LiveDenoiser;
pub use dsp::BlockProcessor;
