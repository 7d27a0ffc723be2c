//! Audio device access, stream plumbing, and recording

pub mod block;
pub mod buffer;
pub mod clock;
pub mod config;
pub mod device;
pub mod engine;
pub mod error;
pub mod input;
pub mod output;
pub mod recorder;

pub use block::AudioBlock;
pub use buffer::{sample_ring, SampleConsumer, SampleProducer};
pub use config::StreamConfig;
pub use device::{
    enumerate_devices, select_device, DeviceDescriptor, DeviceQuery, Direction, SelectedDevice,
};
pub use engine::{LifecycleState, StreamEngine, StreamStats};
pub use error::AudioError;
pub use input::AudioInput;
pub use output::AudioOutput;
pub use recorder::{Recorder, RecordingSummary};
