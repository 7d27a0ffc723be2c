//! Shared command-line surface for the three binaries.
//!
//! Flag parsing is phase 1 of configuration: it produces plain values with
//! no device knowledge. `StreamConfig::resolve` is phase 2.

use std::io::{self, BufRead};

use clap::Args;

use crate::audio::device::{DeviceDescriptor, DeviceQuery};

/// Device selection for the duplex tools.
#[derive(Args, Debug)]
pub struct DuplexDeviceArgs {
    /// Input device (numeric id or name substring)
    #[arg(short = 'i', long, value_name = "ID_OR_NAME")]
    pub input_device: Option<DeviceQuery>,

    /// Output device (numeric id or name substring)
    #[arg(short = 'o', long, value_name = "ID_OR_NAME")]
    pub output_device: Option<DeviceQuery>,
}

/// Stream parameters shared by all tools.
#[derive(Args, Debug)]
pub struct StreamArgs {
    /// Number of channels (default: the input device's maximum)
    #[arg(short = 'c', long)]
    pub channels: Option<u16>,

    /// Sampling rate in Hz
    #[arg(long, value_name = "HZ")]
    pub samplerate: Option<u32>,

    /// Block size in frames
    #[arg(long, value_name = "FRAMES")]
    pub blocksize: Option<u32>,

    /// Latency hint in seconds, used to derive the block size
    #[arg(long, value_name = "SECONDS")]
    pub latency: Option<f64>,
}

/// Print the enumerated device table, `--list-devices` style.
pub fn print_device_table(devices: &[DeviceDescriptor]) {
    for device in devices {
        let default_mark = match (device.default_input, device.default_output) {
            (true, true) => "*",
            (true, false) => ">",
            (false, true) => "<",
            (false, false) => " ",
        };
        println!(
            "{default_mark}{:>3}  {:<40} ({} in, {} out) {} Hz",
            device.index,
            device.name,
            device.max_input_channels,
            device.max_output_channels,
            device.default_sample_rate
        );
    }
}

/// Block until the user presses Enter.
pub fn wait_for_enter() -> io::Result<()> {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(())
}
