//! Live high-frequency boost from an input device to an output device.

use clap::Parser;

use clearmic::audio::config::StreamConfig;
use clearmic::audio::device::{enumerate_devices, select_device, Direction};
use clearmic::audio::engine::StreamEngine;
use clearmic::audio::error::AudioError;
use clearmic::cli::{self, DuplexDeviceArgs, StreamArgs};
use clearmic::dsp::boost::HighFrequencyBoost;

const DEFAULT_SAMPLE_RATE: u32 = 44_100;

#[derive(Parser, Debug)]
#[command(
    name = "freq-boost",
    about = "Stream audio with the high frequencies boosted"
)]
struct Cli {
    /// Show the list of audio devices and exit
    #[arg(short = 'l', long)]
    list_devices: bool,

    #[command(flatten)]
    devices: DuplexDeviceArgs,

    #[command(flatten)]
    stream: StreamArgs,

    /// Frequency in Hz above which to boost
    #[arg(long, value_name = "HZ", default_value_t = 2000.0)]
    cutoff: f64,

    /// Linear amplification factor for the boosted band
    #[arg(long, default_value_t = 2.0)]
    gain: f64,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("{}: {err}", err.kind());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), AudioError> {
    if cli.list_devices {
        cli::print_device_table(&enumerate_devices()?);
        return Ok(());
    }

    let input = select_device(cli.devices.input_device.as_ref(), Direction::Input)?;
    let output = select_device(cli.devices.output_device.as_ref(), Direction::Output)?;
    let config = StreamConfig::resolve(
        &input.descriptor,
        Some(&output.descriptor),
        &cli.stream,
        Some(DEFAULT_SAMPLE_RATE),
    )?;

    println!(
        "input:  [{}] {} ({} channels max)",
        input.descriptor.index, input.descriptor.name, input.descriptor.max_input_channels
    );
    println!(
        "output: [{}] {}",
        output.descriptor.index, output.descriptor.name
    );

    let boost = HighFrequencyBoost::new(config.channels, cli.cutoff, cli.gain, config.sample_rate)?;
    let mut engine = StreamEngine::start(&config, &input.device, &output.device, Box::new(boost))?;

    println!(
        "boosting above {} Hz by {}x at {} Hz; press Enter to quit",
        cli.cutoff, cli.gain, config.sample_rate
    );
    cli::wait_for_enter()?;

    engine.stop()?;
    Ok(())
}
