//! Real-time noise suppression from an input device to an output device.

use clap::Parser;

use clearmic::audio::config::StreamConfig;
use clearmic::audio::device::{enumerate_devices, select_device, Direction};
use clearmic::audio::engine::StreamEngine;
use clearmic::audio::error::AudioError;
use clearmic::cli::{self, DuplexDeviceArgs, StreamArgs};
use clearmic::dsp::denoise::{LiveDenoiser, DENOISE_SAMPLE_RATE};

#[derive(Parser, Debug)]
#[command(
    name = "denoise-live",
    about = "Stream audio through RNNoise noise suppression"
)]
struct Cli {
    /// Show the list of audio devices and exit
    #[arg(short = 'l', long)]
    list_devices: bool,

    #[command(flatten)]
    devices: DuplexDeviceArgs,

    #[command(flatten)]
    stream: StreamArgs,
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
        Some(DENOISE_SAMPLE_RATE),
    )?;

    println!(
        "input:  [{}] {}",
        input.descriptor.index, input.descriptor.name
    );
    println!(
        "output: [{}] {}",
        output.descriptor.index, output.descriptor.name
    );

    let denoiser = LiveDenoiser::new(config.channels, config.sample_rate)?;
    let mut engine =
        StreamEngine::start(&config, &input.device, &output.device, Box::new(denoiser))?;

    println!(
        "noise suppression active on {} channel(s); press Enter to quit",
        config.channels
    );
    cli::wait_for_enter()?;

    engine.stop()?;
    Ok(())
}
