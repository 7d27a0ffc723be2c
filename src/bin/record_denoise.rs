//! Record from an input device to a WAV file, then denoise the recording.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;

use clearmic::audio::config::StreamConfig;
use clearmic::audio::device::{enumerate_devices, select_device, DeviceQuery, Direction};
use clearmic::audio::error::AudioError;
use clearmic::audio::recorder::Recorder;
use clearmic::cli::{self, StreamArgs};
use clearmic::dsp::denoise::denoise_wav_file;

#[derive(Parser, Debug)]
#[command(
    name = "record-denoise",
    about = "Record audio to a WAV file and write a denoised copy"
)]
struct Cli {
    /// Show the list of audio devices and exit
    #[arg(short = 'l', long)]
    list_devices: bool,

    /// Input device (numeric id or name substring)
    #[arg(short = 'd', long, value_name = "ID_OR_NAME")]
    device: Option<DeviceQuery>,

    #[command(flatten)]
    stream: StreamArgs,

    /// Audio file to store the recording
    #[arg(value_name = "FILENAME")]
    filename: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("{}: {err}", err.kind());
        std::process::exit(1);
    }
}

fn generated_filename() -> PathBuf {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    PathBuf::from(format!("rec_{seconds}.wav"))
}

fn run(cli: Cli) -> Result<(), AudioError> {
    if cli.list_devices {
        cli::print_device_table(&enumerate_devices()?);
        return Ok(());
    }

    let input = select_device(cli.device.as_ref(), Direction::Input)?;
    let config = StreamConfig::resolve(&input.descriptor, None, &cli.stream, None)?;
    let path = cli.filename.unwrap_or_else(generated_filename);

    let recorder = Recorder::start(&config, &input.device, &path)?;
    println!(
        "recording '{}' at {} Hz, {} channel(s) to {}; press Enter to stop",
        recorder.device_name(),
        config.sample_rate,
        config.channels,
        path.display()
    );
    cli::wait_for_enter()?;

    let summary = recorder.stop()?;
    println!(
        "recording finished: {} frames written ({} blocks dropped)",
        summary.frames_written, summary.blocks_dropped
    );

    println!("denoising {} ...", path.display());
    let denoised = denoise_wav_file(&path)?;
    println!("denoised copy saved as {}", denoised.display());

    Ok(())
}
