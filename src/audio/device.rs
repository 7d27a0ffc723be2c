//! Audio device enumeration and selection

use std::convert::Infallible;
use std::str::FromStr;

use cpal::traits::{DeviceTrait, HostTrait};

use super::error::AudioError;

/// Stream direction a device is selected for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    fn noun(self) -> &'static str {
        match self {
            Direction::Input => "input",
            Direction::Output => "output",
        }
    }
}

/// Immutable description of one enumerated device.
#[derive(Clone, Debug)]
pub struct DeviceDescriptor {
    /// Position in the enumeration order, used as the numeric device id.
    pub index: usize,
    pub name: String,
    pub max_input_channels: u16,
    pub max_output_channels: u16,
    pub default_sample_rate: u32,
    pub default_input: bool,
    pub default_output: bool,
}

impl DeviceDescriptor {
    fn usable_for(&self, direction: Direction) -> bool {
        match direction {
            Direction::Input => self.max_input_channels > 0,
            Direction::Output => self.max_output_channels > 0,
        }
    }

    fn is_default_for(&self, direction: Direction) -> bool {
        match direction {
            Direction::Input => self.default_input,
            Direction::Output => self.default_output,
        }
    }
}

/// A device request from the command line: numeric index or name substring.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeviceQuery {
    Index(usize),
    Name(String),
}

impl FromStr for DeviceQuery {
    type Err = Infallible;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.parse::<usize>() {
            Ok(index) => Ok(DeviceQuery::Index(index)),
            Err(_) => Ok(DeviceQuery::Name(text.to_string())),
        }
    }
}

/// A resolved device: the descriptor plus the live cpal handle.
pub struct SelectedDevice {
    pub descriptor: DeviceDescriptor,
    pub device: cpal::Device,
}

fn max_channels<I>(configs: Result<I, cpal::SupportedStreamConfigsError>) -> u16
where
    I: Iterator<Item = cpal::SupportedStreamConfigRange>,
{
    configs
        .map(|iter| iter.map(|c| c.channels()).max().unwrap_or(0))
        .unwrap_or(0)
}

fn describe(
    device: &cpal::Device,
    index: usize,
    default_input_name: Option<&String>,
    default_output_name: Option<&String>,
) -> Option<DeviceDescriptor> {
    let name = device.name().ok()?;
    let max_input_channels = max_channels(device.supported_input_configs());
    let max_output_channels = max_channels(device.supported_output_configs());

    let default_sample_rate = if max_input_channels > 0 {
        device.default_input_config().ok().map(|c| c.sample_rate().0)
    } else {
        device.default_output_config().ok().map(|c| c.sample_rate().0)
    }
    .unwrap_or(0);

    Some(DeviceDescriptor {
        index,
        default_input: default_input_name == Some(&name),
        default_output: default_output_name == Some(&name),
        name,
        max_input_channels,
        max_output_channels,
        default_sample_rate,
    })
}

/// List all audio devices the host exposes, in enumeration order.
pub fn enumerate_devices() -> Result<Vec<DeviceDescriptor>, AudioError> {
    let host = cpal::default_host();
    let default_input_name = host.default_input_device().and_then(|d| d.name().ok());
    let default_output_name = host.default_output_device().and_then(|d| d.name().ok());

    let devices = host
        .devices()
        .map_err(|e| AudioError::StreamOpen(format!("failed to enumerate devices: {e}")))?
        .enumerate()
        .filter_map(|(index, device)| {
            describe(
                &device,
                index,
                default_input_name.as_ref(),
                default_output_name.as_ref(),
            )
        })
        .collect();

    Ok(devices)
}

/// Resolve a query against an enumerated device list. Pure so it can be
/// tested against synthetic descriptor lists.
///
/// An index must name a device usable in the requested direction. A name
/// substring (case-insensitive) must match exactly one such device; zero
/// matches fail with `DeviceNotFound`, several with `AmbiguousDevice`.
/// No query resolves the host default for the direction.
pub fn resolve_query(
    devices: &[DeviceDescriptor],
    query: Option<&DeviceQuery>,
    direction: Direction,
) -> Result<usize, AudioError> {
    match query {
        Some(DeviceQuery::Index(index)) => {
            let descriptor = devices
                .iter()
                .find(|d| d.index == *index && d.usable_for(direction))
                .ok_or_else(|| {
                    AudioError::DeviceNotFound(format!(
                        "no {} device with index {index}",
                        direction.noun()
                    ))
                })?;
            Ok(descriptor.index)
        }
        Some(DeviceQuery::Name(needle)) => {
            let lowered = needle.to_lowercase();
            let matches: Vec<&DeviceDescriptor> = devices
                .iter()
                .filter(|d| d.usable_for(direction) && d.name.to_lowercase().contains(&lowered))
                .collect();
            match matches.as_slice() {
                [] => Err(AudioError::DeviceNotFound(format!(
                    "no {} device matching '{needle}'",
                    direction.noun()
                ))),
                [single] => Ok(single.index),
                several => {
                    let names: Vec<&str> = several.iter().map(|d| d.name.as_str()).collect();
                    Err(AudioError::AmbiguousDevice(format!(
                        "'{needle}' matches {} {} devices: {}",
                        several.len(),
                        direction.noun(),
                        names.join(", ")
                    )))
                }
            }
        }
        None => devices
            .iter()
            .find(|d| d.is_default_for(direction))
            .map(|d| d.index)
            .ok_or_else(|| {
                AudioError::DeviceNotFound(format!(
                    "no default {} device available",
                    direction.noun()
                ))
            }),
    }
}

/// Resolve a query to a live device handle.
pub fn select_device(
    query: Option<&DeviceQuery>,
    direction: Direction,
) -> Result<SelectedDevice, AudioError> {
    let descriptors = enumerate_devices()?;
    let index = resolve_query(&descriptors, query, direction)?;
    let descriptor = descriptors
        .into_iter()
        .find(|d| d.index == index)
        .expect("resolved index comes from the descriptor list");

    let host = cpal::default_host();
    let device = host
        .devices()
        .map_err(|e| AudioError::StreamOpen(format!("failed to enumerate devices: {e}")))?
        .nth(index)
        .ok_or_else(|| {
            AudioError::DeviceNotFound(format!(
                "{} device {index} disappeared during selection",
                direction.noun()
            ))
        })?;

    Ok(SelectedDevice { descriptor, device })
}
