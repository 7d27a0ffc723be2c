//! Error taxonomy shared by the library and the binaries.
//!
//! Fatal errors bubble to the top of each binary and terminate it with a
//! `kind: message` line. Underruns, overruns, and dropped blocks are status
//! warnings logged in place, never raised.

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("{0}")]
    DeviceNotFound(String),

    #[error("{0}")]
    AmbiguousDevice(String),

    #[error("{0}")]
    StreamOpen(String),

    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Wav(#[from] hound::Error),

    #[error("{0}")]
    Processing(String),
}

impl AudioError {
    /// Stable kind name printed in front of the message on fatal exit.
    pub fn kind(&self) -> &'static str {
        match self {
            AudioError::DeviceNotFound(_) => "DeviceNotFoundError",
            AudioError::AmbiguousDevice(_) => "AmbiguousDeviceError",
            AudioError::StreamOpen(_) => "StreamOpenError",
            AudioError::Io(_) | AudioError::Wav(_) => "IOError",
            AudioError::Processing(_) => "ProcessingError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(
            AudioError::DeviceNotFound("x".into()).kind(),
            "DeviceNotFoundError"
        );
        assert_eq!(
            AudioError::StreamOpen("x".into()).kind(),
            "StreamOpenError"
        );
        let io_err: AudioError = io::Error::new(io::ErrorKind::Other, "x").into();
        assert_eq!(io_err.kind(), "IOError");
    }
}
