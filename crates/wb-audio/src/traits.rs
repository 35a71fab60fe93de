//! Audio sink trait and error types.

use wb_format::{FormatError, WavHeader};

/// Error type for audio operations.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    /// No default output device on this host
    #[error("no audio output device available")]
    NoDevice,
    /// Named output device does not exist
    #[error("audio device not found: {0}")]
    DeviceNotFound(String),
    /// Device offers no configuration for the requested layout
    #[error("device cannot play {channels} channel(s) near {sample_rate} Hz")]
    UnsupportedConfig { channels: u16, sample_rate: u32 },
    /// Failed to query or initialize the device
    #[error("device init error: {0}")]
    DeviceInit(String),
    /// Failed to create the output stream
    #[error("stream create error: {0}")]
    StreamCreate(String),
    /// Device reported an error while playing
    #[error("playback error: {0}")]
    Playback(String),
    /// Device stopped consuming samples
    #[error("device stopped consuming audio")]
    Stalled,
    /// Writing a file-backed sink failed
    #[error("output file error: {0}")]
    Io(#[from] FormatError),
}

/// Layout requested when opening a sink. Samples are always interleaved
/// signed 16-bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SinkConfig {
    pub channels: u16,
    pub sample_rate: u32,
}

impl From<&WavHeader> for SinkConfig {
    fn from(header: &WavHeader) -> Self {
        Self {
            channels: header.num_channels,
            sample_rate: header.sample_rate,
        }
    }
}

/// An open audio output.
///
/// A sink is released when dropped.
pub trait AudioSink {
    /// Rate the output actually runs at. May differ from the requested rate.
    fn sample_rate(&self) -> u32;

    fn channels(&self) -> u16;

    /// Queue interleaved samples, blocking until all are accepted.
    /// Returns the number of frames written.
    fn write(&mut self, samples: &[i16]) -> Result<usize, AudioError>;

    /// Block until queued audio has been played out.
    fn drain(&mut self) -> Result<(), AudioError> {
        Ok(())
    }
}

impl<S: AudioSink + ?Sized> AudioSink for Box<S> {
    fn sample_rate(&self) -> u32 {
        (**self).sample_rate()
    }

    fn channels(&self) -> u16 {
        (**self).channels()
    }

    fn write(&mut self, samples: &[i16]) -> Result<usize, AudioError> {
        (**self).write(samples)
    }

    fn drain(&mut self) -> Result<(), AudioError> {
        (**self).drain()
    }
}
