//! Playback configuration.

use std::fmt;
use std::path::PathBuf;

use wb_audio::{AudioError, AudioSink, CpalSink, SinkConfig, WavFileSink};
use wb_engine::Balance;

/// Where balanced samples go.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputTarget {
    /// The host's default output device.
    #[default]
    Default,
    /// A cpal output device, by name.
    Device(String),
    /// Render into a WAV file instead of playing.
    WavFile(PathBuf),
}

impl OutputTarget {
    /// Open a sink for this target with the requested layout.
    pub fn open(&self, request: &SinkConfig) -> Result<Box<dyn AudioSink>, AudioError> {
        Ok(match self {
            OutputTarget::Default => Box::new(CpalSink::open(None, request)?),
            OutputTarget::Device(name) => Box::new(CpalSink::open(Some(name), request)?),
            OutputTarget::WavFile(path) => Box::new(WavFileSink::create(path, request)?),
        })
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputTarget::Default => write!(f, "default device"),
            OutputTarget::Device(name) => write!(f, "device {:?}", name),
            OutputTarget::WavFile(path) => write!(f, "file {}", path.display()),
        }
    }
}

/// Everything one playback needs.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackConfig {
    pub path: PathBuf,
    pub balance: Balance,
    pub output: OutputTarget,
}

impl PlaybackConfig {
    /// Play `path` centered on the default device.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            balance: Balance::default(),
            output: OutputTarget::default(),
        }
    }

    pub fn with_balance(mut self, balance: Balance) -> Self {
        self.balance = balance;
        self
    }

    pub fn with_output(mut self, output: OutputTarget) -> Self {
        self.output = output;
        self
    }
}
