//! Sink that renders to a WAV file instead of a device.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use wb_format::{FormatError, WavWriter};

use crate::traits::{AudioError, AudioSink, SinkConfig};

/// Writes balanced samples to a 16-bit PCM WAV file at exactly the
/// requested rate. Chunk sizes are patched on `drain` and on drop.
pub struct WavFileSink {
    writer: WavWriter<BufWriter<File>>,
    path: PathBuf,
}

impl WavFileSink {
    pub fn create(path: impl AsRef<Path>, config: &SinkConfig) -> Result<Self, AudioError> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(FormatError::from)?;
        let writer = WavWriter::new(BufWriter::new(file), config.channels, config.sample_rate)?;
        Ok(Self { writer, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AudioSink for WavFileSink {
    fn sample_rate(&self) -> u32 {
        self.writer.header().sample_rate
    }

    fn channels(&self) -> u16 {
        self.writer.header().num_channels
    }

    fn write(&mut self, samples: &[i16]) -> Result<usize, AudioError> {
        self.writer.write_samples(samples)?;
        Ok(samples.len() / self.channels() as usize)
    }

    fn drain(&mut self) -> Result<(), AudioError> {
        self.writer.update_sizes()?;
        Ok(())
    }
}

impl Drop for WavFileSink {
    fn drop(&mut self) {
        if let Err(e) = self.writer.update_sizes() {
            tracing::warn!("failed to finalize {}: {}", self.path.display(), e);
        }
    }
}
