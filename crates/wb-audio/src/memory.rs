//! In-memory sink that records everything written to it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::traits::{AudioError, AudioSink, SinkConfig};

#[derive(Debug, Default)]
struct Captured {
    samples: Vec<i16>,
    writes: Vec<usize>,
    drained: bool,
    closed: bool,
}

/// Shared view of what a [`MemorySink`] received. Clones observe the same
/// capture, so a caller can inspect it after the sink has been dropped.
#[derive(Clone, Debug, Default)]
pub struct Recording(Arc<Mutex<Captured>>);

impl Recording {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every sample written, in order.
    pub fn samples(&self) -> Vec<i16> {
        self.lock().samples.clone()
    }

    /// Frames written by each `write` call.
    pub fn write_calls(&self) -> Vec<usize> {
        self.lock().writes.clone()
    }

    pub fn frames_written(&self) -> usize {
        self.lock().writes.iter().sum()
    }

    pub fn was_drained(&self) -> bool {
        self.lock().drained
    }

    /// True once the sink has been dropped.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, Captured> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Sink that plays nothing and captures writes into a [`Recording`].
///
/// Can stand in for a device that picks another rate, fails mid-stream or
/// plays in real time.
pub struct MemorySink {
    config: SinkConfig,
    device_rate: u32,
    recording: Recording,
    fail_after: Option<usize>,
    write_delay: Duration,
}

impl MemorySink {
    pub fn new(config: &SinkConfig, recording: Recording) -> Self {
        Self {
            config: *config,
            device_rate: config.sample_rate,
            recording,
            fail_after: None,
            write_delay: Duration::ZERO,
        }
    }

    /// Report `rate` as the negotiated device rate.
    pub fn with_device_rate(mut self, rate: u32) -> Self {
        self.device_rate = rate;
        self
    }

    /// Fail every write after `writes` successful ones.
    pub fn fail_after(mut self, writes: usize) -> Self {
        self.fail_after = Some(writes);
        self
    }

    /// Sleep this long in every write.
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = delay;
        self
    }
}

impl AudioSink for MemorySink {
    fn sample_rate(&self) -> u32 {
        self.device_rate
    }

    fn channels(&self) -> u16 {
        self.config.channels
    }

    fn write(&mut self, samples: &[i16]) -> Result<usize, AudioError> {
        if let Some(limit) = self.fail_after {
            if self.recording.lock().writes.len() >= limit {
                return Err(AudioError::Playback("simulated device failure".into()));
            }
        }
        if !self.write_delay.is_zero() {
            std::thread::sleep(self.write_delay);
        }

        let frames = samples.len() / self.config.channels.max(1) as usize;
        let mut captured = self.recording.lock();
        captured.samples.extend_from_slice(samples);
        captured.writes.push(frames);
        Ok(frames)
    }

    fn drain(&mut self) -> Result<(), AudioError> {
        self.recording.lock().drained = true;
        Ok(())
    }
}

impl Drop for MemorySink {
    fn drop(&mut self) {
        self.recording.lock().closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEREO: SinkConfig = SinkConfig {
        channels: 2,
        sample_rate: 44100,
    };

    #[test]
    fn records_writes_and_close() {
        let recording = Recording::new();
        let mut sink = MemorySink::new(&STEREO, recording.clone());
        assert_eq!(sink.write(&[1, 2, 3, 4]).unwrap(), 2);
        assert_eq!(sink.write(&[5, 6]).unwrap(), 1);
        sink.drain().unwrap();
        assert!(!recording.is_closed());
        drop(sink);

        assert_eq!(recording.samples(), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(recording.write_calls(), vec![2, 1]);
        assert_eq!(recording.frames_written(), 3);
        assert!(recording.was_drained());
        assert!(recording.is_closed());
    }

    #[test]
    fn simulated_failure_stops_recording() {
        let recording = Recording::new();
        let mut sink = MemorySink::new(&STEREO, recording.clone()).fail_after(1);
        sink.write(&[1, 1]).unwrap();
        assert!(matches!(sink.write(&[2, 2]), Err(AudioError::Playback(_))));
        assert_eq!(recording.write_calls(), vec![1]);
    }

    #[test]
    fn reports_snapped_rate() {
        let sink = MemorySink::new(&STEREO, Recording::new()).with_device_rate(48000);
        assert_eq!(sink.sample_rate(), 48000);
        assert_eq!(sink.channels(), 2);
    }
}
