//! CPAL-based audio sink.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{
    BufferSize, Device, FromSample, Sample, SampleFormat, SampleRate, SizedSample, Stream,
    StreamConfig, SupportedStreamConfigRange,
};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::traits::{AudioError, AudioSink, SinkConfig};

/// How long `write` and `drain` wait on a device that consumes nothing.
const STALL_TIMEOUT: Duration = Duration::from_secs(2);
const POLL_INTERVAL: Duration = Duration::from_millis(1);

type ErrorSlot = Arc<Mutex<Option<String>>>;

/// Output stream on a cpal device, fed through a ring buffer.
pub struct CpalSink {
    stream: Stream,
    producer: HeapProd<i16>,
    config: StreamConfig,
    stream_error: ErrorSlot,
    /// Samples handed to the producer so far.
    queued: u64,
    /// Samples the device callback has taken so far.
    played: Arc<AtomicU64>,
}

impl CpalSink {
    /// Open the named output device, or the host default for `None` or
    /// `"default"`, at the supported rate nearest the requested one.
    pub fn open(device_name: Option<&str>, request: &SinkConfig) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = select_device(&host, device_name)?;
        let (config, format) = negotiate(&device, request)?;

        tracing::debug!(
            device = %device.name().unwrap_or_else(|_| "<unnamed>".into()),
            ?format,
            rate = config.sample_rate.0,
            channels = config.channels,
            "opening output stream"
        );

        // Ring buffer for about 100ms of audio
        let capacity = (config.sample_rate.0 as usize / 10).max(1) * config.channels as usize;
        let (producer, consumer) = HeapRb::<i16>::new(capacity).split();
        let stream_error: ErrorSlot = Arc::new(Mutex::new(None));
        let played = Arc::new(AtomicU64::new(0));
        let feed = Feed {
            consumer,
            played: played.clone(),
            stream_error: stream_error.clone(),
        };

        let stream = match format {
            SampleFormat::I16 => build_stream::<i16>(&device, &config, feed)?,
            SampleFormat::F32 => build_stream::<f32>(&device, &config, feed)?,
            SampleFormat::U16 => build_stream::<u16>(&device, &config, feed)?,
            other => {
                return Err(AudioError::StreamCreate(format!(
                    "unsupported sample format {:?}",
                    other
                )))
            }
        };
        stream.play().map_err(|e| AudioError::Playback(e.to_string()))?;

        Ok(Self {
            stream,
            producer,
            config,
            stream_error,
            queued: 0,
            played,
        })
    }

    fn check_stream(&self) -> Result<(), AudioError> {
        let slot = self.stream_error.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            Some(msg) => Err(AudioError::Playback(msg.clone())),
            None => Ok(()),
        }
    }
}

impl AudioSink for CpalSink {
    fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    fn channels(&self) -> u16 {
        self.config.channels
    }

    fn write(&mut self, samples: &[i16]) -> Result<usize, AudioError> {
        let mut remaining = samples;
        let mut last_progress = Instant::now();
        while !remaining.is_empty() {
            self.check_stream()?;
            let pushed = self.producer.push_slice(remaining);
            if pushed > 0 {
                remaining = &remaining[pushed..];
                self.queued += pushed as u64;
                last_progress = Instant::now();
            } else if last_progress.elapsed() > STALL_TIMEOUT {
                return Err(AudioError::Stalled);
            } else {
                std::thread::sleep(POLL_INTERVAL);
            }
        }
        Ok(samples.len() / self.config.channels as usize)
    }

    fn drain(&mut self) -> Result<(), AudioError> {
        let mut played = self.played.load(Ordering::Acquire);
        let mut last_progress = Instant::now();
        while played < self.queued {
            self.check_stream()?;
            let now_played = self.played.load(Ordering::Acquire);
            if now_played > played {
                played = now_played;
                last_progress = Instant::now();
            } else if last_progress.elapsed() > STALL_TIMEOUT {
                return Err(AudioError::Stalled);
            }
            std::thread::sleep(POLL_INTERVAL);
        }
        Ok(())
    }
}

impl Drop for CpalSink {
    fn drop(&mut self) {
        if let Err(e) = self.stream.pause() {
            tracing::debug!("failed to pause output stream: {}", e);
        }
        tracing::debug!("output stream closed");
    }
}

fn select_device(host: &cpal::Host, name: Option<&str>) -> Result<Device, AudioError> {
    match name {
        None | Some("default") => host.default_output_device().ok_or(AudioError::NoDevice),
        Some(wanted) => host
            .output_devices()
            .map_err(|e| AudioError::DeviceInit(e.to_string()))?
            .find(|d| d.name().is_ok_and(|n| n == wanted))
            .ok_or_else(|| AudioError::DeviceNotFound(wanted.to_string())),
    }
}

/// Pick the config range whose rates come closest to the request, then
/// clamp the requested rate into it. The device may therefore run at a
/// different rate than the file; no conversion is done.
fn negotiate(
    device: &Device,
    request: &SinkConfig,
) -> Result<(StreamConfig, SampleFormat), AudioError> {
    let ranges = device
        .supported_output_configs()
        .map_err(|e| AudioError::DeviceInit(e.to_string()))?;

    let range = best_range(ranges, request).ok_or(AudioError::UnsupportedConfig {
        channels: request.channels,
        sample_rate: request.sample_rate,
    })?;

    let rate = nearest_rate(
        range.min_sample_rate().0,
        range.max_sample_rate().0,
        request.sample_rate,
    );
    let config = StreamConfig {
        channels: request.channels,
        sample_rate: SampleRate(rate),
        buffer_size: BufferSize::Default,
    };
    Ok((config, range.sample_format()))
}

fn best_range(
    ranges: impl IntoIterator<Item = SupportedStreamConfigRange>,
    request: &SinkConfig,
) -> Option<SupportedStreamConfigRange> {
    ranges
        .into_iter()
        .filter(|r| r.channels() == request.channels)
        .filter_map(|r| format_rank(r.sample_format()).map(|rank| (r, rank)))
        .min_by_key(|(r, rank)| {
            let rate = nearest_rate(
                r.min_sample_rate().0,
                r.max_sample_rate().0,
                request.sample_rate,
            );
            (rate.abs_diff(request.sample_rate), *rank)
        })
        .map(|(r, _)| r)
}

/// Preference order among formats we can convert 16-bit samples into.
fn format_rank(format: SampleFormat) -> Option<u8> {
    match format {
        SampleFormat::I16 => Some(0),
        SampleFormat::F32 => Some(1),
        SampleFormat::U16 => Some(2),
        _ => None,
    }
}

fn nearest_rate(min: u32, max: u32, wanted: u32) -> u32 {
    wanted.max(min).min(max.max(min))
}

/// State moved into the device callback.
struct Feed {
    consumer: HeapCons<i16>,
    played: Arc<AtomicU64>,
    stream_error: ErrorSlot,
}

fn build_stream<T>(device: &Device, config: &StreamConfig, feed: Feed) -> Result<Stream, AudioError>
where
    T: SizedSample + FromSample<i16>,
{
    let Feed {
        mut consumer,
        played,
        stream_error,
    } = feed;

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let mut popped = 0u64;
                for sample in data.iter_mut() {
                    *sample = match consumer.try_pop() {
                        Some(value) => {
                            popped += 1;
                            T::from_sample(value)
                        }
                        // Underrun
                        None => T::EQUILIBRIUM,
                    };
                }
                played.fetch_add(popped, Ordering::Release);
            },
            move |err| {
                tracing::error!("audio stream error: {}", err);
                let mut slot = stream_error.lock().unwrap_or_else(PoisonError::into_inner);
                slot.get_or_insert_with(|| err.to_string());
            },
            None,
        )
        .map_err(|e| AudioError::StreamCreate(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpal::SupportedBufferSize;

    fn range(channels: u16, min: u32, max: u32, format: SampleFormat) -> SupportedStreamConfigRange {
        SupportedStreamConfigRange::new(
            channels,
            SampleRate(min),
            SampleRate(max),
            SupportedBufferSize::Unknown,
            format,
        )
    }

    fn request(channels: u16, sample_rate: u32) -> SinkConfig {
        SinkConfig { channels, sample_rate }
    }

    #[test]
    fn nearest_rate_clamps_into_range() {
        assert_eq!(nearest_rate(8000, 48000, 44100), 44100);
        assert_eq!(nearest_rate(48000, 48000, 44100), 48000);
        assert_eq!(nearest_rate(8000, 22050, 44100), 22050);
        assert_eq!(nearest_rate(48000, 8000, 44100), 48000);
    }

    #[test]
    fn range_with_exact_rate_wins() {
        let ranges = vec![
            range(2, 48000, 48000, SampleFormat::I16),
            range(2, 44100, 44100, SampleFormat::F32),
        ];
        let best = best_range(ranges, &request(2, 44100)).unwrap();
        assert_eq!(best.sample_format(), SampleFormat::F32);
    }

    #[test]
    fn ties_prefer_native_16_bit() {
        let ranges = vec![
            range(2, 8000, 96000, SampleFormat::F32),
            range(2, 8000, 96000, SampleFormat::I16),
            range(2, 8000, 96000, SampleFormat::U16),
        ];
        let best = best_range(ranges, &request(2, 44100)).unwrap();
        assert_eq!(best.sample_format(), SampleFormat::I16);
    }

    #[test]
    fn channel_count_must_match() {
        let ranges = vec![range(2, 8000, 96000, SampleFormat::I16)];
        assert!(best_range(ranges, &request(1, 44100)).is_none());
    }

    #[test]
    fn unconvertible_formats_skipped() {
        let ranges = vec![
            range(1, 44100, 44100, SampleFormat::I32),
            range(1, 48000, 48000, SampleFormat::I16),
        ];
        let best = best_range(ranges, &request(1, 44100)).unwrap();
        assert_eq!(best.sample_format(), SampleFormat::I16);
        assert_eq!(best.max_sample_rate(), SampleRate(48000));
    }
}
