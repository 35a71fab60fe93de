//! The read/scale/write playback loop.

use std::fs::File;
use std::io::{BufReader, Read};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, error, info, trace, warn};
use wb_audio::{AudioError, AudioSink, SinkConfig};
use wb_engine::{BalanceGains, SampleBuffer};

use crate::config::PlaybackConfig;
use crate::error::PlayerError;

/// What one playback did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaybackReport {
    /// Chunks read and written.
    pub chunks: usize,
    pub frames_read: u64,
    pub frames_written: u64,
    /// Rate declared by the file.
    pub requested_rate: u32,
    /// Rate the sink actually ran at.
    pub device_rate: u32,
    /// Stopped by the cancellation flag before the data ran out.
    pub cancelled: bool,
}

/// Play `config.path` to `config.output`, blocking until done.
///
/// Failures are logged before being returned. The file and sink are
/// released on every path out of this function.
pub fn play_audio(config: &PlaybackConfig) -> Result<PlaybackReport, PlayerError> {
    let stop = AtomicBool::new(false);
    play_with(config, |request| config.output.open(request), &stop)
}

/// [`play_audio`] with an injected sink factory and cancellation flag.
///
/// `open_sink` is only called once the file has been opened and its header
/// validated. `stop` is checked before every chunk.
pub fn play_with<S, F>(
    config: &PlaybackConfig,
    open_sink: F,
    stop: &AtomicBool,
) -> Result<PlaybackReport, PlayerError>
where
    S: AudioSink,
    F: FnOnce(&SinkConfig) -> Result<S, AudioError>,
{
    info!(
        path = %config.path.display(),
        balance = %config.balance,
        output = %config.output,
        "playback started"
    );

    let result = run(config, open_sink, stop);
    match &result {
        Ok(report) if report.cancelled => {
            info!(frames = report.frames_written, "playback cancelled")
        }
        Ok(report) => info!(
            frames = report.frames_written,
            chunks = report.chunks,
            "playback finished"
        ),
        Err(e) => error!(path = %config.path.display(), "playback aborted: {}", e),
    }
    result
}

fn run<S, F>(
    config: &PlaybackConfig,
    open_sink: F,
    stop: &AtomicBool,
) -> Result<PlaybackReport, PlayerError>
where
    S: AudioSink,
    F: FnOnce(&SinkConfig) -> Result<S, AudioError>,
{
    let file = File::open(&config.path).map_err(|source| PlayerError::Open {
        path: config.path.clone(),
        source,
    })?;
    let mut reader = BufReader::new(file);
    let info = wb_format::read_header(&mut reader)?;
    let header = info.header;
    debug!(
        channels = header.num_channels,
        rate = header.sample_rate,
        block_align = header.block_align,
        data_len = info.data_len,
        "parsed header"
    );

    let request = SinkConfig::from(&header);
    let mut sink = open_sink(&request)?;
    if sink.sample_rate() != request.sample_rate {
        warn!(
            file_rate = request.sample_rate,
            device_rate = sink.sample_rate(),
            "device runs at a different rate, playback speed will be off"
        );
    }

    let mut data = reader.take(info.data_len);
    let mut report = stream_samples(
        &mut data,
        header.num_channels,
        &mut sink,
        config.balance.gains(),
        stop,
    )?;
    report.requested_rate = request.sample_rate;
    report.device_rate = sink.sample_rate();

    if !report.cancelled {
        sink.drain()?;
    }
    Ok(report)
}

/// Pump interleaved 16-bit sample data from `reader` into `sink`, one chunk
/// at a time, scaling each chunk by `gains`.
///
/// Each write carries exactly the frames refreshed by the preceding read.
/// The first sink error ends the loop.
pub fn stream_samples<R, S>(
    reader: &mut R,
    channels: u16,
    sink: &mut S,
    gains: BalanceGains,
    stop: &AtomicBool,
) -> Result<PlaybackReport, PlayerError>
where
    R: Read + ?Sized,
    S: AudioSink + ?Sized,
{
    let mut buffer = SampleBuffer::new(channels);
    let mut report = PlaybackReport::default();

    loop {
        if stop.load(Ordering::Relaxed) {
            report.cancelled = true;
            break;
        }

        let frames = buffer.fill(reader).map_err(PlayerError::Read)?;
        if frames == 0 {
            break;
        }

        gains.apply(buffer.samples_mut(), channels);
        let written = sink.write(buffer.samples())?;
        trace!(chunk = report.chunks, frames, written, "chunk written");

        report.chunks += 1;
        report.frames_read += frames as u64;
        report.frames_written += written as u64;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use wb_audio::{MemorySink, Recording};
    use wb_engine::{Balance, CHUNK_BYTES};

    fn pcm(samples: &[i16]) -> Cursor<Vec<u8>> {
        Cursor::new(samples.iter().flat_map(|s| s.to_le_bytes()).collect())
    }

    fn stereo_sink(recording: &Recording) -> MemorySink {
        let config = SinkConfig {
            channels: 2,
            sample_rate: 44100,
        };
        MemorySink::new(&config, recording.clone())
    }

    #[test]
    fn full_stereo_chunks_are_256_frames() {
        let samples: Vec<i16> = (0..1200).map(|i| i as i16).collect();
        let recording = Recording::new();
        let mut sink = stereo_sink(&recording);

        let report = stream_samples(
            &mut pcm(&samples),
            2,
            &mut sink,
            Balance::new(1.0).unwrap().gains(),
            &AtomicBool::new(false),
        )
        .unwrap();

        assert_eq!(CHUNK_BYTES / 4, 256);
        assert_eq!(recording.write_calls(), vec![256, 256, 88]);
        assert_eq!(report.chunks, 3);
        assert_eq!(report.frames_read, 600);
        assert_eq!(report.frames_written, 600);
    }

    #[test]
    fn gains_are_applied_per_channel() {
        let recording = Recording::new();
        let mut sink = stereo_sink(&recording);
        stream_samples(
            &mut pcm(&[1000, 1000, -2000, -2000]),
            2,
            &mut sink,
            Balance::new(0.0).unwrap().gains(),
            &AtomicBool::new(false),
        )
        .unwrap();
        assert_eq!(recording.samples(), vec![0, 1000, 0, -2000]);
    }

    #[test]
    fn empty_input_writes_nothing() {
        let recording = Recording::new();
        let mut sink = stereo_sink(&recording);
        let report = stream_samples(
            &mut pcm(&[]),
            2,
            &mut sink,
            Balance::CENTER.gains(),
            &AtomicBool::new(false),
        )
        .unwrap();
        assert_eq!(report, PlaybackReport::default());
        assert!(recording.write_calls().is_empty());
    }

    #[test]
    fn raised_stop_flag_writes_nothing() {
        let recording = Recording::new();
        let mut sink = stereo_sink(&recording);
        let report = stream_samples(
            &mut pcm(&[1; 4096]),
            2,
            &mut sink,
            Balance::CENTER.gains(),
            &AtomicBool::new(true),
        )
        .unwrap();
        assert!(report.cancelled);
        assert_eq!(report.chunks, 0);
        assert!(recording.write_calls().is_empty());
    }

    #[test]
    fn sink_error_aborts_after_failing_write() {
        let recording = Recording::new();
        let mut sink = stereo_sink(&recording).fail_after(2);
        let result = stream_samples(
            &mut pcm(&[7; 4096]),
            2,
            &mut sink,
            Balance::CENTER.gains(),
            &AtomicBool::new(false),
        );
        assert!(matches!(result, Err(PlayerError::Audio(AudioError::Playback(_)))));
        assert_eq!(recording.write_calls(), vec![256, 256]);
    }
}
