//! Playback for wavbalance.
//!
//! [`play_audio`] plays one file synchronously. [`Player`] runs the same
//! routine on a background thread so it can be cancelled between chunks.

mod config;
mod error;
mod playback;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

// Re-export common types so callers don't need the lower crates directly.
pub use wb_audio::{AudioError, AudioSink, SinkConfig};
pub use wb_engine::{Balance, BalanceError};
pub use wb_format::FormatError;

pub use config::{OutputTarget, PlaybackConfig};
pub use error::PlayerError;
pub use playback::{play_audio, play_with, stream_samples, PlaybackReport};

type PlaybackResult = Result<PlaybackReport, PlayerError>;

/// Owns at most one background playback at a time.
pub struct Player {
    playback: Option<PlaybackHandle>,
}

struct PlaybackHandle {
    stop_signal: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    thread: Option<JoinHandle<PlaybackResult>>,
}

impl PlaybackHandle {
    fn join(&mut self) -> Option<PlaybackResult> {
        let thread = self.thread.take()?;
        Some(thread.join().unwrap_or(Err(PlayerError::Panicked)))
    }
}

impl Player {
    pub fn new() -> Self {
        Self { playback: None }
    }

    /// Start playing to the configured output. Any playback in flight is
    /// stopped first.
    pub fn play(&mut self, config: PlaybackConfig) {
        let output = config.output.clone();
        self.play_with(config, move |request| output.open(request));
    }

    /// Start playing into a sink built by `open_sink`. The sink is created
    /// and dropped on the playback thread.
    pub fn play_with<S, F>(&mut self, config: PlaybackConfig, open_sink: F)
    where
        S: AudioSink + 'static,
        F: FnOnce(&SinkConfig) -> Result<S, AudioError> + Send + 'static,
    {
        self.stop();

        let stop_signal = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));

        let stop = stop_signal.clone();
        let done = finished.clone();

        let thread = std::thread::spawn(move || {
            let result = playback::play_with(&config, open_sink, &stop);
            done.store(true, Ordering::Release);
            result
        });

        self.playback = Some(PlaybackHandle {
            stop_signal,
            finished,
            thread: Some(thread),
        });
    }

    /// Cancel the current playback and wait for its thread. Returns its
    /// outcome, or `None` if nothing was playing.
    pub fn stop(&mut self) -> Option<PlaybackResult> {
        let mut pb = self.playback.take()?;
        pb.stop_signal.store(true, Ordering::Relaxed);
        pb.join()
    }

    /// Wait for the current playback to end on its own.
    pub fn wait(&mut self) -> Option<PlaybackResult> {
        self.playback.take()?.join()
    }

    pub fn is_playing(&self) -> bool {
        self.playback
            .as_ref()
            .is_some_and(|p| !p.finished.load(Ordering::Acquire))
    }

    pub fn is_finished(&self) -> bool {
        self.playback
            .as_ref()
            .is_some_and(|p| p.finished.load(Ordering::Acquire))
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.stop();
    }
}
