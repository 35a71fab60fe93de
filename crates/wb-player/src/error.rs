//! Playback error type.

use std::io;
use std::path::PathBuf;

use wb_audio::AudioError;
use wb_format::FormatError;

/// Why a playback attempt was aborted.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    /// The WAV file could not be opened
    #[error("cannot open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The header is malformed or describes an unplayable layout
    #[error("bad WAV header: {0}")]
    Format(#[from] FormatError),
    /// Opening or writing to the sink failed
    #[error("audio output failed: {0}")]
    Audio(#[from] AudioError),
    /// Reading sample data failed mid-stream
    #[error("cannot read sample data: {0}")]
    Read(#[source] io::Error),
    /// The background playback thread panicked
    #[error("playback thread panicked")]
    Panicked,
}
