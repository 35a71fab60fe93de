//! WAV format support for wavbalance.
//!
//! Decodes the RIFF/WAVE header of 16-bit PCM files and writes canonical
//! PCM WAV files.

mod wav_format;

pub use wav_format::{read_header, samples_to_wav, write_wav, WavHeader, WavInfo, WavWriter};

/// Error type for format parsing.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// Magic bytes did not match where a tag was expected
    #[error("bad magic bytes at offset {offset}")]
    BadMagic { offset: u64 },
    /// Structurally readable but inconsistent header
    #[error("invalid header: {0}")]
    InvalidHeader(&'static str),
    /// Valid WAV, but not a layout we can play
    #[error("unsupported format: {0}")]
    Unsupported(String),
    /// Sample data no longer fits a 32-bit RIFF size field
    #[error("data chunk would exceed {max} bytes")]
    DataTooLarge { max: u32 },
    /// File ended inside the header
    #[error("unexpected end of file")]
    UnexpectedEof,
    /// I/O error
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// Any other decoder failure
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<binrw::Error> for FormatError {
    fn from(err: binrw::Error) -> Self {
        if err.is_eof() {
            return FormatError::UnexpectedEof;
        }
        match err {
            binrw::Error::Io(e) => FormatError::Io(e),
            binrw::Error::BadMagic { pos, .. } => FormatError::BadMagic { offset: pos },
            binrw::Error::Backtrace(bt) => FormatError::from(*bt.error),
            other => FormatError::Decode(other.to_string()),
        }
    }
}
