//! WAV decoding and encoding for 16-bit PCM audio.

use crate::FormatError;
use binrw::{binrw, BinRead, BinWrite};
use std::io::{Cursor, Read, Seek, SeekFrom, Write};

const PCM_FORMAT: u16 = 1;
const FMT_BLOCK_LEN: u32 = 16;
/// Bytes between the end of the RIFF size field and the first sample.
const CANONICAL_RIFF_OVERHEAD: u32 = 36;
/// Largest data chunk whose RIFF size still fits in a `u32`.
const MAX_DATA_LEN: u32 = u32::MAX - CANONICAL_RIFF_OVERHEAD;

#[binrw]
#[brw(little, magic = b"RIFF")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RiffHeader {
    riff_size: u32,
    form_type: [u8; 4],
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChunkHeader {
    id: [u8; 4],
    size: u32,
}

/// The 16-byte PCM block of a `fmt ` chunk.
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub audio_format: u16,
    pub num_channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
}

impl WavHeader {
    /// Header for interleaved signed 16-bit PCM.
    pub fn pcm16(num_channels: u16, sample_rate: u32) -> Result<Self, FormatError> {
        let block_align = num_channels
            .checked_mul(2)
            .ok_or(FormatError::InvalidHeader("block alignment overflows"))?;
        let header = Self {
            audio_format: PCM_FORMAT,
            num_channels,
            sample_rate,
            byte_rate: byte_rate(sample_rate, block_align)?,
            block_align,
            bits_per_sample: 16,
        };
        header.validate()?;
        Ok(header)
    }

    fn validate(&self) -> Result<(), FormatError> {
        if self.audio_format != PCM_FORMAT {
            return Err(FormatError::Unsupported(format!(
                "audio format tag {} (only PCM is playable)",
                self.audio_format
            )));
        }
        if self.bits_per_sample != 16 {
            return Err(FormatError::Unsupported(format!(
                "{} bits per sample (only 16-bit is playable)",
                self.bits_per_sample
            )));
        }
        if !(1..=2).contains(&self.num_channels) {
            return Err(FormatError::Unsupported(format!(
                "{} channels (only mono and stereo are playable)",
                self.num_channels
            )));
        }
        if self.sample_rate == 0 {
            return Err(FormatError::InvalidHeader("sample rate is zero"));
        }
        if self.block_align != self.num_channels * 2 {
            return Err(FormatError::InvalidHeader(
                "block alignment does not match channel count",
            ));
        }
        if byte_rate(self.sample_rate, self.block_align)? != self.byte_rate {
            return Err(FormatError::InvalidHeader(
                "byte rate does not match sample rate and block alignment",
            ));
        }
        Ok(())
    }
}

fn byte_rate(sample_rate: u32, block_align: u16) -> Result<u32, FormatError> {
    sample_rate
        .checked_mul(block_align as u32)
        .ok_or(FormatError::InvalidHeader("byte rate overflows"))
}

/// A parsed header and the location of the sample data that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavInfo {
    pub header: WavHeader,
    /// Absolute offset of the first sample byte.
    pub data_offset: u64,
    /// Declared length of the `data` chunk. Zero for header-only files.
    pub data_len: u64,
}

impl WavInfo {
    /// Whole frames the data chunk declares.
    pub fn frames(&self) -> u64 {
        self.data_len / self.header.block_align as u64
    }
}

// --- Reading ---

/// Read and validate a WAV header, leaving `reader` at the first sample byte.
///
/// Chunks other than `fmt ` and `data` are skipped. A file that ends after
/// its format chunk is treated as having no sample data.
pub fn read_header<R: Read + Seek>(reader: &mut R) -> Result<WavInfo, FormatError> {
    let riff = RiffHeader::read(reader)?;
    if &riff.form_type != b"WAVE" {
        return Err(FormatError::InvalidHeader("RIFF form type is not WAVE"));
    }

    let mut format: Option<WavHeader> = None;
    loop {
        let chunk = match ChunkHeader::read(reader) {
            Ok(chunk) => chunk,
            Err(e) if e.is_eof() => {
                let header = format.ok_or(FormatError::UnexpectedEof)?;
                let data_offset = reader.stream_position()?;
                return Ok(WavInfo { header, data_offset, data_len: 0 });
            }
            Err(e) => return Err(e.into()),
        };

        match &chunk.id {
            b"fmt " => {
                if chunk.size < FMT_BLOCK_LEN {
                    return Err(FormatError::InvalidHeader("fmt chunk shorter than 16 bytes"));
                }
                let header = WavHeader::read(reader)?;
                header.validate()?;
                skip(reader, padded(chunk.size) - FMT_BLOCK_LEN as u64)?;
                format = Some(header);
            }
            b"data" => {
                let header =
                    format.ok_or(FormatError::InvalidHeader("data chunk precedes fmt chunk"))?;
                let data_offset = reader.stream_position()?;
                return Ok(WavInfo { header, data_offset, data_len: chunk.size as u64 });
            }
            _ => skip(reader, padded(chunk.size))?,
        }
    }
}

/// Chunk bodies are padded to an even length.
fn padded(size: u32) -> u64 {
    size as u64 + (size as u64 & 1)
}

fn skip<R: Seek>(reader: &mut R, len: u64) -> Result<(), FormatError> {
    if len > 0 {
        reader.seek(SeekFrom::Current(len as i64))?;
    }
    Ok(())
}

// --- Writing ---

/// Streams interleaved 16-bit samples into a canonical 44-byte-header WAV.
///
/// Sizes are written as zero up front and patched by [`WavWriter::finalize`].
pub struct WavWriter<W: Write + Seek> {
    inner: W,
    header: WavHeader,
    data_len: u32,
}

impl<W: Write + Seek> WavWriter<W> {
    pub fn new(mut inner: W, num_channels: u16, sample_rate: u32) -> Result<Self, FormatError> {
        let header = WavHeader::pcm16(num_channels, sample_rate)?;
        write_preamble(&mut inner, &header, 0)?;
        Ok(Self { inner, header, data_len: 0 })
    }

    pub fn header(&self) -> &WavHeader {
        &self.header
    }

    /// Append samples. Fails without writing anything if the data chunk
    /// would outgrow the RIFF size field.
    pub fn write_samples(&mut self, samples: &[i16]) -> Result<(), FormatError> {
        let data_len = u32::try_from(samples.len() * 2)
            .ok()
            .and_then(|len| self.data_len.checked_add(len))
            .filter(|&len| len <= MAX_DATA_LEN)
            .ok_or(FormatError::DataTooLarge { max: MAX_DATA_LEN })?;
        for sample in samples {
            self.inner.write_all(&sample.to_le_bytes())?;
        }
        self.data_len = data_len;
        Ok(())
    }

    /// Rewrite the chunk sizes for the samples written so far and flush.
    /// Writing may continue afterwards.
    pub fn update_sizes(&mut self) -> Result<(), FormatError> {
        let end = self.inner.stream_position()?;
        self.inner.seek(SeekFrom::Start(0))?;
        write_preamble(&mut self.inner, &self.header, self.data_len)?;
        self.inner.seek(SeekFrom::Start(end))?;
        self.inner.flush()?;
        Ok(())
    }

    /// Patch the chunk sizes and hand back the underlying writer.
    pub fn finalize(mut self) -> Result<W, FormatError> {
        self.update_sizes()?;
        Ok(self.inner)
    }
}

fn write_preamble<W: Write + Seek>(
    w: &mut W,
    header: &WavHeader,
    data_len: u32,
) -> Result<(), FormatError> {
    let riff = RiffHeader {
        riff_size: CANONICAL_RIFF_OVERHEAD + data_len,
        form_type: *b"WAVE",
    };
    riff.write(w)?;
    ChunkHeader { id: *b"fmt ", size: FMT_BLOCK_LEN }.write(w)?;
    header.write(w)?;
    ChunkHeader { id: *b"data", size: data_len }.write(w)?;
    Ok(())
}

pub fn write_wav<W: Write + Seek>(
    w: W,
    num_channels: u16,
    sample_rate: u32,
    samples: &[i16],
) -> Result<W, FormatError> {
    let mut writer = WavWriter::new(w, num_channels, sample_rate)?;
    writer.write_samples(samples)?;
    writer.finalize()
}

pub fn samples_to_wav(num_channels: u16, sample_rate: u32, samples: &[i16]) -> Vec<u8> {
    write_wav(Cursor::new(Vec::new()), num_channels, sample_rate, samples)
        .expect("Vec<u8> write cannot fail")
        .into_inner()
}
