//! Fixed-capacity chunk of interleaved 16-bit samples.

use arrayvec::ArrayVec;
use std::io::{self, Read};

/// Bytes of sample data pulled from the source per iteration.
pub const CHUNK_BYTES: usize = 1024;
/// Capacity of a [`SampleBuffer`] in samples (not frames).
pub const CHUNK_SAMPLES: usize = CHUNK_BYTES / 2;

/// Reusable chunk buffer.
///
/// Only samples refreshed by the most recent [`fill`](Self::fill) are
/// visible, so a short final read never exposes data from the previous
/// chunk.
pub struct SampleBuffer {
    raw: [u8; CHUNK_BYTES],
    samples: ArrayVec<i16, CHUNK_SAMPLES>,
    channels: u16,
}

impl SampleBuffer {
    pub fn new(channels: u16) -> Self {
        Self {
            raw: [0; CHUNK_BYTES],
            samples: ArrayVec::new(),
            channels: channels.max(1),
        }
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Bytes per frame.
    pub fn block_align(&self) -> usize {
        self.channels as usize * 2
    }

    /// Refill from `reader`, returning the number of whole frames now held.
    ///
    /// Reads until the chunk is full or the reader is exhausted. Bytes of a
    /// trailing partial frame at end of input are discarded.
    pub fn fill<R: Read + ?Sized>(&mut self, reader: &mut R) -> io::Result<usize> {
        self.clear();
        let filled = read_up_to(reader, &mut self.raw)?;
        let usable = filled - filled % self.block_align();
        for pair in self.raw[..usable].chunks_exact(2) {
            self.samples.push(i16::from_le_bytes([pair[0], pair[1]]));
        }
        Ok(self.frames())
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [i16] {
        &mut self.samples
    }
}

fn read_up_to<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
