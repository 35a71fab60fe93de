//! Audio sinks for wavbalance.

mod cpal_backend;
mod memory;
mod traits;
mod wav_sink;

pub use cpal_backend::CpalSink;
pub use memory::{MemorySink, Recording};
pub use traits::{AudioError, AudioSink, SinkConfig};
pub use wav_sink::WavFileSink;
