//! Sample processing for wavbalance.
//!
//! Turns a balance ratio into per-channel gains and applies them to
//! fixed-size chunks of interleaved 16-bit samples.

mod balance;
mod sample_buffer;

pub use balance::{Balance, BalanceError, BalanceGains, MAX_AMPLITUDE};
pub use sample_buffer::{SampleBuffer, CHUNK_BYTES, CHUNK_SAMPLES};
