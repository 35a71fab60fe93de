//! Left/right gain split.

use std::fmt;
use std::str::FromStr;

/// Full-scale gain. A channel at this gain passes through unchanged.
pub const MAX_AMPLITUDE: i32 = i16::MAX as i32;

/// Error type for balance ratios.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BalanceError {
    #[error("balance ratio {0} is outside 0.0..=1.0")]
    OutOfRange(f64),
    #[error("balance ratio {0:?} is not a number")]
    Parse(String),
}

/// Gain split ratio in `0.0..=1.0`.
///
/// This is not perceptual panning: the left gain is `MAX_AMPLITUDE * ratio`
/// and the right gain is whatever remains of full scale, so 0.0 silences the
/// left channel and 1.0 silences the right.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Balance(f64);

impl Balance {
    pub const CENTER: Balance = Balance(0.5);

    pub fn new(ratio: f64) -> Result<Self, BalanceError> {
        if (0.0..=1.0).contains(&ratio) {
            Ok(Self(ratio))
        } else {
            Err(BalanceError::OutOfRange(ratio))
        }
    }

    pub fn ratio(self) -> f64 {
        self.0
    }

    pub fn gains(self) -> BalanceGains {
        let left = (MAX_AMPLITUDE as f64 * self.0) as i32;
        BalanceGains {
            left,
            right: MAX_AMPLITUDE - left,
        }
    }
}

impl Default for Balance {
    fn default() -> Self {
        Self::CENTER
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Balance {
    type Err = BalanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ratio: f64 = s
            .trim()
            .parse()
            .map_err(|_| BalanceError::Parse(s.to_string()))?;
        Self::new(ratio)
    }
}

/// Integer gains derived once per playback from a [`Balance`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BalanceGains {
    pub left: i32,
    pub right: i32,
}

impl BalanceGains {
    /// Scale one sample by `gain / MAX_AMPLITUDE`.
    ///
    /// `gain` must lie in `0..=MAX_AMPLITUDE`; the result then never exceeds
    /// the input's magnitude.
    #[inline]
    pub fn scale(sample: i16, gain: i32) -> i16 {
        (sample as i32 * gain / MAX_AMPLITUDE) as i16
    }

    /// Scale interleaved frames in place.
    ///
    /// Channel 0 takes the left gain. Channel 1 takes the right gain only in
    /// a stereo stream. A trailing partial frame is left alone.
    pub fn apply(&self, samples: &mut [i16], channels: u16) {
        let channels = channels.max(1) as usize;
        for frame in samples.chunks_exact_mut(channels) {
            frame[0] = Self::scale(frame[0], self.left);
            if channels == 2 {
                frame[1] = Self::scale(frame[1], self.right);
            }
        }
    }
}
