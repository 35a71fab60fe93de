//! Command-line parsing into a playback configuration.

use std::path::PathBuf;
use std::time::Duration;

use wb_player::{Balance, BalanceError, OutputTarget, PlaybackConfig};

pub const USAGE: &str = "Usage: wavbalance <file.wav> [--balance 0.0-1.0] [--device NAME] \
[--repeat N] [--delay-ms MS] [--wav OUT.wav]";

const DEFAULT_REPEAT: u32 = 10;
const DEFAULT_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
pub enum ArgsError {
    #[error("no input file given")]
    MissingPath,
    #[error("{0} needs a value")]
    MissingValue(String),
    #[error("unknown option {0}")]
    UnknownFlag(String),
    #[error("unexpected argument {0:?}")]
    UnexpectedArgument(String),
    #[error("invalid value {value:?} for {flag}")]
    BadValue { flag: String, value: String },
    #[error(transparent)]
    Balance(#[from] BalanceError),
    #[error("--device and --wav are mutually exclusive")]
    ConflictingOutputs,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Args {
    pub playback: PlaybackConfig,
    /// Number of playback attempts.
    pub repeat: u32,
    /// Pause before each attempt.
    pub delay: Duration,
}

/// Parse arguments, excluding the program name.
pub fn parse<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut path: Option<PathBuf> = None;
    let mut balance = Balance::default();
    let mut device: Option<String> = None;
    let mut wav: Option<PathBuf> = None;
    let mut repeat = DEFAULT_REPEAT;
    let mut delay = DEFAULT_DELAY;

    while let Some(arg) = args.next() {
        let mut value = |flag: &str| args.next().ok_or_else(|| ArgsError::MissingValue(flag.into()));
        match arg.as_str() {
            "--balance" => balance = value("--balance")?.parse()?,
            "--device" => device = Some(value("--device")?),
            "--wav" => wav = Some(value("--wav")?.into()),
            "--repeat" => repeat = parse_number("--repeat", value("--repeat")?)?,
            "--delay-ms" => {
                delay = Duration::from_millis(parse_number("--delay-ms", value("--delay-ms")?)?)
            }
            flag if flag.starts_with("--") => return Err(ArgsError::UnknownFlag(arg)),
            _ if path.is_none() => path = Some(arg.into()),
            _ => return Err(ArgsError::UnexpectedArgument(arg)),
        }
    }

    let output = match (device, wav) {
        (Some(_), Some(_)) => return Err(ArgsError::ConflictingOutputs),
        (Some(name), None) => OutputTarget::Device(name),
        (None, Some(file)) => OutputTarget::WavFile(file),
        (None, None) => OutputTarget::Default,
    };

    let playback = PlaybackConfig::new(path.ok_or(ArgsError::MissingPath)?)
        .with_balance(balance)
        .with_output(output);

    Ok(Args {
        playback,
        repeat,
        delay,
    })
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: String) -> Result<T, ArgsError> {
    value.parse().map_err(|_| ArgsError::BadValue {
        flag: flag.into(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_strs(args: &[&str]) -> Result<Args, ArgsError> {
        parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn defaults_match_the_warning_loop() {
        let args = parse_strs(&["alarm.wav"]).unwrap();
        assert_eq!(args.playback.path, PathBuf::from("alarm.wav"));
        assert_eq!(args.playback.balance, Balance::CENTER);
        assert_eq!(args.playback.output, OutputTarget::Default);
        assert_eq!(args.repeat, 10);
        assert_eq!(args.delay, Duration::from_secs(1));
    }

    #[test]
    fn all_options() {
        let args = parse_strs(&[
            "--balance", "0.2", "in.wav", "--device", "hw:1", "--repeat", "3", "--delay-ms", "250",
        ])
        .unwrap();
        assert_eq!(args.playback.balance.ratio(), 0.2);
        assert_eq!(args.playback.output, OutputTarget::Device("hw:1".into()));
        assert_eq!(args.repeat, 3);
        assert_eq!(args.delay, Duration::from_millis(250));
    }

    #[test]
    fn wav_output() {
        let args = parse_strs(&["in.wav", "--wav", "out.wav"]).unwrap();
        assert_eq!(args.playback.output, OutputTarget::WavFile("out.wav".into()));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(parse_strs(&[]), Err(ArgsError::MissingPath)));
        assert!(matches!(parse_strs(&["a.wav", "--balance"]), Err(ArgsError::MissingValue(_))));
        assert!(matches!(parse_strs(&["a.wav", "--balance", "1.5"]), Err(ArgsError::Balance(_))));
        assert!(matches!(parse_strs(&["a.wav", "--repeat", "x"]), Err(ArgsError::BadValue { .. })));
        assert!(matches!(parse_strs(&["a.wav", "--loud"]), Err(ArgsError::UnknownFlag(_))));
        assert!(matches!(parse_strs(&["a.wav", "b.wav"]), Err(ArgsError::UnexpectedArgument(_))));
        assert!(matches!(
            parse_strs(&["a.wav", "--device", "x", "--wav", "y"]),
            Err(ArgsError::ConflictingOutputs)
        ));
    }
}
