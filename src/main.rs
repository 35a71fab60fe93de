//! wavbalance: play a WAV file repeatedly with a fixed left/right balance.
//!
//! Usage:
//!   wavbalance path/to/file.wav
//!   wavbalance path/to/file.wav --balance 0.2 --repeat 3 --delay-ms 500
//!   wavbalance path/to/file.wav --wav balanced.wav --repeat 1
//!
//! Set `RUST_LOG` to change log verbosity (default `info`).

mod args;

use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = args::parse(std::env::args().skip(1)).unwrap_or_else(|e| {
        eprintln!("{}", e);
        eprintln!("{}", args::USAGE);
        std::process::exit(1);
    });

    for attempt in 1..=args.repeat {
        std::thread::sleep(args.delay);
        info!(attempt, of = args.repeat, "playing {}", args.playback.path.display());
        if let Ok(report) = wb_player::play_audio(&args.playback) {
            info!(attempt, frames = report.frames_written, "done");
        }
    }
}
