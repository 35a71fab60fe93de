//! Background playback: cancellation and one-at-a-time ownership.

use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use wb_audio::{MemorySink, Recording};
use wb_player::{PlaybackConfig, Player};

const CHUNK_WRITE_DELAY: Duration = Duration::from_millis(5);

/// 200 full stereo chunks; about one second at the simulated write delay.
fn long_fixture(dir: &TempDir) -> PathBuf {
    let samples = vec![1234i16; 512 * 200];
    let path = dir.path().join("long.wav");
    fs::write(&path, wb_format::samples_to_wav(2, 44100, &samples)).unwrap();
    path
}

fn short_fixture(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("short.wav");
    fs::write(&path, wb_format::samples_to_wav(2, 44100, &[1, 2, 3, 4])).unwrap();
    path
}

fn play_slow(player: &mut Player, path: PathBuf, recording: &Recording) {
    let capture = recording.clone();
    player.play_with(PlaybackConfig::new(path), move |request| {
        Ok(MemorySink::new(request, capture).with_write_delay(CHUNK_WRITE_DELAY))
    });
}

fn wait_until(mut done: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done() {
        assert!(Instant::now() < deadline, "timed out");
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn stop_cancels_between_chunks() {
    let dir = tempfile::tempdir().unwrap();
    let recording = Recording::new();
    let mut player = Player::new();

    play_slow(&mut player, long_fixture(&dir), &recording);
    wait_until(|| !recording.write_calls().is_empty());
    assert!(player.is_playing());

    let report = player.stop().unwrap().unwrap();
    assert!(report.cancelled);
    assert!(report.chunks < 200);
    assert_eq!(recording.write_calls().len(), report.chunks);
    assert!(recording.is_closed());
    assert!(!recording.was_drained());
    assert!(!player.is_playing());
}

#[test]
fn wait_returns_completed_report() {
    let dir = tempfile::tempdir().unwrap();
    let recording = Recording::new();
    let capture = recording.clone();
    let mut player = Player::new();

    player.play_with(PlaybackConfig::new(short_fixture(&dir)), move |request| {
        Ok(MemorySink::new(request, capture))
    });
    wait_until(|| player.is_finished());

    let report = player.wait().unwrap().unwrap();
    assert!(!report.cancelled);
    assert_eq!(report.frames_written, 2);
    assert!(recording.is_closed());
    assert!(player.wait().is_none());
}

#[test]
fn new_playback_replaces_running_one() {
    let dir = tempfile::tempdir().unwrap();
    let first = Recording::new();
    let second = Recording::new();
    let mut player = Player::new();

    play_slow(&mut player, long_fixture(&dir), &first);
    wait_until(|| !first.write_calls().is_empty());

    let capture = second.clone();
    player.play_with(PlaybackConfig::new(short_fixture(&dir)), move |request| {
        Ok(MemorySink::new(request, capture))
    });

    assert!(first.is_closed());
    assert!(first.write_calls().len() < 200);

    let report = player.wait().unwrap().unwrap();
    assert_eq!(report.frames_written, 2);
    assert_eq!(second.samples().len(), 4);
}

#[test]
fn failures_come_back_through_stop() {
    let dir = tempfile::tempdir().unwrap();
    let mut player = Player::new();

    player.play_with(PlaybackConfig::new(dir.path().join("absent.wav")), |request| {
        Ok(MemorySink::new(request, Recording::new()))
    });
    wait_until(|| player.is_finished());

    assert!(player.stop().unwrap().is_err());
}

#[test]
fn idle_player_has_nothing_to_stop() {
    let mut player = Player::default();
    assert!(player.stop().is_none());
    assert!(!player.is_playing());
    assert!(!player.is_finished());
}

#[test]
fn dropping_player_stops_playback() {
    let dir = tempfile::tempdir().unwrap();
    let recording = Recording::new();
    let mut player = Player::new();

    play_slow(&mut player, long_fixture(&dir), &recording);
    wait_until(|| !recording.write_calls().is_empty());
    drop(player);

    assert!(recording.is_closed());
    assert!(recording.write_calls().len() < 200);
}
