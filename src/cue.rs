//! Audible completion cue.
//!
//! Playback happens on a detached worker so it can never hold up a tick.

use std::f64::consts::TAU;
use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

pub const TONE_FREQUENCY_HZ: u32 = 1000;
pub const TONE_DURATION: Duration = Duration::from_millis(200);
const SAMPLE_RATE: u32 = 22_050;
const AMPLITUDE: f64 = 0.35;
const FADE_SAMPLES: usize = 220;

/// Players that accept a WAV stream on stdin, tried in order.
const PLAYERS: &[(&str, &[&str])] = &[("aplay", &["-q", "-"]), ("paplay", &[])];

pub trait Cue: Send {
    /// Fire and forget.
    fn play(&self);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SilentCue;

impl Cue for SilentCue {
    fn play(&self) {}
}

#[derive(Debug, Clone, Copy)]
pub struct ToneCue {
    frequency_hz: u32,
    duration: Duration,
}

impl ToneCue {
    pub fn new(frequency_hz: u32, duration: Duration) -> Self {
        Self {
            frequency_hz,
            duration,
        }
    }
}

impl Default for ToneCue {
    fn default() -> Self {
        Self::new(TONE_FREQUENCY_HZ, TONE_DURATION)
    }
}

impl Cue for ToneCue {
    fn play(&self) {
        let wav = tone_wav(self.frequency_hz, self.duration);
        let spawned = thread::Builder::new()
            .name("pomo-cue".into())
            .spawn(move || {
                if !PLAYERS.iter().any(|(cmd, args)| pipe_to_player(cmd, args, &wav)) {
                    ring_bell();
                }
            });
        if let Err(err) = spawned {
            tracing::debug!(error = %err, "could not spawn cue worker");
        }
    }
}

fn pipe_to_player(cmd: &str, args: &[&str], wav: &[u8]) -> bool {
    let child = Command::new(cmd)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
    let mut child = match child {
        Ok(child) => child,
        Err(err) => {
            tracing::debug!(player = cmd, error = %err, "cue player unavailable");
            return false;
        }
    };
    if let Some(mut stdin) = child.stdin.take() {
        if let Err(err) = stdin.write_all(wav) {
            tracing::debug!(player = cmd, error = %err, "cue player rejected input");
        }
    }
    matches!(child.wait(), Ok(status) if status.success())
}

fn ring_bell() {
    let mut out = io::stdout().lock();
    let _ = out.write_all(b"\x07").and_then(|_| out.flush());
}

/// 16-bit mono PCM WAV holding a sine tone with short fades against clicks.
pub fn tone_wav(frequency_hz: u32, duration: Duration) -> Vec<u8> {
    let samples = (SAMPLE_RATE as f64 * duration.as_secs_f64()).round() as usize;
    let data_len = (samples * 2) as u32;

    let mut wav = Vec::with_capacity(44 + samples * 2);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&1u16.to_le_bytes()); // mono
    wav.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    wav.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());

    let fade = FADE_SAMPLES.min(samples / 2).max(1);
    for n in 0..samples {
        let t = n as f64 / SAMPLE_RATE as f64;
        let envelope = (n.min(samples - 1 - n) as f64 / fade as f64).min(1.0);
        let value = (TAU * frequency_hz as f64 * t).sin() * AMPLITUDE * envelope;
        wav.extend_from_slice(&((value * i16::MAX as f64) as i16).to_le_bytes());
    }
    wav
}
