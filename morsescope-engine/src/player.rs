use flume::{Receiver, RecvTimeoutError, Sender};
use log::{debug, warn};
use morsescope_messages::{DecodeResult, DecodedEvent, Hertz};
use std::f32::consts::PI;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::decode::MAX_DURATION;
use crate::media::MediaElement;
use crate::spectrogram::{self, SpectrogramImage};

pub const SAMPLE_RATE: Hertz = Hertz(16_000.0);
/// How often the player reports its position
const UPDATE_PERIOD: Duration = Duration::from_millis(20);
const TONE_AMPLITUDE: f32 = 0.4;
/// Silence appended after the last keyed event, seconds
const TAIL: f64 = 0.5;
const SPECTROGRAM_FFT: usize = 512;
const SPECTROGRAM_HEIGHT: usize = 256;
/// Spectrogram columns per second of audio
const SPECTROGRAM_COLUMNS_PER_SEC: f64 = 100.0;
const MAX_SPECTROGRAM_COLUMNS: usize = 8_192;

/// Notifications from the playback collaborator.
#[derive(Debug, Clone)]
pub enum PlaybackEvent {
    /// A new recording is ready to play.
    MediaLoaded { media: MediaElement, duration: f64 },
    /// Static spectrogram of the loaded recording.
    Spectrogram(Arc<SpectrogramImage>),
    TimeUpdate(f64),
    Play,
    Pause,
    Finish,
}

/// Transport commands the engine forwards to the playback collaborator.
pub trait PlaybackControl: Send {
    fn play(&self);
    fn pause(&self);
    /// Seek to a normalized position in `[0, 1]`.
    fn seek(&self, normalized: f64);
    fn stop(&self);
}

#[derive(Debug)]
enum PlayerCommand {
    Play,
    Pause,
    Seek(f64),
    Stop,
}

/// Plays the keyed tone of a decode result in real time.
///
/// There is no audio output; the samples are only handed to the media
/// element's live tap.
pub struct TonePlayer {
    cmd_tx: Sender<PlayerCommand>,
    handle: Option<JoinHandle<()>>,
}

impl TonePlayer {
    pub fn spawn(result: &DecodeResult, event_tx: Sender<PlaybackEvent>) -> Self {
        let samples = synthesize(result, SAMPLE_RATE);
        let (cmd_tx, cmd_rx) = flume::unbounded();
        let handle = thread::spawn(move || run(samples, cmd_rx, event_tx));
        Self {
            cmd_tx,
            handle: Some(handle),
        }
    }

    fn send(&self, cmd: PlayerCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            debug!("Player thread already gone");
        }
    }
}

impl PlaybackControl for TonePlayer {
    fn play(&self) {
        self.send(PlayerCommand::Play);
    }

    fn pause(&self) {
        self.send(PlayerCommand::Pause);
    }

    fn seek(&self, normalized: f64) {
        self.send(PlayerCommand::Seek(normalized));
    }

    fn stop(&self) {
        self.send(PlayerCommand::Stop);
    }
}

impl Drop for TonePlayer {
    fn drop(&mut self) {
        self.stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run(samples: Vec<f32>, cmd_rx: Receiver<PlayerCommand>, event_tx: Sender<PlaybackEvent>) {
    let rate = SAMPLE_RATE.0 as f64;
    let media = MediaElement::new(SAMPLE_RATE);
    let duration = samples.len() as f64 / rate;
    if event_tx
        .send(PlaybackEvent::MediaLoaded {
            media: media.clone(),
            duration,
        })
        .is_err()
    {
        return;
    }

    let columns = ((duration * SPECTROGRAM_COLUMNS_PER_SEC).ceil() as usize)
        .clamp(1, MAX_SPECTROGRAM_COLUMNS);
    match spectrogram::render(&samples, SAMPLE_RATE, SPECTROGRAM_FFT, columns, SPECTROGRAM_HEIGHT) {
        Ok(image) => {
            let _ = event_tx.send(PlaybackEvent::Spectrogram(Arc::new(image)));
        }
        Err(e) => warn!("No static spectrogram: {e:#}"),
    }

    let mut position = 0usize;
    let mut playing = false;
    let mut last = Instant::now();

    loop {
        let mut events = Vec::new();
        match cmd_rx.recv_timeout(UPDATE_PERIOD) {
            Ok(PlayerCommand::Play) if !playing => {
                if position >= samples.len() {
                    position = 0;
                }
                playing = true;
                last = Instant::now();
                events.push(PlaybackEvent::Play);
            }
            Ok(PlayerCommand::Pause) if playing => {
                playing = false;
                events.push(PlaybackEvent::Pause);
            }
            Ok(PlayerCommand::Seek(normalized)) => {
                position = (normalized.clamp(0.0, 1.0) * samples.len() as f64) as usize;
                events.push(PlaybackEvent::TimeUpdate(position as f64 / rate));
            }
            Ok(PlayerCommand::Stop) | Err(RecvTimeoutError::Disconnected) => break,
            Ok(_) | Err(RecvTimeoutError::Timeout) => {}
        }

        if playing {
            let now = Instant::now();
            let elapsed = (now.duration_since(last).as_secs_f64() * rate) as usize;
            if elapsed > 0 {
                let end = (position + elapsed).min(samples.len());
                media.feed(&samples[position..end]);
                position = end;
                last = now;
                events.push(PlaybackEvent::TimeUpdate(position as f64 / rate));
            }
            if position >= samples.len() {
                playing = false;
                events.push(PlaybackEvent::Finish);
            }
        }

        for event in events {
            if event_tx.send(event).is_err() {
                return;
            }
        }
    }
}

/// Dit/dah pattern of a character, `None` for characters without one.
fn morse_pattern(ch: char) -> Option<&'static str> {
    let pattern = match ch.to_ascii_uppercase() {
        'A' => ".-",
        'B' => "-...",
        'C' => "-.-.",
        'D' => "-..",
        'E' => ".",
        'F' => "..-.",
        'G' => "--.",
        'H' => "....",
        'I' => "..",
        'J' => ".---",
        'K' => "-.-",
        'L' => ".-..",
        'M' => "--",
        'N' => "-.",
        'O' => "---",
        'P' => ".--.",
        'Q' => "--.-",
        'R' => ".-.",
        'S' => "...",
        'T' => "-",
        'U' => "..-",
        'V' => "...-",
        'W' => ".--",
        'X' => "-..-",
        'Y' => "-.--",
        'Z' => "--..",
        '0' => "-----",
        '1' => ".----",
        '2' => "..---",
        '3' => "...--",
        '4' => "....-",
        '5' => ".....",
        '6' => "-....",
        '7' => "--...",
        '8' => "---..",
        '9' => "----.",
        '.' => ".-.-.-",
        ',' => "--..--",
        '?' => "..--..",
        '/' => "-..-.",
        '=' => "-...-",
        _ => return None,
    };
    Some(pattern)
}

/// Keyed intervals of one event: its dits and dahs spread over the event's duration.
fn keyed_intervals(event: &DecodedEvent) -> Vec<(f64, f64)> {
    if event.ch.is_whitespace() {
        return Vec::new();
    }
    let Some(pattern) = morse_pattern(event.ch) else {
        return vec![(event.start, event.end)];
    };
    // dit = 1 unit, dah = 3 units, 1 unit between elements
    let units: usize = pattern.chars().map(|c| if c == '-' { 3 } else { 1 }).sum::<usize>() + pattern.len() - 1;
    let unit = event.duration() / units as f64;
    let mut t = event.start;
    pattern
        .chars()
        .map(|c| {
            let len = unit * if c == '-' { 3.0 } else { 1.0 };
            let interval = (t, t + len);
            t += len + unit;
            interval
        })
        .collect()
}

/// Sine tone at the decode's frequency wherever its events are keyed.
/// Output is cut off at [`MAX_DURATION`].
pub fn synthesize(result: &DecodeResult, sample_rate: Hertz) -> Vec<f32> {
    let rate = sample_rate.0 as f64;
    let end = (result.events.last().map_or(0.0, |ev| ev.end) + TAIL).min(MAX_DURATION);
    let mut samples = vec![0.0f32; (end * rate).ceil() as usize];
    let omega = 2.0 * PI * result.frequency / sample_rate.0;

    for (start, stop) in result.events.iter().flat_map(keyed_intervals) {
        let first = (start.max(0.0) * rate) as usize;
        let last = ((stop * rate) as usize).min(samples.len());
        for (i, sample) in samples.iter_mut().enumerate().take(last).skip(first) {
            *sample = TONE_AMPLITUDE * (omega * i as f32).sin();
        }
    }
    samples
}
