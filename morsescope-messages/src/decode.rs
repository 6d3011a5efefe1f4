use serde::{Deserialize, Serialize};

use crate::Hertz;

/// One decoded character and the time interval it was keyed for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecodedEvent {
    /// Start of the interval, seconds from the beginning of the recording
    pub start: f64,
    /// End of the interval (exclusive), seconds
    pub end: f64,
    #[serde(rename = "char")]
    pub ch: char,
}

impl DecodedEvent {
    pub fn new(start: f64, end: f64, ch: char) -> Self {
        Self { start, end, ch }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t < self.end
    }
}

/// Result of one run of the external decoder.
///
/// Events are sorted by `start` and never overlap. A new decode replaces the
/// previous result wholesale.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeResult {
    pub full_text: String,
    /// Detected (or overridden) tone frequency in Hz
    pub frequency: f32,
    pub wpm: f32,
    pub threshold_factor: f32,
    pub avg_snr: f32,
    pub events: Vec<DecodedEvent>,
}

impl DecodeResult {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn center_frequency(&self) -> Hertz {
        Hertz(self.frequency)
    }
}
