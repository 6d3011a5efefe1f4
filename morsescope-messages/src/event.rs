use crate::{Hertz, ViewState};

/// Events sent from the engine to the UI.
#[derive(Debug)]
pub enum Event {
    /// Full view state, sent on startup and whenever a decode or media load changes it.
    StateSnapshot(ViewState),
    /// The live-character display changed.
    LiveChar(char),
    /// Current playback position in seconds.
    Position(f64),
    /// Playback started (`true`) or stopped (`false`).
    Playing(bool),
    /// A new waterfall frame, rendered after a tick.
    WaterfallFrame(WaterfallImage),
    /// Static spectrogram of the whole recording. The top row is `nyquist`,
    /// the bottom row 0 Hz.
    Spectrogram { image: WaterfallImage, nyquist: Hertz },
}

/// RGB pixels, row by row from the top. Waterfall frames have the oldest row at the top.
#[derive(Debug, Clone, PartialEq)]
pub struct WaterfallImage {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<[u8; 3]>,
}

impl WaterfallImage {
    /// Flatten into interleaved RGB bytes.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flatten().copied().collect()
    }
}
