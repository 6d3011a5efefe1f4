use std::time::Duration;

use crate::{ClampPolicy, DecodedEvent, FrequencyWindow, Hertz};

/// State the UI needs to lay out the region strip and the waterfall axis.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    /// Total duration of the loaded recording, seconds
    pub duration: f64,
    pub sample_rate: Hertz,
    /// Window currently mapped onto the waterfall width
    pub window: Option<FrequencyWindow>,
    pub full_text: String,
    pub wpm: f32,
    pub avg_snr: f32,
    pub events: Vec<DecodedEvent>,
}

/// Tuning of the waterfall pipeline.
#[derive(Debug, Clone)]
pub struct WaterfallConfig {
    /// Width of the frequency window around the detected tone
    pub span: Hertz,
    /// Fixed render tick period
    pub tick_period: Duration,
    /// Intensities at or below this value are not drawn
    pub noise_floor: u8,
    /// Analysis window of the live analyser, in samples
    pub fft_size: usize,
    pub clamp_policy: ClampPolicy,
    /// Initial buffer width in pixels
    pub width: usize,
    /// Initial buffer height in rows
    pub height: usize,
}

impl Default for WaterfallConfig {
    fn default() -> Self {
        Self {
            span: Hertz(3_000.0),
            tick_period: Duration::from_millis(50),
            noise_floor: 32,
            fft_size: 2048,
            clamp_policy: ClampPolicy::Mirror,
            width: 512,
            height: 256,
        }
    }
}
