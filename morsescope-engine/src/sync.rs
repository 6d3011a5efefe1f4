use anyhow::Result;
use log::{debug, info};
use morsescope_messages::{
    DecodeResult, FrequencyWindow, Hertz, NO_SYMBOL, ViewState, WaterfallConfig, WaterfallImage,
};
use std::sync::Arc;
use std::time::Instant;

use crate::media::MediaElement;
use crate::regions::RegionIndex;
use crate::spectrogram::SpectrogramImage;
use crate::tap::{AcquisitionTap, Frame, TapVariant};
use crate::ticker::TickTimer;
use crate::waterfall::WaterfallRenderer;

/// Keeps the live-character display and the waterfall in step with playback.
pub struct PlaybackSync {
    config: WaterfallConfig,
    regions: RegionIndex,
    renderer: WaterfallRenderer,
    timer: TickTimer,
    media: Option<MediaElement>,
    tap: Option<AcquisitionTap>,
    spectrogram: Option<Arc<SpectrogramImage>>,
    duration: f64,
    current_time: f64,
    /// Character last pushed to the display; `None` until the first update
    displayed: Option<char>,
    center: Option<Hertz>,
    decode: DecodeResult,
    overlay_dirty: bool,
}

impl PlaybackSync {
    pub fn new(config: WaterfallConfig) -> Self {
        Self {
            renderer: WaterfallRenderer::new(&config),
            timer: TickTimer::new(config.tick_period),
            config,
            regions: RegionIndex::default(),
            media: None,
            tap: None,
            spectrogram: None,
            duration: 0.0,
            current_time: 0.0,
            displayed: None,
            center: None,
            decode: DecodeResult::default(),
            overlay_dirty: false,
        }
    }

    pub fn regions(&self) -> &RegionIndex {
        &self.regions
    }

    pub fn window(&self) -> Option<FrequencyWindow> {
        self.renderer.window()
    }

    pub fn sample_rate(&self) -> Hertz {
        self.media.as_ref().map(MediaElement::sample_rate).unwrap_or_default()
    }

    pub fn is_playing(&self) -> bool {
        self.timer.is_running()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    pub fn live_char(&self) -> char {
        self.displayed.unwrap_or(NO_SYMBOL)
    }

    pub fn tap_variant(&self) -> TapVariant {
        self.tap.as_ref().map_or(TapVariant::Unresolved, AcquisitionTap::variant)
    }

    /// A new recording was loaded. Any previous session and its tap are dropped.
    pub fn on_media_loaded(&mut self, media: MediaElement, duration: f64) {
        info!(
            "Media {} loaded: {:.2}s at {}",
            media.id(),
            duration,
            media.sample_rate()
        );
        self.timer.stop();
        self.tap = None;
        self.spectrogram = None;
        self.media = Some(media);
        self.duration = duration;
        self.current_time = 0.0;
        // the engine shows the marker right away
        self.displayed = Some(NO_SYMBOL);
        self.recompute_window();
        self.renderer.reset();
    }

    pub fn on_spectrogram(&mut self, image: Arc<SpectrogramImage>) {
        if let Some(tap) = self.tap.as_mut() {
            tap.set_spectrogram(image.clone());
        }
        self.spectrogram = Some(image);
    }

    /// Returns the new display character when it changed.
    pub fn on_time_update(&mut self, t: f64) -> Option<char> {
        self.current_time = t;
        let ch = self.regions.active_at(t).map_or(NO_SYMBOL, |ev| ev.ch);
        if self.displayed == Some(ch) {
            return None;
        }
        self.displayed = Some(ch);
        Some(ch)
    }

    pub fn on_play(&mut self, now: Instant) {
        // the session starts with the first play on this media element
        if self.tap.is_none() {
            if let Some(media) = &self.media {
                let mut tap = AcquisitionTap::new(media.clone(), self.config.fft_size);
                if let Some(image) = &self.spectrogram {
                    tap.set_spectrogram(image.clone());
                }
                self.tap = Some(tap);
            }
        }
        if self.timer.start(now) {
            debug!("Waterfall tick loop started");
        }
    }

    pub fn on_pause(&mut self) {
        if self.timer.stop() {
            debug!("Waterfall tick loop stopped");
        }
    }

    pub fn on_finish(&mut self) {
        self.on_pause();
    }

    /// Replace regions and re-center the waterfall on the detected tone.
    pub fn apply_decode(&mut self, result: DecodeResult) -> Result<()> {
        let mut result = result;
        self.regions.set_events(std::mem::take(&mut result.events))?;
        self.center = Some(result.center_frequency());
        self.decode = result;
        self.recompute_window();
        self.overlay_dirty = true;
        info!(
            "Applied decode: {} events, center {}, window {:?}",
            self.regions.events().len(),
            self.decode.center_frequency(),
            self.window()
        );
        Ok(())
    }

    /// Re-center on a frequency picked by the operator.
    pub fn retune(&mut self, center: Hertz) {
        self.center = Some(center);
        self.recompute_window();
    }

    fn recompute_window(&mut self) {
        let nyquist = self.sample_rate().nyquist();
        let window = match self.center {
            Some(center) => FrequencyWindow::centered(center, self.config.span, nyquist, self.config.clamp_policy),
            None => FrequencyWindow::full_band(nyquist),
        };
        self.renderer.set_window(window);
    }

    /// Whether the region overlay needs redrawing; clears the flag.
    pub fn take_overlay_dirty(&mut self) -> bool {
        std::mem::take(&mut self.overlay_dirty)
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.renderer.resize(width, height);
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.renderer.set_visible(visible);
    }

    /// Run a render tick if one is due. Returns whether a tick ran.
    pub fn poll_tick(&mut self, now: Instant) -> bool {
        if !self.timer.fire(now) {
            return false;
        }
        self.tick();
        true
    }

    /// One render tick: a single sample and a single new waterfall row.
    pub fn tick(&mut self) {
        match self.tap.as_mut() {
            Some(tap) => self.renderer.tick(tap, self.current_time, self.duration),
            None => self.renderer.draw(&Frame::Empty),
        }
    }

    pub fn waterfall_image(&self) -> Option<WaterfallImage> {
        self.renderer.image()
    }

    pub fn view_state(&self) -> ViewState {
        ViewState {
            duration: self.duration,
            sample_rate: self.sample_rate(),
            window: self.window(),
            full_text: self.decode.full_text.clone(),
            wpm: self.decode.wpm,
            avg_snr: self.decode.avg_snr,
            events: self.regions.events().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use morsescope_messages::DecodedEvent;
    use std::time::Duration;

    fn sos(frequency: f32) -> DecodeResult {
        DecodeResult {
            full_text: "SOS".into(),
            frequency,
            wpm: 20.0,
            events: vec![
                DecodedEvent::new(0.0, 0.2, 'S'),
                DecodedEvent::new(0.2, 0.4, 'O'),
                DecodedEvent::new(0.4, 0.6, 'S'),
            ],
            ..DecodeResult::default()
        }
    }

    fn loaded() -> (PlaybackSync, MediaElement) {
        let config = WaterfallConfig {
            width: 64,
            height: 16,
            fft_size: 256,
            ..WaterfallConfig::default()
        };
        let mut sync = PlaybackSync::new(config);
        let media = MediaElement::new(Hertz(16_000.0));
        sync.on_media_loaded(media.clone(), 1.0);
        (sync, media)
    }

    #[test]
    fn test_live_char_follows_playback() {
        let (mut sync, _media) = loaded();
        sync.apply_decode(sos(600.0)).unwrap();

        assert_eq!(sync.on_time_update(0.25), Some('O'));
        assert_eq!(sync.live_char(), 'O');
        assert_eq!(sync.on_time_update(0.7), Some(NO_SYMBOL));
    }

    #[test]
    fn test_live_char_is_edge_triggered() {
        let (mut sync, _media) = loaded();
        sync.apply_decode(sos(600.0)).unwrap();

        assert_eq!(sync.on_time_update(0.01), Some('S'));
        assert_eq!(sync.on_time_update(0.1), None);
        assert_eq!(sync.on_time_update(0.19), None);
        assert_eq!(sync.on_time_update(0.21), Some('O'));
        // the second S is a different event with the same character
        assert_eq!(sync.on_time_update(0.45), Some('S'));
        assert_eq!(sync.on_time_update(0.5), None);
    }

    #[test]
    fn test_load_shows_marker_once() {
        let (mut sync, _media) = loaded();
        assert_eq!(sync.live_char(), NO_SYMBOL);
        assert_eq!(sync.on_time_update(0.0), None);
        assert_eq!(sync.on_time_update(0.1), None);

        // before any media, the first update always emits
        let mut fresh = PlaybackSync::new(WaterfallConfig::default());
        assert_eq!(fresh.on_time_update(0.0), Some(NO_SYMBOL));
    }

    #[test]
    fn test_decode_recenters_window() {
        let (mut sync, _media) = loaded();
        assert_eq!(sync.window(), FrequencyWindow::full_band(Hertz(8_000.0)));

        sync.apply_decode(sos(600.0)).unwrap();
        let window = sync.window().unwrap();
        assert_eq!((window.min, window.max), (Hertz(0.0), Hertz(1_200.0)));
        assert!(sync.take_overlay_dirty());
        assert!(!sync.take_overlay_dirty());

        sync.retune(Hertz(4_000.0));
        let window = sync.window().unwrap();
        assert_eq!((window.min, window.max), (Hertz(2_500.0), Hertz(5_500.0)));
    }

    #[test]
    fn test_invalid_decode_keeps_previous_state() {
        let (mut sync, _media) = loaded();
        sync.apply_decode(sos(600.0)).unwrap();

        let mut bad = sos(2_000.0);
        bad.events.swap(0, 2);
        assert!(sync.apply_decode(bad).is_err());
        assert_eq!(sync.regions().events().len(), 3);
        assert_eq!(sync.window().unwrap().max, Hertz(1_200.0));
        assert_eq!(sync.view_state().full_text, "SOS");
    }

    #[test]
    fn test_play_pause_drive_single_tick_loop() {
        let (mut sync, _media) = loaded();
        let now = Instant::now();
        assert!(!sync.is_playing());

        sync.on_play(now);
        let deadline = sync.deadline();
        sync.on_play(now + Duration::from_millis(10));
        assert_eq!(sync.deadline(), deadline, "second play must not restart the loop");

        sync.on_pause();
        assert!(!sync.is_playing());
        sync.on_pause();
        sync.on_finish();
        assert!(!sync.poll_tick(now + Duration::from_secs(1)));
    }

    #[test]
    fn test_each_due_tick_adds_one_row() {
        let (mut sync, media) = loaded();
        let now = Instant::now();
        sync.on_play(now);
        assert_eq!(sync.tap_variant(), TapVariant::Unresolved);

        let period = WaterfallConfig::default().tick_period;
        assert!(sync.poll_tick(now + period));
        assert!(!sync.poll_tick(now + period));
        assert!(sync.poll_tick(now + period * 2));

        assert_eq!(sync.tap_variant(), TapVariant::LiveAnalyser);
        assert!(media.is_tapped());
        assert_eq!(sync.renderer.buffer().unwrap().shifts(), 2);
    }

    #[test]
    fn test_same_media_falls_back_after_reload_but_new_media_does_not() {
        let (mut sync, media) = loaded();
        let now = Instant::now();
        sync.on_play(now);
        sync.tick();
        assert_eq!(sync.tap_variant(), TapVariant::LiveAnalyser);

        // same element reloaded: its tap is spent for good
        sync.on_media_loaded(media, 1.0);
        sync.on_play(now);
        sync.tick();
        assert_eq!(sync.tap_variant(), TapVariant::SpectrogramSample);

        sync.on_media_loaded(MediaElement::new(Hertz(16_000.0)), 1.0);
        assert_eq!(sync.tap_variant(), TapVariant::Unresolved);
        sync.on_play(now);
        sync.tick();
        assert_eq!(sync.tap_variant(), TapVariant::LiveAnalyser);
    }

    #[test]
    fn test_fallback_picks_up_spectrogram() {
        let (mut sync, media) = loaded();
        let _elsewhere = media.claim_tap().unwrap();
        sync.on_play(Instant::now());
        sync.tick();
        assert_eq!(sync.tap_variant(), TapVariant::SpectrogramSample);

        let image = SpectrogramImage::new(1, 4, vec![[0; 3], [0; 3], [0; 3], [0, 0, 255]]).unwrap();
        sync.on_spectrogram(Arc::new(image));
        sync.apply_decode(sos(2_000.0)).unwrap();
        sync.on_time_update(0.3);
        sync.tick();

        let row = sync.renderer.buffer().unwrap().row(0).unwrap();
        assert!(row.iter().any(|&px| px != crate::waterfall::BACKGROUND));
    }
}
