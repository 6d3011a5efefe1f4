use log::info;
use morsescope_messages::Hertz;
use std::sync::Arc;

use crate::analyser::LiveAnalyser;
use crate::media::MediaElement;
use crate::spectrogram::{SpectrogramImage, SpectrogramSampler};

/// One acquisition result, taken once per render tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Per-bin magnitudes, bin `i` at `i * nyquist / bins.len()`.
    Spectrum { bins: Vec<u8>, nyquist: Hertz },
    /// Pixel intensities of a spectrogram column, top row (Nyquist) first.
    Column { rows: Vec<u8>, nyquist: Hertz },
    /// Nothing to show yet.
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapVariant {
    Unresolved,
    LiveAnalyser,
    SpectrogramSample,
}

enum TapState {
    Unresolved,
    Live(LiveAnalyser),
    Sampled(SpectrogramSampler),
}

/// Source of waterfall data for one playback session of one media element.
///
/// Resolves on first use: the live analyser when the media element's tap can
/// be claimed, the static spectrogram otherwise. The choice never changes.
pub struct AcquisitionTap {
    media: MediaElement,
    fft_size: usize,
    spectrogram: Option<Arc<SpectrogramImage>>,
    state: TapState,
}

impl AcquisitionTap {
    pub fn new(media: MediaElement, fft_size: usize) -> Self {
        Self {
            media,
            fft_size,
            spectrogram: None,
            state: TapState::Unresolved,
        }
    }

    pub fn media(&self) -> &MediaElement {
        &self.media
    }

    pub fn variant(&self) -> TapVariant {
        match self.state {
            TapState::Unresolved => TapVariant::Unresolved,
            TapState::Live(_) => TapVariant::LiveAnalyser,
            TapState::Sampled(_) => TapVariant::SpectrogramSample,
        }
    }

    /// Provide the static spectrogram used by the fallback path.
    pub fn set_spectrogram(&mut self, image: Arc<SpectrogramImage>) {
        if let TapState::Sampled(sampler) = &mut self.state {
            sampler.set_image(image.clone());
        }
        self.spectrogram = Some(image);
    }

    /// Pick the acquisition strategy if not done yet.
    pub fn resolve(&mut self) -> TapVariant {
        if let TapState::Unresolved = self.state {
            self.state = match self.media.claim_tap() {
                Some(token) => {
                    info!("Waterfall reading live analyser on media {}", self.media.id());
                    TapState::Live(LiveAnalyser::new(token, self.fft_size))
                }
                None => {
                    info!(
                        "Live tap on media {} already taken, sampling the static spectrogram",
                        self.media.id()
                    );
                    TapState::Sampled(SpectrogramSampler::new(
                        self.spectrogram.clone(),
                        self.media.sample_rate().nyquist(),
                    ))
                }
            };
        }
        self.variant()
    }

    /// Take one frame. Call at most once per tick.
    pub fn sample(&mut self, current_time: f64, duration: f64) -> Frame {
        self.resolve();
        match &mut self.state {
            TapState::Live(analyser) => Frame::Spectrum {
                nyquist: analyser.nyquist(),
                bins: analyser.sample(),
            },
            TapState::Sampled(sampler) => sampler.sample(current_time, duration),
            TapState::Unresolved => Frame::Empty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> Arc<SpectrogramImage> {
        Arc::new(SpectrogramImage::new(2, 2, vec![[0, 0, 100], [0, 0, 200], [50, 0, 0], [0, 60, 0]]).unwrap())
    }

    #[test]
    fn test_resolves_lazily_to_live_analyser() {
        let media = MediaElement::new(Hertz(16_000.0));
        let mut tap = AcquisitionTap::new(media.clone(), 256);
        assert_eq!(tap.variant(), TapVariant::Unresolved);
        assert!(!media.is_tapped());

        match tap.sample(0.0, 1.0) {
            Frame::Spectrum { bins, nyquist } => {
                assert_eq!(bins.len(), 128);
                assert_eq!(nyquist, Hertz(8_000.0));
            }
            other => panic!("expected a spectrum, got {:?}", other),
        }
        assert_eq!(tap.variant(), TapVariant::LiveAnalyser);
        assert!(media.is_tapped());
    }

    #[test]
    fn test_falls_back_when_tap_is_taken() {
        let media = MediaElement::new(Hertz(16_000.0));
        let _other_consumer = media.claim_tap().unwrap();

        let mut tap = AcquisitionTap::new(media, 256);
        assert_eq!(tap.resolve(), TapVariant::SpectrogramSample);
        // no spectrogram rendered yet
        assert_eq!(tap.sample(0.5, 1.0), Frame::Empty);

        tap.set_spectrogram(image());
        assert_eq!(
            tap.sample(0.75, 1.0),
            Frame::Column {
                rows: vec![200, 60],
                nyquist: Hertz(8_000.0)
            }
        );
    }

    #[test]
    fn test_second_session_on_same_media_falls_back_for_good() {
        let media = MediaElement::new(Hertz(16_000.0));
        let mut first = AcquisitionTap::new(media.clone(), 256);
        assert_eq!(first.resolve(), TapVariant::LiveAnalyser);

        let mut second = AcquisitionTap::new(media, 256);
        assert_eq!(second.resolve(), TapVariant::SpectrogramSample);

        // freeing the first session does not bring the live path back
        drop(first);
        second.sample(0.1, 1.0);
        assert_eq!(second.resolve(), TapVariant::SpectrogramSample);
    }

    #[test]
    fn test_spectrogram_given_before_resolution_is_kept() {
        let media = MediaElement::new(Hertz(16_000.0));
        let _claimed = media.claim_tap();
        let mut tap = AcquisitionTap::new(media, 256);
        tap.set_spectrogram(image());
        assert!(matches!(tap.sample(0.0, 1.0), Frame::Column { .. }));
    }
}
