use log::debug;
use morsescope_messages::Hertz;
use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::collections::VecDeque;
use std::f32::consts::PI;
use std::sync::Arc;

use crate::media::TapToken;

/// dB range mapped onto the 0-255 byte scale
const MIN_DB: f32 = -100.0;
const MAX_DB: f32 = -30.0;
/// Weight of the previous frame when smoothing magnitudes over time
const SMOOTHING: f32 = 0.8;

const MIN_FFT_SIZE: usize = 32;
const MAX_FFT_SIZE: usize = 32_768;

/// Windowed FFT over a fixed number of samples.
pub(crate) struct FftFrame {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buf: Vec<Complex<f32>>,
    magnitudes: Vec<f32>,
}

impl FftFrame {
    pub fn new(size: usize) -> Self {
        let size = size.clamp(MIN_FFT_SIZE, MAX_FFT_SIZE).next_power_of_two();
        let fft = FftPlanner::new().plan_fft_forward(size);
        Self {
            fft,
            window: blackman(size),
            buf: vec![Complex::new(0.0, 0.0); size],
            magnitudes: vec![0.0; size / 2],
        }
    }

    pub fn size(&self) -> usize {
        self.window.len()
    }

    /// Linear magnitudes of bins `0..size/2`. Shorter input is zero-padded at the front.
    pub fn magnitudes(&mut self, samples: &[f32]) -> &[f32] {
        let n = self.size();
        let samples = &samples[samples.len().saturating_sub(n)..];
        let pad = n - samples.len();

        for (i, slot) in self.buf.iter_mut().enumerate() {
            let s = if i < pad { 0.0 } else { samples[i - pad] };
            *slot = Complex::new(s * self.window[i], 0.0);
        }
        self.fft.process(&mut self.buf);

        for (mag, bin) in self.magnitudes.iter_mut().zip(&self.buf) {
            *mag = bin.norm() / n as f32;
        }
        &self.magnitudes
    }
}

fn blackman(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| {
            let x = i as f32 / n as f32;
            0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
        })
        .collect()
}

/// Map a linear magnitude onto the analyser byte scale.
pub(crate) fn magnitude_to_byte(magnitude: f32) -> u8 {
    if magnitude <= 0.0 {
        return 0;
    }
    let db = 20.0 * magnitude.log10();
    let scaled = (db - MIN_DB) / (MAX_DB - MIN_DB) * 255.0;
    scaled.clamp(0.0, 255.0) as u8
}

/// Frequency analysis of the live signal flowing through a claimed media tap.
pub struct LiveAnalyser {
    token: TapToken,
    frame: FftFrame,
    history: VecDeque<f32>,
    smoothed: Vec<f32>,
}

impl LiveAnalyser {
    pub fn new(token: TapToken, fft_size: usize) -> Self {
        let frame = FftFrame::new(fft_size);
        let n = frame.size();
        debug!("Live analyser on media {} with {} point FFT", token.media_id(), n);
        Self {
            token,
            frame,
            history: VecDeque::with_capacity(n),
            smoothed: vec![0.0; n / 2],
        }
    }

    pub fn bin_count(&self) -> usize {
        self.smoothed.len()
    }

    pub fn nyquist(&self) -> Hertz {
        self.token.sample_rate().nyquist()
    }

    /// One frame of per-bin magnitudes on the 0-255 scale, covering 0..Nyquist.
    ///
    /// Only consumes samples already handed to the tap; never waits for more.
    pub fn sample(&mut self) -> Vec<u8> {
        let n = self.frame.size();
        for block in self.token.drain() {
            self.history.extend(block);
        }
        if self.history.len() > n {
            let excess = self.history.len() - n;
            self.history.drain(..excess);
        }

        let magnitudes = self.frame.magnitudes(self.history.make_contiguous());
        self.smoothed
            .iter_mut()
            .zip(magnitudes)
            .map(|(prev, &mag)| {
                *prev = SMOOTHING * *prev + (1.0 - SMOOTHING) * mag;
                magnitude_to_byte(*prev)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaElement;

    const SAMPLE_RATE: f32 = 16_000.0;

    fn tone(freq: f32, amplitude: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| amplitude * (2.0 * PI * freq * i as f32 / SAMPLE_RATE).sin())
            .collect()
    }

    fn analyser(fft_size: usize) -> (MediaElement, LiveAnalyser) {
        let media = MediaElement::new(Hertz(SAMPLE_RATE));
        let token = media.claim_tap().unwrap();
        (media.clone(), LiveAnalyser::new(token, fft_size))
    }

    #[test]
    fn test_silence_is_all_zero() {
        let (_media, mut analyser) = analyser(1024);
        let frame = analyser.sample();
        assert_eq!(frame.len(), 512);
        assert!(frame.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_tone_peaks_at_its_bin() {
        let (media, mut analyser) = analyser(1024);
        assert_eq!(analyser.nyquist(), Hertz(8_000.0));
        media.feed(&tone(1_000.0, 0.01, 4096));

        let frame = analyser.sample();
        let (peak_bin, &peak) = frame
            .iter()
            .enumerate()
            .max_by_key(|&(_, v)| *v)
            .expect("frame should not be empty");

        let bin_hz = 8_000.0 / analyser.bin_count() as f32;
        let peak_hz = peak_bin as f32 * bin_hz;
        assert!(peak > 0);
        assert!(
            (peak_hz - 1_000.0).abs() <= 2.0 * bin_hz,
            "peak at {peak_hz} Hz, expected 1000 Hz"
        );
        // far away bins stay quiet
        assert!(frame[400] < peak / 2);
    }

    #[test]
    fn test_smoothing_decays_after_signal_stops() {
        let (media, mut analyser) = analyser(256);
        media.feed(&tone(2_000.0, 0.01, 256));
        let first = analyser.sample();
        media.feed(&vec![0.0; 256]);
        let second = analyser.sample();
        let bin = 2_000 * 128 / 8_000;
        assert!(second[bin] <= first[bin]);
    }

    #[test]
    fn test_fft_size_is_normalised() {
        assert_eq!(FftFrame::new(1000).size(), 1024);
        assert_eq!(FftFrame::new(1).size(), MIN_FFT_SIZE);
    }

    #[test]
    fn test_magnitude_to_byte_range() {
        assert_eq!(magnitude_to_byte(0.0), 0);
        assert_eq!(magnitude_to_byte(1e-6), 0);
        assert_eq!(magnitude_to_byte(1.0), 255);
    }
}
