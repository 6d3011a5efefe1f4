use anyhow::{Result, ensure};
use morsescope_messages::{Hertz, WaterfallImage};
use std::sync::Arc;

use crate::analyser::{FftFrame, magnitude_to_byte};
use crate::tap::Frame;

/// A pre-rendered time-vs-frequency image of a whole recording.
///
/// Column `x` covers time fraction `x / width`; row 0 is Nyquist and the last
/// row is 0 Hz. Brightness encodes magnitude.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrogramImage {
    width: usize,
    height: usize,
    pixels: Vec<[u8; 3]>,
}

impl SpectrogramImage {
    pub fn new(width: usize, height: usize, pixels: Vec<[u8; 3]>) -> Result<Self> {
        ensure!(width > 0 && height > 0, "spectrogram image must not be empty");
        ensure!(
            pixels.len() == width * height,
            "expected {} pixels for {width}x{height}, got {}",
            width * height,
            pixels.len()
        );
        Ok(Self { width, height, pixels })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Copy of the pixels for display.
    pub fn to_image(&self) -> WaterfallImage {
        WaterfallImage {
            width: self.width,
            height: self.height,
            pixels: self.pixels.clone(),
        }
    }

    /// Intensity of every row of column `x`, top row first.
    pub fn column_intensity(&self, x: usize) -> Vec<u8> {
        let x = x.min(self.width - 1);
        (0..self.height)
            .map(|y| {
                let [r, g, b] = self.pixels[y * self.width + x];
                r.max(g).max(b)
            })
            .collect()
    }
}

/// Reads waterfall rows out of the static spectrogram at the playback position.
#[derive(Debug, Clone)]
pub struct SpectrogramSampler {
    image: Option<Arc<SpectrogramImage>>,
    nyquist: Hertz,
}

impl SpectrogramSampler {
    pub fn new(image: Option<Arc<SpectrogramImage>>, nyquist: Hertz) -> Self {
        Self { image, nyquist }
    }

    pub fn set_image(&mut self, image: Arc<SpectrogramImage>) {
        self.image = Some(image);
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    pub fn sample(&self, current_time: f64, duration: f64) -> Frame {
        let Some(image) = &self.image else {
            return Frame::Empty;
        };
        if !(duration.is_finite() && duration > 0.0) || !current_time.is_finite() {
            return Frame::Empty;
        }
        let fraction = (current_time / duration).clamp(0.0, 1.0);
        let x = (fraction * image.width() as f64).floor() as usize;
        Frame::Column {
            rows: image.column_intensity(x),
            nyquist: self.nyquist,
        }
    }
}

/// Render a greyscale spectrogram of `samples`, `width` columns by `height` rows.
pub fn render(
    samples: &[f32],
    sample_rate: Hertz,
    fft_size: usize,
    width: usize,
    height: usize,
) -> Result<SpectrogramImage> {
    ensure!(!samples.is_empty(), "cannot render a spectrogram of no samples");
    ensure!(sample_rate.0 > 0.0, "sample rate must be positive");

    let mut frame = FftFrame::new(fft_size);
    let half = frame.size() / 2;
    let mut pixels = vec![[0u8; 3]; width * height];

    for x in 0..width {
        // analysis window ends at the column's time position
        let end = ((x + 1) * samples.len() / width.max(1)).min(samples.len());
        let start = end.saturating_sub(frame.size());
        let magnitudes = frame.magnitudes(&samples[start..end]);

        for y in 0..height {
            // row y covers frequency (1 - y/height) * nyquist
            let bin = ((height - y) * half / height).min(half - 1);
            let v = magnitude_to_byte(magnitudes[bin]);
            pixels[y * width + x] = [v, v, v];
        }
    }
    SpectrogramImage::new(width, height, pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn striped() -> SpectrogramImage {
        // 4 columns x 3 rows, column x has intensity 10*x + row
        let mut pixels = Vec::new();
        for y in 0..3u8 {
            for x in 0..4u8 {
                pixels.push([0, 10 * x + y, y]);
            }
        }
        SpectrogramImage::new(4, 3, pixels).unwrap()
    }

    #[test]
    fn test_rejects_mismatched_pixels() {
        assert!(SpectrogramImage::new(2, 2, vec![[0; 3]; 3]).is_err());
        assert!(SpectrogramImage::new(0, 2, Vec::new()).is_err());
    }

    #[test]
    fn test_column_intensity_is_max_channel() {
        let image = SpectrogramImage::new(1, 2, vec![[10, 200, 30], [90, 5, 60]]).unwrap();
        assert_eq!(image.column_intensity(0), vec![200, 90]);
    }

    #[test]
    fn test_sampler_reads_column_at_playback_position() {
        let sampler = SpectrogramSampler::new(Some(Arc::new(striped())), Hertz(8_000.0));
        match sampler.sample(5.0, 10.0) {
            Frame::Column { rows, nyquist } => {
                assert_eq!(rows, vec![20, 21, 22]);
                assert_eq!(nyquist, Hertz(8_000.0));
            }
            other => panic!("expected a column, got {:?}", other),
        }
        // end of the recording clamps to the last column
        assert!(matches!(sampler.sample(10.0, 10.0), Frame::Column { rows, .. } if rows[0] == 30));
    }

    #[test]
    fn test_sampler_without_image_or_duration_is_empty() {
        let mut sampler = SpectrogramSampler::new(None, Hertz(8_000.0));
        assert!(matches!(sampler.sample(1.0, 10.0), Frame::Empty));
        sampler.set_image(Arc::new(striped()));
        assert!(sampler.has_image());
        assert!(matches!(sampler.sample(1.0, 0.0), Frame::Empty));
    }

    #[test]
    fn test_render_puts_tone_on_its_row() {
        let rate = 16_000.0;
        let samples: Vec<f32> = (0..16_000)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 2_000.0 * i as f32 / rate).sin())
            .collect();
        let image = render(&samples, Hertz(rate), 512, 8, 64).unwrap();
        let column = image.column_intensity(4);
        let (row, _) = column.iter().enumerate().max_by_key(|&(_, v)| *v).unwrap();
        // 2 kHz of 8 kHz is a quarter of the way up: row 48 of 64
        assert!((row as i64 - 48).abs() <= 1, "peak row {row}");
    }
}
