use morsescope_messages::{FrequencyWindow, Hertz, WaterfallConfig, WaterfallImage};

use crate::tap::{AcquisitionTap, Frame};
use crate::transform::{frequency_from_pixel_y, pixel_x_from_frequency};

pub const BACKGROUND: [u8; 3] = [0, 0, 0];
/// Row color drawn when there is no data to show
pub const BASELINE: [u8; 3] = [20, 24, 40];

/// Low to high: blue, green, yellow, red
const GRADIENT: [[u8; 3]; 4] = [[0, 0, 255], [0, 255, 0], [255, 255, 0], [255, 0, 0]];

/// Color of an intensity on the four-stop gradient.
pub fn intensity_color(intensity: u8) -> [u8; 3] {
    let pos = intensity as f32 / 255.0 * (GRADIENT.len() - 1) as f32;
    let i = (pos.floor() as usize).min(GRADIENT.len() - 2);
    let t = pos - i as f32;
    let (lo, hi) = (GRADIENT[i], GRADIENT[i + 1]);
    std::array::from_fn(|c| (lo[c] as f32 + (hi[c] as f32 - lo[c] as f32) * t).round() as u8)
}

/// Scrolling image: a ring of rows with a cursor on the newest one.
///
/// Row age 0 is the most recent and is shown at the bottom.
#[derive(Debug, Clone)]
pub struct WaterfallBuffer {
    width: usize,
    height: usize,
    pixels: Vec<[u8; 3]>,
    newest: usize,
    shifts: u64,
}

impl WaterfallBuffer {
    pub fn new(width: usize, height: usize) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels: vec![BACKGROUND; width * height],
            newest: 0,
            shifts: 0,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of row shifts since creation.
    pub fn shifts(&self) -> u64 {
        self.shifts
    }

    /// Scroll everything up one row and hand out the cleared bottom row.
    /// The oldest row is discarded.
    pub fn shift(&mut self) -> &mut [[u8; 3]] {
        self.newest = (self.newest + 1) % self.height;
        self.shifts += 1;
        let start = self.newest * self.width;
        let row = &mut self.pixels[start..start + self.width];
        row.fill(BACKGROUND);
        row
    }

    /// Row `age` ticks old; 0 is the newest.
    pub fn row(&self, age: usize) -> Option<&[[u8; 3]]> {
        if age >= self.height {
            return None;
        }
        let idx = (self.newest + self.height - age) % self.height;
        Some(&self.pixels[idx * self.width..(idx + 1) * self.width])
    }

    /// Copy out with the oldest row on top.
    pub fn to_image(&self) -> WaterfallImage {
        let mut pixels = Vec::with_capacity(self.width * self.height);
        for age in (0..self.height).rev() {
            if let Some(row) = self.row(age) {
                pixels.extend_from_slice(row);
            }
        }
        WaterfallImage {
            width: self.width,
            height: self.height,
            pixels,
        }
    }
}

/// Turns acquisition frames into waterfall rows.
pub struct WaterfallRenderer {
    width: usize,
    height: usize,
    visible: bool,
    buffer: Option<WaterfallBuffer>,
    window: Option<FrequencyWindow>,
    noise_floor: u8,
}

impl WaterfallRenderer {
    pub fn new(config: &WaterfallConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            visible: true,
            buffer: WaterfallBuffer::new(config.width, config.height),
            window: None,
            noise_floor: config.noise_floor,
        }
    }

    pub fn window(&self) -> Option<FrequencyWindow> {
        self.window
    }

    pub fn set_window(&mut self, window: Option<FrequencyWindow>) {
        self.window = window;
    }

    pub fn buffer(&self) -> Option<&WaterfallBuffer> {
        self.buffer.as_ref()
    }

    /// Start over at a new size. History is not rescaled.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.reset();
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        self.reset();
    }

    /// Clear to background.
    pub fn reset(&mut self) {
        self.buffer = if self.visible {
            WaterfallBuffer::new(self.width, self.height)
        } else {
            None
        };
    }

    /// Sample the tap once and add the result as the newest row.
    /// Does nothing while hidden.
    pub fn tick(&mut self, tap: &mut AcquisitionTap, current_time: f64, duration: f64) {
        if self.buffer.is_none() {
            return;
        }
        let frame = tap.sample(current_time, duration);
        self.draw(&frame);
    }

    /// Add `frame` as the newest row.
    pub fn draw(&mut self, frame: &Frame) {
        let floor = self.noise_floor;
        let configured = self.window;
        let Some(buffer) = self.buffer.as_mut() else {
            return;
        };
        let width = buffer.width();
        let row = buffer.shift();

        let points: Vec<(Hertz, u8)> = match frame {
            Frame::Empty => {
                row.fill(BASELINE);
                return;
            }
            Frame::Spectrum { bins, nyquist } => {
                let n = bins.len() as f32;
                bins.iter()
                    .enumerate()
                    .map(|(i, &v)| (Hertz(i as f32 * nyquist.0 / n), v))
                    .collect()
            }
            Frame::Column { rows, nyquist } => {
                let h = rows.len() as f32;
                rows.iter()
                    .enumerate()
                    .filter_map(|(y, &v)| Some((frequency_from_pixel_y(y as f32, h, *nyquist)?, v)))
                    .collect()
            }
        };

        let nyquist = match frame {
            Frame::Spectrum { nyquist, .. } | Frame::Column { nyquist, .. } => *nyquist,
            Frame::Empty => return,
        };
        let Some(window) = configured.or_else(|| FrequencyWindow::full_band(nyquist)) else {
            row.fill(BASELINE);
            return;
        };

        // brightest bin wins when several land on one pixel
        let mut peaks = vec![0u8; width];
        for (freq, intensity) in points {
            if intensity <= floor {
                continue;
            }
            let Some(x) = pixel_x_from_frequency(freq, &window, width as f32) else {
                continue;
            };
            let x = (x as usize).min(width - 1);
            peaks[x] = peaks[x].max(intensity);
        }
        for (pixel, &peak) in row.iter_mut().zip(&peaks) {
            if peak > floor {
                *pixel = intensity_color(peak);
            }
        }
    }

    pub fn image(&self) -> Option<WaterfallImage> {
        self.buffer.as_ref().map(WaterfallBuffer::to_image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaElement;

    fn config(width: usize, height: usize) -> WaterfallConfig {
        WaterfallConfig {
            width,
            height,
            noise_floor: 32,
            ..WaterfallConfig::default()
        }
    }

    fn window(min: f32, max: f32) -> Option<FrequencyWindow> {
        Some(FrequencyWindow {
            min: Hertz(min),
            max: Hertz(max),
        })
    }

    #[test]
    fn test_gradient_stops() {
        assert_eq!(intensity_color(0), [0, 0, 255]);
        assert_eq!(intensity_color(85), [0, 255, 0]);
        assert_eq!(intensity_color(170), [255, 255, 0]);
        assert_eq!(intensity_color(255), [255, 0, 0]);
    }

    #[test]
    fn test_buffer_shift_scrolls_rows_up() {
        let mut buffer = WaterfallBuffer::new(2, 3).unwrap();
        buffer.shift().fill([1, 1, 1]);
        buffer.shift().fill([2, 2, 2]);
        assert_eq!(buffer.row(0).unwrap(), &[[2, 2, 2]; 2]);
        assert_eq!(buffer.row(1).unwrap(), &[[1, 1, 1]; 2]);
        assert_eq!(buffer.row(2).unwrap(), &[BACKGROUND; 2]);
        assert!(buffer.row(3).is_none());

        // a third and fourth shift push the first row out the top
        buffer.shift().fill([3, 3, 3]);
        buffer.shift();
        assert_eq!(buffer.row(0).unwrap(), &[BACKGROUND; 2]);
        assert_eq!(buffer.row(2).unwrap(), &[[2, 2, 2]; 2]);
        assert_eq!(buffer.shifts(), 4);

        let image = buffer.to_image();
        assert_eq!(image.pixels[0], [2, 2, 2]);
        assert_eq!(image.pixels[5], BACKGROUND);
    }

    #[test]
    fn test_zero_sized_buffer() {
        assert!(WaterfallBuffer::new(0, 10).is_none());
        let mut renderer = WaterfallRenderer::new(&config(0, 10));
        renderer.draw(&Frame::Empty);
        assert!(renderer.image().is_none());
    }

    #[test]
    fn test_spectrum_bins_land_inside_window() {
        let mut renderer = WaterfallRenderer::new(&config(10, 4));
        renderer.set_window(window(0.0, 1_000.0));
        // 16 bins over 0..8000 Hz: bin 1 = 500 Hz, bin 2 = 1000 Hz, bin 3 = 1500 Hz
        let mut bins = vec![0u8; 16];
        bins[1] = 200;
        bins[2] = 100;
        bins[3] = 255;
        renderer.draw(&Frame::Spectrum {
            bins,
            nyquist: Hertz(8_000.0),
        });

        let buffer = renderer.buffer().unwrap();
        let row = buffer.row(0).unwrap();
        assert_eq!(row[5], intensity_color(200));
        assert_eq!(row[9], intensity_color(100));
        let drawn = row.iter().filter(|&&px| px != BACKGROUND).count();
        assert_eq!(drawn, 2, "1500 Hz lies outside the window");
    }

    #[test]
    fn test_noise_floor_suppresses_weak_bins() {
        let mut renderer = WaterfallRenderer::new(&config(8, 2));
        renderer.set_window(window(0.0, 8_000.0));
        renderer.draw(&Frame::Spectrum {
            bins: vec![32; 8],
            nyquist: Hertz(8_000.0),
        });
        let row = renderer.buffer().unwrap().row(0).unwrap();
        assert!(row.iter().all(|&px| px == BACKGROUND));
    }

    #[test]
    fn test_column_rows_map_top_down() {
        let mut renderer = WaterfallRenderer::new(&config(4, 2));
        renderer.set_window(window(0.0, 8_000.0));
        // rows of a 4-row column: 8000, 6000, 4000, 2000 Hz
        renderer.draw(&Frame::Column {
            rows: vec![0, 0, 0, 250],
            nyquist: Hertz(8_000.0),
        });
        let row = renderer.buffer().unwrap().row(0).unwrap();
        assert_eq!(row[1], intensity_color(250));
        assert_eq!(row.iter().filter(|&&px| px != BACKGROUND).count(), 1);
    }

    #[test]
    fn test_empty_frame_draws_baseline() {
        let mut renderer = WaterfallRenderer::new(&config(3, 2));
        renderer.draw(&Frame::Empty);
        let buffer = renderer.buffer().unwrap();
        assert_eq!(buffer.row(0).unwrap(), &[BASELINE; 3]);
        assert_eq!(buffer.row(1).unwrap(), &[BACKGROUND; 3]);
    }

    #[test]
    fn test_tick_shifts_once_and_samples_once() {
        let media = MediaElement::new(Hertz(16_000.0));
        let mut tap = AcquisitionTap::new(media, 64);
        let mut renderer = WaterfallRenderer::new(&config(16, 8));
        renderer.tick(&mut tap, 0.0, 1.0);
        renderer.tick(&mut tap, 0.05, 1.0);
        assert_eq!(renderer.buffer().unwrap().shifts(), 2);
    }

    #[test]
    fn test_resize_and_hide_clear_history() {
        let mut renderer = WaterfallRenderer::new(&config(4, 4));
        renderer.draw(&Frame::Empty);
        renderer.resize(8, 2);
        let buffer = renderer.buffer().unwrap();
        assert_eq!((buffer.width(), buffer.height(), buffer.shifts()), (8, 2, 0));
        assert!(buffer.row(0).unwrap().iter().all(|&px| px == BACKGROUND));

        renderer.set_visible(false);
        assert!(renderer.image().is_none());
        let media = MediaElement::new(Hertz(16_000.0));
        let mut tap = AcquisitionTap::new(media.clone(), 64);
        renderer.tick(&mut tap, 0.0, 1.0);
        // hidden ticks do not touch the tap
        assert!(!media.is_tapped());

        renderer.set_visible(true);
        assert_eq!(renderer.image().unwrap().width, 8);
    }
}
