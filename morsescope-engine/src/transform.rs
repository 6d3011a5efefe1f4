//! Mappings between pixels, playback time and frequency.
//!
//! Every function returns `None` for degenerate geometry (zero width, zero
//! duration, non-finite input) so callers can bail out before drawing.

use morsescope_messages::{FrequencyWindow, Hertz};

fn positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

/// Playback time under horizontal pixel `x` of the visible viewport.
pub fn time_from_pixel_x(
    x: f64,
    visible_width: f64,
    total_width: f64,
    scroll_offset: f64,
    duration: f64,
) -> Option<f64> {
    if !positive(visible_width) || !positive(total_width) || !positive(duration) {
        return None;
    }
    if !x.is_finite() || !scroll_offset.is_finite() {
        return None;
    }
    let zoom_ratio = total_width / visible_width;
    let absolute_px = (x / visible_width) * visible_width * zoom_ratio + scroll_offset;
    let normalized = (absolute_px / total_width).clamp(0.0, 1.0);
    Some(normalized * duration)
}

/// Horizontal pixel of time `t` relative to the visible viewport: its place on
/// the zoomed timeline minus the scroll offset.
///
/// At zoom 1 this inverts [`time_from_pixel_x`]. When zoomed, that function
/// scales `x` by the zoom ratio a second time; [`Viewport::time_at`] divides it
/// back out.
pub fn pixel_x_from_time(
    t: f64,
    visible_width: f64,
    total_width: f64,
    scroll_offset: f64,
    duration: f64,
) -> Option<f64> {
    if !positive(visible_width) || !positive(total_width) || !positive(duration) {
        return None;
    }
    if !t.is_finite() || !scroll_offset.is_finite() {
        return None;
    }
    Some(t / duration * total_width - scroll_offset)
}

/// Frequency at row `y` of a spectrogram `container_height` pixels tall,
/// 0 Hz at the bottom and Nyquist at the top.
pub fn frequency_from_pixel_y(y: f32, container_height: f32, nyquist: Hertz) -> Option<Hertz> {
    if !(container_height.is_finite() && container_height > 0.0) || !y.is_finite() {
        return None;
    }
    Some(Hertz((nyquist.0 * (1.0 - y / container_height)).round()))
}

/// Horizontal pixel of `freq` on a waterfall `display_width` pixels wide.
/// `None` when the frequency lies outside the window.
pub fn pixel_x_from_frequency(freq: Hertz, window: &FrequencyWindow, display_width: f32) -> Option<f32> {
    let span = window.width();
    if !(span > 0.0) || !(display_width > 0.0) || !window.contains(freq) {
        return None;
    }
    Some((freq.0 - window.min.0) / span * display_width)
}

/// Frequency under horizontal pixel `x` of the waterfall, rounded to 1 Hz.
pub fn frequency_from_pixel_x(x: f32, window: &FrequencyWindow, display_width: f32) -> Option<Hertz> {
    if !(display_width > 0.0) || !x.is_finite() {
        return None;
    }
    let fraction = (x / display_width).clamp(0.0, 1.0);
    Some(Hertz((window.min.0 + fraction * window.width()).round()))
}

/// Zoom and scroll state of the time axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Width of the visible area in pixels
    pub visible_width: f64,
    /// Width of the whole zoomed timeline in pixels
    pub total_width: f64,
    /// Pixels scrolled from the start of the timeline
    pub scroll_offset: f64,
    /// Recording duration in seconds
    pub duration: f64,
}

impl Viewport {
    /// Unzoomed viewport showing the whole recording.
    pub fn fit(width: f64, duration: f64) -> Self {
        Self {
            visible_width: width,
            total_width: width,
            scroll_offset: 0.0,
            duration,
        }
    }

    pub fn zoom_ratio(&self) -> f64 {
        self.total_width / self.visible_width
    }

    /// Time under visible pixel `x`, the inverse of [`Viewport::x_at`].
    pub fn time_at(&self, x: f64) -> Option<f64> {
        let x = x / self.zoom_ratio();
        time_from_pixel_x(x, self.visible_width, self.total_width, self.scroll_offset, self.duration)
    }

    pub fn x_at(&self, t: f64) -> Option<f64> {
        pixel_x_from_time(t, self.visible_width, self.total_width, self.scroll_offset, self.duration)
    }

    /// Time interval currently on screen.
    pub fn visible_time_range(&self) -> Option<(f64, f64)> {
        Some((self.time_at(0.0)?, self.time_at(self.visible_width)?))
    }
}
