use crate::Hertz;

/// How a frequency window that runs past 0 Hz or Nyquist is pulled back into range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClampPolicy {
    /// Clamp the clipped bound and mirror it around the center, so the tone
    /// stays in the middle of a narrower window.
    #[default]
    Mirror,
    /// Clamp the clipped bound and push the opposite bound outward to keep the
    /// configured width where the band allows it.
    PreserveSpan,
}

/// The sub-band of the spectrum mapped onto the waterfall's horizontal axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyWindow {
    pub min: Hertz,
    pub max: Hertz,
}

impl FrequencyWindow {
    /// Window covering the whole band up to `nyquist`.
    pub fn full_band(nyquist: Hertz) -> Option<Self> {
        (nyquist.0 > 0.0).then_some(Self {
            min: Hertz(0.0),
            max: nyquist,
        })
    }

    /// Window of width `span` centered on `center`, clamped to `[0, nyquist]`.
    ///
    /// Returns `None` when `nyquist` is not positive. Degenerate spans or
    /// centers fall back to the full band.
    pub fn centered(center: Hertz, span: Hertz, nyquist: Hertz, policy: ClampPolicy) -> Option<Self> {
        let full = Self::full_band(nyquist)?;
        let (c, ny) = (center.0, nyquist.0);
        if !c.is_finite() || !span.0.is_finite() || span.0 <= 0.0 || c < 0.0 || c > ny {
            return Some(full);
        }

        let half = span.0 / 2.0;
        let mut min = c - half;
        let mut max = c + half;

        match policy {
            ClampPolicy::Mirror => {
                if min < 0.0 {
                    min = 0.0;
                    max = (c + (c - min)).min(ny);
                }
                if max > ny {
                    max = ny;
                    min = (c - (max - c)).max(0.0);
                }
            }
            ClampPolicy::PreserveSpan => {
                if min < 0.0 {
                    max = (max - min).min(ny);
                    min = 0.0;
                }
                if max > ny {
                    min = (min - (max - ny)).max(0.0);
                    max = ny;
                }
            }
        }

        if max <= min {
            return Some(full);
        }
        Some(Self {
            min: Hertz(min),
            max: Hertz(max),
        })
    }

    pub fn width(&self) -> f32 {
        self.max.0 - self.min.0
    }

    pub fn contains(&self, freq: Hertz) -> bool {
        freq.0 >= self.min.0 && freq.0 <= self.max.0
    }
}
