/// Frequency in Hertz.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Hertz(pub f32);

impl std::fmt::Display for Hertz {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.0} Hz", self.0)
    }
}

impl Hertz {
    pub const fn khz(khz: f32) -> Self {
        Self(khz * 1_000.0)
    }

    pub const fn as_hz(self) -> f32 {
        self.0
    }

    /// Highest representable frequency for this sample rate.
    pub fn nyquist(self) -> Self {
        Self(self.0 / 2.0)
    }

    pub fn round(self) -> Self {
        Self(self.0.round())
    }
}

impl From<f32> for Hertz {
    fn from(hz: f32) -> Self {
        Self(hz)
    }
}

impl From<Hertz> for f32 {
    fn from(hz: Hertz) -> Self {
        hz.0
    }
}
