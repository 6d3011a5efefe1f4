use crate::{DecodeResult, Hertz};

/// Commands sent from the UI (or the surrounding application) to the engine.
#[derive(Debug)]
pub enum Command {
    /// Stop the engine and the playback it drives.
    Stop,
    /// Toggle playback.
    PlayPause,
    /// Seek playback to a normalized position in `[0, 1]`.
    Seek(f64),
    /// A new decode result is available. Replaces regions and the frequency window.
    ApplyDecode(DecodeResult),
    /// Manually re-center the waterfall on a frequency picked by the operator.
    Retune(Hertz),
    /// The waterfall display changed size. The buffer is recreated.
    ResizeWaterfall { width: usize, height: usize },
    /// The waterfall display was hidden or shown. The buffer is recreated.
    SetWaterfallVisible(bool),
}
