mod command;
mod decode;
mod event;
mod state;
mod units;
mod window;

pub use command::Command;
pub use decode::{DecodeResult, DecodedEvent};
pub use event::{Event, WaterfallImage};
pub use state::{ViewState, WaterfallConfig};
pub use units::Hertz;
pub use window::{ClampPolicy, FrequencyWindow};

/// Marker shown in the live-character display when no symbol is keyed.
pub const NO_SYMBOL: char = '_';
