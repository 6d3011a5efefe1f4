use flume::Sender;
use log::trace;

use crate::control_panel::ControlPanel;
use crate::region_strip::RegionStrip;
use crate::spectrogram::Spectrogram;
use crate::waterfall::Waterfall;
use morsescope_messages::{Command, Event, ViewState};

/// Local UI state derived from engine events.
pub(super) struct UiState {
    /// Latest engine snapshot
    pub view: Option<ViewState>,

    pub waterfall: Waterfall,

    pub spectrogram: Spectrogram,

    pub region_strip: RegionStrip,

    pub control_panel: ControlPanel,
}

impl UiState {
    pub fn new(cmd_tx: Sender<Command>) -> Self {
        Self {
            view: None,
            waterfall: Waterfall::new(cmd_tx.clone()),
            spectrogram: Spectrogram::new(cmd_tx.clone()),
            region_strip: RegionStrip::new(cmd_tx.clone()),
            control_panel: ControlPanel::new(cmd_tx),
        }
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::StateSnapshot(state) => {
                self.waterfall.set_window(state.window);
                self.region_strip.update_from_view(&state);
                self.spectrogram.set_duration(state.duration);
                self.control_panel.update_from_view(&state);
                self.view = Some(state);
            }
            Event::LiveChar(ch) => {
                trace!("Live character {:?}", ch);
                self.control_panel.set_live_char(ch);
            }
            Event::Position(t) => {
                self.region_strip.set_position(t);
                self.spectrogram.set_position(t);
                self.control_panel.set_position(t);
            }
            Event::Playing(playing) => self.control_panel.set_playing(playing),
            Event::WaterfallFrame(image) => self.waterfall.set_frame(&image),
            Event::Spectrogram { image, nyquist } => self.spectrogram.set_image(&image, nyquist),
        }
    }
}
