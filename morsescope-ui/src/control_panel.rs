use eframe::egui::{Grid, Response, RichText, Ui, Widget};
use flume::Sender;

use morsescope_messages::{Command, FrequencyWindow, NO_SYMBOL, ViewState};

/// Side panel: the character under the playhead, the decode summary and
/// the transport controls.
pub struct ControlPanel {
    cmd_tx: Sender<Command>,
    live_char: char,
    playing: bool,
    position: f64,
    duration: f64,
    full_text: String,
    wpm: f32,
    avg_snr: f32,
    window: Option<FrequencyWindow>,
    show_waterfall: bool,
}

impl ControlPanel {
    pub fn new(cmd_tx: Sender<Command>) -> Self {
        Self {
            cmd_tx,
            live_char: NO_SYMBOL,
            playing: false,
            position: 0.0,
            duration: 0.0,
            full_text: String::new(),
            wpm: 0.0,
            avg_snr: 0.0,
            window: None,
            show_waterfall: true,
        }
    }

    /// Update from engine state snapshot.
    pub fn update_from_view(&mut self, view: &ViewState) {
        self.duration = view.duration;
        self.full_text.clone_from(&view.full_text);
        self.wpm = view.wpm;
        self.avg_snr = view.avg_snr;
        self.window = view.window;
    }

    pub fn set_live_char(&mut self, ch: char) {
        self.live_char = ch;
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    pub fn set_position(&mut self, t: f64) {
        self.position = t;
    }

    pub fn show_waterfall(&self) -> bool {
        self.show_waterfall
    }
}

impl Widget for &mut ControlPanel {
    fn ui(self, ui: &mut Ui) -> Response {
        ui.vertical_centered(|ui| {
            ui.label(
                RichText::new(self.live_char.to_string())
                    .monospace()
                    .size(72.0)
                    .strong(),
            );
        });
        ui.separator();

        ui.horizontal(|ui| {
            let label = if self.playing { "Pause" } else { "Play" };
            if ui.button(label).clicked() {
                let _ = self.cmd_tx.send(Command::PlayPause);
            }
            ui.monospace(format!("{:6.2} / {:.2} s", self.position, self.duration));
        });

        if ui.checkbox(&mut self.show_waterfall, "Show waterfall").changed() {
            let _ = self.cmd_tx.send(Command::SetWaterfallVisible(self.show_waterfall));
        }

        ui.add_space(10.0);
        ui.heading("Decode");
        ui.separator();

        Grid::new("decode_summary").num_columns(2).show(ui, |ui| {
            ui.label("WPM:");
            ui.label(format!("{:.1}", self.wpm));
            ui.end_row();

            ui.label("Avg SNR:");
            ui.label(format!("{:.1} dB", self.avg_snr));
            ui.end_row();

            ui.label("Window:");
            match self.window {
                Some(window) => ui.label(format!("{} to {}", window.min, window.max)),
                None => ui.label("-"),
            };
            ui.end_row();
        });

        ui.add_space(10.0);
        ui.label("Transcript:");
        ui.label(RichText::new(&self.full_text).monospace());

        ui.response()
    }
}
