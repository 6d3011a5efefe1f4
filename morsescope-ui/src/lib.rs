mod control_panel;
mod region_strip;
mod spectrogram;
mod state;
mod waterfall;

use morsescope_messages::{Command, Event};
use state::UiState;

/// Main application struct implementing the egui App trait.
pub struct MorseScopeApp {
    /// Receiver for events from engine
    event_rx: flume::Receiver<Event>,

    /// Local application state
    state: UiState,
}

impl MorseScopeApp {
    fn new(event_rx: flume::Receiver<Event>, cmd_tx: flume::Sender<Command>) -> Self {
        Self {
            event_rx,
            state: UiState::new(cmd_tx),
        }
    }
}

impl eframe::App for MorseScopeApp {
    fn update(&mut self, ctx: &eframe::egui::Context, _frame: &mut eframe::Frame) {
        // Pull every pending event; frames arrive faster than some repaints
        while let Ok(event) = self.event_rx.try_recv() {
            self.state.handle_event(event);
        }

        ctx.request_repaint();

        eframe::egui::SidePanel::right("control_panel")
            .default_width(280.0)
            .show(ctx, |ui| {
                ui.add(&mut self.state.control_panel);
            });

        eframe::egui::TopBottomPanel::bottom("region_strip")
            .resizable(false)
            .show(ctx, |ui| {
                ui.add(&mut self.state.region_strip);
            });

        eframe::egui::CentralPanel::default().show(ctx, |ui| {
            if self.state.view.is_none() {
                ui.centered_and_justified(|ui| {
                    ui.label("Waiting for engine connection...");
                });
            } else {
                let size = eframe::egui::vec2(ui.available_width(), ui.available_height() * 0.4);
                ui.allocate_ui(size, |ui| {
                    ui.add(&mut self.state.spectrogram);
                });
                ui.separator();
                if self.state.control_panel.show_waterfall() {
                    ui.add(&mut self.state.waterfall);
                } else {
                    ui.centered_and_justified(|ui| {
                        ui.label("Waterfall hidden");
                    });
                }
            }
        });
    }
}

/// Entry point for the UI module.
///
/// Runs the eframe application on the main thread (blocking).
pub fn run(event_rx: flume::Receiver<Event>, cmd_tx: flume::Sender<Command>) -> anyhow::Result<()> {
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1024.0, 640.0])
            .with_title("MorseScope"),
        ..Default::default()
    };

    eframe::run_native(
        "MorseScope",
        options,
        Box::new(|_cc| Ok(Box::new(MorseScopeApp::new(event_rx, cmd_tx)))),
    )
    .map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}
