use eframe::egui::{
    Align2, Color32, FontId, Rect, Response, Sense, Slider, Stroke, Ui, Widget, vec2,
};
use flume::Sender;
use log::warn;

use morsescope_engine::RegionIndex;
use morsescope_engine::transform::Viewport;
use morsescope_messages::{Command, ViewState};

const STRIP_HEIGHT: f32 = 40.0;
const MAX_ZOOM: f64 = 16.0;

const REGION_FILL: Color32 = Color32::from_rgb(40, 90, 160);
const REGION_EDGE: Color32 = Color32::from_rgb(120, 170, 230);
const PLAYHEAD: Color32 = Color32::from_rgb(255, 80, 80);

/// Timeline of the decoded characters with the playhead on top.
/// Clicking seeks playback to the time under the pointer.
pub struct RegionStrip {
    cmd_tx: Sender<Command>,
    regions: RegionIndex,
    duration: f64,
    position: f64,
    zoom: f64,
    scroll: f64,
}

impl RegionStrip {
    pub fn new(cmd_tx: Sender<Command>) -> Self {
        Self {
            cmd_tx,
            regions: RegionIndex::default(),
            duration: 0.0,
            position: 0.0,
            zoom: 1.0,
            scroll: 0.0,
        }
    }

    pub fn update_from_view(&mut self, view: &ViewState) {
        if let Err(e) = self.regions.set_events(view.events.clone()) {
            warn!("Engine sent unusable regions: {e:#}");
        }
        if view.duration != self.duration {
            self.duration = view.duration;
            self.position = 0.0;
            self.scroll = 0.0;
        }
    }

    pub fn set_position(&mut self, t: f64) {
        self.position = t;
    }

    /// Current viewport for a strip `width` pixels wide.
    fn viewport(&self, width: f64) -> Viewport {
        let total_width = width * self.zoom;
        Viewport {
            visible_width: width,
            total_width,
            scroll_offset: self.scroll.clamp(0.0, (total_width - width).max(0.0)),
            duration: self.duration,
        }
    }

    /// Normalized seek position for a click at `x`.
    fn seek_target(&self, x: f64, width: f64) -> Option<f64> {
        let t = self.viewport(width).time_at(x)?;
        Some(t / self.duration)
    }

    fn paint(&self, ui: &Ui, rect: Rect) {
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, ui.visuals().extreme_bg_color);

        let viewport = self.viewport(rect.width() as f64);
        let font = FontId::monospace(14.0);
        for span in self.regions.overlay(&viewport) {
            let region = Rect::from_x_y_ranges(
                rect.left() + span.x_start as f32..=rect.left() + span.x_end as f32,
                rect.y_range(),
            )
            .shrink2(vec2(0.0, 4.0));
            painter.rect_filled(region, 2.0, REGION_FILL);
            painter.vline(region.left(), region.y_range(), Stroke::new(1.0, REGION_EDGE));
            if span.show_label {
                painter.text(
                    region.center(),
                    Align2::CENTER_CENTER,
                    span.ch,
                    font.clone(),
                    Color32::WHITE,
                );
            }
        }

        if let Some(x) = viewport.x_at(self.position) {
            let x = rect.left() + x as f32;
            painter.vline(x, rect.y_range(), Stroke::new(2.0, PLAYHEAD));
        }

        if self.regions.is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "no decoded characters",
                FontId::proportional(12.0),
                ui.visuals().weak_text_color(),
            );
        }
    }
}

impl Widget for &mut RegionStrip {
    fn ui(self, ui: &mut Ui) -> Response {
        ui.horizontal(|ui| {
            ui.add(
                Slider::new(&mut self.zoom, 1.0..=MAX_ZOOM)
                    .logarithmic(true)
                    .text("Zoom"),
            );
            let width = ui.available_width() as f64;
            let max_scroll = (width * self.zoom - width).max(0.0);
            self.scroll = self.scroll.min(max_scroll);
            ui.add_enabled(
                max_scroll > 0.0,
                Slider::new(&mut self.scroll, 0.0..=max_scroll)
                    .show_value(false)
                    .text("Scroll"),
            );
        });

        let width = ui.available_width();
        let (rect, response) = ui.allocate_exact_size(vec2(width, STRIP_HEIGHT), Sense::click());
        self.paint(ui, rect);

        if response.clicked() {
            let target = response
                .interact_pointer_pos()
                .and_then(|pos| self.seek_target((pos.x - rect.left()) as f64, rect.width() as f64));
            if let Some(normalized) = target {
                let _ = self.cmd_tx.send(Command::Seek(normalized));
            }
        }

        response
    }
}
