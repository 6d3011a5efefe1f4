use eframe::egui::{
    Color32, ColorImage, Image, Response, Sense, Stroke, TextureHandle, TextureOptions, Ui, Vec2,
    Widget,
};
use flume::Sender;
use log::debug;

use morsescope_engine::transform::frequency_from_pixel_y;
use morsescope_messages::{Command, Hertz, WaterfallImage};

const PLAYHEAD: Color32 = Color32::from_rgb(255, 80, 80);

/// Static spectrogram of the whole recording.
///
/// Time runs left to right, frequency bottom to top. Hovering reads the
/// frequency off the vertical axis; a click retunes the waterfall there.
pub struct Spectrogram {
    cmd_tx: Sender<Command>,
    image: Option<ColorImage>,
    texture: Option<TextureHandle>,
    nyquist: Hertz,
    position: f64,
    duration: f64,
}

impl Spectrogram {
    pub fn new(cmd_tx: Sender<Command>) -> Self {
        Self {
            cmd_tx,
            image: None,
            texture: None,
            nyquist: Hertz::default(),
            position: 0.0,
            duration: 0.0,
        }
    }

    pub fn set_image(&mut self, image: &WaterfallImage, nyquist: Hertz) {
        if image.pixels.len() != image.width * image.height {
            return;
        }
        debug!("Spectrogram {}x{} up to {}", image.width, image.height, nyquist);
        self.image = Some(ColorImage::from_rgb(
            [image.width, image.height],
            &image.to_rgb_bytes(),
        ));
        self.nyquist = nyquist;
    }

    pub fn set_duration(&mut self, duration: f64) {
        self.duration = duration;
    }

    pub fn set_position(&mut self, t: f64) {
        self.position = t;
    }

    /// Frequency at `y` pixels below the top of a display `height` pixels tall.
    fn frequency_at(&self, y: f32, height: f32) -> Option<Hertz> {
        if !(self.nyquist.0 > 0.0) || !(height > 0.0) {
            return None;
        }
        frequency_from_pixel_y(y.clamp(0.0, height), height, self.nyquist)
    }

    fn retune_at(&self, y: f32, height: f32) {
        if let Some(freq) = self.frequency_at(y, height) {
            let _ = self.cmd_tx.send(Command::Retune(freq));
        }
    }
}

impl Widget for &mut Spectrogram {
    fn ui(self, ui: &mut Ui) -> Response {
        if let Some(image) = self.image.take() {
            match self.texture.as_mut() {
                Some(texture) => texture.set(image, TextureOptions::LINEAR),
                None => {
                    self.texture =
                        Some(ui.ctx().load_texture("spectrogram", image, TextureOptions::LINEAR));
                }
            }
        }

        let Some(texture) = &self.texture else {
            ui.label("Waiting for spectrogram...");
            return ui.response();
        };

        let size = Vec2::new(ui.available_width(), ui.available_height());
        let response = ui.add(
            Image::new(texture)
                .fit_to_exact_size(size)
                .sense(Sense::click()),
        );
        let rect = response.rect;

        if self.duration > 0.0 {
            let fraction = (self.position / self.duration).clamp(0.0, 1.0) as f32;
            let x = rect.left() + fraction * rect.width();
            ui.painter_at(rect)
                .vline(x, rect.y_range(), Stroke::new(1.5, PLAYHEAD));
        }

        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                self.retune_at(pos.y - rect.top(), rect.height());
            }
        }

        let hovered = response
            .hover_pos()
            .and_then(|pos| self.frequency_at(pos.y - rect.top(), rect.height()));
        match hovered {
            Some(freq) => response.on_hover_text_at_pointer(freq.to_string()),
            None => response,
        }
    }
}
